//! Model schema registry.
//!
//! Each model declares how remote fields map onto canonical names, how it
//! relates to other models, and which remote resource backs it. The registry
//! is built once on first use and is read-only afterwards.

use std::fmt;
use std::sync::LazyLock;

use serde_json::{Map, Value};

use crate::client::Record;

/// Remote entity category a model is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Repository,
    Release,
    Commit,
    Account,
    User,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Repository => "repository",
            ResourceKind::Release => "release",
            ResourceKind::Commit => "commit",
            ResourceKind::Account => "account",
            ResourceKind::User => "user",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a `hasMany` relation scopes its remote query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinKey {
    /// `"<parent>.id"`: the children are listed per parent id.
    ParentId { parent: String },
    /// Any other pattern, matched as a plain field on the child records.
    Field(String),
}

impl JoinKey {
    pub fn parse(pattern: &str) -> Self {
        match pattern.split_once('.') {
            Some((parent, "id")) if !parent.is_empty() => {
                JoinKey::ParentId {
                    parent: parent.to_string(),
                }
            }
            _ => JoinKey::Field(pattern.to_string()),
        }
    }

    /// Field on the child that holds the parent id, e.g. `repository_id`.
    pub fn child_field(&self) -> String {
        match self {
            JoinKey::ParentId { parent } => format!("{parent}_id"),
            JoinKey::Field(f) => f.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BelongsTo {
    pub name: &'static str,
    pub model: &'static str,
    /// Field on this model holding the target's id.
    pub reference: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HasMany {
    pub name: &'static str,
    pub model: &'static str,
    pub join: JoinKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub name: &'static str,
    /// `(remote field, canonical field)` pairs.
    pub properties: &'static [(&'static str, &'static str)],
    pub belongs_to: Vec<BelongsTo>,
    pub has_many: Vec<HasMany>,
    pub resource: ResourceKind,
}

impl ModelConfig {
    pub fn belongs_to(&self, name: &str) -> Option<&BelongsTo> {
        self.belongs_to.iter().find(|r| r.name == name)
    }

    pub fn has_many(&self, name: &str) -> Option<&HasMany> {
        self.has_many.iter().find(|r| r.name == name)
    }

    /// Canonical name for a remote field.
    pub fn canonical(&self, remote: &str) -> Option<&'static str> {
        self.properties
            .iter()
            .find(|(r, _)| *r == remote)
            .map(|(_, c)| *c)
    }

    /// Rename remote fields to canonical ones, dropping anything unmapped.
    pub fn project(&self, record: &Record) -> Record {
        let mut out = Map::new();
        if let Value::Object(fields) = record {
            for (remote, canonical) in self.properties {
                if let Some(v) = fields.get(*remote) {
                    out.insert((*canonical).to_string(), v.clone());
                }
            }
        }
        Value::Object(out)
    }
}

static MODELS: LazyLock<Vec<ModelConfig>> = LazyLock::new(build);

/// Look a model up by name.
pub fn model(name: &str) -> Option<&'static ModelConfig> {
    MODELS.iter().find(|m| m.name == name)
}

pub fn models() -> &'static [ModelConfig] {
    &MODELS
}

/// `hasMany` relation on `parent` whose target is `child`, if any.
pub fn relation_between(parent: &str, child: &str) -> Option<&'static HasMany> {
    model(parent)?.has_many.iter().find(|r| r.model == child)
}

fn build() -> Vec<ModelConfig> {
    vec![
        ModelConfig {
            name: "Repository",
            properties: &[
                ("id", "id"),
                ("name", "name"),
                ("title", "title"),
                ("repository_url", "url"),
                ("vcs", "vcs"),
                ("created_at", "created"),
                ("last_commit_at", "lastCommit"),
            ],
            belongs_to: vec![BelongsTo {
                name: "account",
                model: "Account",
                reference: "account_id",
            }],
            has_many: vec![
                HasMany {
                    name: "releases",
                    model: "Release",
                    join: JoinKey::parse("repository.id"),
                },
                HasMany {
                    name: "commits",
                    model: "Commit",
                    join: JoinKey::parse("repository.id"),
                },
            ],
            resource: ResourceKind::Repository,
        },
        ModelConfig {
            name: "Release",
            properties: &[("id", "id"), ("name", "name")],
            belongs_to: vec![BelongsTo {
                name: "repository",
                model: "Repository",
                reference: "repository_id",
            }],
            has_many: vec![],
            resource: ResourceKind::Release,
        },
        ModelConfig {
            name: "Commit",
            properties: &[
                ("revision", "id"),
                ("hash_id", "hash"),
                ("message", "message"),
                ("time", "created"),
                ("author", "author"),
                ("email", "email"),
                ("changed_files", "files"),
                ("changed_dirs", "folders"),
                ("changed_properties", "properties"),
                ("too_large", "isTooLarge"),
            ],
            belongs_to: vec![
                BelongsTo {
                    name: "repository",
                    model: "Repository",
                    reference: "repository_id",
                },
                BelongsTo {
                    name: "account",
                    model: "Account",
                    reference: "account_id",
                },
                BelongsTo {
                    name: "user",
                    model: "User",
                    reference: "user_id",
                },
            ],
            has_many: vec![],
            resource: ResourceKind::Commit,
        },
        ModelConfig {
            name: "Account",
            properties: &[
                ("id", "id"),
                ("name", "name"),
                ("third_level_domain", "subdomain"),
            ],
            belongs_to: vec![BelongsTo {
                name: "owner",
                model: "User",
                reference: "owner_id",
            }],
            has_many: vec![],
            resource: ResourceKind::Account,
        },
        ModelConfig {
            name: "User",
            properties: &[
                ("id", "id"),
                ("first_name", "firstname"),
                ("last_name", "lastname"),
                ("email", "email"),
                ("owner", "isOwner"),
                ("admin", "isAdmin"),
            ],
            belongs_to: vec![BelongsTo {
                name: "account",
                model: "Account",
                reference: "account_id",
            }],
            has_many: vec![],
            resource: ResourceKind::User,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registry_has_every_model_once() {
        let names: Vec<_> = models().iter().map(|m| m.name).collect();
        assert_eq!(names, ["Repository", "Release", "Commit", "Account", "User"]);
    }

    #[test]
    fn relation_targets_resolve() {
        for m in models() {
            for r in &m.belongs_to {
                assert!(model(r.model).is_some(), "{}.{}", m.name, r.name);
            }
            for r in &m.has_many {
                assert!(model(r.model).is_some(), "{}.{}", m.name, r.name);
            }
        }
    }

    #[test]
    fn join_key_parsing() {
        assert_eq!(
            JoinKey::parse("repository.id"),
            JoinKey::ParentId {
                parent: "repository".into()
            }
        );
        assert_eq!(
            JoinKey::parse("repository.name"),
            JoinKey::Field("repository.name".into())
        );
        assert_eq!(JoinKey::parse("owner_id"), JoinKey::Field("owner_id".into()));
        assert_eq!(JoinKey::parse(".id"), JoinKey::Field(".id".into()));
        assert_eq!(JoinKey::parse("repository.id").child_field(), "repository_id");
    }

    #[test]
    fn projection_renames_and_drops() {
        let account = model("Account").unwrap();
        let got = account.project(&json!({
            "id": 4,
            "name": "Acme",
            "third_level_domain": "acme",
            "time_zone": "UTC"
        }));
        assert_eq!(got, json!({"id": 4, "name": "Acme", "subdomain": "acme"}));
    }

    #[test]
    fn commit_id_comes_from_revision() {
        let commit = model("Commit").unwrap();
        assert_eq!(commit.canonical("revision"), Some("id"));
        let got = commit.project(&json!({"revision": 812, "too_large": false}));
        assert_eq!(got, json!({"id": 812, "isTooLarge": false}));
    }

    #[test]
    fn repository_relations() {
        let repo = model("Repository").unwrap();
        assert_eq!(repo.belongs_to("account").unwrap().reference, "account_id");
        assert_eq!(repo.has_many("releases").unwrap().model, "Release");
        assert_eq!(relation_between("Repository", "Commit").unwrap().name, "commits");
        assert!(relation_between("Commit", "Repository").is_none());
    }
}
