//! Maps generic model requests onto Beanstalk client calls.
//!
//! The entity layer asks for "one by id", "all", or "related to a parent";
//! [`RepositoryBackend`] resolves that through the model's [`ModelConfig`] and
//! calls the matching [`Client`] operation.

use tracing::debug;

use crate::client::{Client, Params, Record};
use crate::collection::field_matches;
use crate::error::{ApiError, Result};
use crate::paging::PagedResult;
use crate::schema::{self, HasMany, JoinKey, ModelConfig, ResourceKind};

/// Records produced by the backend, either already fetched or paged lazily.
pub enum Records {
    Loaded(std::vec::IntoIter<Record>),
    Paged(PagedResult<Client>),
}

impl Records {
    pub fn is_paged(&self) -> bool {
        matches!(self, Records::Paged(_))
    }
}

impl From<Vec<Record>> for Records {
    fn from(v: Vec<Record>) -> Self {
        Records::Loaded(v.into_iter())
    }
}

impl Iterator for Records {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Records::Loaded(it) => it.next().map(Ok),
            Records::Paged(p) => p.next(),
        }
    }
}

/// Resolves relations the backend has no dedicated remote call for.
pub trait RelationResolver {
    fn resolve(
        &self,
        backend: &RepositoryBackend,
        relation: &HasMany,
        parent_id: &str,
    ) -> Result<Records>;
}

/// Fetches every record of the target model and keeps the ones whose join
/// field equals the parent id.
#[derive(Debug, Default, Clone, Copy)]
pub struct FilterResolver;

impl RelationResolver for FilterResolver {
    fn resolve(
        &self,
        backend: &RepositoryBackend,
        relation: &HasMany,
        parent_id: &str,
    ) -> Result<Records> {
        let target = target_model(relation)?;
        let field = relation.join.child_field();
        let mut matched = Vec::new();
        for record in backend.all(target)? {
            let record = record?;
            if field_matches(&record, &field, parent_id) {
                matched.push(record);
            }
        }
        Ok(matched.into())
    }
}

pub struct RepositoryBackend {
    client: Client,
}

impl RepositoryBackend {
    pub const IDENTIFIER: &'static str = "beanstalk";

    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Fetch one record. Branches and tags are never folded in; use
    /// [`Client::branches_for`] and [`Client::tags_for`] for those.
    pub fn get(&self, id: &str, config: &ModelConfig) -> Result<Record> {
        match config.resource {
            ResourceKind::Repository => self.client.repository(id),
            ResourceKind::Account => self.client.account(id),
            ResourceKind::User => self.client.user(id),
            ResourceKind::Release | ResourceKind::Commit => Err(unsupported("get", config)),
        }
    }

    pub fn all(&self, config: &ModelConfig) -> Result<Records> {
        match config.resource {
            ResourceKind::Repository => Ok(self.client.repositories()?.into()),
            ResourceKind::Commit => Ok(Records::Paged(self.client.changesets(Params::new()))),
            ResourceKind::Release | ResourceKind::Account | ResourceKind::User => {
                Err(unsupported("all", config))
            }
        }
    }

    /// Children of `parent_id` along `relation`, falling back to
    /// [`FilterResolver`] for relations that are not parent-scoped.
    pub fn related(&self, relation: &HasMany, parent_id: &str) -> Result<Records> {
        self.related_with(relation, parent_id, &FilterResolver)
    }

    pub fn related_with(
        &self,
        relation: &HasMany,
        parent_id: &str,
        fallback: &dyn RelationResolver,
    ) -> Result<Records> {
        let target = target_model(relation)?;
        match &relation.join {
            JoinKey::ParentId { parent } => {
                debug!(relation = relation.name, %parent, parent_id, "scoped fetch");
                match target.resource {
                    ResourceKind::Commit => Ok(Records::Paged(
                        self.client.changesets_for(parent_id, Params::new()),
                    )),
                    ResourceKind::Release => Ok(self.client.releases_for(parent_id)?.into()),
                    ResourceKind::Repository | ResourceKind::Account | ResourceKind::User => {
                        Err(unsupported("related", target))
                    }
                }
            }
            JoinKey::Field(_) => fallback.resolve(self, relation, parent_id),
        }
    }
}

fn target_model(relation: &HasMany) -> Result<&'static ModelConfig> {
    schema::model(relation.model).ok_or(ApiError::UnsupportedResource {
        operation: "related",
        model: relation.model,
        kind: "unknown model".to_string(),
    })
}

fn unsupported(operation: &'static str, config: &ModelConfig) -> ApiError {
    ApiError::UnsupportedResource {
        operation,
        model: config.name,
        kind: config.resource.to_string(),
    }
}
