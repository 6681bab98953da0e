use serde_json::Value;

use crate::backend::RepositoryBackend;
use crate::client::Record;
use crate::error::Result;
use crate::schema::{self, HasMany, JoinKey, ModelConfig};

/// Records of one model, fetched on first traversal.
///
/// A filter on the parent-id field (`repository_id` for releases and commits)
/// turns into a scoped `related` fetch instead of a full listing. All other
/// filters are applied to the fetched records.
pub struct LazyCollection<'b> {
    backend: &'b RepositoryBackend,
    config: &'static ModelConfig,
    scope: Option<(&'static HasMany, String)>,
    filters: Vec<(String, String)>,
    limit: Option<usize>,
    data: Option<Vec<Record>>,
}

impl<'b> LazyCollection<'b> {
    pub fn new(backend: &'b RepositoryBackend, config: &'static ModelConfig) -> Self {
        Self {
            backend,
            config,
            scope: None,
            filters: Vec::new(),
            limit: None,
            data: None,
        }
    }

    pub fn model(&self) -> &'static ModelConfig {
        self.config
    }

    /// Keep records whose `field` equals `value`.
    ///
    /// Filtering an already loaded collection drops the loaded records; the
    /// next traversal fetches again with every filter applied.
    pub fn filter(mut self, field: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        self.data = None;
        if self.scope.is_none()
            && let Some(relation) = self.parent_relation(field)
        {
            self.scope = Some((relation, value));
            return self;
        }
        self.filters.push((field.to_string(), value));
        self
    }

    /// Stop after `n` matching records.
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self.data = None;
        self
    }

    /// Parent id the collection was narrowed to, if any.
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_ref().map(|(_, id)| id.as_str())
    }

    pub fn is_loaded(&self) -> bool {
        self.data.is_some()
    }

    pub fn iter(&mut self) -> Result<impl Iterator<Item = &Record>> {
        self.load()?;
        Ok(self.data.iter().flatten())
    }

    pub fn into_vec(mut self) -> Result<Vec<Record>> {
        self.load()?;
        Ok(self.data.unwrap_or_default())
    }

    fn load(&mut self) -> Result<()> {
        if self.data.is_some() {
            return Ok(());
        }
        let source = match &self.scope {
            Some((relation, id)) => self.backend.related(relation, id)?,
            None => self.backend.all(self.config)?,
        };
        let mut data = Vec::new();
        if self.limit != Some(0) {
            for record in source {
                let record = record?;
                if self
                    .filters
                    .iter()
                    .all(|(f, v)| field_matches(&record, f, v))
                {
                    data.push(record);
                    if self.limit.is_some_and(|n| data.len() >= n) {
                        break;
                    }
                }
            }
        }
        self.data = Some(data);
        Ok(())
    }

    /// The parent's `hasMany` relation that `field` scopes, e.g.
    /// `Repository.commits` for `repository_id` on `Commit`.
    fn parent_relation(&self, field: &str) -> Option<&'static HasMany> {
        self.config
            .belongs_to
            .iter()
            .filter(|b| b.reference == field)
            .find_map(|b| {
                schema::relation_between(b.model, self.config.name).filter(|rel| {
                    matches!(rel.join, JoinKey::ParentId { .. }) && rel.join.child_field() == field
                })
            })
    }
}

/// Whether the (possibly dotted) `field` of `record` equals `want`.
/// Numbers and booleans compare by their JSON text.
pub(crate) fn field_matches(record: &Record, field: &str, want: &str) -> bool {
    let mut cur = record;
    for part in field.split('.') {
        match cur.get(part) {
            Some(v) => cur = v,
            None => return false,
        }
    }
    match cur {
        Value::String(s) => s == want,
        Value::Number(n) => n.to_string() == want,
        Value::Bool(b) => b.to_string() == want,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Client, Endpoint};
    use httpmock::prelude::*;
    use serde_json::json;

    fn backend_for(server: &MockServer) -> RepositoryBackend {
        let ep = Endpoint::with_base(&server.url("/api/"), None).unwrap();
        RepositoryBackend::new(Client::new(ep, None).unwrap())
    }

    #[test]
    fn nothing_is_fetched_before_traversal() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/api/repositories.json");
            then.status(200).json_body(json!([{"repository": {"id": 1}}]));
        });

        let b = backend_for(&server);
        let mut repos = LazyCollection::new(&b, schema::model("Repository").unwrap());
        assert!(!repos.is_loaded());
        m.assert_hits(0);

        assert_eq!(repos.iter().unwrap().count(), 1);
        assert_eq!(repos.iter().unwrap().count(), 1);
        m.assert_hits(1);
    }

    #[test]
    fn parent_filter_becomes_scoped_fetch() {
        let server = MockServer::start();
        let scoped = server.mock(|when, then| {
            when.method(GET).path("/api/7/releases.json");
            then.status(200).json_body(json!([
                {"release": {"id": 1, "name": "a", "environment_name": "staging"}},
                {"release": {"id": 2, "name": "b", "environment_name": "production"}}
            ]));
        });

        let b = backend_for(&server);
        let releases = LazyCollection::new(&b, schema::model("Release").unwrap())
            .filter("repository_id", "7")
            .filter("environment_name", "production");
        assert_eq!(releases.scope(), Some("7"));

        let got = releases.into_vec().unwrap();
        assert_eq!(got, vec![json!({"id": 2, "name": "b", "environment_name": "production"})]);
        scoped.assert();
    }

    #[test]
    fn commits_by_repository_stop_at_limit() {
        let server = MockServer::start();
        let page: Vec<_> = (0..30)
            .map(|i| json!({"revision_cache": {"revision": i}}))
            .collect();
        let page1 = server.mock(|when, then| {
            when.method(GET)
                .path("/api/changesets/repository.json")
                .query_param("repository_id", "3")
                .query_param("page", "1");
            then.status(200).json_body(json!(page));
        });
        let page2 = server.mock(|when, then| {
            when.method(GET)
                .path("/api/changesets/repository.json")
                .query_param("page", "2");
            then.status(200).json_body(json!([]));
        });

        let b = backend_for(&server);
        let got = LazyCollection::new(&b, schema::model("Commit").unwrap())
            .filter("repository_id", 3.to_string())
            .limit(5)
            .into_vec()
            .unwrap();
        assert_eq!(got.len(), 5);
        page1.assert_hits(1);
        page2.assert_hits(0);
    }

    #[test]
    fn other_filters_apply_after_full_listing() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/api/repositories.json");
            then.status(200).json_body(json!([
                {"repository": {"id": 1, "vcs": "git"}},
                {"repository": {"id": 2, "vcs": "subversion"}}
            ]));
        });

        let b = backend_for(&server);
        let mut repos = LazyCollection::new(&b, schema::model("Repository").unwrap())
            .filter("vcs", "git");
        assert_eq!(repos.scope(), None);
        let ids: Vec<_> = repos.iter().unwrap().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(1)]);
        m.assert();
    }

    #[test]
    fn filter_added_after_load_applies_on_next_traversal() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET).path("/api/repositories.json");
            then.status(200).json_body(json!([
                {"repository": {"id": 1, "vcs": "git"}},
                {"repository": {"id": 2, "vcs": "subversion"}}
            ]));
        });

        let b = backend_for(&server);
        let mut repos = LazyCollection::new(&b, schema::model("Repository").unwrap());
        assert_eq!(repos.iter().unwrap().count(), 2);

        let mut repos = repos.filter("vcs", "git");
        assert!(!repos.is_loaded());
        assert_eq!(repos.iter().unwrap().count(), 1);

        let mut repos = repos.limit(0);
        assert_eq!(repos.iter().unwrap().count(), 0);
        m.assert_hits(2);
    }

    #[test]
    fn only_the_first_parent_filter_scopes() {
        let server = MockServer::start();
        let b = backend_for(&server);
        let c = LazyCollection::new(&b, schema::model("Release").unwrap())
            .filter("repository_id", "7")
            .filter("repository_id", "8");
        assert_eq!(c.scope(), Some("7"));
        assert_eq!(c.filters, vec![("repository_id".to_string(), "8".to_string())]);
    }

    #[test]
    fn unscoped_release_listing_is_unsupported() {
        let server = MockServer::start();
        let b = backend_for(&server);
        let c = LazyCollection::new(&b, schema::model("Release").unwrap());
        assert!(c.into_vec().is_err());
    }

    #[test]
    fn field_matching() {
        let r = json!({"id": 12, "name": "core", "flags": {"admin": true}});
        assert!(field_matches(&r, "id", "12"));
        assert!(field_matches(&r, "name", "core"));
        assert!(field_matches(&r, "flags.admin", "true"));
        assert!(!field_matches(&r, "flags", "true"));
        assert!(!field_matches(&r, "missing", "x"));
    }
}
