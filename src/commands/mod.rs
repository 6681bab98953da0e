//! CLI commands. Each one loads the configuration, talks to the API through
//! the backend, and writes plain lines (or JSON) to stdout.

mod output;
mod progress;

use anyhow::{Context, Result};
use std::io::{self, Write};

use crate::backend::RepositoryBackend;
use crate::client::{Params, Record};
use crate::collection::LazyCollection;
use crate::config::Config;
use crate::paths::paths;
use crate::schema::{self, ModelConfig};

use output::{write_records, write_refs};

/// Options of `bsk commits`.
#[derive(Debug, Default, Clone)]
pub struct CommitQuery {
    pub repository: Option<String>,
    pub limit: usize,
    pub order_field: Option<String>,
    pub order: Option<String>,
}

impl CommitQuery {
    fn params(&self) -> Params {
        let mut params = Params::new();
        if let Some(f) = &self.order_field {
            params.insert("order_field".to_string(), f.clone());
        }
        if let Some(o) = &self.order {
            params.insert("order".to_string(), o.clone());
        }
        params
    }
}

fn model(name: &str) -> Result<&'static ModelConfig> {
    schema::model(name).with_context(|| format!("model {name} is not registered"))
}

fn connect(cfg: &Config) -> Result<RepositoryBackend> {
    Ok(RepositoryBackend::new(cfg.client()?))
}

fn emit(config: &ModelConfig, records: &[Record], json: bool) -> Result<()> {
    let mut out = io::stdout().lock();
    write_records(&mut out, config, records, json)?;
    out.flush()?;
    Ok(())
}

/// `bsk repos`: every repository in the account.
pub fn cmd_repos(cfg: &Config, json: bool) -> Result<()> {
    let backend = connect(cfg)?;
    let repo = model("Repository")?;
    let pb = progress::fetching("repositories");
    let records = LazyCollection::new(&backend, repo).into_vec();
    pb.finish_and_clear();
    emit(repo, &records.context("failed to list repositories")?, json)
}

/// `bsk repo <id>`. With `refs`, branches and tags are fetched by separate calls.
pub fn cmd_repo(cfg: &Config, id: &str, refs: bool, json: bool) -> Result<()> {
    let backend = connect(cfg)?;
    let repo = model("Repository")?;
    let pb = progress::fetching(&format!("repository {id}"));
    let fetched = (|| -> Result<_> {
        let record = backend.get(id, repo)?;
        let extra = if refs {
            let client = backend.client();
            Some((client.branches_for(id)?, client.tags_for(id)?))
        } else {
            None
        };
        Ok((record, extra))
    })();
    pb.finish_and_clear();
    let (record, extra) = fetched.with_context(|| format!("failed to fetch repository {id}"))?;

    emit(repo, std::slice::from_ref(&record), json)?;
    if let Some((branches, tags)) = extra {
        let mut out = io::stdout().lock();
        write_refs(&mut out, "branches", &branches)?;
        write_refs(&mut out, "tags", &tags)?;
    }
    Ok(())
}

/// `bsk releases <repo>`: scoped through the `repository_id` filter.
pub fn cmd_releases(cfg: &Config, repository: &str, json: bool) -> Result<()> {
    let backend = connect(cfg)?;
    let release = model("Release")?;
    let pb = progress::fetching(&format!("releases of {repository}"));
    let records = LazyCollection::new(&backend, release)
        .filter("repository_id", repository)
        .into_vec();
    pb.finish_and_clear();
    let records = records.with_context(|| format!("failed to list releases of {repository}"))?;
    emit(release, &records, json)
}

/// `bsk commits`: newest changesets, account-wide or for one repository.
///
/// Pages are requested only as far as `limit` needs.
pub fn cmd_commits(cfg: &Config, q: &CommitQuery, json: bool) -> Result<()> {
    let backend = connect(cfg)?;
    let commit = model("Commit")?;
    let client = backend.client();
    let pages = match &q.repository {
        Some(repo) => client.changesets_for(repo, q.params()),
        None => client.changesets(q.params()),
    };

    let pb = progress::fetching("changesets");
    let records: Result<Vec<Record>, _> = pages.take(q.limit).collect();
    pb.finish_and_clear();
    emit(commit, &records.context("failed to list changesets")?, json)
}

pub fn cmd_account(cfg: &Config, id: &str, json: bool) -> Result<()> {
    let backend = connect(cfg)?;
    let account = model("Account")?;
    let record = backend
        .get(id, account)
        .with_context(|| format!("failed to fetch account {id}"))?;
    emit(account, std::slice::from_ref(&record), json)
}

/// `bsk users`: listed through the client, the backend has no bulk user listing.
pub fn cmd_users(cfg: &Config, json: bool) -> Result<()> {
    let backend = connect(cfg)?;
    let user = model("User")?;
    let records = backend.client().users().context("failed to list users")?;
    emit(user, &records, json)
}

pub fn cmd_user(cfg: &Config, id: &str, json: bool) -> Result<()> {
    let backend = connect(cfg)?;
    let user = model("User")?;
    let record = backend
        .get(id, user)
        .with_context(|| format!("failed to fetch user {id}"))?;
    emit(user, std::slice::from_ref(&record), json)
}

/// `bsk config`: effective configuration, password masked.
pub fn cmd_config(cfg: &Config) -> Result<()> {
    print!("{}", cfg.redacted()?);
    Ok(())
}

/// `bsk home`: directory holding `config.toml`.
pub fn cmd_home() -> Result<()> {
    println!("{}", paths()?.home.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_query_params_only_carry_set_options() {
        let q = CommitQuery {
            order_field: Some("time".into()),
            ..CommitQuery::default()
        };
        let params = q.params();
        assert_eq!(params.len(), 1);
        assert_eq!(params["order_field"], "time");
    }

    #[test]
    fn every_command_model_is_registered() {
        for name in ["Repository", "Release", "Commit", "Account", "User"] {
            assert!(model(name).is_ok(), "{name}");
        }
    }
}
