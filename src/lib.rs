//! Crate entry point for **beanstalk-cli (bsk)**.
//!
//! Read-only access to the Beanstalk REST API: repositories, releases,
//! changesets, accounts and users.
//!
//! - [`client`]: blocking HTTP client and envelope unwrapping
//! - [`paging`]: lazy iteration over paged listings
//! - [`schema`]: per-model field and relation declarations
//! - [`backend`]: maps get/all/related requests onto client calls
//! - [`collection`]: lazily fetched, filterable model collections
//!
//! The `cmd_*` re-exports back the `bsk` binary.

pub mod backend;
pub mod client;
pub mod collection;
mod commands;
mod config;
pub mod error;
mod logging;
pub mod paging;
mod paths;
pub mod schema;

pub use backend::{FilterResolver, Records, RelationResolver, RepositoryBackend};
pub use client::{Client, Credentials, Endpoint, Params, Record};
pub use collection::LazyCollection;
pub use commands::{
    CommitQuery, cmd_account, cmd_commits, cmd_config, cmd_home, cmd_releases, cmd_repo,
    cmd_repos, cmd_user, cmd_users,
};
pub use config::{Config, load_config};
pub use error::ApiError;
pub use logging::init_logging;
pub use paging::{PageSize, PagedResult};
pub use paths::bsk_home;
