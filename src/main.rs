//! # bsk
//!
//! **bsk** is a read-only command-line client for the Beanstalk API.
//!
//! Features:
//! - `bsk repos` / `bsk repo <id> [--refs]` list or show repositories
//! - `bsk releases <repo>` lists the releases of a repository
//! - `bsk commits [--repo <id>]` walks changesets page by page
//! - `bsk account <id>`, `bsk users`, `bsk user <id>`
//! - `bsk home` prints the directory holding `config.toml`
//! - `bsk config` prints the effective configuration
//!
//! This CLI is built with [clap](https://docs.rs/clap).

use anyhow::Result;
use beanstalk_cli::{
    CommitQuery, Config, cmd_account, cmd_commits, cmd_config, cmd_home, cmd_releases, cmd_repo,
    cmd_repos, cmd_user, cmd_users, init_logging, load_config,
};
use clap::{Parser, Subcommand, ValueEnum};

/// Command-line interface definition.
#[derive(Parser, Debug)]
#[command(
    name = "bsk",
    version,
    about = "bsk - read-only Beanstalk API client",
    arg_required_else_help = true
)]
struct Cli {
    /// Print projected JSON, one record per line
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Order {
    Asc,
    Desc,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Cmd {
    /// List repositories
    Repos,
    /// Show one repository
    Repo {
        id: String,
        /// Also list branches and tags
        #[arg(long)]
        refs: bool,
    },
    /// List releases of a repository
    Releases { repository: String },
    /// List changesets, newest first
    Commits {
        /// Only changesets of this repository (id or name)
        #[arg(long)]
        repo: Option<String>,
        /// Maximum number of changesets to show
        #[arg(long, default_value_t = 30)]
        limit: usize,
        #[arg(long)]
        order_field: Option<String>,
        #[arg(long, value_enum)]
        order: Option<Order>,
    },
    /// Show one account
    Account { id: String },
    /// List users
    Users,
    /// Show one user
    User { id: String },
    /// Print the directory holding config.toml
    Home,
    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let json = cli.json;
    // `home` must work before any config exists
    let cfg = || -> Result<Config> {
        let cfg = load_config()?;
        init_logging(&cfg.log_level);
        Ok(cfg)
    };

    match cli.cmd {
        Cmd::Home => cmd_home(),
        Cmd::Config => cmd_config(&cfg()?),
        Cmd::Repos => cmd_repos(&cfg()?, json),
        Cmd::Repo { id, refs } => cmd_repo(&cfg()?, &id, refs, json),
        Cmd::Releases { repository } => cmd_releases(&cfg()?, &repository, json),
        Cmd::Commits {
            repo,
            limit,
            order_field,
            order,
        } => {
            let q = CommitQuery {
                repository: repo,
                limit,
                order_field,
                order: order.map(|o| match o {
                    Order::Asc => "ASC".to_string(),
                    Order::Desc => "DESC".to_string(),
                }),
            };
            cmd_commits(&cfg()?, &q, json)
        }
        Cmd::Account { id } => cmd_account(&cfg()?, &id, json),
        Cmd::Users => cmd_users(&cfg()?, json),
        Cmd::User { id } => cmd_user(&cfg()?, &id, json),
    }
}
