use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use std::{env, fs};

use crate::client::{Client, Credentials, Endpoint};
use crate::paging::PageSize;
use crate::paths::paths;

/// Configuration loaded from `config.toml`, with environment overrides.
///
/// Example TOML:
/// ```toml
/// account  = "acme"
/// username = "jane"
/// password = "api-token"
/// per_page = 30
/// timeout_secs = 20
/// log_level = "info"
/// ```
///
/// `BEANSTALK_ACCOUNT`, `BEANSTALK_USERNAME`, `BEANSTALK_PASSWORD` and
/// `BEANSTALK_BASE_URL` take precedence over the file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub account: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Overrides `https://{account}.beanstalkapp.com/api/`.
    pub base_url: Option<String>,
    pub per_page: u32,
    pub timeout_secs: Option<u64>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account: None,
            username: None,
            password: None,
            base_url: None,
            per_page: PageSize::MAX,
            timeout_secs: Some(30),
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    /// Apply overrides from a variable lookup (the process environment in
    /// [`load_config`]).
    pub fn apply_env_with(&mut self, get: impl Fn(&str) -> Option<String>) {
        let set = |slot: &mut Option<String>, key: &str| {
            if let Some(v) = get(key).filter(|v| !v.is_empty()) {
                *slot = Some(v);
            }
        };
        set(&mut self.account, "BEANSTALK_ACCOUNT");
        set(&mut self.username, "BEANSTALK_USERNAME");
        set(&mut self.password, "BEANSTALK_PASSWORD");
        set(&mut self.base_url, "BEANSTALK_BASE_URL");
    }

    pub fn credentials(&self) -> Option<Credentials> {
        let username = self.username.clone()?;
        Some(Credentials {
            username,
            password: self.password.clone().unwrap_or_default(),
        })
    }

    pub fn endpoint(&self) -> Result<Endpoint> {
        let endpoint = match (&self.base_url, &self.account) {
            (Some(base), _) => Endpoint::with_base(base, self.credentials())?,
            (None, Some(account)) => Endpoint::for_account(account, self.credentials())?,
            (None, None) => bail!("no account configured (set `account` or BEANSTALK_ACCOUNT)"),
        };
        Ok(endpoint)
    }

    pub fn client(&self) -> Result<Client> {
        let per_page = PageSize::new(self.per_page).context("invalid `per_page` in config")?;
        let client = Client::new(self.endpoint()?, self.timeout_secs.map(Duration::from_secs))?
            .with_page_size(per_page);
        Ok(client)
    }

    /// TOML rendering with the password masked.
    pub fn redacted(&self) -> Result<String> {
        let mut shown = self.clone();
        if shown.password.is_some() {
            shown.password = Some("<redacted>".to_string());
        }
        toml::to_string(&shown).context("failed to render config")
    }
}

/// Load `config.toml` from the config home and apply the environment.
///
/// A missing file is fine; everything can come from the environment.
pub fn load_config() -> Result<Config> {
    let p = paths()?;
    let mut cfg = load_config_from(&p.config)?;
    cfg.apply_env_with(|k| env::var(k).ok());
    Ok(cfg)
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let txt = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let cfg: Config = toml::from_str(&txt)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(cfg)
}
