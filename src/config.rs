//! TOML configuration parsing and validation.
//!
//! Every section has defaults, so a missing config file yields a usable
//! [`Config`]. A file that exists but cannot be parsed or validated is an
//! error.
//!
//! ```toml
//! [db]
//! path = "./data/xka.sqlite"
//!
//! [source]
//! base_url = "https://xkcd.com"
//! user_agent = "XKCD-archive Crawler/1.0.0"
//! concurrency = 4
//! max_records = 0          # 0 = unbounded
//! window = "first-missing" # or "after-highest"
//!
//! [search]
//! min_score = 0.0
//! limit = 10
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/xka.sqlite")
}

/// Which candidate IDs a bounded refresh considers first.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Window {
    /// The lowest missing IDs, counting up from 1.
    #[default]
    FirstMissing,
    /// Only IDs above the highest one already stored.
    AfterHighest,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Maximum number of items fetched in one refresh; 0 means unbounded.
    #[serde(default)]
    pub max_records: usize,
    #[serde(default)]
    pub window: Window,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            concurrency: default_concurrency(),
            max_records: 0,
            window: Window::default(),
        }
    }
}

fn default_base_url() -> String {
    crate::models::DEFAULT_SITE.to_string()
}
fn default_user_agent() -> String {
    "XKCD-archive Crawler/1.0.0".to_string()
}
fn default_concurrency() -> usize {
    1
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default)]
    pub min_score: f64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_score: 0.0,
            limit: default_limit(),
        }
    }
}

fn default_limit() -> i64 {
    10
}

impl Config {
    /// Check the invariants the rest of the crate relies on.
    pub fn validate(&self) -> Result<()> {
        if self.source.concurrency == 0 {
            anyhow::bail!("source.concurrency must be >= 1");
        }
        if self.source.base_url.trim().is_empty() {
            anyhow::bail!("source.base_url must not be empty");
        }
        if self.search.min_score < 0.0 || self.search.min_score.is_nan() {
            anyhow::bail!("search.min_score must be >= 0");
        }
        if self.search.limit < 1 {
            anyhow::bail!("search.limit must be >= 1");
        }
        Ok(())
    }
}

/// Load the config file at `path`, falling back to defaults when it does not exist.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}
