//! Configuration loading and management.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use chrono::format::{Item, StrftimeItems};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use tally_core::EngineConfig;

/// Default `created_with` value for entries recorded from the command line.
pub const DEFAULT_CREATED_WITH: &str = "tally-cli";

/// Application configuration.
///
/// `user_id` and `workspace_id` are the owner defaults applied to every
/// command; `date_format` is a chrono strftime pattern for human output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,
    /// Owner of entries created and listed by the CLI.
    pub user_id: Option<String>,
    /// Workspace used when a command does not name one.
    pub workspace_id: Option<String>,
    /// Client label stored on new entries.
    pub created_with: String,
    /// strftime pattern for timestamps in human output.
    pub date_format: String,
    /// Engine policy switches.
    pub engine: EngineConfig,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("tally.db"),
            user_id: None,
            workspace_id: None,
            created_with: DEFAULT_CREATED_WITH.to_string(),
            date_format: "%Y-%m-%d %H:%M".to_string(),
            engine: EngineConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Later sources win: defaults, the user config file, `config_path`, then
    /// `TALLY_*` environment variables (`__` separates nested keys, as in
    /// `TALLY_ENGINE__RESYNC_ON_EDIT`).
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("TALLY_").split("__"));

        figment.extract()
    }

    /// Checks values that deserialization alone cannot.
    pub fn validate(&self) -> Result<()> {
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            bail!("invalid date_format: {:?}", self.date_format);
        }
        if self.created_with.trim().is_empty() {
            bail!("created_with cannot be empty");
        }
        Ok(())
    }

    /// The configured owner, required by every entry command.
    pub fn owner(&self) -> Result<&str> {
        match self.user_id.as_deref().map(str::trim) {
            Some(owner) if !owner.is_empty() => Ok(owner),
            _ => bail!("user_id is not configured (set it in config.toml or TALLY_USER_ID)"),
        }
    }
}

/// Returns the platform-specific config directory for tally.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tally"))
}

/// Returns the platform-specific data directory for tally.
///
/// On Linux: `~/.local/share/tally`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("tally"))
}
