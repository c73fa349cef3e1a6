//! Board configuration.
//!
//! Read once at startup from `$HOME/.taskboard/config.toml` (or `--config`). A
//! missing file yields the defaults; command-line flags override file values.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::fields::WeekStart;
use crate::project::ProjectId;
use crate::user::UserId;

/// Settings that shape a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// User recorded as author of comments and actor of activity.
    pub current_user: UserId,
    /// First day of the timeline window.
    pub week_start: WeekStart,
    /// JSON seed file; the built-in demo data is used when absent.
    pub seed: Option<PathBuf>,
    /// Log destination for the interactive board, which owns the terminal.
    pub log_file: Option<PathBuf>,
    /// Project the board opens filtered to.
    pub default_project: Option<ProjectId>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            current_user: UserId(1),
            week_start: WeekStart::Sunday,
            seed: None,
            log_file: None,
            default_project: None,
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path(),
        };
        if !path.exists() {
            return Ok(Config::default());
        }
        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
    }
}

/// Directory holding the config file: `$HOME/.taskboard`, or `./.taskboard` without `HOME`.
pub fn config_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".taskboard")
}

pub fn default_config_path() -> PathBuf {
    config_dir().join("config.toml")
}
