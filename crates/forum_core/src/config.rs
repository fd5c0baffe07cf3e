//! Runtime configuration for hosts embedding the forum core.

use crate::logging::default_log_level;
use serde::Deserialize;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "FORUM_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "FORUM_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "FORUM_LOG_DIR";

/// Store and logging settings.
///
/// `db_path = None` selects an in-memory store; `log_dir = None` leaves file
/// logging off.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ForumConfig {
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl ForumConfig {
    /// Reads `FORUM_DB_PATH`, `FORUM_LOG_LEVEL` and `FORUM_LOG_DIR`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup; blank values are unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();
        Self {
            db_path: read(DB_PATH_ENV).map(PathBuf::from),
            log_level: read(LOG_LEVEL_ENV).unwrap_or(defaults.log_level),
            log_dir: read(LOG_DIR_ENV).map(PathBuf::from),
        }
    }
}
