//! # Configuration
//!
//! The tracker is configured with one YAML file. Every field except the
//! school list and the admin table has a default, and a few deployment
//! settings can be overridden from the environment.
//!
//! ```yaml
//! schools:
//!   - School A
//!   - School B
//! admins:
//!   gholape: "$argon2id$v=19$m=19456,t=2,p=1$..."
//! storage:
//!   kind: csv
//! github_sync:
//!   repo: gholape/van-data
//!   branch: main
//!   path_prefix: data
//! ```

use argon2::password_hash::PasswordHash;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::storage::school_key;

pub const DATA_DIR_ENV: &str = "VAN_TRACKER_DATA_DIR";
pub const BIND_ENV: &str = "VAN_TRACKER_BIND";
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Which record store backs the tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageConfig {
    /// One directory of CSV files per school under `data_directory`
    #[default]
    Csv,
    /// Hosted realtime-database JSON tree
    RemoteTree {
        url: String,
        #[serde(default)]
        auth_token: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubSyncConfig {
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Falls back to `GITHUB_TOKEN`
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub path_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_data_directory")]
    pub data_directory: PathBuf,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Known schools; parent logins are matched in this order
    pub schools: Vec<String>,
    /// Admin username to Argon2 PHC hash
    pub admins: BTreeMap<String, String>,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default = "default_git_versioning")]
    pub git_versioning: bool,
    #[serde(default)]
    pub github_sync: Option<GithubSyncConfig>,
}

fn default_data_directory() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("School Van Tracker")
}

fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_git_versioning() -> bool {
    true
}

impl TrackerConfig {
    /// Read, override from the environment, and validate
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let yaml_content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml(&yaml_content)?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(yaml_content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml_content)?)
    }

    /// Apply environment overrides through `lookup` so tests need not touch the process env
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            self.data_directory = PathBuf::from(dir);
        }
        if let Some(bind) = lookup(BIND_ENV).filter(|v| !v.is_empty()) {
            self.bind_address = bind;
        }
        if let Some(sync) = self.github_sync.as_mut() {
            if sync.token.as_deref().map_or(true, str::is_empty) {
                sync.token = lookup(GITHUB_TOKEN_ENV).filter(|v| !v.is_empty());
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.schools.is_empty() {
            return Err(ConfigError::Invalid("at least one school is required".to_string()));
        }

        let mut seen = HashSet::new();
        for school in &self.schools {
            let key = school_key(school);
            if key.is_empty() {
                return Err(ConfigError::Invalid(format!("school name {:?} has no usable characters", school)));
            }
            if !seen.insert(key) {
                return Err(ConfigError::Invalid(format!("school {:?} is listed twice", school)));
            }
        }

        if self.admins.is_empty() {
            return Err(ConfigError::Invalid("at least one admin is required".to_string()));
        }
        for (username, phc_hash) in &self.admins {
            if PasswordHash::new(phc_hash).is_err() {
                return Err(ConfigError::Invalid(format!(
                    "password for admin {:?} is not a PHC hash; generate one with `van-tracker hash-password`",
                    username
                )));
            }
        }

        if let StorageConfig::RemoteTree { url, .. } = &self.storage {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!("remote tree url {:?} must be http(s)", url)));
            }
        }

        if let Some(sync) = &self.github_sync {
            if !sync.repo.contains('/') {
                return Err(ConfigError::Invalid(format!("github_sync.repo {:?} must be owner/name", sync.repo)));
            }
        }

        Ok(())
    }
}
