//! Configuration and profile management
//!
//! Credentials and endpoints live in a TOML file with named profiles:
//!
//! ```toml
//! default_profile = "prod"
//!
//! [profiles.prod]
//! api_url = "https://api.meridian.dev"
//! api_key = "${MERIDIAN_API_KEY}"
//! api_secret = "${MERIDIAN_API_SECRET}"
//!
//! [profiles.staging]
//! api_url = "https://api.staging.meridian.dev"
//! api_key = "k"
//! api_secret = "s"
//! [profiles.staging.retry]
//! max_attempts = 5
//! ```
//!
//! Values support `${VAR}` environment expansion so secrets can stay out
//! of the file. `MERIDIAN_API_URL` / `MERIDIAN_API_KEY` /
//! `MERIDIAN_API_SECRET` form a file-less fallback profile.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use meridian_cloud::{CloudClient, RetryConfig};

/// Environment variable naming the API endpoint
pub const ENV_API_URL: &str = "MERIDIAN_API_URL";
/// Environment variable naming the API key
pub const ENV_API_KEY: &str = "MERIDIAN_API_KEY";
/// Environment variable naming the API secret
pub const ENV_API_SECRET: &str = "MERIDIAN_API_SECRET";

const DEFAULT_API_URL: &str = "https://api.meridian.dev";

/// Errors that can occur during configuration operations
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load config from {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("no profile selected and no default_profile configured")]
    NoDefaultProfile,

    #[error("environment variable expansion failed: {0}")]
    EnvExpansion(String),

    #[error("failed to determine config directory")]
    ConfigDir,

    #[error("invalid profile: {0}")]
    InvalidProfile(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    /// Profile used when none is named explicitly
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    /// Map of profile name -> profile configuration
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// One named connection profile
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Profile {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    pub api_key: String,
    pub api_secret: String,
    /// Transport retry overrides for this profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryConfig>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl Config {
    /// Platform-specific path of the config file
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "meridian", "meridian").ok_or(ConfigError::ConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Load the config from the default location. A missing file is an
    /// empty config, not an error.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(&path)
    }

    /// Load the config from an explicit path
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Load {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Look up a profile by name, falling back to `default_profile`.
    ///
    /// Values are environment-expanded on the way out, so the stored
    /// config can reference `${VAR}` without the caller caring.
    pub fn profile(&self, name: Option<&str>) -> Result<Profile> {
        let name = match name.or(self.default_profile.as_deref()) {
            Some(name) => name,
            None => return Err(ConfigError::NoDefaultProfile),
        };
        let profile = self
            .profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.to_string(),
            })?;
        profile.expanded()
    }
}

impl Profile {
    /// Build a profile from `MERIDIAN_*` environment variables.
    ///
    /// Returns `None` unless both key and secret are present; the URL
    /// falls back to the public endpoint.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var(ENV_API_KEY).ok()?;
        let api_secret = std::env::var(ENV_API_SECRET).ok()?;
        Some(Self {
            api_url: std::env::var(ENV_API_URL).unwrap_or_else(|_| default_api_url()),
            api_key,
            api_secret,
            retry: None,
        })
    }

    /// Build an API client from this profile
    pub fn client(&self) -> Result<CloudClient> {
        CloudClient::builder()
            .base_url(&self.api_url)
            .api_key(&self.api_key)
            .api_secret(&self.api_secret)
            .retry(self.retry.clone().unwrap_or_default())
            .build()
            .map_err(|e| ConfigError::InvalidProfile(e.to_string()))
    }

    /// Expand `${VAR}` references in every value
    fn expanded(&self) -> Result<Self> {
        Ok(Self {
            api_url: expand(&self.api_url)?,
            api_key: expand(&self.api_key)?,
            api_secret: expand(&self.api_secret)?,
            retry: self.retry.clone(),
        })
    }
}

fn expand(value: &str) -> Result<String> {
    shellexpand::env(value)
        .map(|v| v.into_owned())
        .map_err(|e| ConfigError::EnvExpansion(e.to_string()))
}
