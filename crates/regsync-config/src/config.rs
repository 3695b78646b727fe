use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use regsync_utils::{
    path::{expand_home, xdg_config_home},
    time::parse_duration,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{ConfigError, ErrorContext, Result},
    throttle::ThrottleSettings,
};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "REGSYNC_CONFIG";

/// Application's configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Root of the persisted module documents.
    /// Default: modules
    pub modules_dir: String,

    /// Root of the persisted provider documents.
    /// Default: providers
    pub providers_dir: String,

    /// Root of the per-namespace signing key files.
    /// Default: keys
    pub keys_dir: String,

    /// Optional blacklist document. A missing file is an empty blacklist.
    pub blacklist_path: Option<String>,

    /// Environment variable holding the GitHub bearer token.
    /// Default: GH_TOKEN
    pub token_env: String,

    /// User agent sent with every request.
    /// Default: regsync/<version>
    pub user_agent: Option<String>,

    /// Per-request timeout.
    /// Default: 30s
    pub request_timeout: String,

    /// Number of catalog entries synchronized at once.
    /// Default: 20
    pub entry_concurrency: usize,

    /// Number of versions resolved or scanned at once within one entry.
    /// Default: 10
    pub version_concurrency: usize,

    /// Attempts made for a release asset download before giving up.
    /// Default: 10
    pub asset_retry_attempts: u32,

    /// Delay before the first asset download retry; doubled on each attempt.
    /// Default: 1s
    pub asset_retry_base_delay: String,

    /// Check the release feed before a full provider fetch.
    /// Default: true
    pub feed_shortcut: bool,

    /// Call-class throttles.
    pub throttle: ThrottleSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            modules_dir: "modules".into(),
            providers_dir: "providers".into(),
            keys_dir: "keys".into(),
            blacklist_path: None,
            token_env: "GH_TOKEN".into(),
            user_agent: None,
            request_timeout: "30s".into(),
            entry_concurrency: 20,
            version_concurrency: 10,
            asset_retry_attempts: 10,
            asset_retry_base_delay: "1s".into(),
            feed_shortcut: true,
            throttle: ThrottleSettings::default(),
        }
    }
}

/// Picks the configuration file: an explicit path first, then `REGSYNC_CONFIG`, then
/// `$XDG_CONFIG_HOME/regsync/config.toml`.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match std::env::var(CONFIG_ENV) {
        Ok(path_str) if !path_str.is_empty() => expand_home(&path_str),
        _ => xdg_config_home().join("regsync").join("config.toml"),
    }
}

impl Config {
    /// Loads and validates the configuration. A missing file yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = config_path(explicit);

        if explicit.is_none() && !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("entry_concurrency", self.entry_concurrency),
            ("version_concurrency", self.version_concurrency),
            ("asset_retry_attempts", self.asset_retry_attempts as usize),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be greater than zero".into(),
                });
            }
        }
        if self.token_env.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "token_env",
                reason: "must name an environment variable".into(),
            });
        }

        self.request_timeout()?;
        self.asset_retry_base_delay()?;
        self.throttle.validate()
    }

    pub fn request_timeout(&self) -> Result<Duration> {
        Ok(parse_duration(&self.request_timeout)?)
    }

    pub fn asset_retry_base_delay(&self) -> Result<Duration> {
        Ok(parse_duration(&self.asset_retry_base_delay)?)
    }

    pub fn modules_path(&self) -> PathBuf {
        expand_home(&self.modules_dir)
    }

    pub fn providers_path(&self) -> PathBuf {
        expand_home(&self.providers_dir)
    }

    pub fn keys_path(&self) -> PathBuf {
        expand_home(&self.keys_dir)
    }

    pub fn blacklist_path(&self) -> Option<PathBuf> {
        self.blacklist_path.as_deref().map(expand_home)
    }

    /// Reads the bearer token from the configured environment variable.
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
    }

    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("regsync/{}", env!("CARGO_PKG_VERSION")))
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
