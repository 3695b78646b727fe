use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Rate and concurrency limits for one class of remote call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CallClassSettings {
    /// Minimum spacing between two calls of this class, in milliseconds.
    pub min_interval_ms: u64,

    /// Maximum number of calls of this class in flight at once.
    pub max_concurrent: usize,
}

impl CallClassSettings {
    pub const fn new(min_interval_ms: u64, max_concurrent: usize) -> Self {
        Self {
            min_interval_ms,
            max_concurrent,
        }
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

/// Per call-class throttle configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ThrottleSettings {
    /// Tag enumeration over the git smart-HTTP protocol.
    pub cli: CallClassSettings,

    /// GraphQL and REST API calls.
    pub api: CallClassSettings,

    /// Release asset downloads.
    pub asset: CallClassSettings,

    /// Release feed polling.
    pub feed: CallClassSettings,
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        Self {
            cli: CallClassSettings::new(16, 60),
            api: CallClassSettings::new(1000, 3),
            asset: CallClassSettings::new(16, 30),
            feed: CallClassSettings::new(33, 30),
        }
    }
}

impl ThrottleSettings {
    pub fn validate(&self) -> Result<()> {
        for (field, class) in [
            ("throttle.cli.max_concurrent", &self.cli),
            ("throttle.api.max_concurrent", &self.api),
            ("throttle.asset.max_concurrent", &self.asset),
            ("throttle.feed.max_concurrent", &self.feed),
        ] {
            if class.max_concurrent == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be greater than zero".into(),
                });
            }
        }
        Ok(())
    }
}
