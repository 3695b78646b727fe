use miette::Diagnostic;
use regsync_utils::error::{DurationError, UtilsError};
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(regsync_config::toml_deserialize),
        help("Check your config.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    #[diagnostic(code(regsync_config::toml_serialize))]
    TomlSerError(#[from] toml::ser::Error),

    #[error("Invalid value for `{field}`: {reason}")]
    #[diagnostic(
        code(regsync_config::invalid_value),
        help("Fix the value in your configuration file")
    )]
    InvalidValue { field: &'static str, reason: String },

    #[error("Error while {action}: {source}")]
    #[diagnostic(code(regsync_config::io))]
    IoError {
        action: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(code(regsync_config::utils))]
    Utils(#[from] UtilsError),
}

impl From<DurationError> for ConfigError {
    fn from(err: DurationError) -> Self {
        Self::Utils(UtilsError::Duration(err))
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

pub trait ErrorContext<T> {
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            ConfigError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::InvalidValue {
            field: "entry_concurrency",
            reason: "must be greater than zero".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for `entry_concurrency`: must be greater than zero"
        );

        let io: std::io::Result<()> = Err(std::io::Error::other("boom"));
        let err = io.with_context(|| "reading config".into()).unwrap_err();
        assert_eq!(err.to_string(), "Error while reading config: boom");
    }
}
