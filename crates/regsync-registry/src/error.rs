//! Error types for the registry crate.

use std::path::PathBuf;

use miette::Diagnostic;
use regsync_utils::error::{FileSystemError, HashError};
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum RegistryError {
    #[error("Error while {action}: {source}")]
    #[diagnostic(code(regsync_registry::io))]
    IoError {
        action: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    #[diagnostic(code(regsync_registry::fs))]
    FileSystem(#[from] FileSystemError),

    #[error("Failed to serialize {path}: {source}")]
    #[diagnostic(code(regsync_registry::serialize))]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to parse blacklist {path}: {source}")]
    #[diagnostic(
        code(regsync_registry::blacklist),
        help("The blacklist must be a JSON object with `providers` and `modules` arrays")
    )]
    Blacklist {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{release}: missing checksums artifact {asset}")]
    #[diagnostic(
        code(regsync_registry::missing_checksums),
        help("Provider releases must publish a SHA256SUMS file")
    )]
    MissingChecksums { release: String, asset: String },

    #[error("{release}: missing checksums signature artifact {asset}")]
    #[diagnostic(
        code(regsync_registry::missing_checksums_signature),
        help("Provider releases must publish a detached signature of the SHA256SUMS file")
    )]
    MissingChecksumsSignature { release: String, asset: String },

    #[error("{release}: checksums file has no digest for {filename}")]
    #[diagnostic(code(regsync_registry::missing_digest))]
    MissingDigest { release: String, filename: String },

    #[error("{release}: checksums artifact {url} could not be downloaded")]
    #[diagnostic(code(regsync_registry::checksums_unavailable))]
    ChecksumsUnavailable { release: String, url: String },

    #[error("Invalid checksums file on line {line}: {source}")]
    #[diagnostic(code(regsync_registry::invalid_checksums))]
    InvalidChecksums { line: usize, source: HashError },

    #[error("Invalid catalog path: {0}")]
    #[diagnostic(code(regsync_registry::invalid_path))]
    InvalidPath(String),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Extension trait for adding context to I/O errors.
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
            RegistryError::IoError {
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
        let err = RegistryError::MissingChecksums {
            release: "acme/acme 1.0.0".into(),
            asset: "terraform-provider-acme_1.0.0_SHA256SUMS".into(),
        };
        assert_eq!(
            err.to_string(),
            "acme/acme 1.0.0: missing checksums artifact terraform-provider-acme_1.0.0_SHA256SUMS"
        );

        let err = RegistryError::InvalidPath("x/y".into());
        assert_eq!(err.to_string(), "Invalid catalog path: x/y");
    }

    #[test]
    fn test_with_context() {
        let io: std::io::Result<()> = Err(std::io::Error::other("denied"));
        let err = io.with_context(|| "reading blacklist".into()).unwrap_err();
        assert_eq!(err.to_string(), "Error while reading blacklist: denied");
    }
}
