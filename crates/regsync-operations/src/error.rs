use miette::Diagnostic;
use regsync_config::error::ConfigError;
use regsync_registry::{error::RegistryError, EntryKind};
use regsync_remote::error::{ErrorKind, RemoteError};
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum OperationError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Remote(#[from] RemoteError),

    #[error("{entry}: {source}")]
    #[diagnostic(code(regsync_operations::entry))]
    Entry {
        entry: String,
        #[source]
        source: Box<OperationError>,
    },

    #[error("Could not parse key: {0}")]
    #[diagnostic(
        code(regsync_operations::key),
        help("Provide an ASCII-armored OpenPGP public key")
    )]
    InvalidKey(String),

    #[error("Could not parse signature: {0}")]
    #[diagnostic(code(regsync_operations::signature))]
    InvalidSignature(String),

    #[error("Error checking signature: {0}")]
    #[diagnostic(code(regsync_operations::bad_signature))]
    BadSignature(String),

    #[error(
        "there are no providers in namespace {0}; please submit at least one provider before \
         submitting a GPG key"
    )]
    #[diagnostic(code(regsync_operations::no_providers))]
    NoProviders(String),

    #[error("Invalid repository name: {0}")]
    #[diagnostic(
        code(regsync_operations::invalid_repository),
        help("Use owner/terraform-provider-<name> or owner/terraform-<target>-<name>")
    )]
    InvalidRepository(String),

    #[error("Repository already exists in the registry, {0}")]
    #[diagnostic(code(regsync_operations::already_exists))]
    AlreadyExists(String),

    #[error("No valid versions are detected for {kind} repository {repository}")]
    #[diagnostic(
        code(regsync_operations::no_versions),
        help("Check the repository's releases and their checksum files")
    )]
    NoVersions {
        kind: EntryKind,
        repository: String,
    },

    #[error("Task failed: {0}")]
    #[diagnostic(code(regsync_operations::task))]
    TaskFailed(String),

    #[error("Error while {action}: {source}")]
    #[diagnostic(code(regsync_operations::io))]
    IoError {
        action: String,
        source: std::io::Error,
    },

    #[error("{0}")]
    #[diagnostic(code(regsync_operations::custom))]
    Custom(String),
}

impl OperationError {
    /// Wraps `self` with the identity of the catalog entry it happened in.
    pub fn in_entry(self, entry: impl ToString) -> Self {
        Self::Entry {
            entry: entry.to_string(),
            source: Box::new(self),
        }
    }

    /// Classification of the underlying remote failure, if any.
    pub fn remote_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Remote(err) => Some(err.kind()),
            Self::Entry { source, .. } => source.remote_kind(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, OperationError>;

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
            OperationError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}
