use miette::Diagnostic;
use thiserror::Error;

/// Coarse classification of a remote failure, decided where the failure is first seen.
///
/// Retry decisions look only at the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Timeouts, dropped connections, rate limiting and server errors.
    Transient,
    /// The requested resource does not exist.
    NotFound,
    /// The remote answered with something that could not be understood.
    Invalid,
    /// Anything else; never retried.
    Fatal,
}

#[derive(Error, Diagnostic, Debug)]
pub enum RemoteError {
    #[error("Request to {url} failed: {source}")]
    #[diagnostic(
        code(regsync_remote::network),
        help("Check your internet connection or try again later")
    )]
    Network {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("HTTP {status}: {url}")]
    #[diagnostic(code(regsync_remote::http_error))]
    HttpError { status: u16, url: String },

    #[error("Invalid response from {url}: {reason}")]
    #[diagnostic(code(regsync_remote::invalid_response))]
    InvalidResponse { url: String, reason: String },

    #[error("GraphQL query for {repository} failed: {}", .messages.join("; "))]
    #[diagnostic(
        code(regsync_remote::graphql),
        help("Check that the repository exists and the token has access to it")
    )]
    GraphQl {
        repository: String,
        messages: Vec<String>,
    },

    #[error("Invalid repository reference: {0}")]
    #[diagnostic(
        code(regsync_remote::invalid_repository),
        help("Use `owner/name` or a https://github.com/owner/name URL")
    )]
    InvalidRepository(String),

    #[error("Gave up on {url} after {attempts} attempts: {last}")]
    #[diagnostic(code(regsync_remote::retries_exhausted))]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last: String,
    },

    #[error("Background request task failed: {0}")]
    #[diagnostic(code(regsync_remote::task))]
    TaskFailed(String),
}

impl RemoteError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { source, .. } => {
                match source.as_ref() {
                    ureq::Error::Timeout(_)
                    | ureq::Error::Io(_)
                    | ureq::Error::ConnectionFailed => ErrorKind::Transient,
                    _ => ErrorKind::Fatal,
                }
            }
            Self::HttpError { status, .. } => status_kind(*status),
            Self::InvalidResponse { .. } | Self::InvalidRepository(_) => ErrorKind::Invalid,
            Self::RetriesExhausted { .. } => ErrorKind::Transient,
            Self::GraphQl { .. } | Self::TaskFailed(_) => ErrorKind::Fatal,
        }
    }

    pub fn network(url: impl Into<String>, source: ureq::Error) -> Self {
        Self::Network {
            url: url.into(),
            source: Box::new(source),
        }
    }

    pub fn invalid(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Maps an HTTP status to its error kind. 403 counts as transient since GitHub uses it for
/// secondary rate limits.
pub fn status_kind(status: u16) -> ErrorKind {
    match status {
        404 | 410 => ErrorKind::NotFound,
        403 | 408 | 429 => ErrorKind::Transient,
        500..=599 => ErrorKind::Transient,
        _ => ErrorKind::Fatal,
    }
}

pub type Result<T> = std::result::Result<T, RemoteError>;
