use std::{error::Error, fmt, path::PathBuf};

#[derive(Debug)]
pub enum DurationError {
    ParseFailed { input: String, reason: String },
}

impl fmt::Display for DurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DurationError::ParseFailed { input, reason } => {
                write!(f, "Failed to parse `{input}` as a duration: {reason}")
            }
        }
    }
}

impl Error for DurationError {}

#[derive(Debug)]
pub enum HashError {
    InvalidDigest { value: String, reason: String },
}

impl fmt::Display for HashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashError::InvalidDigest { value, reason } => {
                write!(f, "Invalid SHA-256 digest `{value}`: {reason}")
            }
        }
    }
}

impl Error for HashError {}

#[derive(Debug)]
pub enum FileSystemError {
    File {
        path: PathBuf,
        action: &'static str,
        source: std::io::Error,
    },

    Directory {
        path: PathBuf,
        action: &'static str,
        source: std::io::Error,
    },

    NotADirectory {
        path: PathBuf,
    },

    Json {
        path: PathBuf,
        action: &'static str,
        source: serde_json::Error,
    },
}

impl fmt::Display for FileSystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSystemError::File {
                path,
                action,
                source,
            } => {
                write!(f, "Failed to {action} file `{}`: {source}", path.display())
            }
            FileSystemError::Directory {
                path,
                action,
                source,
            } => {
                write!(
                    f,
                    "Failed to {action} directory `{}`: {source}",
                    path.display()
                )
            }
            FileSystemError::NotADirectory { path } => {
                write!(f, "`{}` is not a directory", path.display())
            }
            FileSystemError::Json {
                path,
                action,
                source,
            } => {
                write!(f, "Failed to {action} JSON `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for FileSystemError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FileSystemError::File { source, .. } => Some(source),
            FileSystemError::Directory { source, .. } => Some(source),
            FileSystemError::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum UtilsError {
    Duration(DurationError),
    Hash(HashError),
    FileSystem(FileSystemError),
}

impl fmt::Display for UtilsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UtilsError::Duration(err) => write!(f, "{err}"),
            UtilsError::Hash(err) => write!(f, "{err}"),
            UtilsError::FileSystem(err) => write!(f, "{err}"),
        }
    }
}

impl Error for UtilsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            UtilsError::Duration(err) => Some(err),
            UtilsError::Hash(err) => Some(err),
            UtilsError::FileSystem(err) => Some(err),
        }
    }
}

impl From<DurationError> for UtilsError {
    fn from(err: DurationError) -> Self {
        UtilsError::Duration(err)
    }
}

impl From<HashError> for UtilsError {
    fn from(err: HashError) -> Self {
        UtilsError::Hash(err)
    }
}

impl From<FileSystemError> for UtilsError {
    fn from(err: FileSystemError) -> Self {
        UtilsError::FileSystem(err)
    }
}

pub type DurationResult<T> = std::result::Result<T, DurationError>;
pub type FileSystemResult<T> = std::result::Result<T, FileSystemError>;
pub type HashResult<T> = std::result::Result<T, HashError>;

pub type UtilsResult<T> = std::result::Result<T, UtilsError>;
