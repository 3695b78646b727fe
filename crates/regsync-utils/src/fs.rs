use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{FileSystemError, FileSystemResult};

/// Creates a directory structure if it doesn't exist.
///
/// If the directory already exists, this function does nothing. If the path exists but is
/// not a directory, this function returns an error.
///
/// # Errors
///
/// * [`FileSystemError::Directory`] if the directory could not be created.
/// * [`FileSystemError::NotADirectory`] if the path exists but is not a directory.
pub fn ensure_dir_exists<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    let path = path.as_ref();
    if !path.exists() {
        fs::create_dir_all(path).map_err(|err| FileSystemError::Directory {
            path: path.to_path_buf(),
            action: "create",
            source: err,
        })?;
    } else if !path.is_dir() {
        return Err(FileSystemError::NotADirectory {
            path: path.to_path_buf(),
        });
    }

    Ok(())
}

/// Reads and deserializes a JSON document.
///
/// # Errors
///
/// * [`FileSystemError::File`] if the file cannot be read.
/// * [`FileSystemError::Json`] if the content is not valid JSON for `T`.
pub fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> FileSystemResult<T> {
    let path = path.as_ref();
    let content = fs::read(path).map_err(|err| FileSystemError::File {
        path: path.to_path_buf(),
        action: "read",
        source: err,
    })?;

    serde_json::from_slice(&content).map_err(|err| FileSystemError::Json {
        path: path.to_path_buf(),
        action: "parse",
        source: err,
    })
}

/// Serializes `value` as JSON indented with two spaces.
pub fn to_pretty_json<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec_pretty(value)
}

/// Replaces the file at `path` with `content` unless it already holds exactly those bytes.
///
/// Parent directories are created as needed. The new content is written to a sibling
/// temporary file first and then renamed into place, so readers never observe a partial
/// document.
///
/// Returns `true` when the file was written and `false` when it was already up to date.
///
/// # Example
///
/// ```no_run
/// use regsync_utils::fs::write_if_changed;
///
/// let written = write_if_changed("/tmp/regsync/doc.json", b"{}").unwrap();
/// assert!(!write_if_changed("/tmp/regsync/doc.json", b"{}").unwrap() || !written);
/// ```
pub fn write_if_changed<P: AsRef<Path>>(path: P, content: &[u8]) -> FileSystemResult<bool> {
    let path = path.as_ref();

    if let Ok(existing) = fs::read(path) {
        if existing == content {
            return Ok(false);
        }
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir_exists(parent)?;
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!(".{file_name}.{}.tmp", std::process::id()));

    fs::write(&tmp_path, content).map_err(|err| FileSystemError::File {
        path: tmp_path.clone(),
        action: "write",
        source: err,
    })?;

    fs::rename(&tmp_path, path).map_err(|err| {
        let _ = fs::remove_file(&tmp_path);
        FileSystemError::File {
            path: path.to_path_buf(),
            action: "replace",
            source: err,
        }
    })?;

    Ok(true)
}

/// Recursively lists every regular file below `dir`, sorted by path.
///
/// A missing directory yields an empty list.
pub fn walk_files<P: AsRef<Path>>(dir: P) -> FileSystemResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut files = Vec::new();

    if !dir.exists() {
        return Ok(files);
    }

    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let entries = fs::read_dir(&current).map_err(|err| FileSystemError::Directory {
            path: current.clone(),
            action: "read",
            source: err,
        })?;

        for entry in entries {
            let entry = entry.map_err(|err| FileSystemError::Directory {
                path: current.clone(),
                action: "read",
                source: err,
            })?;
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}
