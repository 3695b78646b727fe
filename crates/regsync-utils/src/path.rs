use std::{env, path::PathBuf};

/// Returns the user's home directory from `HOME`, falling back to `/`.
pub fn home_dir() -> PathBuf {
    env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

/// Returns `$XDG_CONFIG_HOME`, or `$HOME/.config` when unset.
pub fn xdg_config_home() -> PathBuf {
    env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Expands a leading `~` to the home directory.
///
/// # Example
///
/// ```
/// use regsync_utils::path::expand_home;
///
/// assert_eq!(expand_home("data/providers").to_str(), Some("data/providers"));
/// ```
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        return home_dir();
    }
    match path.strip_prefix("~/") {
        Some(rest) => home_dir().join(rest),
        None => PathBuf::from(path),
    }
}
