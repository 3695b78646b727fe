use std::{
    fmt::Display,
    sync::{LazyLock, PoisonError, RwLock},
};

use nu_ansi_term::Color;
use regsync_operations::{error::ErrorContext, OperationError, Result};
use serde::Serialize;

pub static COLOR: LazyLock<RwLock<bool>> = LazyLock::new(|| RwLock::new(true));

pub struct Colored<T: Display>(pub Color, pub T);

impl<T: Display> Display for Colored<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let color = COLOR.read().unwrap_or_else(PoisonError::into_inner);
        if *color {
            write!(f, "{}", self.0.prefix())?;
            self.1.fmt(f)?;
            write!(f, "{}", self.0.suffix())
        } else {
            self.1.fmt(f)
        }
    }
}

pub fn disable_color() {
    *COLOR.write().unwrap_or_else(PoisonError::into_inner) = false;
}

/// Prints `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|err| OperationError::Custom(format!("serializing output: {err}")))?;
    println!("{out}");
    Ok(())
}

pub fn write_file(path: &std::path::Path, content: &str) -> Result<()> {
    std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))
}
