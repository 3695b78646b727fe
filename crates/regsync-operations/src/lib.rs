//! Synchronization and key verification workflows.
//!
//! Operations take a [`RegsyncContext`] holding the settings, the remote source and the
//! blacklist, and fan their work out through [`parallel::run_all`].

pub mod add;
pub mod cancel;
pub mod context;
pub mod error;
pub mod gpg;
pub mod module;
pub mod parallel;
pub mod provider;
pub mod sync;
pub mod types;
pub mod validate;
pub mod verification;
pub mod verify_key;

#[cfg(test)]
pub mod test_utils;

pub use context::{RegsyncContext, Settings};
pub use error::{OperationError, Result};
pub use types::*;
