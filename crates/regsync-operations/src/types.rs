use std::fmt;

use regsync_registry::EntryId;
use serde::Serialize;

// ---- Sync ----

/// Which catalog entries a sync run covers.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub modules: bool,
    pub providers: bool,
    /// Only entries whose namespace starts with this prefix.
    pub namespace_prefix: Option<String>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            modules: true,
            providers: true,
            namespace_prefix: None,
        }
    }
}

/// What synchronizing one entry did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    /// The document was rewritten; `added` new versions were merged in.
    Updated { added: usize },
    /// The merged document is byte-identical to the one on disk.
    Unchanged,
    /// The releases feed showed nothing new, no full fetch was made.
    Skipped,
}

impl EntryOutcome {
    pub fn from_write(added: usize, written: bool) -> Self {
        if written {
            Self::Updated { added }
        } else {
            Self::Unchanged
        }
    }
}

/// Info about an entry that failed to synchronize.
#[derive(Debug, Clone, Serialize)]
pub struct FailedEntry {
    pub entry: String,
    pub error: String,
}

/// Report returned after a sync run completes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub attempted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: Vec<FailedEntry>,
}

impl SyncReport {
    pub fn record(&mut self, outcome: EntryOutcome) {
        match outcome {
            EntryOutcome::Updated { .. } => self.updated += 1,
            EntryOutcome::Unchanged => self.unchanged += 1,
            EntryOutcome::Skipped => self.skipped += 1,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

// ---- Verify key ----

/// The providers a key is checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyTarget {
    Provider { namespace: String, name: String },
    Namespace(String),
}

impl VerifyTarget {
    pub fn namespace(&self) -> &str {
        match self {
            Self::Provider { namespace, .. } => namespace,
            Self::Namespace(namespace) => namespace,
        }
    }
}

/// A provider version whose checksums the key signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyMatch {
    pub entry: String,
    pub version: String,
}

impl KeyMatch {
    pub fn new(entry: &EntryId, version: impl Into<String>) -> Self {
        Self {
            entry: entry.to_string(),
            version: version.into(),
        }
    }
}

impl fmt::Display for KeyMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.entry, self.version)
    }
}

/// Final verdict of a key scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum KeyVerdict {
    Verified { matches: Vec<KeyMatch> },
    NotVerified,
}

/// Everything a key scan observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub verdict: KeyVerdict,
    /// Versions whose signature check failed hard, e.g. tampered checksums.
    pub failures: Vec<String>,
    /// Versions never checked because a match had already been found.
    pub cancelled: usize,
    pub checked: usize,
}

impl ScanReport {
    pub fn is_verified(&self) -> bool {
        matches!(self.verdict, KeyVerdict::Verified { .. })
    }
}
