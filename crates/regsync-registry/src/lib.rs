//! Catalog data model for the regsync registry synchronizer.
//!
//! This crate owns everything about catalog documents that does not touch the network:
//!
//! - **Catalog**: entry identities, version records and target artifacts
//! - **Storage**: shard paths, discovery, document read and replace
//! - **Merge**: semantic version filtering, deduplication, blacklist suppression and ordering
//! - **Artifacts**: release asset conventions, checksums files and provider manifests
//! - **Validation**: invariant checks over persisted documents
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use regsync_registry::{blacklist::Blacklist, storage};
//!
//! fn list(root: &Path) -> regsync_registry::Result<()> {
//!     let blacklist = Blacklist::load(Some(Path::new("versions_blacklist.json")))?;
//!     for id in storage::discover_providers(root, None)? {
//!         let doc = storage::load_document(root, &id)?;
//!         println!("{id}: {} versions", doc.versions.len());
//!     }
//!     let _ = blacklist;
//!     Ok(())
//! }
//! ```

pub mod artifacts;
pub mod blacklist;
pub mod catalog;
pub mod checksums;
pub mod error;
pub mod manifest;
pub mod merge;
pub mod storage;
pub mod validate;
pub mod version;

pub use catalog::{CatalogDocument, EntryId, EntryKind, TargetArtifact, VersionRecord};
pub use error::{ErrorContext, RegistryError, Result};
