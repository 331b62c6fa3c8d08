//! bbupdate - Broadband Provider Coverage Dataset Updater
//!
//! Refreshes one provider's coverage features across two destination layers
//! (UBB and SGID), archiving the superseded features with round and tier
//! metadata first.
//!
//! # Architecture
//!
//! - [`store`]: the feature-storage capability (the GIS backend seam) and an
//!   in-memory, JSON-file-backed implementation
//! - [`workflow`]: the linear update pass: validate provider, assign
//!   identifiers, archive, replace in each destination
//! - [`cli`]: the operator-facing command surface

pub mod cli;
pub mod error;
pub mod store;
pub mod workflow;

pub use error::{Result, UpdateError};
pub use store::{FeatureStore, Workspace};
pub use workflow::{run, ArchiveMode, UpdateParams, UpdateReport};
