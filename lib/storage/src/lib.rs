//! Versioned artifact storage for mangarec.
//!
//! Artifacts live under `<root>/<status>/<version>/<name>`, gzip-compressed,
//! each with a SHA-256 sidecar. Readers always pick the newest version.

pub mod store;
pub mod artifacts;

pub use store::{new_version, parse_version, ArtifactDescription, ArtifactStatus, ArtifactStore};
pub use artifacts::{
    Versioned, EXCLUSIONS_FILE, FEATURES_FILE, INTERACTIONS_FILE, METADATA_FILE, SIMILARITY_FILE,
};
