//! Reconciliation error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the reconciliation engine
#[derive(Debug, Error)]
pub enum SyncError {
    /// App Store Connect call failed
    #[error(transparent)]
    Api(#[from] gantry_asc::AscError),

    /// Failure attributed to one declared entity
    #[error("{kind} '{key}': {source}")]
    Entity {
        kind: &'static str,
        key: String,
        #[source]
        source: Box<SyncError>,
    },

    /// Local asset file could not be read
    #[error("asset {path}: {source}")]
    AssetIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Upload instruction referenced bytes outside the file
    #[error("upload part out of range: offset {offset} length {length} but file is {size} bytes")]
    PartOutOfRange { offset: u64, length: u64, size: u64 },

    /// A spawned task panicked
    #[error("task panicked: {0}")]
    TaskPanicked(String),
}

impl SyncError {
    /// Attribute an error to the entity being reconciled
    pub fn entity(kind: &'static str, key: impl Into<String>, source: SyncError) -> Self {
        Self::Entity {
            kind,
            key: key.into(),
            source: Box::new(source),
        }
    }
}

/// Result type for reconciliation operations
pub type Result<T> = std::result::Result<T, SyncError>;
