//! Error Types
//!
//! The main error type [`KeelError`] covers the failure modes observable by
//! the engine core: asset parsing, file I/O, resource-tree JSON, invariant
//! violations and arena exhaustion.
//!
//! All public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, KeelError>`. Worker tasks report failures through
//! this type; the scheduler logs them and poisons the frame fence so the host
//! can break the frame loop. Nothing is retried automatically.

use thiserror::Error;

/// The main error type for the Keel engine.
#[derive(Error, Debug)]
pub enum KeelError {
    // ========================================================================
    // Asset Loading Errors
    // ========================================================================
    /// Signature mismatch, truncated file or unsupported field value.
    #[error("Failed to parse asset \"{path}\": {reason}")]
    AssetParse {
        /// Relative path of the offending asset.
        path: String,
        /// What exactly went wrong.
        reason: String,
    },

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource-tree (JSON) parse error.
    #[error("Resource tree parse error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // Programmer Errors
    // ========================================================================
    /// Contract violation (duplicate child, missing joint, bad index).
    #[error("Invariant violation: {0}")]
    Invariant(String),

    /// The frame arena ran out of capacity. Arenas are sized at startup.
    #[error("Frame arena overflow: requested {requested} bytes, {remaining} remaining")]
    ArenaOverflow {
        /// Size of the failed allocation.
        requested: usize,
        /// Bytes left in the arena before the allocation.
        remaining: usize,
    },
}

impl KeelError {
    /// Shorthand for an [`KeelError::AssetParse`] with a formatted reason.
    #[must_use]
    pub fn asset(path: &str, reason: impl Into<String>) -> Self {
        KeelError::AssetParse {
            path: path.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Alias for `Result<T, KeelError>`.
pub type Result<T> = std::result::Result<T, KeelError>;
