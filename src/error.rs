//! Error types for the batch-processing engine.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the persistent status store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An accessor was used outside the open/close window.
    #[error("store is not open")]
    NotOpen,

    /// The backing file exists but its content cannot be parsed.
    ///
    /// Surfaced at `open()`; the file is never deleted or recreated
    /// automatically.
    #[error("corrupt store file {path}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The in-memory map could not be serialized for flushing.
    #[error("failed to serialize store content")]
    Serialize(#[source] serde_json::Error),

    #[error("store I/O failure")]
    Io(#[from] std::io::Error),
}

/// Errors raised while setting up ambient infrastructure (logging).
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised by the directory walker.
#[derive(Debug, Error)]
pub enum WalkError {
    /// The walker root is not an existing directory.
    #[error("path '{0}' is not a directory")]
    NotADirectory(PathBuf),
}

/// Errors raised by the batch controller.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O failure")]
    Io(#[from] std::io::Error),

    /// A failure raised by the action callback itself.
    ///
    /// Propagated unchanged; the candidate's recorded status keeps its
    /// pre-call value.
    #[error(transparent)]
    Action(#[from] anyhow::Error),
}
