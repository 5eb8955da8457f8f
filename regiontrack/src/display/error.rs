//! Display error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DisplayError {
    /// Writing a frame or status file failed.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The loading sequence file is missing or unreadable.
    #[error("loading sequence {path} unavailable: {source}")]
    LoadingSequence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The display was already closed.
    #[error("display is closed")]
    Closed,
}
