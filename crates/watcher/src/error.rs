//! Error types for the watch engine

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by the watch engine
///
/// Only `SourceInit` and `Subscribe` raised during startup are fatal;
/// everything else is logged by the dispatch loop and monitoring continues.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The platform event source could not be created
    #[error("failed to create file watcher: {0}")]
    SourceInit(#[source] notify::Error),

    /// A path could not be subscribed with the event source
    #[error("failed to watch {}: {source}", path.display())]
    Subscribe {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// A subscription could not be cancelled
    #[error("failed to unwatch {}: {source}", path.display())]
    Unsubscribe {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// Runtime error reported by the event source
    #[error("event source error: {0}")]
    Source(#[from] notify::Error),

    /// The shell could not be started
    #[error("failed to spawn `{shell}`: {source}")]
    Spawn {
        shell: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran but exited unsuccessfully
    #[error("command exited with {status}")]
    CommandFailed { status: ExitStatus },

    /// The command exceeded its configured timeout and was killed
    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for watch engine operations
pub type Result<T> = std::result::Result<T, WatchError>;
