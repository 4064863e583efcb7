//! Event source seam
//!
//! The engine never talks to the platform notification API directly. It
//! subscribes paths through [`EventSource`] and consumes two streams:
//! classified [`WatchEvent`]s and raw source errors.

mod native;

#[cfg(test)]
pub(crate) mod fake;

pub use native::{classify, NotifySource, EVENT_BUFFER};

use crossbeam_channel::Receiver;
use std::path::{Path, PathBuf};

/// Subscription handle onto a platform change-notification facility
///
/// Subscriptions are non-recursive: the registry subscribes each
/// directory of a tree on its own.
pub trait EventSource: Send {
    /// Start delivering events for `path`
    fn watch(&mut self, path: &Path) -> notify::Result<()>;

    /// Stop delivering events for `path`
    fn unwatch(&mut self, path: &Path) -> notify::Result<()>;
}

/// Receiving ends of an event source
pub struct SourceChannels {
    /// Classified change notifications
    pub events: Receiver<WatchEvent>,
    /// Errors reported by the source itself
    pub errors: Receiver<notify::Error>,
}

/// File system event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    /// Path that changed
    pub path: PathBuf,
    /// Type of change
    pub kind: EventKind,
}

impl WatchEvent {
    pub fn new(path: impl Into<PathBuf>, kind: EventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Type of file system event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// File or directory created (or renamed into place)
    Create,
    /// Contents written
    Modify,
    /// Attributes or timestamps changed
    Metadata,
    /// File or directory deleted
    Remove,
    /// File or directory renamed away
    Rename,
}

impl EventKind {
    /// True when the path no longer exists after this event
    pub fn is_removal(self) -> bool {
        matches!(self, EventKind::Remove | EventKind::Rename)
    }
}
