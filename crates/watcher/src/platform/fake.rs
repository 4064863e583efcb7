//! In-memory event source for deterministic tests

use super::{EventSource, SourceChannels, WatchEvent};
use crossbeam_channel::{unbounded, Sender};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Default)]
struct FakeState {
    watched: Vec<PathBuf>,
    unwatched: Vec<PathBuf>,
    fail_on: Option<PathBuf>,
}

/// Records subscriptions instead of touching the platform API
#[derive(Clone, Default)]
pub(crate) struct FakeSource {
    state: Arc<Mutex<FakeState>>,
}

/// Test-side senders feeding a [`FakeSource`]'s channels
pub(crate) struct FakeFeed {
    pub events: Sender<WatchEvent>,
    pub errors: Sender<notify::Error>,
}

impl FakeSource {
    pub fn new() -> (Self, SourceChannels, FakeFeed) {
        let (event_tx, events) = unbounded();
        let (error_tx, errors) = unbounded();
        (
            Self::default(),
            SourceChannels { events, errors },
            FakeFeed {
                events: event_tx,
                errors: error_tx,
            },
        )
    }

    /// Make every subscription of `path` fail
    pub fn fail_on(&self, path: impl Into<PathBuf>) {
        self.state.lock().fail_on = Some(path.into());
    }

    pub fn watched(&self) -> Vec<PathBuf> {
        self.state.lock().watched.clone()
    }

    pub fn unwatched(&self) -> Vec<PathBuf> {
        self.state.lock().unwatched.clone()
    }
}

impl EventSource for FakeSource {
    fn watch(&mut self, path: &Path) -> notify::Result<()> {
        let mut state = self.state.lock();
        if state.fail_on.as_deref() == Some(path) {
            return Err(notify::Error::generic("subscription refused").add_path(path.to_path_buf()));
        }
        state.watched.push(path.to_path_buf());
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) -> notify::Result<()> {
        let mut state = self.state.lock();
        if !state.watched.iter().any(|p| p == path) {
            return Err(notify::Error::watch_not_found().add_path(path.to_path_buf()));
        }
        state.unwatched.push(path.to_path_buf());
        Ok(())
    }
}
