//! Watch registry
//!
//! Authoritative set of watched paths with per-path debounce state. Owns
//! the event source so that subscriptions and bookkeeping never diverge.
//! A single lock covers:
//! - Subscribing and recording new paths
//! - Unsubscribing removed paths
//! - The debounce check-and-update for incoming events
//!
//! A path dropped and re-registered inside its debounce window (an
//! editor's rename-over save) keeps its last trigger time.

use crate::debounce::{DebounceGate, Decision};
use crate::error::{Result, WatchError};
use crate::platform::EventSource;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Why a path is being watched, which decides what events it answers for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchScope {
    /// Matched a pattern (or a recursive walk): answers for itself and
    /// its direct children
    Directory,
    /// A matched regular file: answers for exactly itself
    File,
    /// Containing directory of a watched file: answers only for
    /// directory-level events on itself
    Parent,
}

#[derive(Debug)]
struct Entry {
    scope: WatchScope,
    last_trigger: Option<Instant>,
}

struct Inner<S> {
    source: S,
    entries: HashMap<PathBuf, Entry>,
    /// Last trigger of recently dropped paths still inside the window
    recent: HashMap<PathBuf, Instant>,
}

/// Watched paths plus the event source they are subscribed with
pub struct WatchRegistry<S: EventSource> {
    inner: Mutex<Inner<S>>,
    gate: DebounceGate,
}

impl<S: EventSource> WatchRegistry<S> {
    pub fn new(source: S, window: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                source,
                entries: HashMap::new(),
                recent: HashMap::new(),
            }),
            gate: DebounceGate::new(window),
        }
    }

    /// Watch `path`, and its containing directory when it is a file
    ///
    /// Already-watched paths are left alone. Returns how many new
    /// subscriptions were made.
    pub fn register(&self, path: &Path) -> Result<usize> {
        let path = canonical(path);
        let mut inner = self.inner.lock();

        if is_dir(&path) {
            return self.insert(&mut inner, path, WatchScope::Directory);
        }

        if inner.entries.contains_key(&path) {
            debug!("Already watching {}", path.display());
            return Ok(0);
        }

        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf);

        let mut added = self.insert(&mut inner, path, WatchScope::File)?;
        if let Some(parent) = parent {
            added += self.insert(&mut inner, parent, WatchScope::Parent)?;
        }
        Ok(added)
    }

    fn insert(&self, inner: &mut Inner<S>, path: PathBuf, scope: WatchScope) -> Result<usize> {
        if let Some(entry) = inner.entries.get_mut(&path) {
            if entry.scope == WatchScope::Parent && scope == WatchScope::Directory {
                debug!("Widening {} to a directory watch", path.display());
                entry.scope = WatchScope::Directory;
            } else {
                debug!("Already watching {}", path.display());
            }
            return Ok(0);
        }

        debug!("Watching [{}]", path.display());
        inner
            .source
            .watch(&path)
            .map_err(|source| WatchError::Subscribe {
                path: path.clone(),
                source,
            })?;

        let seed = self.gate.seed(Instant::now());
        let last_trigger = match inner.recent.remove(&path) {
            Some(last) => seed.max(Some(last)),
            None => seed,
        };
        inner.entries.insert(path, Entry { scope, last_trigger });
        Ok(1)
    }

    /// Stop watching `path` and every watched path beneath it
    ///
    /// Cancellation failures are logged; the path is usually gone already.
    /// Returns how many entries were dropped.
    pub fn unregister(&self, path: &Path) -> usize {
        let path = lexical(path);
        let now = Instant::now();
        let window = self.gate.window();
        let mut inner = self.inner.lock();

        inner
            .recent
            .retain(|_, last| now.saturating_duration_since(*last) < window);

        let doomed: Vec<PathBuf> = inner
            .entries
            .keys()
            .filter(|watched| watched.starts_with(&path))
            .cloned()
            .collect();

        for watched in &doomed {
            let last = inner.entries.remove(watched).and_then(|e| e.last_trigger);
            if let Some(last) = last.filter(|t| now.saturating_duration_since(*t) < window) {
                inner.recent.insert(watched.clone(), last);
            }
            if let Err(source) = inner.source.unwatch(watched) {
                let e = WatchError::Unsubscribe {
                    path: watched.clone(),
                    source,
                };
                debug!("{}", e);
            } else {
                debug!("Stopped watching {}", watched.display());
            }
        }

        doomed.len()
    }

    /// Debounce an event for `path` observed at `now`
    ///
    /// The event is attributed to `path` itself when watched, otherwise
    /// to its parent when that parent is a [`WatchScope::Directory`].
    pub fn should_trigger(&self, path: &Path, now: Instant) -> Decision {
        let path = lexical(path);
        let mut inner = self.inner.lock();

        let Some(key) = attribute(&inner.entries, &path) else {
            debug!("Ignoring event for unwatched {}", path.display());
            return Decision::Untracked;
        };

        let Some(entry) = inner.entries.get_mut(&key) else {
            return Decision::Untracked;
        };

        let decision = self.gate.check(&mut entry.last_trigger, now);
        if let Decision::Suppress { remaining } = decision {
            debug!(
                "Suppressing {} ({} left in debounce window)",
                path.display(),
                humantime::format_duration(remaining)
            );
        }
        decision
    }

    /// Release every subscription
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        let paths: Vec<PathBuf> = inner.entries.drain().map(|(path, _)| path).collect();
        inner.recent.clear();

        for path in paths {
            if let Err(e) = inner.source.unwatch(&path) {
                debug!("Failed to unwatch {} on shutdown: {}", path.display(), e);
            }
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.inner.lock().entries.contains_key(&lexical(path))
    }

    pub fn scope(&self, path: &Path) -> Option<WatchScope> {
        self.inner.lock().entries.get(&lexical(path)).map(|e| e.scope)
    }

    /// Watched paths, sorted
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.inner.lock().entries.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn window(&self) -> Duration {
        self.gate.window()
    }
}

fn attribute(entries: &HashMap<PathBuf, Entry>, path: &Path) -> Option<PathBuf> {
    if entries.contains_key(path) {
        return Some(path.to_path_buf());
    }

    let parent = path.parent()?;
    match entries.get(parent) {
        Some(entry) if entry.scope == WatchScope::Directory => Some(parent.to_path_buf()),
        _ => None,
    }
}

/// Canonical form of an existing path, lexical form otherwise
fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| lexical(path))
}

/// Drop `.` components so `./a.txt` and `a.txt` share an entry
fn lexical(path: &Path) -> PathBuf {
    let cleaned: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    if cleaned.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        cleaned
    }
}

/// Stat failures count as "not a directory"
fn is_dir(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) => meta.is_dir(),
        Err(e) => {
            warn!("Unable to stat {}: {}", path.display(), e);
            false
        }
    }
}
