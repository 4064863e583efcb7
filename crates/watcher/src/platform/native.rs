//! `notify`-backed event source

use super::{EventKind, EventSource, SourceChannels, WatchEvent};
use crate::error::{Result, WatchError};
use crossbeam_channel::{bounded, TrySendError};
use notify::event::{ModifyKind, RenameMode};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use tracing::warn;

/// Events buffered between the platform watcher and the dispatch loop.
/// While a command runs nothing drains the buffer; overflow is dropped.
pub const EVENT_BUFFER: usize = 4096;

/// Event source using the platform's recommended `notify` backend
pub struct NotifySource {
    watcher: RecommendedWatcher,
}

impl NotifySource {
    /// Create the platform watcher and its event/error channels
    pub fn new() -> Result<(Self, SourceChannels)> {
        let (event_tx, events) = bounded(EVENT_BUFFER);
        let (error_tx, errors) = bounded(EVENT_BUFFER);

        let watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => {
                    for change in classify(&event) {
                        match event_tx.try_send(change) {
                            Ok(()) => {}
                            Err(TrySendError::Full(dropped)) => {
                                warn!(
                                    "Event buffer full, dropping event for {}",
                                    dropped.path.display()
                                );
                            }
                            Err(TrySendError::Disconnected(_)) => return,
                        }
                    }
                }
                Err(e) => {
                    if let Err(TrySendError::Full(e)) = error_tx.try_send(e) {
                        warn!("Error buffer full, dropping: {}", e);
                    }
                }
            }
        })
        .map_err(WatchError::SourceInit)?;

        Ok((Self { watcher }, SourceChannels { events, errors }))
    }
}

impl EventSource for NotifySource {
    fn watch(&mut self, path: &Path) -> notify::Result<()> {
        self.watcher.watch(path, RecursiveMode::NonRecursive)
    }

    fn unwatch(&mut self, path: &Path) -> notify::Result<()> {
        self.watcher.unwatch(path)
    }
}

/// Map a raw `notify` event onto zero or more [`WatchEvent`]s
///
/// Access notifications and unclassifiable events are dropped.
pub fn classify(event: &notify::Event) -> Vec<WatchEvent> {
    use notify::EventKind as Raw;

    let kind = match event.kind {
        Raw::Create(_) => EventKind::Create,
        Raw::Remove(_) => EventKind::Remove,
        Raw::Modify(ModifyKind::Metadata(_)) => EventKind::Metadata,
        Raw::Modify(ModifyKind::Name(RenameMode::To)) => EventKind::Create,
        Raw::Modify(ModifyKind::Name(RenameMode::Both)) => {
            // paths[0] is the old name, paths[1] the new one
            let mut changes = Vec::with_capacity(2);
            if let Some(from) = event.paths.first() {
                changes.push(WatchEvent::new(from.clone(), EventKind::Rename));
            }
            if let Some(to) = event.paths.get(1) {
                changes.push(WatchEvent::new(to.clone(), EventKind::Create));
            }
            return changes;
        }
        Raw::Modify(ModifyKind::Name(_)) => EventKind::Rename,
        Raw::Modify(_) => EventKind::Modify,
        Raw::Access(_) | Raw::Any | Raw::Other => return Vec::new(),
    };

    event
        .paths
        .iter()
        .map(|path| WatchEvent::new(path.clone(), kind))
        .collect()
}
