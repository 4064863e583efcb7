//! Watch engine and event dispatch loop
//!
//! Single consumer over the event source's two streams:
//! - Create events re-resolve every pattern and register new matches
//! - Other changes pass the debounce gate and may run the command
//! - Removals additionally drop the path (and anything under it), then
//!   re-resolve so a replaced file stays watched
//! - Source errors are logged and never stop the loop
//!
//! The command runs on the loop thread, so events queue in the source's
//! buffer while it executes.

use crate::config::EngineConfig;
use crate::debounce::Decision;
use crate::error::{Result, WatchError};
use crate::platform::{EventKind, EventSource, NotifySource, SourceChannels, WatchEvent};
use crate::registry::WatchRegistry;
use crate::resolve::PathResolver;
use crate::runner::{CommandRunner, ShellRunner};
use crossbeam_channel::{select, Receiver};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Owns the registry, resolver and runner for one watch session
pub struct WatchEngine<S: EventSource> {
    config: EngineConfig,
    resolver: PathResolver,
    registry: WatchRegistry<S>,
    channels: SourceChannels,
    runner: Box<dyn CommandRunner>,
}

impl WatchEngine<NotifySource> {
    /// Create an engine on the platform's native event source
    pub fn new(config: EngineConfig) -> Result<Self> {
        let (source, channels) = NotifySource::new()?;
        let runner = ShellRunner::new(config.output, config.timeout);
        Ok(Self::with_source(config, source, channels, Box::new(runner)))
    }
}

impl<S: EventSource> WatchEngine<S> {
    pub fn with_source(
        config: EngineConfig,
        source: S,
        channels: SourceChannels,
        runner: Box<dyn CommandRunner>,
    ) -> Self {
        let resolver = PathResolver::new(config.patterns.clone(), config.recursive);
        let registry = WatchRegistry::new(source, config.debounce);

        Self {
            config,
            resolver,
            registry,
            channels,
            runner,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &WatchRegistry<S> {
        &self.registry
    }

    /// Register everything the patterns currently match
    ///
    /// Any subscription failure aborts startup. Returns the number of
    /// watched paths.
    pub fn start(&self) -> Result<usize> {
        debug!("Path list {:?}", self.resolver.patterns());
        debug!("Command to execute: {:?}", self.config.command.args());

        for path in self.resolver.resolve() {
            self.registry.register(&path)?;
        }

        let watched = self.registry.len();
        if watched == 0 {
            warn!("No paths matched {:?}, nothing to watch", self.resolver.patterns());
        } else {
            info!(
                "Watching {} path(s), debounce {}",
                watched,
                humantime::format_duration(self.registry.window())
            );
        }

        if self.config.run_first {
            self.execute();
        }

        Ok(watched)
    }

    /// Consume events until `shutdown` fires or the source goes away
    pub fn run(&self, shutdown: &Receiver<()>) {
        loop {
            select! {
                recv(shutdown) -> _ => {
                    info!("Shutting down");
                    break;
                }
                recv(self.channels.events) -> msg => match msg {
                    Ok(event) => self.handle_event(event),
                    Err(_) => {
                        warn!("Event source closed");
                        break;
                    }
                },
                recv(self.channels.errors) -> msg => match msg {
                    Ok(e) => self.handle_error(e),
                    Err(_) => {
                        warn!("Event source closed");
                        break;
                    }
                },
            }
        }
    }

    /// Route one change notification
    pub fn handle_event(&self, event: WatchEvent) {
        debug!("{} changed ({:?})", event.path.display(), event.kind);

        match event.kind {
            EventKind::Create => {
                let added = self.rescan();
                if added > 0 {
                    debug!("Picked up {} new path(s)", added);
                }
            }
            EventKind::Modify | EventKind::Metadata => self.trigger(&event),
            EventKind::Remove | EventKind::Rename => {
                self.trigger(&event);
                let dropped = self.registry.unregister(&event.path);
                if dropped > 0 {
                    debug!("Dropped {} watch(es) under {}", dropped, event.path.display());
                }
                // A rename-over save leaves a new file behind the old path
                if self.rescan() > 0 {
                    debug!("Re-watching {}", event.path.display());
                }
            }
        }
    }

    pub fn handle_error(&self, e: notify::Error) {
        error!("{}", WatchError::Source(e));
    }

    /// Re-resolve every pattern and register paths not yet watched
    ///
    /// Failures here are logged; the next create event retries.
    pub fn rescan(&self) -> usize {
        let mut added = 0;
        for path in self.resolver.resolve() {
            match self.registry.register(&path) {
                Ok(n) => added += n,
                Err(e) => error!("{}", e),
            }
        }
        added
    }

    fn trigger(&self, event: &WatchEvent) {
        match self.registry.should_trigger(&event.path, Instant::now()) {
            Decision::Accept => self.execute(),
            Decision::Suppress { .. } | Decision::Untracked => {}
        }
    }

    fn execute(&self) {
        let command = &self.config.command;
        if command.is_empty() {
            warn!("No command to run");
            return;
        }

        let line = command.line();
        info!("Running `{}`", line);
        let started = Instant::now();

        match self.runner.run(command) {
            Ok(()) => info!("done in {}", humantime::format_duration(round_ms(started.elapsed()))),
            Err(e) => error!("Error running command `{}`: {}", line, e),
        }
    }

    /// Stop the loop's resources: every watch subscription is released
    pub fn shutdown(self) {
        self.registry.close();
    }
}

fn round_ms(elapsed: Duration) -> Duration {
    Duration::from_millis(elapsed.as_millis() as u64)
}
