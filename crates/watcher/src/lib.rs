//! File system watching for whenchange
//!
//! This crate provides the watch-and-debounce engine:
//! - Glob pattern resolution with optional recursive directory discovery
//! - A registry of watched paths with per-path debouncing
//! - Pickup of newly created files and directories matching a pattern
//! - Shell command execution on accepted changes

pub mod config;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod platform;
pub mod registry;
pub mod resolve;
pub mod runner;

pub use config::{
    parse_delay, EngineConfig, ShellCommand, DEFAULT_DELAY, DEFAULT_PATH, DEFAULT_SHELL,
};
pub use debounce::{DebounceGate, Decision};
pub use engine::WatchEngine;
pub use error::{Result, WatchError};
pub use platform::{EventKind, EventSource, NotifySource, SourceChannels, WatchEvent};
pub use registry::{WatchRegistry, WatchScope};
pub use resolve::PathResolver;
pub use runner::{CommandRunner, OutputMode, ShellRunner};
