//! whenchange command-line front end
//!
//! Argument parsing and logging setup; the watch engine itself lives in
//! the `watcher` crate.

pub mod args;
pub mod logging;

pub use args::Cli;
