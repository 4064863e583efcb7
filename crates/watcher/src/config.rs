//! Engine configuration
//!
//! Built once from parsed command-line arguments and immutable for the
//! lifetime of the process:
//! - Patterns to watch (globs, files or directories)
//! - Recursive directory watching
//! - Debounce window
//! - Shell command to run on change

use crate::runner::OutputMode;
use std::time::Duration;
use tracing::warn;

/// Debounce window used when none is given or the given one is invalid
pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

/// Shell used to run the command when none is given
pub const DEFAULT_SHELL: &str = "bash";

/// Pattern watched when no `--path` is given
pub const DEFAULT_PATH: &str = "./";

/// Parse a debounce window such as `5s`, `100ms` or `1m 30s`
///
/// Invalid input falls back to [`DEFAULT_DELAY`] with a warning.
pub fn parse_delay(input: &str) -> Duration {
    match humantime::parse_duration(input.trim()) {
        Ok(delay) => delay,
        Err(e) => {
            warn!(
                "Invalid delay '{}' ({}), using default of {}",
                input,
                e,
                humantime::format_duration(DEFAULT_DELAY)
            );
            DEFAULT_DELAY
        }
    }
}

/// Shell plus command tokens to execute on an accepted change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    shell: String,
    args: Vec<String>,
}

impl ShellCommand {
    pub fn new(shell: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            shell: shell.into(),
            args,
        }
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// True when no command tokens were supplied
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Command tokens joined into the single string handed to `<shell> -c`
    pub fn line(&self) -> String {
        self.args.join(" ")
    }
}

/// Watch engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Paths or glob patterns to watch, in the order given
    pub patterns: Vec<String>,

    /// Walk matched directories and watch every sub-directory
    pub recursive: bool,

    /// Minimum time between two accepted triggers for the same path
    pub debounce: Duration,

    /// Command run on an accepted change
    pub command: ShellCommand,

    /// How the command's output reaches the terminal
    pub output: OutputMode,

    /// Kill the command if it runs longer than this (default: none)
    pub timeout: Option<Duration>,

    /// Run the command once after the initial watches are set up
    pub run_first: bool,
}

impl EngineConfig {
    /// Create a configuration with default output handling
    ///
    /// An empty pattern list watches [`DEFAULT_PATH`].
    pub fn new(patterns: Vec<String>, recursive: bool, delay: &str, command: ShellCommand) -> Self {
        let patterns = if patterns.is_empty() {
            vec![DEFAULT_PATH.to_string()]
        } else {
            patterns
        };

        Self {
            patterns,
            recursive,
            debounce: parse_delay(delay),
            command,
            output: OutputMode::default(),
            timeout: None,
            run_first: false,
        }
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_run_first(mut self, run_first: bool) -> Self {
        self.run_first = run_first;
        self
    }
}
