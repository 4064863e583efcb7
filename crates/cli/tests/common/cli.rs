//! Helpers for driving the `whenchange` binary
//!
//! `execute` runs to completion (help, version). `spawn` starts a
//! long-running watch session that is stopped with SIGTERM.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};

/// CLI command builder
pub struct WhenchangeCommand {
    binary_path: PathBuf,
    working_dir: PathBuf,
    args: Vec<String>,
}

impl WhenchangeCommand {
    /// Create a new command in the given working directory
    pub fn new(working_dir: impl AsRef<Path>) -> Self {
        Self {
            binary_path: PathBuf::from(env!("CARGO_BIN_EXE_whenchange")),
            working_dir: working_dir.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    /// Add command arguments
    pub fn args(&mut self, args: &[&str]) -> &mut Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.binary_path);
        command
            .args(&self.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null());
        command
    }

    /// Execute command to completion
    pub fn execute(&self) -> Result<CommandResult> {
        let start = Instant::now();
        let output = self.command().output().context("Failed to execute command")?;
        Ok(CommandResult::from_output(output, start.elapsed()))
    }

    /// Start a watch session in the background
    pub fn spawn(&self) -> Result<Session> {
        let child = self
            .command()
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn whenchange")?;

        Ok(Session {
            child,
            started: Instant::now(),
        })
    }
}

/// A running `whenchange` process
pub struct Session {
    child: Child,
    started: Instant,
}

impl Session {
    /// True while the process has not exited
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Send SIGTERM and collect everything the process printed
    pub fn stop(mut self) -> Result<CommandResult> {
        if self.is_running() {
            let status = Command::new("kill")
                .arg("-TERM")
                .arg(self.child.id().to_string())
                .status()
                .context("Failed to run kill")?;
            anyhow::ensure!(status.success(), "kill -TERM failed");
        }

        let output = self.child.wait_with_output().context("Failed to wait for whenchange")?;
        Ok(CommandResult::from_output(output, self.started.elapsed()))
    }
}

/// Command execution result with timing
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

impl CommandResult {
    fn from_output(output: Output, duration: Duration) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            duration,
        }
    }

    /// Check if command succeeded
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Check if stdout contains text
    pub fn contains_stdout(&self, text: &str) -> bool {
        self.stdout.contains(text)
    }

    /// Check if stderr contains text
    pub fn contains_stderr(&self, text: &str) -> bool {
        self.stderr.contains(text)
    }
}

/// Poll `check` until it holds or `timeout` passes
pub fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    check()
}

/// Macro for convenient command construction
///
/// Usage:
/// ```ignore
/// whenchange!(dir, "--help").execute()?;
/// whenchange!(dir, "-p", "src/", "make").spawn()?;
/// ```
#[macro_export]
macro_rules! whenchange {
    ($dir:expr, $($arg:expr),*) => {{
        let mut cmd = $crate::common::cli::WhenchangeCommand::new($dir);
        cmd.args(&[$($arg),*]);
        cmd
    }};
}
