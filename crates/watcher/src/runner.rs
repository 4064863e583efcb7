//! Command execution
//!
//! Runs the configured command line through `<shell> -c` and blocks until
//! it finishes. Failures are returned to the caller, which logs them and
//! keeps watching.

use crate::config::ShellCommand;
use crate::error::{Result, WatchError};
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Poll interval while waiting on a command with a timeout
const WAIT_POLL: Duration = Duration::from_millis(25);

/// How long captured output may still trickle in after a timeout kill
const DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Where the command's stdout/stderr go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Stream straight to this process's stdout/stderr
    #[default]
    Inherit,
    /// Collect both streams and log them once the command exits
    Captured,
    /// Discard all output
    Quiet,
}

/// Executes the command for an accepted trigger
pub trait CommandRunner: Send {
    fn run(&self, command: &ShellCommand) -> Result<()>;
}

/// Runs commands through a shell as a child process
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
    output: OutputMode,
    timeout: Option<Duration>,
}

impl ShellRunner {
    pub fn new(output: OutputMode, timeout: Option<Duration>) -> Self {
        Self { output, timeout }
    }

    fn spawn(&self, command: &ShellCommand) -> Result<Child> {
        let mut cmd = Command::new(command.shell());
        cmd.arg("-c").arg(command.line()).stdin(Stdio::null());

        // Own process group, so a timeout takes down everything the shell forked
        #[cfg(unix)]
        if self.timeout.is_some() {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        match self.output {
            OutputMode::Inherit => {
                cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }
            OutputMode::Captured => {
                cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
            OutputMode::Quiet => {
                cmd.stdout(Stdio::null()).stderr(Stdio::null());
            }
        }

        cmd.spawn().map_err(|source| WatchError::Spawn {
            shell: command.shell().to_string(),
            source,
        })
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus> {
        let Some(timeout) = self.timeout else {
            return Ok(child.wait()?);
        };

        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }

            let elapsed = started.elapsed();
            if elapsed >= timeout {
                warn!(
                    "Command still running after {}, killing it",
                    humantime::format_duration(timeout)
                );
                if let Err(e) = kill_tree(child) {
                    debug!("Kill failed: {}", e);
                }
                child.wait()?;
                return Err(WatchError::Timeout(timeout));
            }

            thread::sleep(WAIT_POLL.min(timeout - elapsed));
        }
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, command: &ShellCommand) -> Result<()> {
        let mut child = self.spawn(command)?;

        // Drain pipes on their own threads so a chatty command can't fill
        // the pipe buffer and stall while we wait on it
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = self.wait(&mut child);

        // Anything that escaped the kill may still hold the pipes open
        let deadline = match status {
            Err(WatchError::Timeout(_)) => Some(Instant::now() + DRAIN_GRACE),
            _ => None,
        };
        let mut output = collect(stdout, deadline);
        output.push_str(&collect(stderr, deadline));
        if self.output == OutputMode::Captured && !output.is_empty() {
            info!("Command output:\n{}", output);
        }

        let status = status?;
        if status.success() {
            Ok(())
        } else {
            Err(WatchError::CommandFailed { status })
        }
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Err(e) = pipe.read_to_end(&mut buf) {
            debug!("Failed to read command output: {}", e);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Join a drain thread, giving up once `deadline` passes
fn collect(handle: Option<JoinHandle<String>>, deadline: Option<Instant>) -> String {
    let Some(handle) = handle else {
        return String::new();
    };

    if let Some(deadline) = deadline {
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                debug!("Command output still open, abandoning it");
                return String::new();
            }
            thread::sleep(WAIT_POLL);
        }
    }
    handle.join().unwrap_or_default()
}

#[cfg(unix)]
fn kill_tree(child: &mut Child) -> std::io::Result<()> {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    killpg(Pid::from_raw(child.id() as i32), Signal::SIGKILL)?;
    Ok(())
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) -> std::io::Result<()> {
    child.kill()
}
