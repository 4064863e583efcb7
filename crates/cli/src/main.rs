//! whenchange - run a shell command when files change

use anyhow::{Context, Result};
use clap::Parser;
use cli_lib::{logging, Cli};
use owo_colors::OwoColorize;
use tracing::info;
use watcher::WatchEngine;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Installed before startup so an early SIGTERM still shuts down cleanly
    let mut signals = Signals::install()?;

    let engine = WatchEngine::new(cli.into_config())?;
    engine.start().context("Failed to set up watches")?;

    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
    let mut dispatch = tokio::task::spawn_blocking(move || {
        engine.run(&shutdown_rx);
        engine.shutdown();
    });

    tokio::select! {
        _ = signals.recv() => {
            info!("Received termination signal");
            let _ = shutdown_tx.send(());
            dispatch.await.context("Dispatch loop panicked")?;
        }
        joined = &mut dispatch => {
            joined.context("Dispatch loop panicked")?;
        }
    }

    Ok(())
}

/// Termination signals that stop the watch loop
#[cfg(unix)]
struct Signals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    fn install() -> Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())
                .context("Failed to install SIGINT handler")?,
            terminate: signal(SignalKind::terminate())
                .context("Failed to install SIGTERM handler")?,
        })
    }

    async fn recv(&mut self) {
        tokio::select! {
            _ = self.interrupt.recv() => {}
            _ = self.terminate.recv() => {}
        }
    }
}

#[cfg(not(unix))]
struct Signals;

#[cfg(not(unix))]
impl Signals {
    fn install() -> Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
