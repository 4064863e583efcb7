//! Logging setup

use tracing::Level;

/// Max log level for the `--verbose` flag
pub fn level(verbose: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

/// Install the global subscriber, writing to stderr
///
/// Stdout is left to the command being run.
pub fn init(verbose: bool) {
    tracing_subscriber::fmt()
        .with_max_level(level(verbose))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
