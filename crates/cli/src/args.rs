//! Command-line arguments

use clap::{ArgAction, Parser};
use std::time::Duration;
use watcher::{EngineConfig, OutputMode, ShellCommand, DEFAULT_SHELL};

/// whenchange - run a shell command when files change
#[derive(Parser, Debug)]
#[command(name = "whenchange")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Examples:\n  \
    whenchange -p '*.go' go build\n  \
    whenchange -p ./src/ mvn test-compile")]
pub struct Cli {
    /// File, directory or glob pattern to watch (repeatable, default: ./)
    #[arg(short = 'p', long = "path", value_name = "PATH")]
    pub paths: Vec<String>,

    /// Also watch all sub-directories of watched directories (-r=false to disable)
    #[arg(
        short,
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = true,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    pub recursive: bool,

    /// Minimum time between two runs for the same path (e.g. 500ms, 2s)
    #[arg(short, long, default_value = "5s", value_name = "DURATION")]
    pub delay: String,

    /// Shell used to run the command as `<shell> -c "<command>"`
    #[arg(long, default_value = DEFAULT_SHELL)]
    pub shell: String,

    /// Output debug information
    #[arg(short, long)]
    pub verbose: bool,

    /// Collect the command's output and print it after it exits
    #[arg(long, conflicts_with = "quiet")]
    pub capture: bool,

    /// Discard the command's output
    #[arg(long)]
    pub quiet: bool,

    /// Kill the command if it runs longer than this
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Run the command once at startup
    #[arg(long)]
    pub run_first: bool,

    /// Command to execute on change; all remaining arguments are joined
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.capture {
            OutputMode::Captured
        } else if self.quiet {
            OutputMode::Quiet
        } else {
            OutputMode::Inherit
        }
    }

    /// Build the immutable engine configuration
    pub fn into_config(self) -> EngineConfig {
        let output = self.output_mode();
        let command = ShellCommand::new(self.shell, self.command);

        EngineConfig::new(self.paths, self.recursive, &self.delay, command)
            .with_output(output)
            .with_timeout(self.timeout)
            .with_run_first(self.run_first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watcher::{DEFAULT_DELAY, DEFAULT_PATH};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("whenchange").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        assert!(cli.paths.is_empty());
        assert!(cli.recursive);
        assert_eq!(cli.delay, "5s");
        assert_eq!(cli.shell, DEFAULT_SHELL);
        assert!(!cli.verbose);
        assert!(cli.command.is_empty());

        let config = cli.into_config();
        assert_eq!(config.patterns, vec![DEFAULT_PATH.to_string()]);
        assert_eq!(config.debounce, DEFAULT_DELAY);
        assert!(config.command.is_empty());
        assert_eq!(config.output, OutputMode::Inherit);
    }

    #[test]
    fn test_repeatable_paths_and_command() {
        let cli = parse(&["-p", "src/", "--path", "*.toml", "cargo", "build", "--release"]);
        assert_eq!(cli.paths, vec!["src/", "*.toml"]);
        assert_eq!(cli.command, vec!["cargo", "build", "--release"]);

        let config = cli.into_config();
        assert_eq!(config.command.line(), "cargo build --release");
    }

    #[test]
    fn test_flags_after_command_belong_to_command() {
        let cli = parse(&["-d", "1s", "make", "-v", "-p", "x"]);
        assert!(!cli.verbose);
        assert!(cli.paths.is_empty());
        assert_eq!(cli.command, vec!["make", "-v", "-p", "x"]);
    }

    #[test]
    fn test_recursive_can_be_disabled() {
        assert!(parse(&["-r"]).recursive);
        assert!(!parse(&["--recursive=false"]).recursive);

        let cli = parse(&["-r=false", "make"]);
        assert!(!cli.recursive);
        assert_eq!(cli.command, vec!["make"]);

        // A bare -r never swallows the command
        let cli = parse(&["-r", "go", "build"]);
        assert!(cli.recursive);
        assert_eq!(cli.command, vec!["go", "build"]);
    }

    #[test]
    fn test_delay_and_shell() {
        let cli = parse(&["--delay", "250ms", "--shell", "zsh", "-v", "make"]);
        assert!(cli.verbose);

        let config = cli.into_config();
        assert_eq!(config.debounce, Duration::from_millis(250));
        assert_eq!(config.command.shell(), "zsh");
    }

    #[test]
    fn test_invalid_delay_falls_back() {
        let config = parse(&["-d", "banana", "make"]).into_config();
        assert_eq!(config.debounce, DEFAULT_DELAY);
    }

    #[test]
    fn test_output_modes() {
        assert_eq!(parse(&["--capture"]).output_mode(), OutputMode::Captured);
        assert_eq!(parse(&["--quiet"]).output_mode(), OutputMode::Quiet);
        assert!(Cli::try_parse_from(["whenchange", "--capture", "--quiet"]).is_err());
    }

    #[test]
    fn test_timeout_parsing() {
        let config = parse(&["--timeout", "2m", "--run-first", "make"]).into_config();
        assert_eq!(config.timeout, Some(Duration::from_secs(120)));
        assert!(config.run_first);

        assert!(Cli::try_parse_from(["whenchange", "--timeout", "soon"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
