//! CLI argument parsing and dispatch

use std::io;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use log::LevelFilter;

use grm::bootstrap::{AssumeYes, Bootstrapper, Confirmer, DialoguerConfirmer, SshTransport};
use grm::config::{find_conffile, ConfigSnapshot};
use grm::mode::Mode;
use grm::orchestrator::{Delegation, Engine};
use grm::output::{init_logging, parse_level, ColorChoice, OutputConfig};
use grm::repository::DefaultGitOperations;
use grm::walker::ProcessWorker;

/// grm - keep a fleet of Git working copies in line with their manifests
#[derive(Parser, Debug)]
#[command(name = "grm")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Operation to perform on every repository in the tree
    #[arg(value_enum)]
    mode: Mode,

    /// Git command to run in every repository (git mode only)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    args: Vec<String>,

    /// Colorize diagnostics (always, never, auto)
    #[arg(long, value_enum, value_name = "WHEN", default_value_t = ColorChoice::Auto)]
    color: ColorChoice,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", default_value = "info", value_parser = parse_level)]
    log_level: LevelFilter,

    /// Create remote repositories without asking
    #[arg(short = 'y', long)]
    yes: bool,

    /// Read the configuration from stdin instead of the conffile
    #[arg(long, hide = true)]
    config_stdin: bool,
}

impl Cli {
    /// Reject trailing arguments that the mode has no use for.
    fn validate(&self) {
        if self.mode.takes_git_args() && self.args.is_empty() {
            Self::command()
                .error(
                    ErrorKind::MissingRequiredArgument,
                    "git mode needs a git command to run, e.g. `grm git status`",
                )
                .exit();
        }
        if !self.mode.takes_git_args() && !self.args.is_empty() {
            Self::command()
                .error(
                    ErrorKind::UnknownArgument,
                    format!(
                        "unexpected arguments for {} mode: {}",
                        self.mode,
                        self.args.join(" ")
                    ),
                )
                .exit();
        }
    }

    /// Options repeated on the command line of every sub-tree worker.
    fn worker_args(&self) -> Vec<String> {
        let mut args = vec![
            "--log-level".to_string(),
            self.log_level.as_str().to_lowercase(),
            "--color".to_string(),
            self.color.as_arg().to_string(),
        ];
        if self.yes {
            args.push("--yes".to_string());
        }
        args
    }

    /// Execute the selected mode
    pub fn execute(self) -> Result<()> {
        self.validate();
        let output = OutputConfig::from_env_and_flag(self.color);
        init_logging(self.log_level, &output);

        let cwd = std::env::current_dir().context("Failed to determine the current directory")?;
        let base = ConfigSnapshot::from_process_env();
        let snapshot = if self.config_stdin {
            base.read_stream(io::stdin().lock())
                .context("Failed to read the configuration stream")?
        } else {
            let conffile = find_conffile(&cwd)?;
            base.load_conffile(&conffile)?
        };

        let confirmer: Box<dyn Confirmer> = if self.yes {
            Box::new(AssumeYes)
        } else {
            Box::new(DialoguerConfirmer::new(output.use_color))
        };
        let worker = ProcessWorker::current(self.worker_args(), self.mode, self.args.clone())?;
        let engine = Engine::new(
            self.mode,
            self.args,
            Box::new(DefaultGitOperations),
            Bootstrapper::new(Box::new(SshTransport), confirmer),
            Delegation::Process(worker),
        );

        engine.run(&cwd, snapshot, &mut io::stdout().lock())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_git_mode_collects_trailing_arguments() {
        let cli = Cli::try_parse_from(["grm", "git", "log", "--oneline", "-n", "3"]).unwrap();
        assert_eq!(cli.mode, Mode::Git);
        assert_eq!(cli.args, vec!["log", "--oneline", "-n", "3"]);
    }

    #[test]
    fn test_global_options() {
        let cli = Cli::try_parse_from([
            "grm",
            "--log-level",
            "debug",
            "--color",
            "never",
            "-y",
            "new",
        ])
        .unwrap();
        assert_eq!(cli.mode, Mode::New);
        assert_eq!(cli.log_level, LevelFilter::Debug);
        assert!(cli.yes);
        assert_eq!(
            cli.worker_args(),
            vec!["--log-level", "debug", "--color", "never", "--yes"]
        );
    }

    #[test]
    fn test_worker_command_line_parses_back() {
        let cli = Cli::try_parse_from([
            "grm",
            "--log-level",
            "warn",
            "--color",
            "auto",
            "--config-stdin",
            "git",
            "--",
            "status",
            "--short",
        ])
        .unwrap();
        assert!(cli.config_stdin);
        assert_eq!(cli.args, vec!["status", "--short"]);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let err = Cli::try_parse_from(["grm", "frobnicate"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }
}
