//! # grm-bootstrap
//!
//! Standalone entry point for creating one remote repository, the same way
//! `grm new` does for every plain directory in a tree. Settings come from
//! `GRM_*` environment variables only.
//!
//! Exit status 2 means the required settings are not all defined.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::LevelFilter;

use grm::bootstrap::{
    check_settings, AssumeYes, Bootstrapper, Confirmer, DialoguerConfirmer, Outcome, SshTransport,
};
use grm::config::ConfigSnapshot;
use grm::manifest::ManifestEntry;
use grm::mode::Mode;
use grm::output::{init_logging, parse_level, ColorChoice, OutputConfig};
use grm::repository::DefaultGitOperations;
use grm::state::{PathState, RepoContext};

/// Create a remote repository from a template and wire a local directory to it
#[derive(Parser, Debug)]
#[command(name = "grm-bootstrap")]
#[command(version, about, long_about = None)]
struct Args {
    /// Repository path relative to the remote root
    remote_rel: String,

    /// Local directory to wire up (defaults to the current directory)
    dir: Option<PathBuf>,

    /// Colorize diagnostics (always, never, auto)
    #[arg(long, value_enum, value_name = "WHEN", default_value_t = ColorChoice::Auto)]
    color: ColorChoice,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL", default_value = "info", value_parser = parse_level)]
    log_level: LevelFilter,

    /// Create the remote repository without asking
    #[arg(short = 'y', long)]
    yes: bool,
}

fn run(args: Args) -> Result<()> {
    let output = OutputConfig::from_env_and_flag(args.color);
    init_logging(args.log_level, &output);

    let cwd = std::env::current_dir().context("Failed to determine the current directory")?;
    let snapshot = ConfigSnapshot::from_process_env().with_mode(Mode::New);
    check_settings(&snapshot)?;
    let dir = args.dir.unwrap_or_else(|| PathBuf::from("."));
    let entry = ManifestEntry::new(
        args.remote_rel,
        Some(dir.to_string_lossy().into_owned()),
        None,
    );
    let ctx = RepoContext::new(entry, &cwd, &snapshot);

    let git = DefaultGitOperations;
    match PathState::observe(&ctx.abs_local, &git)? {
        PathState::PlainDir | PathState::RepoRoot => {}
        state => bail!("{} is not usable: {}", ctx.abs_local.display(), state),
    }

    let confirmer: Box<dyn Confirmer> = if args.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(DialoguerConfirmer::new(output.use_color))
    };
    let bootstrapper = Bootstrapper::new(Box::new(SshTransport), confirmer);
    if bootstrapper.bootstrap(&ctx, &git)? == Outcome::Created {
        log::info!("{} created", ctx.abs_local.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err
                .downcast_ref::<grm::error::Error>()
                .map(grm::error::Error::exit_code)
                .unwrap_or(1);
            log::error!("{}", grm::error::report(&*err));
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
