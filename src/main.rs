//! # grm CLI
//!
//! This is the binary entry point for the `grm` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Running the selected mode over the tree around the current directory.
//! - Translating errors into a diagnostic and a process exit status.
//!
//! The engine itself lives in the `grm` library crate.

mod cli;

use std::process::ExitCode;

use clap::Parser;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    match cli.execute() {
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
