//! # Error Handling
//!
//! This module defines the centralized error type for `grm`. It uses the
//! `thiserror` library to describe every failure the engine can run into,
//! grouped the way the engine treats them:
//!
//! - **Configuration errors** (`Config`, `ManifestNotFound`, `Manifest`):
//!   fatal, the run stops before any repository is touched.
//! - **Path errors** (`Path`, `NotARepository`): reported for a single
//!   manifest entry, which is then skipped while the run continues.
//! - **Subprocess errors** (`Subprocess`, `Passthrough`, `Bootstrap`): fatal,
//!   repository mutations are never retried.
//! - **Recursion errors** (`Recursion`): a delegated sub-tree worker failed.
//! - **Missing bootstrap settings** (`MissingSettings`): skips the entry in
//!   `new` mode, exit status 2 for the standalone bootstrap binary.
//!
//! The binaries map an error to a process exit status with
//! [`Error::exit_code`]. A sub-tree worker's status is passed on, so a
//! failed `git` passthrough exits the same way at any depth.

use std::path::PathBuf;

use thiserror::Error;

/// Problems found while tokenizing a single manifest line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    #[error("more than 3 fields")]
    TooManyFields,

    #[error("trailing backslash with nothing to escape")]
    TrailingBackslash,

    #[error("configuration assignment with an empty key")]
    EmptyKey,

    #[error("repository entry where only configuration assignments are allowed")]
    UnexpectedEntry,
}

/// Main error type for grm operations
#[derive(Error, Debug)]
pub enum Error {
    /// A required setting is missing or a configuration value is unusable.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Config {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// No manifest was found in the invocation directory or above it.
    #[error("No {list_fn} found in {} or any parent directory", start.display())]
    ManifestNotFound { list_fn: String, start: PathBuf },

    /// A manifest, conffile or config stream line could not be parsed.
    #[error("{source_name}:{line}: {source}")]
    Manifest {
        source_name: String,
        line: usize,
        #[source]
        source: ManifestError,
    },

    /// An entry resolved to something other than a directory.
    #[error("{path} {message}")]
    Path { path: String, message: String },

    /// An entry resolved to a directory that is not a repository root.
    #[error("{path} is not a Git repository")]
    NotARepository { path: String },

    /// A git or hook subprocess could not be started or returned nonzero.
    #[error("{command} failed in {}{}", dir.display(), code.map(|c| format!(" (exit code {})", c)).unwrap_or_default())]
    Subprocess {
        command: String,
        dir: PathBuf,
        code: Option<i32>,
    },

    /// The git command passed through in `git` mode returned nonzero.
    #[error("git {command} failed in {} with exit code {code}", dir.display())]
    Passthrough {
        command: String,
        dir: PathBuf,
        code: i32,
    },

    /// A sub-tree worker exited unsuccessfully.
    #[error("Recursive worker for {} failed{}", dir.display(), code.map(|c| format!(" with exit code {}", c)).unwrap_or_default())]
    Recursion { dir: PathBuf, code: Option<i32> },

    /// Settings required by the bootstrapper are not defined.
    #[error("Missing required settings: {}", keys.join(", "))]
    MissingSettings { keys: Vec<String> },

    /// Creating the remote repository failed.
    #[error("Bootstrap of {target} failed: {message}")]
    Bootstrap { target: String, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A directory walk error, wrapped from `walkdir::Error`.
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// The operator prompt could not be shown.
    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),
}

impl Error {
    /// Build a configuration error without a hint.
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            hint: None,
        }
    }

    /// The process exit status this error should produce.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::MissingSettings { .. } => 2,
            Error::Passthrough { code, .. } if *code > 0 => *code,
            Error::Recursion {
                code: Some(code), ..
            } if *code > 0 => *code,
            _ => 1,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Render an error and its causes on one line.
///
/// A cause whose text the message already ends with is not repeated.
pub fn report(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
