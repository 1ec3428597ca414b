//! Thin wrappers around the `git` command line.
//!
//! Every invocation runs in an explicit directory, is logged at debug level
//! and inherits the process's stdout and stderr unless its output is
//! captured. A nonzero exit becomes [`Error::Subprocess`], except for the
//! probes below, which report failure as a value.

use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use log::debug;

use crate::defaults::ORIGIN;
use crate::error::{Error, Result};

fn describe(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

fn spawn_failed(command: String, dir: &Path, err: std::io::Error) -> Error {
    debug!("Could not start {}: {}", command, err);
    Error::Subprocess {
        command,
        dir: dir.to_path_buf(),
        code: None,
    }
}

fn check(status: ExitStatus, command: String, dir: &Path) -> Result<()> {
    if status.success() {
        Ok(())
    } else {
        Err(Error::Subprocess {
            command,
            dir: dir.to_path_buf(),
            code: status.code(),
        })
    }
}

/// Run `git <args>` in `dir`, failing on a nonzero exit.
pub fn run(dir: &Path, args: &[&str]) -> Result<()> {
    let command = describe("git", args);
    debug!("Running {} (in {})", command, dir.display());
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .status()
        .map_err(|e| spawn_failed(command.clone(), dir, e))?;
    check(status, command, dir)
}

/// Run `git <args>` in `dir` and capture stdout.
///
/// Returns `Ok(None)` when git exits nonzero; only a failure to start git at
/// all is an error.
pub fn probe(dir: &Path, args: &[&str]) -> Result<Option<String>> {
    let command = describe("git", args);
    debug!("Probing {} (in {})", command, dir.display());
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| spawn_failed(command, dir, e))?;

    if output.status.success() {
        Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
    } else {
        Ok(None)
    }
}

/// Whether `dir` is the top of a working copy.
pub fn is_repo_root(dir: &Path) -> Result<bool> {
    Ok(probe(dir, &["rev-parse", "--show-prefix"])?.is_some_and(|prefix| prefix.trim().is_empty()))
}

/// Clone `url` into `target` without populating the working tree.
pub fn clone_no_checkout(cwd: &Path, url: &str, target: &Path) -> Result<()> {
    let target = target.to_string_lossy();
    run(cwd, &["clone", "--no-checkout", url, &target])
}

/// Populate the working tree of a `--no-checkout` clone.
pub fn checkout(dir: &Path) -> Result<()> {
    run(dir, &["checkout", "-q"])
}

pub fn checkout_branch(dir: &Path, branch: &str) -> Result<()> {
    run(dir, &["checkout", "-q", branch])
}

pub fn init(dir: &Path) -> Result<()> {
    run(dir, &["init", "-q"])
}

/// The configured URL of `origin`, or `None` when there is no such remote.
pub fn origin_url(dir: &Path) -> Result<Option<String>> {
    Ok(probe(dir, &["remote", "get-url", ORIGIN])?.map(|url| url.trim().to_string()))
}

pub fn set_origin_url(dir: &Path, url: &str) -> Result<()> {
    run(dir, &["remote", "set-url", ORIGIN, url])
}

/// Add `origin` and fetch it.
pub fn add_origin(dir: &Path, url: &str) -> Result<()> {
    run(dir, &["remote", "add", "-f", ORIGIN, url])
}

pub fn fetch_origin(dir: &Path) -> Result<()> {
    run(dir, &["fetch", ORIGIN])
}

/// Short names of the remote-tracking branches of `origin`.
pub fn remote_branches(dir: &Path) -> Result<Vec<String>> {
    let refs = format!("refs/remotes/{}", ORIGIN);
    let listing = probe(dir, &["for-each-ref", "--format=%(refname:short)", &refs])?
        .unwrap_or_default();
    let head = format!("{}/HEAD", ORIGIN);
    Ok(listing
        .lines()
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != head && *name != ORIGIN)
        .map(str::to_string)
        .collect())
}

/// Ask `origin` for its HEAD and return the branch it points to.
pub fn remote_default_branch(dir: &Path) -> Result<String> {
    run(dir, &["remote", "set-head", ORIGIN, "--auto"])?;
    let head = format!("refs/remotes/{}/HEAD", ORIGIN);
    let symref = probe(dir, &["symbolic-ref", "--short", &head])?.ok_or_else(|| {
        Error::Subprocess {
            command: format!("git symbolic-ref --short {}", head),
            dir: dir.to_path_buf(),
            code: None,
        }
    })?;
    let symref = symref.trim();
    let prefix = format!("{}/", ORIGIN);
    Ok(symref.strip_prefix(&prefix).unwrap_or(symref).to_string())
}

/// Run `git <args>` in `dir` on behalf of the operator.
///
/// A nonzero exit is reported as [`Error::Passthrough`] so its status can be
/// surfaced verbatim.
pub fn passthrough(dir: &Path, args: &[String]) -> Result<()> {
    let command = args.join(" ");
    debug!("Running git {} (in {})", command, dir.display());
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .map_err(|e| spawn_failed(format!("git {}", command), dir, e))?;

    match status.code() {
        Some(0) => Ok(()),
        Some(code) => Err(Error::Passthrough {
            command,
            dir: dir.to_path_buf(),
            code,
        }),
        None => Err(Error::Subprocess {
            command: format!("git {}", command),
            dir: dir.to_path_buf(),
            code: None,
        }),
    }
}

/// Run the configure hook: `sh -c '<command> "$@"' grm-config <media>`.
pub fn run_config_cmd(
    dir: &Path,
    command: &str,
    media: &str,
    env: &[(String, String)],
) -> Result<()> {
    let script = format!("{} \"$@\"", command);
    debug!("Configuring {} with {} {}", dir.display(), command, media);
    let status = Command::new("sh")
        .args(["-c", &script, "grm-config", media])
        .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .current_dir(dir)
        .stdin(Stdio::null())
        .status()
        .map_err(|e| spawn_failed(command.to_string(), dir, e))?;
    check(status, command.to_string(), dir)
}
