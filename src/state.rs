//! # Per-Entry State Machine
//!
//! Every manifest entry inside the tree filter goes through the same steps:
//! the filesystem state of its local path is observed ([`PathState`]), an
//! [`Action`] is chosen from that state and the active [`Operations`] by the
//! pure function [`decide`], and the action is carried out by an
//! [`EntryProcessor`].
//!
//! | Observed state     | `new`          | other modes                        |
//! |--------------------|----------------|------------------------------------|
//! | missing            | does not exist | clone (needs the clone flag)       |
//! | not a directory    | error          | error                              |
//! | repository root    | already exists | update remote, configure, git      |
//! | plain directory    | bootstrap      | not a Git repository               |
//!
//! List modes print before anything is observed and never mutate.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, error, info, log, warn, Level};

use crate::bootstrap::{Bootstrapper, Outcome};
use crate::config::ConfigSnapshot;
use crate::defaults::keys;
use crate::error::{Error, Result};
use crate::manifest::ManifestEntry;
use crate::mode::{Listing, Operations};
use crate::path::{cat_path, normalize};
use crate::remote::{parse_login, remote_url};
use crate::repository::GitOperations;

/// What is found at an entry's local path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathState {
    Missing,
    NotDirectory,
    RepoRoot,
    PlainDir,
}

impl PathState {
    pub fn observe(path: &Path, git: &dyn GitOperations) -> Result<Self> {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(PathState::Missing),
            Err(e) => return Err(e.into()),
        };

        if !metadata.is_dir() {
            Ok(PathState::NotDirectory)
        } else if git.is_repo_root(path)? {
            Ok(PathState::RepoRoot)
        } else {
            Ok(PathState::PlainDir)
        }
    }
}

impl fmt::Display for PathState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PathState::Missing => "missing",
            PathState::NotDirectory => "not a directory",
            PathState::RepoRoot => "repository root",
            PathState::PlainDir => "plain directory",
        })
    }
}

/// What to do with an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Clone without checkout, configure, then check out.
    Clone,
    /// Update the remote, configure and run git, as the flags allow.
    Update,
    /// Create the remote repository and wire the directory to it.
    Bootstrap,
    AlreadyExists,
    DoesNotExist,
    NotADirectory,
    NotARepository,
}

impl Action {
    /// The error an action reports, for actions that only report one.
    pub fn failure(&self, display_path: &str) -> Option<Error> {
        match self {
            Action::DoesNotExist => Some(Error::Path {
                path: display_path.to_string(),
                message: "does not exist".to_string(),
            }),
            Action::NotADirectory => Some(Error::Path {
                path: display_path.to_string(),
                message: "is not a directory".to_string(),
            }),
            Action::NotARepository => Some(Error::NotARepository {
                path: display_path.to_string(),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Clone => "clone",
            Action::Update => "update",
            Action::Bootstrap => "bootstrap",
            Action::AlreadyExists => "skip (already exists)",
            Action::DoesNotExist => "error (does not exist)",
            Action::NotADirectory => "error (not a directory)",
            Action::NotARepository => "error (not a Git repository)",
        })
    }
}

/// Choose the action for an observed path state.
///
/// List modes never reach this point.
pub fn decide(ops: &Operations, state: PathState) -> Action {
    match state {
        PathState::Missing if ops.clone && !ops.new => Action::Clone,
        PathState::Missing => Action::DoesNotExist,
        PathState::NotDirectory => Action::NotADirectory,
        PathState::RepoRoot if ops.new => Action::AlreadyExists,
        PathState::RepoRoot => Action::Update,
        PathState::PlainDir if ops.new => Action::Bootstrap,
        PathState::PlainDir => Action::NotARepository,
    }
}

/// How an entry ended, for the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    Listed,
    Cloned,
    Updated,
    Bootstrapped,
    Skipped,
    Failed,
}

/// Everything derived for one manifest entry.
#[derive(Debug, Clone)]
pub struct RepoContext {
    pub entry: ManifestEntry,
    /// Directory holding the manifest; relative paths resolve against it.
    pub manifest_dir: PathBuf,
    pub local_path: String,
    pub remote_path: String,
    pub media_path: String,
    /// Normalized absolute local path, the one compared to the tree filter.
    pub abs_local: PathBuf,
    pub snapshot: ConfigSnapshot,
}

impl RepoContext {
    pub fn new(entry: ManifestEntry, manifest_dir: &Path, snapshot: &ConfigSnapshot) -> Self {
        let local_path = cat_path(&[snapshot.str_or_empty(keys::LOCAL_DIR), &entry.local_rel]);
        let remote_path = cat_path(&[snapshot.str_or_empty(keys::REMOTE_DIR), &entry.remote_rel]);
        let media_path = cat_path(&[
            snapshot.str_or_empty(keys::GM_BASE_PATH),
            snapshot.str_or_empty(keys::GM_DIR),
            &entry.media_rel,
        ]);
        let abs_local = normalize(&manifest_dir.join(&local_path));

        Self {
            entry,
            manifest_dir: manifest_dir.to_path_buf(),
            local_path,
            remote_path,
            media_path,
            abs_local,
            snapshot: snapshot.clone(),
        }
    }

    fn prefix(&self) -> &str {
        self.snapshot.str_or_empty(keys::RECURSE_PREFIX)
    }

    /// The local path as the operator sees it from the traversal root.
    pub fn display_path(&self) -> String {
        cat_path(&[self.prefix(), &self.local_path])
    }

    pub fn remote_url(&self) -> String {
        remote_url(&self.snapshot, &self.remote_path)
    }

    /// The URL handed to git. A relative filesystem remote is anchored to
    /// the manifest directory so it means the same thing in every working
    /// copy.
    pub fn git_url(&self) -> String {
        let url = self.remote_url();
        if url.starts_with('/') || url.contains(':') || parse_login(&url).is_some() {
            url
        } else {
            normalize(&self.manifest_dir.join(&url))
                .to_string_lossy()
                .into_owned()
        }
    }

    /// The line a list mode prints for this entry.
    pub fn listing(&self, listing: Listing) -> String {
        match listing {
            Listing::RemoteRel => cat_path(&[self.prefix(), &self.remote_path]),
            Listing::LocalRel => self.display_path(),
            Listing::RemoteUrl => self.remote_url(),
        }
    }

    /// Run the configure hook in the working copy, if one is configured.
    pub fn configure(&self, git: &dyn GitOperations) -> Result<()> {
        let command = self.snapshot.str_or_empty(keys::CONFIG_CMD);
        if command.is_empty() {
            debug!("{}: no {} set, nothing to configure", self.display_path(), keys::CONFIG_CMD);
            return Ok(());
        }
        info!("Configuring {}", self.display_path());
        git.run_config_cmd(
            &self.abs_local,
            command,
            &self.media_path,
            &self.snapshot.env_vars(),
        )
    }

    fn decision_level(&self) -> Level {
        if self.snapshot.flag(keys::OPT_DEBUG_PRIMITIVES) {
            Level::Info
        } else {
            Level::Debug
        }
    }
}

/// Carries out the decided action for each entry.
pub struct EntryProcessor<'a> {
    pub git: &'a dyn GitOperations,
    pub bootstrapper: &'a Bootstrapper,
    /// Arguments passed through to git in `git` mode.
    pub git_args: &'a [String],
}

impl EntryProcessor<'_> {
    /// Process one entry.
    ///
    /// Entry-level problems are logged and reported as
    /// [`EntryOutcome::Failed`]; an `Err` is fatal for the whole run.
    pub fn process(&self, ctx: &RepoContext, out: &mut dyn Write) -> Result<EntryOutcome> {
        let ops = Operations::from_snapshot(&ctx.snapshot);
        if let Some(listing) = ops.listing {
            writeln!(out, "{}", ctx.listing(listing))?;
            return Ok(EntryOutcome::Listed);
        }

        let display = ctx.display_path();
        let state = PathState::observe(&ctx.abs_local, self.git)?;
        let action = decide(&ops, state);
        log!(ctx.decision_level(), "{}: {} -> {}", display, state, action);

        match action {
            Action::Clone => {
                self.clone(ctx)?;
                Ok(EntryOutcome::Cloned)
            }
            Action::Update => {
                info!("{} exists", display);
                self.update(ctx, &ops)?;
                Ok(EntryOutcome::Updated)
            }
            Action::AlreadyExists => {
                info!("{} already exists (skipping)", display);
                Ok(EntryOutcome::Skipped)
            }
            Action::Bootstrap => match self.bootstrapper.bootstrap(ctx, self.git) {
                Ok(Outcome::Created) => {
                    info!("{} created", display);
                    Ok(EntryOutcome::Bootstrapped)
                }
                Ok(Outcome::Aborted) => Ok(EntryOutcome::Skipped),
                Err(e @ Error::MissingSettings { .. }) => {
                    warn!("{}: {} (skipping)", display, e);
                    Ok(EntryOutcome::Skipped)
                }
                Err(e) => Err(e),
            },
            Action::DoesNotExist | Action::NotADirectory | Action::NotARepository => {
                if let Some(err) = action.failure(&display) {
                    error!("{}", err);
                }
                Ok(EntryOutcome::Failed)
            }
        }
    }

    fn clone(&self, ctx: &RepoContext) -> Result<()> {
        let url = ctx.git_url();
        info!("Cloning {} into {}", url, ctx.display_path());
        self.git
            .clone_no_checkout(&ctx.manifest_dir, &url, &ctx.abs_local)?;
        ctx.configure(self.git)?;
        self.git.checkout(&ctx.abs_local)
    }

    fn update(&self, ctx: &RepoContext, ops: &Operations) -> Result<()> {
        if ops.set_remote {
            self.sync_origin(ctx)?;
        }
        if ops.configure {
            ctx.configure(self.git)?;
        }
        if ops.git {
            self.git.passthrough(&ctx.abs_local, self.git_args)?;
        }
        Ok(())
    }

    fn sync_origin(&self, ctx: &RepoContext) -> Result<()> {
        let url = ctx.git_url();
        match self.git.origin_url(&ctx.abs_local)? {
            Some(current) if current == url => {
                debug!("{}: origin already points to {}", ctx.display_path(), url);
                Ok(())
            }
            Some(_) => self.git.set_origin_url(&ctx.abs_local, &url),
            None => self.git.add_origin(&ctx.abs_local, &url),
        }
    }
}
