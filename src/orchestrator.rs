//! Orchestrator for a complete invocation
//!
//! An invocation processes one manifest and then the sub-trees below it:
//!
//! 1. the selected mode's flags are laid over the seeded snapshot;
//! 2. the manifest nearest to the invocation directory is read line by line,
//!    assignments updating the snapshot for everything that follows;
//! 3. every entry whose local path lies inside the invocation directory is
//!    handed to the [`EntryProcessor`];
//! 4. when `OPT_RECURSE` is set, nested manifests are discovered and each
//!    sub-tree is delegated, one after the other, either to a separate
//!    process or to this engine again.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use log::{debug, log, Level};

use crate::bootstrap::Bootstrapper;
use crate::config::{find_manifest_dir, ConfigSnapshot};
use crate::defaults::keys;
use crate::error::{Error, Result};
use crate::manifest::ManifestLine;
use crate::mode::Mode;
use crate::path::{is_within, normalize};
use crate::repository::GitOperations;
use crate::state::{EntryOutcome, EntryProcessor, RepoContext};
use crate::walker::{discover, ProcessWorker};

/// How sub-trees are handed off.
#[derive(Debug, Clone)]
pub enum Delegation {
    /// Re-run the binary in the sub-tree, streaming the derived snapshot.
    Process(ProcessWorker),
    /// Recurse within this process.
    InProcess,
}

/// Entry counts for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub listed: usize,
    pub cloned: usize,
    pub updated: usize,
    pub bootstrapped: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Sub-trees delegated to workers.
    pub subtrees: usize,
}

impl Summary {
    pub fn record(&mut self, outcome: EntryOutcome) {
        let counter = match outcome {
            EntryOutcome::Listed => &mut self.listed,
            EntryOutcome::Cloned => &mut self.cloned,
            EntryOutcome::Updated => &mut self.updated,
            EntryOutcome::Bootstrapped => &mut self.bootstrapped,
            EntryOutcome::Skipped => &mut self.skipped,
            EntryOutcome::Failed => &mut self.failed,
        };
        *counter += 1;
    }

    pub fn merge(&mut self, other: Summary) {
        self.listed += other.listed;
        self.cloned += other.cloned;
        self.updated += other.updated;
        self.bootstrapped += other.bootstrapped;
        self.skipped += other.skipped;
        self.failed += other.failed;
        self.subtrees += other.subtrees;
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cloned, {} updated, {} created, {} skipped, {} failed",
            self.cloned, self.updated, self.bootstrapped, self.skipped, self.failed
        )?;
        if self.subtrees > 0 {
            write!(f, ", {} sub-trees delegated", self.subtrees)?;
        }
        Ok(())
    }
}

/// Runs a mode over a tree.
pub struct Engine {
    mode: Mode,
    git_args: Vec<String>,
    git: Box<dyn GitOperations>,
    bootstrapper: Bootstrapper,
    delegation: Delegation,
}

impl Engine {
    pub fn new(
        mode: Mode,
        git_args: Vec<String>,
        git: Box<dyn GitOperations>,
        bootstrapper: Bootstrapper,
        delegation: Delegation,
    ) -> Self {
        Self {
            mode,
            git_args,
            git,
            bootstrapper,
            delegation,
        }
    }

    /// Process the tree rooted at `cwd`, writing listings to `out`.
    ///
    /// `snapshot` holds every layer below the mode flags.
    pub fn run(&self, cwd: &Path, snapshot: ConfigSnapshot, out: &mut dyn Write) -> Result<Summary> {
        let summary = self.process_tree(cwd, snapshot, out)?;
        out.flush()?;

        let level = if summary.listed > 0 {
            Level::Debug
        } else {
            Level::Info
        };
        log!(level, "{}: {}", cwd.display(), summary);
        Ok(summary)
    }

    fn process_tree(
        &self,
        cwd: &Path,
        snapshot: ConfigSnapshot,
        out: &mut dyn Write,
    ) -> Result<Summary> {
        let mut snapshot = snapshot.with_mode(self.mode);
        let manifest_dir = find_manifest_dir(cwd, snapshot.list_fn()?)?;
        let manifest_path = manifest_dir.join(snapshot.list_fn()?);
        let filter = normalize(cwd);
        debug!("Processing {}", manifest_path.display());

        let processor = EntryProcessor {
            git: self.git.as_ref(),
            bootstrapper: &self.bootstrapper,
            git_args: &self.git_args,
        };
        let mut summary = Summary::default();
        let mut tokenizer = snapshot.tokenizer()?;
        let reader = BufReader::new(File::open(&manifest_path)?);

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let parsed = tokenizer.parse_line(&line).map_err(|source| Error::Manifest {
                source_name: manifest_path.display().to_string(),
                line: index + 1,
                source,
            })?;

            match parsed {
                None => {}
                Some(ManifestLine::Assignment { key, value }) => {
                    snapshot.assign(&key, &value);
                    if key == keys::LIST_SEP {
                        tokenizer = snapshot.tokenizer()?;
                    }
                }
                Some(ManifestLine::Entry(entry)) => {
                    let ctx = RepoContext::new(entry, &manifest_dir, &snapshot);
                    if !is_within(&ctx.abs_local, &filter) {
                        debug!("{} is outside {}", ctx.abs_local.display(), filter.display());
                        continue;
                    }
                    summary.record(processor.process(&ctx, out)?);
                }
            }
        }

        if snapshot.flag(keys::OPT_RECURSE) {
            out.flush()?;
            for node in discover(cwd, &manifest_dir, snapshot.list_fn()?, &snapshot)? {
                summary.subtrees += 1;
                match &self.delegation {
                    Delegation::Process(worker) => worker.run(&node)?,
                    Delegation::InProcess => {
                        let nested = self.process_tree(&node.dir, node.snapshot, out)?;
                        summary.merge(nested);
                    }
                }
            }
        }

        Ok(summary)
    }
}
