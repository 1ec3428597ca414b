//! # Sub-Tree Discovery and Delegation
//!
//! After its own manifest, an invocation looks below the traversal root for
//! nested manifests. Every directory holding one is a recursion boundary: it
//! becomes a [`RecursionNode`] with a snapshot derived from the parent's,
//! and the walk does not descend into it, since the sub-tree's own worker
//! takes care of everything below.
//!
//! Dot-directories are never entered, which also keeps the walk out of
//! `.git`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::ConfigSnapshot;
use crate::error::{Error, Result};
use crate::mode::Mode;
use crate::path::relative_slash_path;

/// A directory holding its own manifest, with the snapshot it inherits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecursionNode {
    pub dir: PathBuf,
    /// Path from the parent's manifest directory, `/`-separated.
    pub rel: String,
    pub snapshot: ConfigSnapshot,
}

fn is_dot_dir(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

/// Find the recursion boundaries below `root`, in file-name order.
///
/// Each node's `rel` is measured from `base`, the directory of the manifest
/// the parent read, so sub-tree paths line up with the parent's entries
/// whichever directory below it the walk starts from.
pub fn discover(
    root: &Path,
    base: &Path,
    list_fn: &str,
    parent: &ConfigSnapshot,
) -> Result<Vec<RecursionNode>> {
    let mut nodes = Vec::new();
    let mut walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.file_type().is_dir() && !is_dot_dir(e));

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable directory: {}", e);
                continue;
            }
        };
        if !entry.path().join(list_fn).is_file() {
            continue;
        }

        let rel = relative_slash_path(base, entry.path())
            .or_else(|| relative_slash_path(root, entry.path()))
            .unwrap_or_default();
        debug!("Found {} in {}", list_fn, rel);
        nodes.push(RecursionNode {
            dir: entry.path().to_path_buf(),
            snapshot: parent.derive_child(&rel),
            rel,
        });
        walker.skip_current_dir();
    }

    Ok(nodes)
}

/// Re-runs the current executable in a sub-tree, streaming it the
/// sub-tree's snapshot.
#[derive(Debug, Clone)]
pub struct ProcessWorker {
    exe: PathBuf,
    /// Global options repeated on every worker's command line.
    global_args: Vec<String>,
    mode: Mode,
    trailing_args: Vec<String>,
}

impl ProcessWorker {
    pub fn new(exe: PathBuf, global_args: Vec<String>, mode: Mode, trailing_args: Vec<String>) -> Self {
        Self {
            exe,
            global_args,
            mode,
            trailing_args,
        }
    }

    /// A worker re-running the binary of the current process.
    pub fn current(global_args: Vec<String>, mode: Mode, trailing_args: Vec<String>) -> Result<Self> {
        Ok(Self::new(std::env::current_exe()?, global_args, mode, trailing_args))
    }

    /// The worker's arguments, after the program name.
    pub fn args(&self) -> Vec<String> {
        let mut args = self.global_args.clone();
        args.push("--config-stdin".to_string());
        args.push(self.mode.as_arg().to_string());
        if !self.trailing_args.is_empty() {
            args.push("--".to_string());
            args.extend(self.trailing_args.iter().cloned());
        }
        args
    }

    /// Run the worker for `node` and wait for it.
    pub fn run(&self, node: &RecursionNode) -> Result<()> {
        let stream = node.snapshot.to_stream()?;
        debug!(
            "Delegating {} to {} {}",
            node.dir.display(),
            self.exe.display(),
            self.args().join(" ")
        );

        let mut child = Command::new(&self.exe)
            .args(self.args())
            .current_dir(&node.dir)
            .stdin(Stdio::piped())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            // A worker that exits early closes its end; its status tells the rest.
            if let Err(e) = stdin.write_all(stream.as_bytes()) {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(e.into());
                }
            }
        }
        let status = child.wait()?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::Recursion {
                dir: node.dir.clone(),
                code: status.code(),
            })
        }
    }
}
