//! # Repository Operations
//!
//! Everything the engine does to a working copy goes through the
//! [`GitOperations`] trait. [`DefaultGitOperations`] forwards to the `git`
//! command line (see [`crate::git`]); tests substitute a recording mock so
//! the state machine and the bootstrapper can be exercised without touching
//! real repositories.
//!
//! The configure hook is not a git command, but it runs inside the working
//! copy at well-defined points of the repository lifecycle, so it lives on
//! the same seam.

use std::path::Path;

use crate::error::Result;

/// Trait for repository operations - allows mocking in tests
pub trait GitOperations: Send + Sync {
    /// Whether `dir` is the top of a working copy.
    fn is_repo_root(&self, dir: &Path) -> Result<bool>;

    /// Clone `url` into `target` without checking out files. Relative URLs
    /// and targets are resolved against `cwd`.
    fn clone_no_checkout(&self, cwd: &Path, url: &str, target: &Path) -> Result<()>;

    /// Populate the working tree after a `--no-checkout` clone.
    fn checkout(&self, dir: &Path) -> Result<()>;

    fn checkout_branch(&self, dir: &Path, branch: &str) -> Result<()>;

    fn init(&self, dir: &Path) -> Result<()>;

    /// The URL of `origin`, `None` when the remote does not exist.
    fn origin_url(&self, dir: &Path) -> Result<Option<String>>;

    fn set_origin_url(&self, dir: &Path, url: &str) -> Result<()>;

    /// Add `origin` and fetch it.
    fn add_origin(&self, dir: &Path, url: &str) -> Result<()>;

    fn fetch_origin(&self, dir: &Path) -> Result<()>;

    fn remote_branches(&self, dir: &Path) -> Result<Vec<String>>;

    /// The branch `origin`'s HEAD points to.
    fn remote_default_branch(&self, dir: &Path) -> Result<String>;

    /// Run an operator-supplied git command.
    fn passthrough(&self, dir: &Path, args: &[String]) -> Result<()>;

    /// Run the configure hook with `media` as its argument and `env` added
    /// to its environment.
    fn run_config_cmd(
        &self,
        dir: &Path,
        command: &str,
        media: &str,
        env: &[(String, String)],
    ) -> Result<()>;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command and `sh`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultGitOperations;

impl GitOperations for DefaultGitOperations {
    fn is_repo_root(&self, dir: &Path) -> Result<bool> {
        crate::git::is_repo_root(dir)
    }

    fn clone_no_checkout(&self, cwd: &Path, url: &str, target: &Path) -> Result<()> {
        crate::git::clone_no_checkout(cwd, url, target)
    }

    fn checkout(&self, dir: &Path) -> Result<()> {
        crate::git::checkout(dir)
    }

    fn checkout_branch(&self, dir: &Path, branch: &str) -> Result<()> {
        crate::git::checkout_branch(dir, branch)
    }

    fn init(&self, dir: &Path) -> Result<()> {
        crate::git::init(dir)
    }

    fn origin_url(&self, dir: &Path) -> Result<Option<String>> {
        crate::git::origin_url(dir)
    }

    fn set_origin_url(&self, dir: &Path, url: &str) -> Result<()> {
        crate::git::set_origin_url(dir, url)
    }

    fn add_origin(&self, dir: &Path, url: &str) -> Result<()> {
        crate::git::add_origin(dir, url)
    }

    fn fetch_origin(&self, dir: &Path) -> Result<()> {
        crate::git::fetch_origin(dir)
    }

    fn remote_branches(&self, dir: &Path) -> Result<Vec<String>> {
        crate::git::remote_branches(dir)
    }

    fn remote_default_branch(&self, dir: &Path) -> Result<String> {
        crate::git::remote_default_branch(dir)
    }

    fn passthrough(&self, dir: &Path, args: &[String]) -> Result<()> {
        crate::git::passthrough(dir, args)
    }

    fn run_config_cmd(
        &self,
        dir: &Path,
        command: &str,
        media: &str,
        env: &[(String, String)],
    ) -> Result<()> {
        crate::git::run_config_cmd(dir, command, media, env)
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use crate::error::Error;
    use std::collections::{HashMap, HashSet};
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// Records every mutating call as a short string.
    #[derive(Default, Clone)]
    pub(crate) struct MockGitOperations {
        pub calls: Arc<Mutex<Vec<String>>>,
        pub repo_roots: Arc<Mutex<HashSet<PathBuf>>>,
        pub origins: Arc<Mutex<HashMap<PathBuf, String>>>,
        pub branches: Vec<String>,
        pub passthrough_code: Option<i32>,
    }

    impl MockGitOperations {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_repo_root(self, dir: &Path) -> Self {
            self.repo_roots.lock().unwrap().insert(dir.to_path_buf());
            self
        }

        pub fn with_origin(self, dir: &Path, url: &str) -> Self {
            self.origins
                .lock()
                .unwrap()
                .insert(dir.to_path_buf(), url.to_string());
            self
        }

        pub fn with_branches(mut self, branches: &[&str]) -> Self {
            self.branches = branches.iter().map(|b| b.to_string()).collect();
            self
        }

        pub fn failing_passthrough(mut self, code: i32) -> Self {
            self.passthrough_code = Some(code);
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl GitOperations for MockGitOperations {
        fn is_repo_root(&self, dir: &Path) -> Result<bool> {
            Ok(self.repo_roots.lock().unwrap().contains(dir))
        }

        fn clone_no_checkout(&self, _cwd: &Path, url: &str, target: &Path) -> Result<()> {
            self.record(format!("clone {} {}", url, target.display()));
            std::fs::create_dir_all(target)?;
            self.repo_roots.lock().unwrap().insert(target.to_path_buf());
            Ok(())
        }

        fn checkout(&self, dir: &Path) -> Result<()> {
            self.record(format!("checkout {}", dir.display()));
            Ok(())
        }

        fn checkout_branch(&self, dir: &Path, branch: &str) -> Result<()> {
            self.record(format!("checkout {} {}", dir.display(), branch));
            Ok(())
        }

        fn init(&self, dir: &Path) -> Result<()> {
            self.record(format!("init {}", dir.display()));
            self.repo_roots.lock().unwrap().insert(dir.to_path_buf());
            Ok(())
        }

        fn origin_url(&self, dir: &Path) -> Result<Option<String>> {
            Ok(self.origins.lock().unwrap().get(dir).cloned())
        }

        fn set_origin_url(&self, dir: &Path, url: &str) -> Result<()> {
            self.record(format!("set-url {} {}", dir.display(), url));
            Ok(())
        }

        fn add_origin(&self, dir: &Path, url: &str) -> Result<()> {
            self.record(format!("add-origin {} {}", dir.display(), url));
            Ok(())
        }

        fn fetch_origin(&self, dir: &Path) -> Result<()> {
            self.record(format!("fetch {}", dir.display()));
            Ok(())
        }

        fn remote_branches(&self, _dir: &Path) -> Result<Vec<String>> {
            Ok(self.branches.clone())
        }

        fn remote_default_branch(&self, _dir: &Path) -> Result<String> {
            Ok(self
                .branches
                .first()
                .map(|b| b.trim_start_matches("origin/").to_string())
                .unwrap_or_default())
        }

        fn passthrough(&self, dir: &Path, args: &[String]) -> Result<()> {
            self.record(format!("git {} {}", dir.display(), args.join(" ")));
            match self.passthrough_code {
                Some(code) => Err(Error::Passthrough {
                    command: args.join(" "),
                    dir: dir.to_path_buf(),
                    code,
                }),
                None => Ok(()),
            }
        }

        fn run_config_cmd(
            &self,
            dir: &Path,
            command: &str,
            media: &str,
            _env: &[(String, String)],
        ) -> Result<()> {
            self.record(format!("configure {} {} {}", dir.display(), command, media));
            Ok(())
        }
    }
}
