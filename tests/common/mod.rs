//! Shared test utilities for E2E tests.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new()
//!         .with_conffile(conffiles::MINIMAL)
//!         .with_manifest("", "alpha\n");
//!     fixture.command().arg("list-lrel").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::Path;
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::conffiles;
    #[allow(unused_imports)]
    pub use super::{git_available, init_bare_remote};
    pub use super::TestFixture;
}

/// Common conffile contents.
#[allow(dead_code)]
pub mod conffiles {
    /// Names the manifest and nothing else.
    pub const MINIMAL: &str = "*LIST_FN*.grm.repos\n";

    /// Names the manifest and disables recursion.
    pub const NO_RECURSE: &str = "*LIST_FN*.grm.repos\n*OPT_RECURSE*\n";

    /// A conffile that forgets the manifest name.
    pub const WITHOUT_LIST_FN: &str = "# nothing here\n*OPT_RECURSE*1\n";
}

/// Name of the manifest used by every fixture.
pub const MANIFEST: &str = ".grm.repos";

/// Whether a `git` binary can be run.
#[allow(dead_code)]
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

#[allow(dead_code)]
fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(["-c", "user.name=grm", "-c", "user.email=grm@example.invalid"])
        .args(args)
        .current_dir(dir)
        .status()
        .expect("Failed to run git");
    assert!(status.success(), "git {:?} failed in {}", args, dir.display());
}

/// Create a bare repository at `bare` holding one commit with a README.
#[allow(dead_code)]
pub fn init_bare_remote(bare: &Path) {
    let seed = assert_fs::TempDir::new().expect("Failed to create temp directory");
    git(seed.path(), &["init", "-q"]);
    seed.child("README").write_str("seed\n").expect("Failed to write README");
    git(seed.path(), &["add", "README"]);
    git(seed.path(), &["commit", "-q", "-m", "seed"]);

    std::fs::create_dir_all(bare.parent().expect("bare path has a parent"))
        .expect("Failed to create remote root");
    let bare = bare.to_str().expect("temp paths are UTF-8");
    git(seed.path(), &["clone", "-q", "--bare", ".", bare]);
}

/// A temporary tree with a conffile and manifests.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a `.grm.conf` with the given content at the root.
    pub fn with_conffile(self, content: &str) -> Self {
        self.with_file(".grm.conf", content)
    }

    /// Add a manifest in `dir` (relative to the root, `""` for the root).
    pub fn with_manifest(self, dir: &str, content: &str) -> Self {
        let path = if dir.is_empty() {
            MANIFEST.to_string()
        } else {
            format!("{}/{}", dir, MANIFEST)
        };
        self.with_file(&path, content)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Add an empty directory.
    #[allow(dead_code)]
    pub fn with_dir(self, path: &str) -> Self {
        self.temp_dir
            .child(path)
            .create_dir_all()
            .expect("Failed to create directory");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    /// A `grm` command run at the root, with no `GRM_*` settings leaking in
    /// from the environment running the tests.
    pub fn command(&self) -> assert_cmd::Command {
        self.command_in("")
    }

    /// A `grm` command run in `dir`, relative to the root.
    pub fn command_in(&self, dir: &str) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("grm");
        cmd.current_dir(self.path().join(dir));
        scrub_env(&mut cmd);
        cmd.args(["--color", "never"]);
        cmd
    }

    /// A `grm-bootstrap` command run at the root.
    #[allow(dead_code)]
    pub fn bootstrap_command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("grm-bootstrap");
        cmd.current_dir(self.path());
        scrub_env(&mut cmd);
        cmd.args(["--color", "never"]);
        cmd
    }
}

fn scrub_env(cmd: &mut assert_cmd::Command) {
    for (name, _) in std::env::vars() {
        if name.starts_with("GRM_") {
            cmd.env_remove(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_fixture_with_nested_manifest() {
        let fixture = TestFixture::new().with_manifest("sub/deeper", "x\n");
        assert!(fixture.path().join("sub/deeper/.grm.repos").is_file());
    }
}
