//! End-to-end tests for the list modes.
//!
//! List modes print one line per entry before anything is observed on
//! disk, so these run without git and without the listed directories.

mod common;
use common::prelude::*;

fn tree() -> TestFixture {
    TestFixture::new()
        .with_conffile(conffiles::MINIMAL)
        .with_manifest("", "alpha\ngroup/beta.git * b\n# retired\n")
        .with_manifest("sub", "gamma.git\n")
        .with_manifest("sub/nested", "delta\n")
}

#[test]
fn test_list_lrel_recurses_into_sub_trees() {
    let fixture = tree();

    fixture
        .command()
        .arg("list-lrel")
        .assert()
        .success()
        .stdout("alpha\nb\nsub/gamma\nsub/nested/delta\n");
}

#[test]
fn test_list_rrel_prefixes_remote_paths() {
    let fixture = tree();

    fixture
        .command()
        .arg("list-rrel")
        .assert()
        .success()
        .stdout("alpha\ngroup/beta.git\nsub/gamma.git\nsub/nested/delta\n");
}

#[test]
fn test_list_rurl_uses_remote_base_url() {
    let fixture = TestFixture::new()
        .with_conffile("*LIST_FN*.grm.repos\n*REMOTE_BASE_URL*https://git.example.com/org/\n")
        .with_manifest("", "tools/grm\n");

    fixture
        .command()
        .arg("list-rurl")
        .assert()
        .success()
        .stdout("https://git.example.com/org/tools/grm\n");
}

#[test]
fn test_list_rurl_with_login() {
    let fixture = TestFixture::new()
        .with_conffile(
            "*LIST_FN*.grm.repos\n*RLOGIN*ssh://git@host.example\n*RPATH_BASE*/srv/git\n",
        )
        .with_manifest("", "tools/grm\n");

    fixture
        .command()
        .arg("list-rurl")
        .assert()
        .success()
        .stdout("ssh://git@host.example/srv/git/tools/grm.git\n");
}

#[test]
fn test_manifest_assignments_apply_to_following_lines() {
    let fixture = TestFixture::new()
        .with_conffile(conffiles::MINIMAL)
        .with_manifest("", "first\n*LOCAL_DIR*checkouts\nsecond\n");

    fixture
        .command()
        .arg("list-lrel")
        .assert()
        .success()
        .stdout("first\ncheckouts/second\n");
}

#[test]
fn test_separator_switch_in_manifest() {
    let fixture = TestFixture::new()
        .with_conffile(conffiles::MINIMAL)
        .with_manifest("", "a*x\n*LIST_SEP*|\nb*c|y\n");

    fixture
        .command()
        .arg("list-lrel")
        .assert()
        .success()
        .stdout("x\ny\n");
}

#[test]
fn test_tree_filter_limits_entries_to_invocation_directory() {
    let fixture = tree().with_dir("alpha/src");

    fixture
        .command_in("alpha/src")
        .arg("list-lrel")
        .assert()
        .success()
        .stdout("");

    fixture
        .command_in("alpha")
        .arg("list-lrel")
        .assert()
        .success()
        .stdout("alpha\n");
}

#[test]
fn test_nearest_manifest_wins() {
    let fixture = tree();

    fixture
        .command_in("sub")
        .arg("list-lrel")
        .assert()
        .success()
        .stdout("gamma\nnested/delta\n");
}

#[test]
fn test_recursion_disabled_in_conffile() {
    let fixture = tree().with_conffile(conffiles::NO_RECURSE);

    fixture
        .command()
        .arg("list-lrel")
        .assert()
        .success()
        .stdout("alpha\nb\n");
}

#[test]
fn test_recursion_disabled_from_environment() {
    let fixture = tree();

    fixture
        .command()
        .env("GRM_OPT_RECURSE", "")
        .arg("list-lrel")
        .assert()
        .success()
        .stdout("alpha\nb\n");
}

#[test]
fn test_path_roots_are_not_inherited_by_sub_trees() {
    let fixture = TestFixture::new()
        .with_conffile(conffiles::MINIMAL)
        .with_manifest("", "*LOCAL_DIR*co\nalpha\n")
        .with_manifest("sub", "gamma\n");

    fixture
        .command()
        .arg("list-lrel")
        .assert()
        .success()
        .stdout("co/alpha\nsub/gamma\n");
}

#[test]
fn test_sub_tree_paths_do_not_depend_on_invocation_directory() {
    let fixture = TestFixture::new()
        .with_conffile(conffiles::MINIMAL)
        .with_manifest("", "b.git * nested/b\n")
        .with_manifest("nested/deeper", "c.git\n");

    fixture
        .command()
        .arg("list-lrel")
        .assert()
        .success()
        .stdout("nested/b\nnested/deeper/c\n");

    fixture
        .command_in("nested")
        .arg("list-lrel")
        .assert()
        .success()
        .stdout("nested/b\nnested/deeper/c\n");
}
