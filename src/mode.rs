//! Operating modes and the operation flags each one implies.
//!
//! The mode is chosen on the command line and recorded in the configuration
//! snapshot as `MODE_*` flags, which always win over anything a manifest
//! says. [`Operations`] is read back from those flags, so a snapshot carries
//! everything the state machine needs.

use clap::ValueEnum;

use crate::config::ConfigSnapshot;
use crate::defaults::keys;

/// Primary operation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Clone missing repositories and configure them
    Clone,
    /// Update remotes, configure, then run a git command in every repository
    Git,
    /// Point each repository's origin at its manifest URL
    SetRemote,
    /// Run the configure hook in every repository
    Configure,
    /// List remote-relative paths
    ListRrel,
    /// List remote URLs
    ListRurl,
    /// List local-relative paths
    ListLrel,
    /// Clone, update remotes and configure
    Run,
    /// Create brand-new remote repositories for plain directories
    New,
}

impl Mode {
    /// The command-line spelling of the mode.
    pub fn as_arg(&self) -> &'static str {
        match self {
            Mode::Clone => "clone",
            Mode::Git => "git",
            Mode::SetRemote => "set-remote",
            Mode::Configure => "configure",
            Mode::ListRrel => "list-rrel",
            Mode::ListRurl => "list-rurl",
            Mode::ListLrel => "list-lrel",
            Mode::Run => "run",
            Mode::New => "new",
        }
    }

    /// The `MODE_*` flags this mode sets.
    pub fn flags(&self) -> &'static [&'static str] {
        match self {
            Mode::Clone => &[keys::MODE_CLONE, keys::MODE_CONFIGURE],
            Mode::Git => &[keys::MODE_GIT, keys::MODE_SET_REMOTE, keys::MODE_CONFIGURE],
            Mode::SetRemote => &[keys::MODE_SET_REMOTE],
            Mode::Configure => &[keys::MODE_CONFIGURE],
            Mode::ListRrel => &[keys::MODE_LIST_RREL],
            Mode::ListRurl => &[keys::MODE_LIST_RURL],
            Mode::ListLrel => &[keys::MODE_LIST_LREL],
            Mode::Run => &[keys::MODE_CLONE, keys::MODE_SET_REMOTE, keys::MODE_CONFIGURE],
            Mode::New => &[keys::MODE_NEW],
        }
    }

    /// Whether trailing command-line arguments are meaningful.
    pub fn takes_git_args(&self) -> bool {
        matches!(self, Mode::Git)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_arg())
    }
}

/// Which listing a list mode prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    RemoteRel,
    RemoteUrl,
    LocalRel,
}

/// Operations that can be performed on repositories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Operations {
    /// Clone the repository if it doesn't exist
    pub clone: bool,
    /// Run the configure hook
    pub configure: bool,
    /// Update the origin URL
    pub set_remote: bool,
    /// Pass a git command through to every repository
    pub git: bool,
    /// Bootstrap new remote repositories
    pub new: bool,
    pub listing: Option<Listing>,
}

impl Operations {
    /// Read the operation flags recorded in a snapshot.
    pub fn from_snapshot(snapshot: &ConfigSnapshot) -> Self {
        let listing = if snapshot.flag(keys::MODE_LIST_RREL) {
            Some(Listing::RemoteRel)
        } else if snapshot.flag(keys::MODE_LIST_RURL) {
            Some(Listing::RemoteUrl)
        } else if snapshot.flag(keys::MODE_LIST_LREL) {
            Some(Listing::LocalRel)
        } else {
            None
        };

        let clone = snapshot.flag(keys::MODE_CLONE);
        Self {
            clone,
            configure: clone || snapshot.flag(keys::MODE_CONFIGURE),
            set_remote: snapshot.flag(keys::MODE_SET_REMOTE),
            git: snapshot.flag(keys::MODE_GIT),
            new: snapshot.flag(keys::MODE_NEW),
            listing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(mode: Mode) -> Operations {
        Operations::from_snapshot(&ConfigSnapshot::defaults().with_mode(mode))
    }

    #[test]
    fn test_run_implies_clone_set_remote_configure() {
        let ops = ops(Mode::Run);
        assert!(ops.clone && ops.set_remote && ops.configure);
        assert!(!ops.git && !ops.new);
        assert_eq!(ops.listing, None);
    }

    #[test]
    fn test_git_implies_set_remote_and_configure() {
        let ops = ops(Mode::Git);
        assert!(ops.git && ops.set_remote && ops.configure);
        assert!(!ops.clone);
    }

    #[test]
    fn test_clone_implies_configure() {
        let ops = ops(Mode::Clone);
        assert!(ops.clone && ops.configure);
        assert!(!ops.set_remote);
    }

    #[test]
    fn test_clone_flag_alone_implies_configure() {
        let snapshot = ConfigSnapshot::defaults().with_flag(keys::MODE_CLONE, true);
        assert!(Operations::from_snapshot(&snapshot).configure);
    }

    #[test]
    fn test_list_modes() {
        assert_eq!(ops(Mode::ListRrel).listing, Some(Listing::RemoteRel));
        assert_eq!(ops(Mode::ListRurl).listing, Some(Listing::RemoteUrl));
        assert_eq!(ops(Mode::ListLrel).listing, Some(Listing::LocalRel));
        assert_eq!(ops(Mode::ListLrel).clone, false);
    }

    #[test]
    fn test_mode_display_matches_value_enum() {
        for mode in Mode::value_variants() {
            let parsed = Mode::from_str(mode.as_arg(), false).unwrap();
            assert_eq!(&parsed, mode);
            assert_eq!(mode.to_string(), mode.as_arg());
        }
    }
}
