//! Default values for grm configuration.
//!
//! This module provides centralized default values and well-known key names
//! used across the engine, ensuring consistency and avoiding duplication.

/// Name of the conffile marking the root of a managed tree.
pub const CONFFILE_NAME: &str = ".grm.conf";

/// Prefix of process environment variables that overlay configuration keys.
pub const ENV_PREFIX: &str = "GRM_";

/// Field separator used in manifests unless `LIST_SEP` says otherwise.
pub const DEFAULT_SEPARATOR: char = '*';

/// Login used by the bootstrapper when `RLOGIN` is defined but empty.
pub const LOOPBACK_LOGIN: &str = "ssh://localhost";

/// Name of the remote every managed repository is wired to.
pub const ORIGIN: &str = "origin";

/// Well-known configuration keys.
pub mod keys {
    pub const LIST_FN: &str = "LIST_FN";
    pub const LIST_SEP: &str = "LIST_SEP";
    pub const CONFIG_CMD: &str = "CONFIG_CMD";
    pub const RPATH_BASE: &str = "RPATH_BASE";
    pub const RPATH_TEMPLATE: &str = "RPATH_TEMPLATE";
    pub const RLOGIN: &str = "RLOGIN";
    pub const REMOTE_BASE_URL: &str = "REMOTE_BASE_URL";
    pub const GM_BASE_PATH: &str = "GM_BASE_PATH";
    pub const RECURSE_PREFIX: &str = "RECURSE_PREFIX";

    pub const REMOTE_DIR: &str = "REMOTE_DIR";
    pub const LOCAL_DIR: &str = "LOCAL_DIR";
    pub const GM_DIR: &str = "GM_DIR";

    pub const OPT_RECURSE: &str = "OPT_RECURSE";
    pub const OPT_DEBUG_PRIMITIVES: &str = "OPT_DEBUG_PRIMITIVES";

    pub const MODE_CLONE: &str = "MODE_CLONE";
    pub const MODE_CONFIGURE: &str = "MODE_CONFIGURE";
    pub const MODE_SET_REMOTE: &str = "MODE_SET_REMOTE";
    pub const MODE_GIT: &str = "MODE_GIT";
    pub const MODE_NEW: &str = "MODE_NEW";
    pub const MODE_LIST_RREL: &str = "MODE_LIST_RREL";
    pub const MODE_LIST_RURL: &str = "MODE_LIST_RURL";
    pub const MODE_LIST_LREL: &str = "MODE_LIST_LREL";

    /// Keys recomputed from each process's own position in the tree.
    pub const PATH_ROOTS: [&str; 3] = [REMOTE_DIR, LOCAL_DIR, GM_DIR];
}
