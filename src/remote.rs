//! Remote URL construction.
//!
//! A manifest entry only names a path relative to the remote root. How that
//! path becomes something `git clone` understands depends on which settings
//! are defined, checked in order:
//!
//! 1. `RLOGIN` holding a URL with an explicit scheme (`ssh://git@host`,
//!    `https://host`): the login, then `RPATH_BASE`, then the remote path,
//!    always ending in `.git`;
//! 2. `REMOTE_BASE_URL`: that base joined with the remote path;
//! 3. otherwise the remote path itself, a filesystem remote resolved
//!    relative to the manifest directory.

use url::Url;

use crate::config::ConfigSnapshot;
use crate::defaults::keys;
use crate::path::{cat_path, with_git_suffix};

/// Parse a login, accepting it only when it carries an explicit scheme.
pub fn parse_login(login: &str) -> Option<Url> {
    Url::parse(login).ok().filter(|url| !url.scheme().is_empty())
}

/// The URL a repository at `remote_path` is cloned from and pushed to.
pub fn remote_url(snapshot: &ConfigSnapshot, remote_path: &str) -> String {
    let login = snapshot.str_or_empty(keys::RLOGIN);
    if parse_login(login).is_some() {
        let path = cat_path(&[snapshot.str_or_empty(keys::RPATH_BASE), remote_path]);
        return format!(
            "{}/{}",
            login.trim_end_matches('/'),
            with_git_suffix(path.trim_start_matches('/'))
        );
    }

    match snapshot.get_str(keys::REMOTE_BASE_URL) {
        Some(base) if !base.is_empty() => format!(
            "{}/{}",
            base.trim_end_matches('/'),
            remote_path.trim_start_matches('/')
        ),
        _ => remote_path.to_string(),
    }
}
