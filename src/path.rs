//! Path composition utilities for grm
//!
//! Manifest fields and configuration roots are plain strings using `/` as the
//! separator. They are composed with [`cat_path`], which lets an absolute
//! component override everything to its left, so a root configured as an
//! absolute path wins over the relative position it is composed under.

use std::path::{Component, Path, PathBuf};

/// Compose path segments, right to left, stopping at the first absolute one.
///
/// Empty and `.` segments are dropped and a leading `./` is stripped from
/// each remaining segment before joining with `/`.
///
/// ```
/// use grm::path::cat_path;
///
/// assert_eq!(cat_path(&["/a", "b", "c"]), "/a/b/c");
/// assert_eq!(cat_path(&["x", "/y", "z"]), "/y/z");
/// assert_eq!(cat_path(&["", "./lib", "core"]), "lib/core");
/// ```
pub fn cat_path<S: AsRef<str>>(parts: &[S]) -> String {
    let mut result = String::new();

    for part in parts.iter().rev() {
        let part = strip_dot_slash(part.as_ref());
        if part.is_empty() {
            continue;
        }

        result = if result.is_empty() {
            part.to_string()
        } else {
            format!("{}/{}", part.trim_end_matches('/'), result)
        };

        if part.starts_with('/') {
            break;
        }
    }

    result
}

fn strip_dot_slash(part: &str) -> &str {
    let stripped = part.trim_start_matches("./");
    if stripped == "." {
        ""
    } else {
        stripped
    }
}

/// Lexically normalize a path, resolving `.` and `..` without touching the
/// filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Whether `path` is `filter` itself or lies below it.
pub fn is_within(path: &Path, filter: &Path) -> bool {
    normalize(path).starts_with(normalize(filter))
}

/// The default local and media name for a remote path: its last segment
/// with a trailing `.git` removed.
pub fn basename_without_git(remote: &str) -> String {
    let segment = remote
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();

    match segment.strip_suffix(".git") {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => segment.to_string(),
    }
}

/// Append `.git` unless the path already ends with it.
pub fn with_git_suffix(path: &str) -> String {
    if path.ends_with(".git") {
        path.to_string()
    } else {
        format!("{}.git", path)
    }
}

/// The `/`-joined path of `dir` relative to `root`, or `None` if `dir` is
/// not below `root`.
pub fn relative_slash_path(root: &Path, dir: &Path) -> Option<String> {
    let rel = dir.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

/// Extend a recursion prefix, keeping it free of leading and trailing
/// slashes.
pub fn join_prefix(prefix: &str, rel: &str) -> String {
    cat_path(&[prefix, rel]).trim_matches('/').to_string()
}
