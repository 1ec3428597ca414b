//! # grm
//!
//! This library keeps a tree of Git working copies in line with the
//! manifests that describe it. It is used by the `grm` and `grm-bootstrap`
//! command-line tools.
//!
//! ## Quick Example
//!
//! ```
//! use grm::manifest::{ManifestLine, Tokenizer};
//!
//! let tokenizer = Tokenizer::default();
//! let line = tokenizer.parse_line("tools/grm.git * grm  # the manager").unwrap();
//!
//! match line {
//!     Some(ManifestLine::Entry(entry)) => {
//!         assert_eq!(entry.remote_rel, "tools/grm.git");
//!         assert_eq!(entry.local_rel, "grm");
//!         assert_eq!(entry.media_rel, "grm");
//!     }
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```
//!
//! ## Core Concepts
//!
//! - **Manifests (`manifest`)**: `*`-separated lines naming a remote path,
//!   a local path and a media path, or assigning a configuration value.
//! - **Configuration (`config`)**: A layered snapshot built from defaults,
//!   `GRM_*` variables, the `.grm.conf` conffile and manifest assignments.
//!   It is serialized in manifest syntax to hand a sub-tree to a worker.
//! - **Modes (`mode`)**: The command-line operation, expanded into the
//!   primitive flags the rest of the engine reads.
//! - **Entries (`state`)**: Each entry's local path is observed and a
//!   decision taken: clone, update, bootstrap, or report.
//! - **Remotes (`remote`, `bootstrap`)**: URL construction and creation of
//!   new remote repositories from a template.
//! - **Recursion (`walker`, `orchestrator`)**: Nested manifests below the
//!   invocation directory are processed as sub-trees.

pub mod bootstrap;
pub mod config;
pub mod defaults;
pub mod error;
pub mod git;
pub mod manifest;
pub mod mode;
pub mod orchestrator;
pub mod output;
pub mod path;
pub mod remote;
pub mod repository;
pub mod state;
pub mod walker;

#[cfg(test)]
mod path_proptest;
