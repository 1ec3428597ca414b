//! # Configuration Snapshots
//!
//! Configuration is a flat mapping from uppercase keys to string or boolean
//! values. A [`ConfigSnapshot`] is seeded in layers, later layers overriding
//! earlier ones:
//!
//! 1. built-in defaults ([`ConfigSnapshot::defaults`]);
//! 2. `GRM_<KEY>` process environment variables ([`ConfigSnapshot::overlay_env`]);
//! 3. the root configuration, either the `.grm.conf` conffile found above
//!    the invocation directory ([`ConfigSnapshot::load_conffile`]) or the
//!    serialized snapshot a parent process streams to a sub-tree worker
//!    ([`ConfigSnapshot::read_stream`]);
//! 4. assignment lines of the manifest being processed ([`ConfigSnapshot::assign`]);
//! 5. the `MODE_*` flags of the selected mode ([`ConfigSnapshot::with_mode`]).
//!
//! ## Key classes
//!
//! Keys fall into four classes (see [`KeyClass`]). Path roots and mode flags
//! describe a single process's position and intent, so they are dropped
//! whenever a snapshot crosses a process boundary ([`ConfigSnapshot::redacted`],
//! [`ConfigSnapshot::derive_child`]).

use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::defaults::{keys, CONFFILE_NAME, DEFAULT_SEPARATOR, ENV_PREFIX};
use crate::error::{Error, ManifestError, Result};
use crate::manifest::{ManifestLine, Tokenizer};
use crate::mode::Mode;
use crate::path::join_prefix;

/// A configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Str(String),
    Bool(bool),
}

impl ConfigValue {
    /// The value as it is written to manifests and the environment.
    ///
    /// Booleans serialize as `1` and the empty string.
    pub fn as_str(&self) -> &str {
        match self {
            ConfigValue::Str(s) => s,
            ConfigValue::Bool(true) => "1",
            ConfigValue::Bool(false) => "",
        }
    }

    /// Truthiness: booleans as-is, strings when non-empty.
    pub fn is_true(&self) -> bool {
        match self {
            ConfigValue::Str(s) => !s.is_empty(),
            ConfigValue::Bool(b) => *b,
        }
    }
}

/// How a key behaves across layers and process boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass {
    /// `REMOTE_DIR`, `LOCAL_DIR`, `GM_DIR`
    PathRoot,
    /// `MODE_*`
    Mode,
    /// `OPT_*`, coerced to booleans
    Option,
    /// Everything else
    Setting,
}

impl KeyClass {
    pub fn of(key: &str) -> Self {
        if keys::PATH_ROOTS.contains(&key) {
            KeyClass::PathRoot
        } else if key.starts_with("MODE_") {
            KeyClass::Mode
        } else if key.starts_with("OPT_") {
            KeyClass::Option
        } else {
            KeyClass::Setting
        }
    }

    /// Whether keys of this class are dropped at process boundaries.
    pub fn is_redacted(&self) -> bool {
        matches!(self, KeyClass::PathRoot | KeyClass::Mode)
    }
}

/// An immutable-by-convention set of configuration values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigSnapshot {
    values: BTreeMap<String, ConfigValue>,
}

impl ConfigSnapshot {
    /// Built-in defaults: recursion enabled, `*` as separator.
    pub fn defaults() -> Self {
        let mut values = BTreeMap::new();
        values.insert(keys::OPT_RECURSE.to_string(), ConfigValue::Bool(true));
        values.insert(
            keys::LIST_SEP.to_string(),
            ConfigValue::Str(DEFAULT_SEPARATOR.to_string()),
        );
        Self { values }
    }

    /// Overlay `GRM_<KEY>` variables. Path roots and mode flags are never
    /// taken from the environment.
    pub fn overlay_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (name, value) in vars {
            let Some(key) = name.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            if key.is_empty() || KeyClass::of(key).is_redacted() {
                continue;
            }
            self.set(key, value.as_ref());
        }
        self
    }

    /// Defaults overlaid with the current process environment.
    pub fn from_process_env() -> Self {
        Self::defaults().overlay_env(std::env::vars())
    }

    /// Merge the assignments of a conffile.
    pub fn load_conffile(self, path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let file = std::fs::File::open(path)?;
        let tokenizer = self.tokenizer()?;
        self.merge_assignments(
            std::io::BufReader::new(file),
            &path.display().to_string(),
            tokenizer,
        )
    }

    /// Merge a snapshot serialized by [`ConfigSnapshot::to_stream`].
    ///
    /// The whole stream is consumed before returning.
    pub fn read_stream<R: BufRead>(self, reader: R) -> Result<Self> {
        self.merge_assignments(reader, "<stdin>", Tokenizer::default())
    }

    fn merge_assignments<R: BufRead>(
        mut self,
        reader: R,
        source_name: &str,
        mut tokenizer: Tokenizer,
    ) -> Result<Self> {
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let parse_error = |source| Error::Manifest {
                source_name: source_name.to_string(),
                line: index + 1,
                source,
            };

            match tokenizer.parse_line(&line).map_err(parse_error)? {
                None => {}
                Some(ManifestLine::Assignment { key, value }) => {
                    self.assign(&key, &value);
                    if key == keys::LIST_SEP {
                        tokenizer = self.tokenizer()?;
                    }
                }
                Some(ManifestLine::Entry(_)) => {
                    return Err(parse_error(ManifestError::UnexpectedEntry));
                }
            }
        }
        Ok(self)
    }

    /// Apply an assignment read from a conffile or manifest.
    ///
    /// `MODE_*` keys are owned by the command line and are ignored here.
    pub fn assign(&mut self, key: &str, value: &str) {
        if KeyClass::of(key) == KeyClass::Mode {
            warn!("Ignoring assignment to {} (modes are set on the command line)", key);
            return;
        }
        self.set(key, value);
    }

    fn set(&mut self, key: &str, value: &str) {
        let value = match KeyClass::of(key) {
            KeyClass::Option | KeyClass::Mode => ConfigValue::Bool(!value.is_empty()),
            KeyClass::PathRoot | KeyClass::Setting => ConfigValue::Str(value.to_string()),
        };
        self.values.insert(key.to_string(), value);
    }

    /// Builder-style string assignment, bypassing the mode guard.
    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    /// Builder-style boolean assignment.
    pub fn with_flag(mut self, key: &str, on: bool) -> Self {
        self.values.insert(key.to_string(), ConfigValue::Bool(on));
        self
    }

    /// Replace every `MODE_*` flag with those of `mode`.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.values.retain(|k, _| KeyClass::of(k) != KeyClass::Mode);
        for key in mode.flags() {
            self.values.insert(key.to_string(), ConfigValue::Bool(true));
        }
        self
    }

    /// A copy without path roots and mode flags.
    pub fn redacted(&self) -> Self {
        let values = self
            .values
            .iter()
            .filter(|(k, _)| !KeyClass::of(k).is_redacted())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self { values }
    }

    /// The snapshot handed to a sub-tree rooted `rel` below this one.
    pub fn derive_child(&self, rel: &str) -> Self {
        let prefix = join_prefix(self.str_or_empty(keys::RECURSE_PREFIX), rel);
        let mut child = self.redacted();
        child.set(keys::RECURSE_PREFIX, &prefix);
        child
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(ConfigValue::as_str)
    }

    /// The value of `key`, or the empty string when undefined.
    pub fn str_or_empty(&self, key: &str) -> &str {
        self.get_str(key).unwrap_or_default()
    }

    pub fn is_defined(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Truthiness of `key`; undefined keys are false.
    pub fn flag(&self, key: &str) -> bool {
        self.values.get(key).is_some_and(ConfigValue::is_true)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// The manifest file name. Required before any manifest is read.
    pub fn list_fn(&self) -> Result<&str> {
        match self.get_str(keys::LIST_FN) {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(Error::Config {
                message: format!("{} is not set", keys::LIST_FN),
                hint: Some(format!(
                    "Add '* {} * <manifest file name>' to {} or export {}{}",
                    keys::LIST_FN,
                    CONFFILE_NAME,
                    ENV_PREFIX,
                    keys::LIST_FN
                )),
            }),
        }
    }

    /// The tokenizer for the configured `LIST_SEP`.
    pub fn tokenizer(&self) -> Result<Tokenizer> {
        let raw = self.str_or_empty(keys::LIST_SEP);
        let mut chars = raw.chars();
        match (chars.next(), chars.next()) {
            (None, _) => Ok(Tokenizer::default()),
            (Some(c), None) if c != '\\' && c != '#' && !c.is_whitespace() => {
                Ok(Tokenizer::new(c))
            }
            _ => Err(Error::Config {
                message: format!("{} must be a single character, got '{}'", keys::LIST_SEP, raw),
                hint: Some("Backslash, '#' and whitespace cannot be used as separators".to_string()),
            }),
        }
    }

    /// Serialize as assignment lines readable by [`ConfigSnapshot::read_stream`].
    ///
    /// The separator line comes first and is always written with the default
    /// separator, so a reader never needs to know it in advance.
    pub fn to_stream(&self) -> Result<String> {
        let tokenizer = self.tokenizer()?;
        let mut out = Tokenizer::default().assignment_line(
            keys::LIST_SEP,
            &tokenizer.separator().to_string(),
        );
        out.push('\n');

        for (key, value) in &self.values {
            if key == keys::LIST_SEP {
                continue;
            }
            out.push_str(&tokenizer.assignment_line(key, value.as_str()));
            out.push('\n');
        }
        Ok(out)
    }

    /// The redacted snapshot as `GRM_*` environment variables.
    pub fn env_vars(&self) -> Vec<(String, String)> {
        self.redacted()
            .values
            .iter()
            .map(|(k, v)| (format!("{}{}", ENV_PREFIX, k), v.as_str().to_string()))
            .collect()
    }
}

/// Find the conffile in `start` or the nearest ancestor holding one.
pub fn find_conffile(start: &Path) -> Result<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFFILE_NAME))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| Error::Config {
            message: format!(
                "No {} found in {} or any parent directory",
                CONFFILE_NAME,
                start.display()
            ),
            hint: Some(format!(
                "Create {} at the root of the managed tree",
                CONFFILE_NAME
            )),
        })
}

/// Find the directory holding the manifest nearest to `start`.
pub fn find_manifest_dir(start: &Path, list_fn: &str) -> Result<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(list_fn).is_file())
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::ManifestNotFound {
            list_fn: list_fn.to_string(),
            start: start.to_path_buf(),
        })
}
