//! # Manifest Parsing
//!
//! A manifest is a line-oriented file listing repositories. Each line holds
//! up to three fields separated by a single separator character (`*` unless
//! `LIST_SEP` says otherwise):
//!
//! ```text
//! # remote-relative        local-relative   media-relative
//! group/proj.git
//! group/tools.git        * vendor/tools
//!                        * LOCAL_DIR      * checkouts
//! ```
//!
//! A line whose first field is empty is not a repository but a configuration
//! assignment (`key`, `value`) that applies to every following line and to
//! every sub-tree below the manifest. The same syntax is used by the conffile
//! and by the configuration stream handed to sub-tree workers.
//!
//! ## Escaping
//!
//! A backslash makes the next character literal: `\*` embeds the separator,
//! `\#` a hash, `\ ` a space that survives trimming. An unescaped `#` starts
//! a comment that runs to the end of the line. Leading and trailing unescaped
//! whitespace of every field is trimmed.
//!
//! The [`Tokenizer`] is an explicit state machine so the escaping contract
//! can be tested independently of the engine: [`unescape`] of [`escape`] is
//! the identity for every string without a newline.

use crate::error::ManifestError;
use crate::path::basename_without_git;

/// Maximum number of fields on a manifest line.
pub const MAX_FIELDS: usize = 3;

/// One repository line: the three relative paths, defaults already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Path of the repository relative to the remote root.
    pub remote_rel: String,
    /// Path of the working copy relative to the local root.
    pub local_rel: String,
    /// Path handed to the configure hook, relative to the media root.
    pub media_rel: String,
}

impl ManifestEntry {
    /// Build an entry, defaulting empty or missing local and media paths to
    /// the basename of the remote path without its `.git` suffix.
    pub fn new(remote_rel: String, local_rel: Option<String>, media_rel: Option<String>) -> Self {
        let default = || basename_without_git(&remote_rel);
        let local_rel = local_rel.filter(|s| !s.is_empty()).unwrap_or_else(default);
        let media_rel = media_rel.filter(|s| !s.is_empty()).unwrap_or_else(default);
        Self {
            remote_rel,
            local_rel,
            media_rel,
        }
    }
}

/// A meaningful manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestLine {
    Entry(ManifestEntry),
    Assignment { key: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Skipping whitespace before a field's first character.
    Leading,
    /// Accumulating field characters.
    Field,
    /// A backslash was read; the next character is literal.
    Escape,
}

/// Accumulates one field, remembering where unescaped trailing whitespace
/// starts so it can be trimmed.
#[derive(Default)]
struct FieldAccumulator {
    text: String,
    keep: usize,
}

impl FieldAccumulator {
    fn push_plain(&mut self, c: char) {
        self.text.push(c);
        if !c.is_whitespace() {
            self.keep = self.text.len();
        }
    }

    fn push_literal(&mut self, c: char) {
        self.text.push(c);
        self.keep = self.text.len();
    }

    fn finish(mut self) -> String {
        self.text.truncate(self.keep);
        self.text
    }
}

/// Splits manifest lines into unescaped fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tokenizer {
    separator: char,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(crate::defaults::DEFAULT_SEPARATOR)
    }
}

impl Tokenizer {
    pub fn new(separator: char) -> Self {
        Self { separator }
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    /// Split one line into its unescaped fields.
    ///
    /// Returns an empty vector for lines holding nothing but whitespace and
    /// an optional comment.
    pub fn split(&self, line: &str) -> Result<Vec<String>, ManifestError> {
        let line = line.trim_end_matches(|c| c == '\r' || c == '\n');
        let mut fields = Vec::new();
        let mut field = FieldAccumulator::default();
        let mut state = State::Leading;
        let mut content = false;

        for c in line.chars() {
            match state {
                State::Escape => {
                    field.push_literal(c);
                    state = State::Field;
                }
                State::Leading | State::Field => {
                    if c == '\\' {
                        content = true;
                        state = State::Escape;
                    } else if c == '#' {
                        break;
                    } else if c == self.separator {
                        content = true;
                        if fields.len() + 1 == MAX_FIELDS {
                            return Err(ManifestError::TooManyFields);
                        }
                        fields.push(std::mem::take(&mut field).finish());
                        state = State::Leading;
                    } else if state == State::Leading && c.is_whitespace() {
                        // skipped
                    } else {
                        content = true;
                        field.push_plain(c);
                        state = State::Field;
                    }
                }
            }
        }

        if state == State::Escape {
            return Err(ManifestError::TrailingBackslash);
        }
        if !content {
            return Ok(Vec::new());
        }
        fields.push(field.finish());
        Ok(fields)
    }

    /// Parse one line into an entry or an assignment.
    pub fn parse_line(&self, line: &str) -> Result<Option<ManifestLine>, ManifestError> {
        let mut fields = self.split(line)?.into_iter();
        let first = match fields.next() {
            Some(first) => first,
            None => return Ok(None),
        };
        let second = fields.next();
        let third = fields.next();

        if first.is_empty() {
            let key = second.unwrap_or_default();
            if key.is_empty() {
                return Err(ManifestError::EmptyKey);
            }
            return Ok(Some(ManifestLine::Assignment {
                key,
                value: third.unwrap_or_default(),
            }));
        }

        Ok(Some(ManifestLine::Entry(ManifestEntry::new(
            first, second, third,
        ))))
    }

    /// Serialize an assignment as a manifest line.
    pub fn assignment_line(&self, key: &str, value: &str) -> String {
        format!(
            "{sep}{}{sep}{}",
            escape(key, self.separator),
            escape(value, self.separator),
            sep = self.separator
        )
    }
}

/// Escape a string so it reads back as a single field.
///
/// Backslashes, `#` and the separator are escaped everywhere; whitespace
/// only where it would otherwise be trimmed.
pub fn escape(value: &str, separator: char) -> String {
    let chars: Vec<char> = value.chars().collect();
    let leading = chars.iter().take_while(|c| c.is_whitespace()).count();
    let trailing_start = chars.len()
        - chars[leading..]
            .iter()
            .rev()
            .take_while(|c| c.is_whitespace())
            .count();

    let mut out = String::with_capacity(value.len() + 2);
    for (i, &c) in chars.iter().enumerate() {
        let edge_space = c.is_whitespace() && (i < leading || i >= trailing_start);
        if c == '\\' || c == '#' || c == separator || edge_space {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Unescape a single serialized field.
pub fn unescape(field: &str, separator: char) -> Result<String, ManifestError> {
    let mut fields = Tokenizer::new(separator).split(field)?;
    match fields.len() {
        0 => Ok(String::new()),
        1 => Ok(fields.remove(0)),
        _ => Err(ManifestError::TooManyFields),
    }
}
