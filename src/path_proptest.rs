//! Property-based tests for path composition and manifest escaping.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use std::path::Path;

    use crate::manifest::{escape, unescape, Tokenizer};
    use crate::path::{basename_without_git, cat_path, is_within, join_prefix, with_git_suffix};
    use proptest::prelude::*;

    fn segment() -> impl Strategy<Value = String> {
        "[a-z0-9_-]{1,8}(/[a-z0-9_-]{1,8}){0,2}"
    }

    fn separator() -> impl Strategy<Value = char> {
        prop::sample::select(vec!['*', '|', ':', ';', ','])
    }

    // ============================================================================
    // escape / unescape
    // ============================================================================

    proptest! {
        /// Property: unescaping an escaped string gives the string back
        #[test]
        fn unescape_inverts_escape(value in "[^\r\n]*", sep in separator()) {
            let escaped = escape(&value, sep);
            prop_assert_eq!(unescape(&escaped, sep).unwrap(), value);
        }

        /// Property: an escaped value always reads back as at most one field
        #[test]
        fn escaped_value_is_a_single_field(value in "[^\r\n]*", sep in separator()) {
            let fields = Tokenizer::new(sep).split(&escape(&value, sep)).unwrap();
            prop_assert!(fields.len() <= 1, "{:?} split into {:?}", value, fields);
        }

        /// Property: an assignment line parses back to the same key and value
        #[test]
        fn assignment_line_parses_back(
            key in "[A-Z_]{1,12}",
            value in "[^\r\n]*",
            sep in separator(),
        ) {
            let tokenizer = Tokenizer::new(sep);
            let line = tokenizer.assignment_line(&key, &value);
            let parsed = tokenizer.parse_line(&line).unwrap();
            prop_assert_eq!(
                parsed,
                Some(crate::manifest::ManifestLine::Assignment { key, value })
            );
        }
    }

    // ============================================================================
    // cat_path
    // ============================================================================

    proptest! {
        /// Property: relative segments are joined with a single slash
        #[test]
        fn cat_path_joins_relative_segments(parts in prop::collection::vec(segment(), 1..5)) {
            prop_assert_eq!(cat_path(&parts), parts.join("/"));
        }

        /// Property: everything left of an absolute segment is ignored
        #[test]
        fn cat_path_absolute_short_circuit(
            left in prop::collection::vec(segment(), 0..3),
            abs in segment(),
            right in prop::collection::vec(segment(), 0..3),
        ) {
            let abs = format!("/{}", abs);
            let mut all = left.clone();
            all.push(abs.clone());
            all.extend(right.iter().cloned());

            let mut tail = vec![abs];
            tail.extend(right);
            prop_assert_eq!(cat_path(&all), cat_path(&tail));
        }

        /// Property: composing an already composed path changes nothing
        #[test]
        fn cat_path_is_idempotent(parts in prop::collection::vec(segment(), 0..4)) {
            let once = cat_path(&parts);
            prop_assert_eq!(cat_path(&[once.as_str()]), once.clone());
        }

        /// Property: a composed path lies within each of its left prefixes
        #[test]
        fn composed_path_is_within_its_root(root in segment(), rel in segment()) {
            let root = format!("/{}", root);
            let composed = cat_path(&[root.as_str(), rel.as_str()]);
            prop_assert!(is_within(Path::new(&composed), Path::new(&root)));
        }

        /// Property: recursion prefixes never gain leading or trailing slashes
        #[test]
        fn join_prefix_is_trimmed(prefix in "(/?[a-z]{1,6}/?)?", rel in segment()) {
            let joined = join_prefix(&prefix, &rel);
            prop_assert!(!joined.starts_with('/'));
            prop_assert!(!joined.ends_with('/'));
            prop_assert!(joined.ends_with(&rel));
        }
    }

    // ============================================================================
    // remote names
    // ============================================================================

    proptest! {
        /// Property: with_git_suffix is idempotent
        #[test]
        fn with_git_suffix_is_idempotent(path in segment()) {
            let once = with_git_suffix(&path);
            prop_assert!(once.ends_with(".git"));
            prop_assert_eq!(with_git_suffix(&once), once.clone());
        }

        /// Property: the default local name ignores the .git suffix
        #[test]
        fn basename_ignores_git_suffix(path in segment()) {
            prop_assert_eq!(
                basename_without_git(&with_git_suffix(&path)),
                basename_without_git(&path)
            );
        }
    }
}
