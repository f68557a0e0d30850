//! Property-based tests for path handling and option parsing.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use gamepak_core::FileOption;
use gamepak_core::address::normalize_path;
use gamepak_core::export::DestRoot;
use gamepak_core::export::filters::pattern_matches;
use proptest::prelude::*;
use tempfile::TempDir;

const FLAG_NAMES: [&str; 7] = [
    "raw", "marker", "object", "binary", "stream", "unknown", "suppress",
];

proptest! {
    /// Normalizing twice changes nothing.
    #[test]
    fn prop_normalize_is_idempotent(path in "[a-z./\\\\]{0,40}") {
        let once = normalize_path(&path);
        prop_assert_eq!(normalize_path(&once), once);
    }

    /// Normalized paths have no empty, `.` or edge separators.
    #[test]
    fn prop_normalized_shape(path in "[a-z./\\\\]{0,40}") {
        let normalized = normalize_path(&path);
        prop_assert!(!normalized.starts_with('/'));
        prop_assert!(!normalized.ends_with('/'));
        prop_assert!(!normalized.contains('\\'));
        if !normalized.is_empty() {
            prop_assert!(normalized.split('/').all(|s| !s.is_empty() && s != "."));
        }
    }

    /// Separator style and redundant segments do not change the result.
    #[test]
    fn prop_separator_style_irrelevant(
        segments in prop::collection::vec("[a-zA-Z0-9_]{1,8}", 1..6)
    ) {
        let forward = segments.join("/");
        let messy = format!("/{}//", segments.join("\\./"));
        prop_assert_eq!(normalize_path(&messy), forward);
    }

    /// Every listed flag is contained in the parsed option.
    #[test]
    fn prop_parsed_options_contain_each_flag(
        picks in prop::collection::vec(0..FLAG_NAMES.len(), 0..5)
    ) {
        let list: Vec<&str> = picks.iter().map(|&i| FLAG_NAMES[i]).collect();
        let option: FileOption = list.join(",").parse().unwrap();
        for name in list {
            let flag: FileOption = name.parse().unwrap();
            prop_assert!(option.contains(flag));
        }
    }

    /// A prefix pattern accepts every extension of the prefix.
    #[test]
    fn prop_prefix_star_matches(prefix in "[a-z0-9]{0,8}", rest in "[a-z0-9.]{0,8}") {
        let pattern = format!("{prefix}*");
        let candidate = format!("{prefix}{rest}");
        prop_assert!(pattern_matches(&candidate, &pattern));
    }

    /// Any `..` component is refused as an export destination.
    #[test]
    fn prop_parent_traversal_rejected(
        prefix in "([a-z]+/){0,4}",
        suffix in "([a-z]+/?){0,4}"
    ) {
        let temp = TempDir::new().expect("failed to create temp dir");
        let root = DestRoot::create(temp.path()).expect("failed to create root");
        let path = format!("{prefix}../{suffix}");
        prop_assert!(root.join_entry(&path).is_err());
    }
}
