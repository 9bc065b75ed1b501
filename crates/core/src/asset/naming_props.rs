//! Property-based tests for naming.
//!
//! - Classification is exactly a case-sensitive substring search
//! - Keys are plain concatenation of prefix, hash, and extension

use proptest::prelude::*;

use super::AssetDescriptor;
use super::naming::{PUBLIC_MARKER, is_public, resolve_key};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Any hash with the marker spliced in anywhere is public.
    #[test]
    fn prop_marker_anywhere_is_public(
        before in "[a-zA-Z0-9-]{0,20}",
        after in "[a-zA-Z0-9-]{0,20}",
    ) {
        let asset = AssetDescriptor::new(format!("{before}{PUBLIC_MARKER}{after}"), ".bin", "application/octet-stream");
        prop_assert!(is_public(&asset));
    }

    /// Hashes drawn from an alphabet that cannot spell the marker are private.
    #[test]
    fn prop_hash_without_marker_is_private(hash in "[A-Z0-9]{0,40}") {
        let asset = AssetDescriptor::new(hash, ".bin", "application/octet-stream");
        prop_assert!(!is_public(&asset));
    }

    /// Classification agrees with `str::contains` for arbitrary input.
    #[test]
    fn prop_classification_matches_contains(hash in ".*") {
        let asset = AssetDescriptor::new(hash.clone(), "", "");
        prop_assert_eq!(is_public(&asset), hash.contains("public"));
    }

    /// Key = prefix + "/" + hash + extension, nothing more.
    #[test]
    fn prop_key_is_concatenation(
        prefix in "[a-z0-9/]{0,16}",
        hash in "[a-f0-9]{1,32}",
        ext in "(\\.[a-z]{1,4})?",
    ) {
        let asset = AssetDescriptor::new(hash.clone(), ext.clone(), "application/octet-stream");
        let key = resolve_key(&prefix, &asset);
        prop_assert_eq!(key, format!("{prefix}/{hash}{ext}"));
    }
}
