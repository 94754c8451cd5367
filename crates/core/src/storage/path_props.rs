//! Property-based tests for path normalization.

use proptest::prelude::*;

use super::path::{PathError, StoragePath, normalize};

/// Strategy for a single valid segment, including characters that need encoding.
fn segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _.#?%&+=é-]{1,12}".prop_filter("dot segments are not canonical", |s| {
        s != "." && s != ".."
    })
}

/// Segment without `%`, so it survives decoding unchanged.
fn plain_segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _.-]{1,12}".prop_filter("dot segments are not canonical", |s| {
        s != "." && s != ".."
    })
}

/// Strategy for a canonical relative path.
fn relative_path() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 1..5).prop_map(|segments| segments.join("/"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Encoding a canonical path and normalizing it yields the same path.
    #[test]
    fn prop_normalize_inverts_encoding(raw in relative_path()) {
        let path = StoragePath::from_key(&raw).expect("canonical key is valid");
        prop_assert_eq!(path.as_str(), raw.as_str());

        let decoded = normalize(&path.encoded()).expect("encoded path is valid");
        prop_assert_eq!(decoded.as_str(), raw.as_str());
    }

    /// A `..` segment anywhere is rejected, encoded or not.
    #[test]
    fn prop_traversal_rejected(
        prefix in prop::collection::vec(plain_segment(), 0..3),
        suffix in prop::collection::vec(plain_segment(), 0..3),
        dots in prop_oneof![Just(".."), Just("%2e%2e"), Just("%2E."), Just(".%2E")],
    ) {
        let mut segments: Vec<String> = prefix;
        segments.push(dots.to_string());
        segments.extend(suffix);
        let raw = segments.join("/");

        prop_assert_eq!(normalize(&raw), Err(PathError::Traversal));
    }

    /// Normalizing the encoded form of a normalized path changes nothing.
    #[test]
    fn prop_normalize_idempotent(raw in relative_path()) {
        let once = StoragePath::from_key(&raw).expect("valid");
        let twice = normalize(&once.encoded()).expect("valid");
        let thrice = normalize(&twice.encoded()).expect("valid");
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(twice, thrice);
    }
}
