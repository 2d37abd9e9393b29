//! Property-based tests for extension pattern normalization and ordering

use pbxlint::pattern::Pattern;
use proptest::prelude::*;
use std::cmp::Ordering;

fn atom() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "1", "2", "9", "a", "X", "x", "Z", "N", "n", ".", "!", "[1-3]", "[13]", "[a-c]",
        "[0-9]", "[5-1]", "[-]", "]", "[_]",
    ])
}

/// Valid patterns: `_` followed by atoms, with stray dashes between them.
fn valid_pattern() -> impl Strategy<Value = String> {
    prop::collection::vec((atom(), any::<bool>()), 1..8).prop_map(|atoms| {
        let mut raw = String::from("_");
        for (atom, dash) in atoms {
            raw.push_str(atom);
            if dash {
                raw.push('-');
            }
        }
        raw
    })
}

fn literal_extension() -> impl Strategy<Value = String> {
    "[0-9*#]{1,6}"
}

proptest! {
    #[test]
    fn canonical_form_denotes_the_same_pattern(raw in valid_pattern()) {
        let pattern = Pattern::parse(&raw);
        prop_assert!(pattern.is_valid());
        let canonical = Pattern::parse(&pattern.canonical_pattern());
        prop_assert_eq!(&pattern, &canonical);
    }

    #[test]
    fn canonical_form_is_canonical(raw in valid_pattern()) {
        let canonical = Pattern::parse(&raw).canonical_pattern();
        prop_assert!(Pattern::parse(&canonical).is_canonical(), "{} -> {}", raw, canonical);
    }

    #[test]
    fn ordering_is_antisymmetric(a in valid_pattern(), b in valid_pattern()) {
        let (a, b) = (Pattern::parse(&a), Pattern::parse(&b));
        prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
        prop_assert_eq!(a.cmp(&b) == Ordering::Equal, a == b);
    }

    #[test]
    fn literals_sort_below_wildcards(literal in literal_extension(), raw in valid_pattern()) {
        let pattern = Pattern::parse(&raw);
        prop_assume!(pattern.is_pattern());
        prop_assert!(Pattern::parse(&literal) < pattern);
    }

    #[test]
    fn underscore_prefix_does_not_change_literals(literal in literal_extension()) {
        let plain = Pattern::parse(&literal);
        let prefixed = Pattern::parse(&format!("_{}", literal));
        prop_assert_eq!(plain, prefixed);
    }
}
