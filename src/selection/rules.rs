//! Tag and variant compatibility rules.

use std::collections::BTreeSet;

use crate::config::TagRules;

/// Returns true if a piece declaring `piece_tags` may join an asset that
/// already carries `current`.
///
/// Every tag the piece declares is checked: its exclusive partners must be
/// absent and its inclusive partners must already be present.
pub fn tags_compatible(piece_tags: &[String], current: &BTreeSet<String>, rules: &TagRules) -> bool {
    piece_tags.iter().all(|tag| {
        let excluded = rules
            .exclusive
            .get(tag)
            .is_some_and(|others| others.iter().any(|o| current.contains(o)));
        let missing = rules
            .inclusive
            .get(tag)
            .is_some_and(|others| others.iter().any(|o| !current.contains(o)));
        !excluded && !missing
    })
}

/// Filters a piece's variants down to those compatible with the asset's
/// established variant.
///
/// With no established variant every declared variant is compatible. The
/// result keeps declaration order and drops duplicates.
pub fn compatible_variants(
    piece_variants: &[String],
    established: Option<&str>,
    rules: &TagRules,
) -> Vec<String> {
    let (include, exclude) = match established {
        Some(v) => (rules.inclusive.get(v), rules.exclusive.get(v)),
        None => (None, None),
    };

    let mut out: Vec<String> = Vec::new();
    for candidate in piece_variants {
        let included = include.is_none_or(|list| list.is_empty() || list.contains(candidate));
        let not_excluded = exclude.is_none_or(|list| !list.contains(candidate));
        if included && not_excluded && !out.contains(candidate) {
            out.push(candidate.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(tags: &[&str]) -> BTreeSet<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|t| t.to_string()).collect()
    }

    fn rules() -> TagRules {
        let mut rules = TagRules::default();
        rules
            .exclusive
            .insert("crown".into(), strings(&["helmet"]));
        rules.inclusive.insert("plume".into(), strings(&["helmet"]));
        rules
    }

    #[test]
    fn untagged_piece_always_fits() {
        assert!(tags_compatible(&[], &set(&["helmet"]), &rules()));
    }

    #[test]
    fn exclusive_tag_blocks_co_occurrence() {
        let rules = rules();
        assert!(!tags_compatible(&strings(&["crown"]), &set(&["helmet"]), &rules));
        assert!(tags_compatible(&strings(&["crown"]), &set(&["cape"]), &rules));
    }

    #[test]
    fn inclusive_tag_requires_partner() {
        let rules = rules();
        assert!(!tags_compatible(&strings(&["plume"]), &set(&[]), &rules));
        assert!(tags_compatible(&strings(&["plume"]), &set(&["helmet"]), &rules));
    }

    #[test]
    fn every_declared_tag_is_checked() {
        let rules = rules();
        let tags = strings(&["cape", "crown"]);
        assert!(!tags_compatible(&tags, &set(&["helmet"]), &rules));
    }

    #[test]
    fn no_established_variant_keeps_all() {
        let variants = strings(&["red", "blue", "red"]);
        let out = compatible_variants(&variants, None, &rules());
        assert_eq!(out, strings(&["red", "blue"]));
    }

    #[test]
    fn established_variant_applies_rules() {
        let mut rules = TagRules::default();
        rules.inclusive.insert("red".into(), strings(&["red", "orange"]));
        rules.exclusive.insert("blue".into(), strings(&["orange"]));

        let variants = strings(&["red", "orange", "green"]);
        assert_eq!(
            compatible_variants(&variants, Some("red"), &rules),
            strings(&["red", "orange"])
        );
        assert_eq!(
            compatible_variants(&variants, Some("blue"), &rules),
            strings(&["red", "green"])
        );
        assert_eq!(compatible_variants(&variants, Some("green"), &rules), variants);
    }
}
