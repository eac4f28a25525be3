//! Description generation.
//!
//! Two modes, chosen by the shape of [`DescriptionConfig`]:
//!
//! - **Simple**: `fragment-count` distinct fragments from a flat pool,
//!   Oxford-joined into the template's `{fragments}` placeholder.
//! - **Stat**: the asset's primary stat selects a fragment bucket; one
//!   descriptor and `fragment-count` distinct hobbies fill `{name}`,
//!   `{descriptor}` and `{hobbies}`.

use rand::seq::index;

use super::stats::{StatValue, primary_stat};
use crate::config::DescriptionConfig;
use crate::rng::AssetRng;

/// A generated description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Description {
    pub text: String,
    /// Name of the stat bucket used in stat mode.
    pub kind: Option<String>,
}

/// Builds a description for an asset with the given clamped stats.
pub fn describe(config: &DescriptionConfig, stats: &[StatValue], rng: &mut AssetRng) -> Description {
    if !config.simple_fragments.is_empty() {
        let fragments = pick_distinct(&config.simple_fragments, config.fragment_count, rng);
        return Description {
            text: config.template.replace("{fragments}", &oxford_join(&fragments)),
            kind: None,
        };
    }

    if config.stat_fragments.is_empty() {
        return Description::default();
    }

    let Some(primary) = primary_stat(stats, config.fallback_primary_stat.as_deref()) else {
        tracing::warn!("no primary stat and no fallback; description left empty");
        return Description::default();
    };
    let Some(bucket) = config.stat_fragments.get(primary) else {
        tracing::warn!(stat = primary, "no description fragments for primary stat");
        return Description::default();
    };

    let descriptor = if bucket.descriptors.is_empty() {
        ""
    } else {
        bucket.descriptors[rng.index(bucket.descriptors.len())].as_str()
    };
    let hobbies = pick_distinct(&bucket.hobbies, config.fragment_count, rng);

    let text = config
        .template
        .replace("{name}", &bucket.name)
        .replace("{descriptor}", descriptor)
        .replace("{hobbies}", &oxford_join(&hobbies));

    Description {
        text,
        kind: Some(bucket.name.clone()).filter(|n| !n.is_empty()),
    }
}

/// Draws up to `count` distinct entries from `pool`, in draw order.
pub fn pick_distinct<'a>(pool: &'a [String], count: usize, rng: &mut AssetRng) -> Vec<&'a str> {
    let mut unique: Vec<&str> = Vec::with_capacity(pool.len());
    for item in pool {
        if !unique.contains(&item.as_str()) {
            unique.push(item);
        }
    }
    let amount = count.min(unique.len());
    index::sample(rng, unique.len(), amount)
        .into_iter()
        .map(|i| unique[i])
        .collect()
}

/// Joins items as an English list with a serial comma.
///
/// When any item contains a comma the separator escalates to a semicolon:
///
/// ```
/// use looks::oxford_join;
///
/// assert_eq!(oxford_join(&["a"]), "a");
/// assert_eq!(oxford_join(&["a", "b"]), "a and b");
/// assert_eq!(oxford_join(&["a", "b", "c"]), "a, b, and c");
/// assert_eq!(oxford_join(&["a,x", "b"]), "a,x; and b");
/// ```
pub fn oxford_join<S: AsRef<str>>(items: &[S]) -> String {
    let complex = items.iter().any(|s| s.as_ref().contains(','));
    let punct = if complex { ";" } else { "," };

    match items {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [first, second] if !complex => format!("{} and {}", first.as_ref(), second.as_ref()),
        [head @ .., last] => {
            let head: Vec<&str> = head.iter().map(|s| s.as_ref()).collect();
            let separator = format!("{punct} ");
            format!(
                "{}{punct} and {}",
                head.join(separator.as_str()),
                last.as_ref()
            )
        }
    }
}
