//! Stat aggregation.

use std::collections::BTreeMap;

use crate::config::GeneratorConfig;
use crate::selection::ChosenPiece;

/// Final value of one stat after clamping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatValue {
    /// Stat key from config.
    pub key: String,
    /// Display name.
    pub name: String,
    pub value: i64,
    pub maximum: i64,
}

/// Running per-stat sums for one asset.
///
/// Deltas are summed unclamped; [`finish`](Self::finish) clamps each sum
/// exactly once, so the result does not depend on layer order.
#[derive(Debug, Clone, Default)]
pub struct StatAccumulator {
    sums: BTreeMap<String, i64>,
}

impl StatAccumulator {
    /// Starts every configured stat at zero.
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            sums: config.settings.stats.keys().map(|k| (k.clone(), 0)).collect(),
        }
    }

    /// Adds one piece's deltas. Stats missing from config are ignored.
    pub fn add(&mut self, deltas: &BTreeMap<String, i64>) {
        for (stat, delta) in deltas {
            match self.sums.get_mut(stat) {
                Some(sum) => *sum = sum.saturating_add(*delta),
                None => tracing::warn!(stat = %stat, "piece references an unconfigured stat"),
            }
        }
    }

    /// Adds the deltas of every chosen piece.
    pub fn add_pieces(&mut self, pieces: &[ChosenPiece]) {
        for piece in pieces {
            self.add(&piece.stats);
        }
    }

    /// Clamps every sum to its configured range.
    pub fn finish(self, config: &GeneratorConfig) -> Vec<StatValue> {
        self.sums
            .into_iter()
            .map(|(key, sum)| {
                let (minimum, maximum) = config
                    .settings
                    .stats
                    .get(&key)
                    .map_or((i64::MIN, i64::MAX), |r| (r.minimum, r.maximum));
                // i64::clamp panics when minimum > maximum
                let value = sum.max(minimum).min(maximum);
                StatValue {
                    name: config.stat_display_name(&key),
                    key,
                    value,
                    maximum,
                }
            })
            .collect()
    }
}

/// Picks the stat with the highest clamped value.
///
/// An exact tie for the highest value, or no stats at all, yields `fallback`.
pub fn primary_stat<'a>(stats: &'a [StatValue], fallback: Option<&'a str>) -> Option<&'a str> {
    let Some(best) = stats.iter().map(|s| s.value).max() else {
        return fallback;
    };
    let mut leaders = stats.iter().filter(|s| s.value == best);
    match (leaders.next(), leaders.next()) {
        (Some(only), None) => Some(only.key.as_str()),
        _ => fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StatConfig;

    fn config() -> GeneratorConfig {
        let mut config = GeneratorConfig::default();
        for (key, min, max) in [("strength", 0, 10), ("speed", -5, 5)] {
            config.settings.stats.insert(
                key.into(),
                StatConfig {
                    name: None,
                    minimum: min,
                    maximum: max,
                },
            );
        }
        config
    }

    fn deltas(pairs: &[(&str, i64)]) -> BTreeMap<String, i64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn value(stats: &[StatValue], key: &str) -> i64 {
        stats.iter().find(|s| s.key == key).unwrap().value
    }

    #[test]
    fn clamps_once_after_summing() {
        let config = config();
        let mut acc = StatAccumulator::new(&config);
        // A mid-way clamp would cap at 10 and end at 4.
        acc.add(&deltas(&[("strength", 12)]));
        acc.add(&deltas(&[("strength", -6)]));
        let stats = acc.finish(&config);
        assert_eq!(value(&stats, "strength"), 6);
        assert_eq!(value(&stats, "speed"), 0);
    }

    #[test]
    fn clamps_to_both_bounds() {
        let config = config();
        let mut acc = StatAccumulator::new(&config);
        acc.add(&deltas(&[("strength", 40), ("speed", -9)]));
        let stats = acc.finish(&config);
        assert_eq!(value(&stats, "strength"), 10);
        assert_eq!(value(&stats, "speed"), -5);
    }

    #[test]
    fn aggregation_is_order_independent() {
        let config = config();
        let layers = [
            deltas(&[("strength", 9), ("speed", 4)]),
            deltas(&[("strength", 7)]),
            deltas(&[("strength", -8), ("speed", 3)]),
            deltas(&[("speed", -6)]),
        ];
        let orders = [[0, 1, 2, 3], [3, 2, 1, 0], [1, 3, 0, 2], [2, 0, 3, 1]];

        let mut results = Vec::new();
        for order in orders {
            let mut acc = StatAccumulator::new(&config);
            for i in order {
                acc.add(&layers[i]);
            }
            results.push(acc.finish(&config));
        }
        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn unknown_stats_are_ignored() {
        let config = config();
        let mut acc = StatAccumulator::new(&config);
        acc.add(&deltas(&[("luck", 3)]));
        assert_eq!(acc.finish(&config).len(), 2);
    }

    #[test]
    fn primary_stat_prefers_unique_maximum() {
        let stats = vec![
            StatValue { key: "a".into(), name: "A".into(), value: 3, maximum: 10 },
            StatValue { key: "b".into(), name: "B".into(), value: 7, maximum: 10 },
        ];
        assert_eq!(primary_stat(&stats, Some("fallback")), Some("b"));
    }

    #[test]
    fn primary_stat_tie_uses_fallback() {
        let stats = vec![
            StatValue { key: "a".into(), name: "A".into(), value: 7, maximum: 10 },
            StatValue { key: "b".into(), name: "B".into(), value: 7, maximum: 10 },
            StatValue { key: "c".into(), name: "C".into(), value: 1, maximum: 10 },
        ];
        assert_eq!(primary_stat(&stats, Some("fallback")), Some("fallback"));
        assert_eq!(primary_stat(&[], Some("fallback")), Some("fallback"));
        assert_eq!(primary_stat(&stats, None), None);
    }
}
