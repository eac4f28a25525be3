//! Rarity weight resolution and the weighted draw.

use crate::config::{Rarity, RarityTable};
use crate::rng::AssetRng;

/// Resolves [`Rarity`] values to draw weights.
///
/// Named buckets ordered before the minimum-rarity floor resolve to zero,
/// which removes their probability mass from every draw.
#[derive(Debug, Clone, Copy)]
pub struct WeightResolver<'a> {
    table: &'a RarityTable,
    floor_index: Option<usize>,
}

impl<'a> WeightResolver<'a> {
    pub fn new(table: &'a RarityTable, minimum_rarity: Option<&str>) -> Self {
        let floor_index = minimum_rarity.and_then(|floor| {
            let index = table.order.iter().position(|b| b == floor);
            if index.is_none() {
                tracing::warn!(floor, "minimum rarity is not in the rarity order; ignoring");
            }
            index
        });
        Self { table, floor_index }
    }

    pub fn weight(&self, rarity: &Rarity) -> f64 {
        let raw = match rarity {
            Rarity::Numeric(w) => *w,
            Rarity::Named(bucket) => self.bucket_weight(bucket),
        };
        if raw.is_finite() && raw > 0.0 { raw } else { 0.0 }
    }

    fn bucket_weight(&self, bucket: &str) -> f64 {
        if let Some(floor) = self.floor_index {
            let below_floor = self
                .table
                .order
                .iter()
                .position(|b| b == bucket)
                .is_some_and(|i| i < floor);
            if below_floor {
                return 0.0;
            }
        }
        match self.table.chances.get(bucket) {
            Some(chance) => *chance,
            None => {
                tracing::warn!(bucket, "unknown rarity bucket resolves to zero weight");
                0.0
            }
        }
    }
}

/// Weighted draw over `weights` in iteration order.
///
/// Returns the index of the first entry whose cumulative weight exceeds a
/// uniform draw in `[0, total)`, or `None` when no entry has positive
/// weight. Negative and non-finite entries count as zero. Weights are scaled
/// by the largest one first, so huge values cannot overflow the total.
pub fn weighted_index(weights: &[f64], rng: &mut AssetRng) -> Option<usize> {
    let usable = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
    let largest = weights.iter().map(|w| usable(*w)).fold(0.0, f64::max);
    if largest <= 0.0 {
        return None;
    }

    let scaled: Vec<f64> = weights.iter().map(|w| usable(*w) / largest).collect();
    let total: f64 = scaled.iter().sum();
    let draw = rng.below(total);
    let mut cumulative = 0.0;
    for (i, w) in scaled.iter().enumerate() {
        cumulative += w;
        if cumulative > draw {
            return Some(i);
        }
    }
    // Rounding can leave the draw at the very top of the range.
    scaled.iter().rposition(|w| *w > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RarityTable {
        let mut table = RarityTable {
            order: vec!["common".into(), "uncommon".into(), "rare".into()],
            ..Default::default()
        };
        table.chances.insert("common".into(), 60.0);
        table.chances.insert("uncommon".into(), 30.0);
        table.chances.insert("rare".into(), 10.0);
        table
    }

    #[test]
    fn numeric_weights_pass_through() {
        let table = table();
        let resolver = WeightResolver::new(&table, None);
        assert_eq!(resolver.weight(&Rarity::Numeric(2.5)), 2.5);
        assert_eq!(resolver.weight(&Rarity::Numeric(-1.0)), 0.0);
        assert_eq!(resolver.weight(&Rarity::Numeric(f64::NAN)), 0.0);
    }

    #[test]
    fn named_weights_use_chances() {
        let table = table();
        let resolver = WeightResolver::new(&table, None);
        assert_eq!(resolver.weight(&Rarity::Named("uncommon".into())), 30.0);
        assert_eq!(resolver.weight(&Rarity::Named("mythic".into())), 0.0);
    }

    #[test]
    fn floor_discounts_commoner_buckets() {
        let table = table();
        let resolver = WeightResolver::new(&table, Some("uncommon"));
        assert_eq!(resolver.weight(&Rarity::Named("common".into())), 0.0);
        assert_eq!(resolver.weight(&Rarity::Named("uncommon".into())), 30.0);
        assert_eq!(resolver.weight(&Rarity::Named("rare".into())), 10.0);
        // Raw numbers are not bucketed.
        assert_eq!(resolver.weight(&Rarity::Numeric(1.0)), 1.0);
    }

    #[test]
    fn unknown_floor_is_ignored() {
        let table = table();
        let resolver = WeightResolver::new(&table, Some("legendary"));
        assert_eq!(resolver.weight(&Rarity::Named("common".into())), 60.0);
    }

    #[test]
    fn zero_total_yields_none() {
        let mut rng = AssetRng::from_seed(1);
        assert_eq!(weighted_index(&[], &mut rng), None);
        assert_eq!(weighted_index(&[0.0, 0.0], &mut rng), None);
    }

    #[test]
    fn zero_weight_entries_are_never_drawn() {
        for seed in 0..500 {
            let mut rng = AssetRng::from_seed(seed);
            let picked = weighted_index(&[0.0, 3.0, 0.0, 1.0], &mut rng).unwrap();
            assert!(picked == 1 || picked == 3);
        }
    }

    #[test]
    fn huge_weights_still_draw() {
        for seed in 0..200 {
            let mut rng = AssetRng::from_seed(seed);
            let picked = weighted_index(&[f64::MAX, f64::MAX], &mut rng);
            assert!(matches!(picked, Some(0 | 1)));
            let picked = weighted_index(&[1e308, 0.0, 1e308], &mut rng).unwrap();
            assert!(picked == 0 || picked == 2);
        }
    }

    #[test]
    fn unusable_entries_count_as_zero() {
        let mut rng = AssetRng::from_seed(4);
        assert_eq!(weighted_index(&[f64::INFINITY, -2.0, f64::NAN], &mut rng), None);
        assert_eq!(weighted_index(&[f64::NAN, 2.0], &mut rng), Some(1));
    }

    #[test]
    fn draw_frequencies_follow_weights() {
        let mut rng = AssetRng::from_seed(9);
        let mut counts = [0usize; 2];
        for _ in 0..10_000 {
            counts[weighted_index(&[9.0, 1.0], &mut rng).unwrap()] += 1;
        }
        assert!(counts[0] > 8_500 && counts[0] < 9_500, "counts: {counts:?}");
    }
}
