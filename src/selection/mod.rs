//! Rarity-weighted piece selection.
//!
//! Selection runs once per layer, in piece order, and threads a
//! [`SelectionState`] through the layers of one asset:
//!
//! ```text
//! candidates ──► tag filter ──► variant filter ──► weights ──► draw
//!                    ▲                ▲                          │
//!                    │                │                          ▼
//!               state.tags      state.variant ◄──── variant resolution
//!                    ▲                                           │
//!                    └───────────────── tag merge ◄──────────────┘
//! ```

pub mod rules;
pub mod weight;

pub use rules::{compatible_variants, tags_compatible};
pub use weight::{WeightResolver, weighted_index};

use std::collections::{BTreeMap, BTreeSet};

use crate::config::{GeneratorConfig, LayerCatalog, PieceDefinition, TagRules, transform_name};
use crate::error::{Exhaustion, GenerateError, GenerateResult};
use crate::rng::AssetRng;

// ============================================================================
// Selection State
// ============================================================================

/// Per-asset state accumulated while choosing pieces.
///
/// Tags only ever grow, and the variant is set once by the first layer whose
/// chosen piece declares variants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    tags: BTreeSet<String>,
    variant: Option<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    fn merge_tags(&mut self, tags: &[String]) {
        self.tags.extend(tags.iter().cloned());
    }
}

// ============================================================================
// ChosenPiece
// ============================================================================

/// The piece picked for one layer of one asset.
#[derive(Debug, Clone, PartialEq)]
pub struct ChosenPiece {
    /// Layer key from `piece-order`.
    pub layer: String,
    /// Layer display name.
    pub layer_name: String,
    /// Piece identifier, suffixed with `_<variant>` when a later layer picks a variant.
    pub piece: String,
    /// Piece display name, prefixed with the variant when one was picked.
    pub friendly_name: String,
    /// Rarity label as configured (bucket name or number).
    pub rarity: String,
    /// Variant picked for this layer, if any.
    pub variant: Option<String>,
    /// Stat deltas contributed by this piece.
    pub stats: BTreeMap<String, i64>,
}

// ============================================================================
// RaritySelector
// ============================================================================

/// Chooses one piece per layer under tag, variant and weight constraints.
#[derive(Debug, Clone, Copy)]
pub struct RaritySelector<'a> {
    weights: WeightResolver<'a>,
    tags: &'a TagRules,
    variants: &'a TagRules,
}

impl<'a> RaritySelector<'a> {
    pub fn new(
        weights: WeightResolver<'a>,
        tags: &'a TagRules,
        variants: &'a TagRules,
    ) -> Self {
        Self {
            weights,
            tags,
            variants,
        }
    }

    /// Builds a selector from the rarity, tag and variant settings of `config`.
    pub fn from_config(config: &'a GeneratorConfig) -> Self {
        Self::new(
            WeightResolver::new(
                &config.settings.rarity,
                config.output.minimum_rarity.as_deref(),
            ),
            &config.settings.tags,
            &config.settings.variants,
        )
    }

    /// Chooses a piece for `layer` and folds it into `state`.
    pub fn select(
        &self,
        layer: &str,
        layer_name: &str,
        pieces: &BTreeMap<String, PieceDefinition>,
        state: &mut SelectionState,
        rng: &mut AssetRng,
    ) -> GenerateResult<ChosenPiece> {
        // Survivors in key order, each with its compatible variant subset.
        let mut survivors: Vec<(&String, &PieceDefinition, Vec<String>)> = Vec::new();
        for (key, piece) in pieces {
            if !tags_compatible(&piece.tags, &state.tags, self.tags) {
                continue;
            }
            if piece.variants.is_empty() {
                survivors.push((key, piece, Vec::new()));
                continue;
            }
            let compatible = compatible_variants(&piece.variants, state.variant(), self.variants);
            if !compatible.is_empty() {
                survivors.push((key, piece, compatible));
            }
        }

        if survivors.is_empty() {
            return Err(GenerateError::exhausted(layer, Exhaustion::NoCandidates));
        }

        let weights: Vec<f64> = survivors
            .iter()
            .map(|(_, piece, _)| self.weights.weight(&piece.rarity))
            .collect();
        let index = weighted_index(&weights, rng)
            .ok_or_else(|| GenerateError::exhausted(layer, Exhaustion::ZeroWeight))?;
        let (key, piece, compatible) = &survivors[index];

        let base_name = piece
            .friendly_name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| transform_name(key));

        let mut chosen = ChosenPiece {
            layer: layer.to_string(),
            layer_name: layer_name.to_string(),
            piece: (*key).clone(),
            friendly_name: base_name.clone(),
            rarity: piece.rarity.label(),
            variant: None,
            stats: piece.stats.clone(),
        };

        if !compatible.is_empty() {
            if state.variant.is_none() {
                // This layer establishes the asset's variant.
                let variant = piece.variants[rng.index(piece.variants.len())].clone();
                tracing::trace!(layer, variant = %variant, "variant established");
                state.variant = Some(variant.clone());
                chosen.variant = Some(variant);
            } else {
                let variant = compatible[rng.index(compatible.len())].clone();
                chosen.piece = format!("{key}_{variant}");
                chosen.friendly_name = format!("{variant} {base_name}");
                chosen.variant = Some(variant);
            }
        }

        state.merge_tags(&piece.tags);
        Ok(chosen)
    }

    /// Chooses one piece for every layer of `config`'s piece order.
    pub fn select_all(
        &self,
        config: &GeneratorConfig,
        rng: &mut AssetRng,
    ) -> GenerateResult<Vec<ChosenPiece>> {
        let mut state = SelectionState::new();
        config
            .settings
            .piece_order
            .iter()
            .map(|layer| {
                let catalog = config.catalog(layer)?;
                let name = config.layer_display_name(layer);
                self.select(layer, &name, &catalog.pieces, &mut state, rng)
            })
            .collect()
    }

    /// Total weight of a catalog ignoring tag and variant filters.
    pub fn unfiltered_weight(&self, catalog: &LayerCatalog) -> f64 {
        catalog
            .pieces
            .values()
            .map(|p| self.weights.weight(&p.rarity))
            .sum()
    }

    /// Rejects configs in which some layer can never yield a piece.
    ///
    /// A layer whose pieces weigh nothing before any filtering would fail in
    /// every job, so it is reported once up front as a run-fatal error.
    pub fn preflight(&self, config: &GeneratorConfig) -> GenerateResult<()> {
        if config.settings.piece_order.is_empty() {
            return Err(GenerateError::invalid_config("piece order is empty"));
        }
        for layer in &config.settings.piece_order {
            let catalog = config.catalog(layer)?;
            if self.unfiltered_weight(catalog) <= 0.0 {
                return Err(GenerateError::invalid_config(format!(
                    "layer '{layer}' has zero total rarity weight"
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
