//! Serializable generation config.
//!
//! A [`GeneratorConfig`] is the immutable per-run snapshot every stage reads
//! from: the layer order, each layer's piece catalog, the rarity bucket
//! table, stat ranges and description templates. Loading it from disk and
//! validating it are the caller's business; this module only defines the
//! shape and a few lookups.
//!
//! # JSON Format
//!
//! ```json
//! {
//!   "input": { "filename": "{layer}_{piece}.png", "pathname": "art" },
//!   "output": { "image-count": 100, "include-meta": true, "meta-format": "json" },
//!   "settings": {
//!     "piece-order": ["background", "body"],
//!     "rarity": { "order": ["common", "rare"], "chances": { "common": 80, "rare": 20 } },
//!     "max-workers": 4
//!   },
//!   "attributes": {
//!     "background": { "pieces": { "blue": { "rarity": "common" } } },
//!     "body": { "pieces": { "tall": { "rarity": 2.5, "tags": ["tall"] } } }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{GenerateError, GenerateResult};

// ============================================================================
// Input / Output
// ============================================================================

/// Where piece artwork lives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "kebab-case", default)]
pub struct InputSettings {
    /// Filename template. `{layer}` and `{piece}` are substituted.
    pub filename: String,

    /// Directory prefix joined in front of the expanded filename.
    pub pathname: String,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            filename: "{layer}_{piece}.png".to_string(),
            pathname: String::new(),
        }
    }
}

impl InputSettings {
    /// Expands the filename template for one chosen piece.
    pub fn piece_path(&self, layer: &str, piece: &str) -> String {
        let filename = self
            .filename
            .replace("{layer}", layer)
            .replace("{piece}", piece);
        if self.pathname.is_empty() {
            filename
        } else {
            format!("{}/{}", self.pathname.trim_end_matches('/'), filename)
        }
    }
}

/// Serialization format for per-asset metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum MetaFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputSettings {
    pub image_count: usize,

    /// Whether a metadata buffer (and description) is produced per asset.
    pub include_meta: bool,

    pub meta_format: MetaFormat,

    /// Named rarity bucket below which bucket weights are discounted to zero.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_rarity: Option<String>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            image_count: 0,
            include_meta: true,
            meta_format: MetaFormat::Json,
            minimum_rarity: None,
        }
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Inclusion/exclusion rules keyed by tag (or variant) name.
///
/// `exclusive["a"] = ["b"]` forbids `a` from joining an asset that already
/// carries `b`. `inclusive["a"] = ["b"]` requires `b` to be present first.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct TagRules {
    pub inclusive: BTreeMap<String, Vec<String>>,
    pub exclusive: BTreeMap<String, Vec<String>>,
}

/// Named rarity buckets.
///
/// `order` runs from the most common bucket to the rarest; `chances` holds
/// each bucket's weight.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct RarityTable {
    pub order: Vec<String>,
    pub chances: BTreeMap<String, f64>,
}

/// A stat every asset carries, clamped to `[minimum, maximum]`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct StatConfig {
    /// Display name. Derived from the stat key when empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub minimum: i64,
    pub maximum: i64,
}

/// An attribute attached to every asset regardless of the pieces chosen.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct StaticAttribute {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Display type. `"timestamp"` is replaced by the generation time.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    /// Layer keys, bottom-most first.
    pub piece_order: Vec<String>,
    pub stats: BTreeMap<String, StatConfig>,
    pub attributes: BTreeMap<String, StaticAttribute>,
    pub rarity: RarityTable,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_workers: Option<usize>,
    pub tags: TagRules,
    pub variants: TagRules,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_collision_passes: Option<usize>,
    /// Fixed run seed. Drawn from entropy when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

// ============================================================================
// Piece Catalog
// ============================================================================

/// A piece's weight: a named bucket or a raw number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(untagged)]
pub enum Rarity {
    Numeric(f64),
    Named(String),
}

impl Default for Rarity {
    fn default() -> Self {
        Self::Numeric(1.0)
    }
}

impl Rarity {
    /// Label recorded alongside the chosen piece.
    pub fn label(&self) -> String {
        match self {
            Self::Numeric(w) => w.to_string(),
            Self::Named(bucket) => bucket.clone(),
        }
    }
}

/// One artwork option for a layer.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "kebab-case", default)]
pub struct PieceDefinition {
    pub rarity: Rarity,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<String>,
    /// Signed stat deltas keyed by stat key.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub stats: BTreeMap<String, i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
}

/// All pieces available for one layer.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "kebab-case", default)]
pub struct LayerCatalog {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
    pub pieces: BTreeMap<String, PieceDefinition>,
}

// ============================================================================
// Descriptions
// ============================================================================

/// Fragment bucket used when a stat is the asset's primary stat.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct StatFragments {
    pub name: String,
    pub descriptors: Vec<String>,
    pub hobbies: Vec<String>,
}

/// Description templates.
///
/// Simple mode uses `{fragments}` in the template; stat mode uses `{name}`,
/// `{descriptor}` and `{hobbies}`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "kebab-case", default)]
pub struct DescriptionConfig {
    pub template: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_primary_stat: Option<String>,
    pub fragment_count: usize,
    pub stat_fragments: BTreeMap<String, StatFragments>,
    pub simple_fragments: Vec<String>,
}

// ============================================================================
// GeneratorConfig
// ============================================================================

/// Default worker count when the config leaves it unset.
pub const DEFAULT_WORKERS: usize = 3;

/// Default ceiling on collision regeneration passes.
pub const DEFAULT_COLLISION_PASSES: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct GeneratorConfig {
    pub input: InputSettings,
    pub output: OutputSettings,
    pub settings: Settings,
    /// Piece catalogs keyed by layer.
    pub attributes: BTreeMap<String, LayerCatalog>,
    pub descriptions: DescriptionConfig,
}

impl GeneratorConfig {
    pub fn from_json(json: &str) -> GenerateResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> GenerateResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Returns the catalog for a layer named in `piece-order`.
    pub fn catalog(&self, layer: &str) -> GenerateResult<&LayerCatalog> {
        self.attributes.get(layer).ok_or_else(|| {
            GenerateError::invalid_config(format!("layer '{layer}' has no piece catalog"))
        })
    }

    /// Display name for a layer key.
    pub fn layer_display_name(&self, layer: &str) -> String {
        self.attributes
            .get(layer)
            .and_then(|c| c.friendly_name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| transform_name(layer))
    }

    /// Display name for a stat key.
    pub fn stat_display_name(&self, stat: &str) -> String {
        self.settings
            .stats
            .get(stat)
            .and_then(|s| s.name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| transform_name(stat))
    }

    pub fn worker_count(&self) -> usize {
        self.settings.max_workers.unwrap_or(DEFAULT_WORKERS).max(1)
    }

    pub fn collision_passes(&self) -> usize {
        self.settings
            .max_collision_passes
            .unwrap_or(DEFAULT_COLLISION_PASSES)
    }
}

/// Turns an identifier into a display name: `dark_blue-eyes` → `Dark Blue Eyes`.
pub fn transform_name(name: &str) -> String {
    name.split(['_', '-', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "input": { "filename": "{layer}/{piece}.png", "pathname": "art/" },
        "output": { "image-count": 5, "meta-format": "csv", "minimum-rarity": "rare" },
        "settings": {
            "piece-order": ["background", "hat"],
            "stats": { "strength": { "minimum": 0, "maximum": 10 } },
            "rarity": { "order": ["common", "rare"], "chances": { "common": 80, "rare": 20 } },
            "tags": { "exclusive": { "crown": ["helmet"] } }
        },
        "attributes": {
            "background": { "pieces": { "blue": { "rarity": "common" } } },
            "hat": {
                "friendly-name": "Headwear",
                "pieces": { "crown": { "rarity": 2.5, "tags": ["crown"], "stats": { "strength": 3 } } }
            }
        }
    }"#;

    #[test]
    fn parses_kebab_case_config() {
        let config = GeneratorConfig::from_json(SAMPLE).unwrap();

        assert_eq!(config.output.image_count, 5);
        assert_eq!(config.output.meta_format, MetaFormat::Csv);
        assert_eq!(config.output.minimum_rarity.as_deref(), Some("rare"));
        assert!(config.output.include_meta);
        assert_eq!(config.settings.piece_order, vec!["background", "hat"]);
        assert_eq!(config.settings.tags.exclusive["crown"], vec!["helmet"]);
        assert_eq!(config.worker_count(), DEFAULT_WORKERS);
    }

    #[test]
    fn rarity_accepts_names_and_numbers() {
        let config = GeneratorConfig::from_json(SAMPLE).unwrap();

        let blue = &config.attributes["background"].pieces["blue"];
        assert_eq!(blue.rarity, Rarity::Named("common".into()));

        let crown = &config.attributes["hat"].pieces["crown"];
        assert_eq!(crown.rarity, Rarity::Numeric(2.5));
        assert_eq!(crown.stats["strength"], 3);
    }

    #[test]
    fn piece_path_expands_template() {
        let config = GeneratorConfig::from_json(SAMPLE).unwrap();
        assert_eq!(config.input.piece_path("hat", "crown"), "art/hat/crown.png");

        let bare = InputSettings {
            filename: "{layer}-{piece}.svg".into(),
            pathname: String::new(),
        };
        assert_eq!(bare.piece_path("bg", "red"), "bg-red.svg");
    }

    #[test]
    fn display_names_fall_back_to_transformed_keys() {
        let config = GeneratorConfig::from_json(SAMPLE).unwrap();
        assert_eq!(config.layer_display_name("hat"), "Headwear");
        assert_eq!(config.layer_display_name("background"), "Background");
        assert_eq!(config.stat_display_name("strength"), "Strength");
    }

    #[test]
    fn transform_name_title_cases_words() {
        assert_eq!(transform_name("dark_blue-eyes"), "Dark Blue Eyes");
        assert_eq!(transform_name("hat"), "Hat");
        assert_eq!(transform_name("__"), "");
    }

    #[test]
    fn missing_catalog_is_invalid_config() {
        let config = GeneratorConfig::from_json(SAMPLE).unwrap();
        let err = config.catalog("shoes").unwrap_err();
        assert!(err.is_run_fatal());
    }

    #[test]
    fn empty_config_deserializes() {
        let config = GeneratorConfig::from_json("{}").unwrap();
        assert!(config.settings.piece_order.is_empty());
        assert_eq!(config.input.filename, "{layer}_{piece}.png");
        assert_eq!(config.collision_passes(), DEFAULT_COLLISION_PASSES);
    }

    #[test]
    fn json_roundtrip_keeps_kebab_keys() {
        let config = GeneratorConfig::from_json(SAMPLE).unwrap();
        let json = config.to_json_pretty().unwrap();
        assert!(json.contains("\"piece-order\""));
        assert!(json.contains("\"image-count\""));
        assert_eq!(GeneratorConfig::from_json(&json).unwrap(), config);
    }
}
