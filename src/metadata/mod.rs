//! Per-asset metadata.
//!
//! Metadata is built from the pieces chosen for an asset: one attribute per
//! layer, one per stat (summed and clamped), the configured static
//! attributes, and a generated description. It serializes either to an
//! indented JSON document or to a single CSV row.

pub mod csv;
pub mod description;
pub mod stats;

pub use description::{Description, describe, oxford_join, pick_distinct};
pub use stats::{StatAccumulator, StatValue, primary_stat};

use serde::Serialize;
use serde_json::Value;

use crate::config::{GeneratorConfig, MetaFormat, transform_name};
use crate::error::GenerateResult;
use crate::rng::AssetRng;
use crate::selection::ChosenPiece;

/// Static attribute type replaced by the run's generation time.
pub const TIMESTAMP_TYPE: &str = "timestamp";

// ============================================================================
// Metadata
// ============================================================================

/// Collectible metadata for one asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metadata {
    /// The job index, as text.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
}

/// One entry of the attribute list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub trait_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_type: Option<String>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub value: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<i64>,
}

impl Attribute {
    pub fn text(trait_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            trait_type: trait_type.into(),
            display_type: None,
            value: Value::String(value.into()),
            max_value: None,
        }
    }

    /// A numeric stat attribute.
    pub fn number(trait_type: impl Into<String>, value: i64, maximum: i64) -> Self {
        Self {
            trait_type: trait_type.into(),
            display_type: Some("number".to_string()),
            value: Value::from(value),
            max_value: Some(maximum),
        }
    }
}

impl Metadata {
    pub fn to_json(&self) -> GenerateResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Looks up an attribute by its trait type.
    pub fn attribute(&self, trait_type: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.trait_type == trait_type)
    }
}

// ============================================================================
// MetadataBuilder
// ============================================================================

/// Builds and serializes metadata for every asset of a run.
#[derive(Debug, Clone)]
pub struct MetadataBuilder<'a> {
    config: &'a GeneratorConfig,
    generated_at: i64,
    heading: Vec<String>,
}

impl<'a> MetadataBuilder<'a> {
    /// `generated_at` is the run's generation time in unix seconds.
    pub fn new(config: &'a GeneratorConfig, generated_at: i64) -> Self {
        Self {
            config,
            generated_at,
            heading: csv::heading(config),
        }
    }

    /// CSV column labels for this run.
    pub fn heading(&self) -> &[String] {
        &self.heading
    }

    /// Builds the metadata for job `job` from its chosen pieces.
    pub fn build(&self, job: usize, pieces: &[ChosenPiece], rng: &mut AssetRng) -> Metadata {
        self.assemble(job, pieces, rng).0
    }

    /// Metadata plus the clamped stats it was built from.
    fn assemble(
        &self,
        job: usize,
        pieces: &[ChosenPiece],
        rng: &mut AssetRng,
    ) -> (Metadata, Vec<StatValue>) {
        let mut attributes: Vec<Attribute> = pieces
            .iter()
            .map(|p| Attribute::text(&p.layer_name, &p.friendly_name))
            .collect();

        let mut acc = StatAccumulator::new(self.config);
        acc.add_pieces(pieces);
        let stats = acc.finish(self.config);
        attributes.extend(
            stats
                .iter()
                .map(|s| Attribute::number(&s.name, s.value, s.maximum)),
        );

        let description = describe(&self.config.descriptions, &stats, rng);

        for (key, attr) in &self.config.settings.attributes {
            let trait_type = attr
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| transform_name(key));
            let entry = match attr.kind.as_deref() {
                Some(TIMESTAMP_TYPE) => Attribute {
                    trait_type,
                    display_type: Some("date".to_string()),
                    value: Value::from(self.generated_at),
                    max_value: None,
                },
                kind => Attribute {
                    trait_type,
                    display_type: kind.map(str::to_string),
                    value: attr.value.clone(),
                    max_value: None,
                },
            };
            attributes.push(entry);
        }

        if let Some(kind) = &description.kind {
            attributes.push(Attribute::text("Type", kind));
        }

        let meta = Metadata {
            name: job.to_string(),
            description: description.text,
            attributes,
        };
        (meta, stats)
    }

    /// Builds and serializes metadata in the configured format.
    ///
    /// Returns an empty buffer when metadata output is disabled.
    pub fn encode(
        &self,
        job: usize,
        pieces: &[ChosenPiece],
        rng: &mut AssetRng,
    ) -> GenerateResult<Vec<u8>> {
        if !self.config.output.include_meta {
            return Ok(Vec::new());
        }
        let (meta, stats) = self.assemble(job, pieces, rng);
        match self.config.output.meta_format {
            MetaFormat::Json => meta.to_json(),
            MetaFormat::Csv => Ok(csv::row(&meta, pieces, &stats).into_bytes()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
