//! looks: layered collectible generator
//!
//! This crate batch-generates unique collectible images by stacking randomly
//! chosen artwork pieces, one per layer, under rarity weights and tag/variant
//! rules, and builds matching metadata (attribute list and a generated
//! description) for each image.
//!
//! # Example
//!
//! ```
//! use image::{Rgba, RgbaImage};
//! use looks::{GeneratorConfig, Generator, MemorySource, encode_png};
//!
//! let config = GeneratorConfig::from_json(r#"{
//!     "output": { "image-count": 2 },
//!     "settings": { "piece-order": ["bg"], "seed": 1 },
//!     "attributes": {
//!         "bg": { "pieces": { "red": { "rarity": 1 }, "blue": { "rarity": 1 } } }
//!     }
//! }"#).unwrap();
//!
//! let red = encode_png(&RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]))).unwrap();
//! let blue = encode_png(&RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]))).unwrap();
//! let source = MemorySource::new()
//!     .with("bg_red.png", red)
//!     .with("bg_blue.png", blue);
//!
//! let batch = Generator::new(&config, &source).run().unwrap();
//! assert_eq!(batch.assets.len(), 2);
//! assert_ne!(batch.assets[0].hash, batch.assets[1].hash);
//! ```
//!
//! # Pipeline
//!
//! Each job runs selection, artwork loading, compositing, PNG encoding,
//! hashing and metadata building on a worker thread (see [`Generator`]).
//! Once the pool has joined, [`CollisionResolver`] rebuilds any asset whose
//! image duplicates an earlier one.

mod asset;
mod config;
mod error;
mod layer;
mod metadata;
mod resolver;
mod rng;
mod scheduler;
mod selection;

#[cfg(test)]
mod test_support;

pub use asset::{AssetBuilder, AssetFactory, ContentHash, GeneratedAsset};
pub use config::{
    DEFAULT_COLLISION_PASSES, DEFAULT_WORKERS, DescriptionConfig, GeneratorConfig, InputSettings,
    LayerCatalog, MetaFormat, OutputSettings, PieceDefinition, Rarity, RarityTable, Settings,
    StatConfig, StatFragments, StaticAttribute, TagRules, transform_name,
};
pub use error::{Exhaustion, GenerateError, GenerateResult, JobFailure};
pub use layer::{
    Canvas, DirectorySource, MemorySource, PieceSource, alpha_blend, composite, decode_layer,
    encode_png,
};
pub use metadata::{
    Attribute, Description, Metadata, MetadataBuilder, StatAccumulator, StatValue, describe,
    oxford_join, pick_distinct, primary_stat,
};
pub use resolver::{CollisionResolver, find_collisions};
pub use rng::{AssetRng, derive_seed, entropy_seed};
pub use scheduler::{Batch, ErrorPolicy, Generator};
pub use selection::{
    ChosenPiece, RaritySelector, SelectionState, WeightResolver, compatible_variants,
    tags_compatible, weighted_index,
};

/// CSV helpers for metadata rows.
pub mod csv {
    pub use crate::metadata::csv::{DESCRIPTION_COLUMN, NAME_COLUMN, heading, heading_line, row};
}
