//! Building one asset from one job index.
//!
//! ```text
//! (seed, job, attempt) ──► select ──► load ──► composite ──► PNG ──► hash
//!                             │                                       │
//!                             └───────────► metadata ◄────────────────┘
//! ```

use std::fmt;

use crate::config::GeneratorConfig;
use crate::error::{GenerateError, GenerateResult};
use crate::layer::{Canvas, PieceSource, encode_png};
use crate::metadata::MetadataBuilder;
use crate::rng::AssetRng;
use crate::selection::{ChosenPiece, RaritySelector};

// ============================================================================
// ContentHash
// ============================================================================

/// BLAKE3 digest of an encoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(blake3::Hash);

impl ContentHash {
    pub fn of(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.to_hex().as_str())
    }
}

// ============================================================================
// GeneratedAsset
// ============================================================================

/// The output of one job.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedAsset {
    /// Job index; also the asset's name.
    pub job: usize,
    /// Build attempt that produced this asset. Collision regeneration bumps it.
    pub attempt: u32,
    /// PNG-encoded image.
    pub image: Vec<u8>,
    /// Serialized metadata. Empty when metadata output is disabled.
    pub meta: Vec<u8>,
    /// Hash of `image`.
    pub hash: ContentHash,
    /// Pieces chosen for each layer, in piece order.
    pub pieces: Vec<ChosenPiece>,
}

impl GeneratedAsset {
    /// Wraps encoded buffers, hashing the image.
    pub fn new(
        job: usize,
        attempt: u32,
        image: Vec<u8>,
        meta: Vec<u8>,
        pieces: Vec<ChosenPiece>,
    ) -> Self {
        Self {
            hash: ContentHash::of(&image),
            job,
            attempt,
            image,
            meta,
            pieces,
        }
    }
}

// ============================================================================
// AssetFactory
// ============================================================================

/// Anything that can (re)build the asset for a job.
///
/// Shared by every worker thread.
pub trait AssetFactory: Sync {
    fn build(&self, job: usize, attempt: u32) -> GenerateResult<GeneratedAsset>;
}

/// Builds assets from config and piece artwork.
pub struct AssetBuilder<'a> {
    config: &'a GeneratorConfig,
    source: &'a dyn PieceSource,
    selector: RaritySelector<'a>,
    metadata: MetadataBuilder<'a>,
    seed: u64,
}

impl<'a> AssetBuilder<'a> {
    /// `generated_at` is the run's generation time in unix seconds.
    pub fn new(
        config: &'a GeneratorConfig,
        source: &'a dyn PieceSource,
        seed: u64,
        generated_at: i64,
    ) -> Self {
        Self {
            config,
            source,
            selector: RaritySelector::from_config(config),
            metadata: MetadataBuilder::new(config, generated_at),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// CSV column labels matching the rows this builder writes.
    pub fn heading(&self) -> &[String] {
        self.metadata.heading()
    }

    /// Checks that every layer can yield a piece.
    pub fn preflight(&self) -> GenerateResult<()> {
        self.selector.preflight(self.config)
    }
}

impl AssetFactory for AssetBuilder<'_> {
    #[tracing::instrument(level = "debug", skip(self))]
    fn build(&self, job: usize, attempt: u32) -> GenerateResult<GeneratedAsset> {
        let mut rng = AssetRng::for_job(self.seed, job, attempt);
        let pieces = self.selector.select_all(self.config, &mut rng)?;

        let mut layers = pieces.iter().map(|piece| {
            let path = self.config.input.piece_path(&piece.layer, &piece.piece);
            self.source.load(&path)
        });
        let base = layers
            .next()
            .ok_or_else(|| GenerateError::invalid_config("piece order is empty"))??;
        let mut canvas = Canvas::from_base(base);
        for layer in layers {
            canvas.stack(&layer?)?;
        }
        let image = encode_png(&canvas.into_image())?;

        let meta = self.metadata.encode(job, &pieces, &mut rng)?;
        let asset = GeneratedAsset::new(job, attempt, image, meta, pieces);
        tracing::debug!(hash = %asset.hash, "asset built");
        Ok(asset)
    }
}
