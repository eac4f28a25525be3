//! Piece artwork sources and decoding.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use image::RgbaImage;

use super::svg::{is_svg, rasterize_svg};
use crate::error::{GenerateError, GenerateResult};

// ============================================================================
// PieceSource
// ============================================================================

/// Supplies raw artwork bytes for the path fragments computed from config.
///
/// Sources are shared by every worker, so implementations must be `Sync`.
pub trait PieceSource: Sync {
    /// Reads the bytes stored under `path`.
    ///
    /// A path with nothing behind it must yield
    /// [`GenerateError::ConfigInputMissing`].
    fn read(&self, path: &str) -> GenerateResult<Vec<u8>>;

    /// Reads and decodes the artwork at `path` into an RGBA raster.
    fn load(&self, path: &str) -> GenerateResult<RgbaImage> {
        let bytes = self.read(path)?;
        decode_layer(path, &bytes)
    }
}

/// Reads artwork from the filesystem, relative to a root directory.
#[derive(Debug, Clone, Default)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl PieceSource for DirectorySource {
    fn read(&self, path: &str) -> GenerateResult<Vec<u8>> {
        let full = self.root.join(path);
        std::fs::read(&full).map_err(|source| match source.kind() {
            ErrorKind::NotFound => GenerateError::ConfigInputMissing {
                path: full.display().to_string(),
            },
            _ => GenerateError::Io {
                path: full.display().to_string(),
                source,
            },
        })
    }
}

/// Serves artwork from memory. Handy for tests and embedded asset packs.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the bytes served for `path`.
    pub fn insert(&mut self, path: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(path.into(), bytes);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, path: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(path, bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl PieceSource for MemorySource {
    fn read(&self, path: &str) -> GenerateResult<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| GenerateError::ConfigInputMissing {
                path: path.to_string(),
            })
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Decodes artwork bytes into an RGBA raster.
///
/// SVG markup is rasterized at its intrinsic size; anything else goes
/// through the `image` crate with the format sniffed from the bytes.
pub fn decode_layer(path: &str, bytes: &[u8]) -> GenerateResult<RgbaImage> {
    if is_svg(path, bytes) {
        return rasterize_svg(path, bytes);
    }
    let decoded = image::load_from_memory(bytes).map_err(|e| GenerateError::codec(path, e))?;
    Ok(decoded.to_rgba8())
}

/// Encodes a raster as PNG.
pub fn encode_png(raster: &RgbaImage) -> GenerateResult<Vec<u8>> {
    let mut out = std::io::Cursor::new(Vec::new());
    raster
        .write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| GenerateError::codec("png output", e))?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn png(color: [u8; 4]) -> Vec<u8> {
        encode_png(&RgbaImage::from_pixel(3, 2, Rgba(color))).unwrap()
    }

    #[test]
    fn memory_source_serves_and_decodes() {
        let source = MemorySource::new().with("bg_blue.png", png([0, 0, 255, 255]));
        let img = source.load("bg_blue.png").unwrap();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(1, 1).0, [0, 0, 255, 255]);
    }

    #[test]
    fn missing_piece_reports_path() {
        let source = MemorySource::new();
        match source.read("hat_crown.png").unwrap_err() {
            GenerateError::ConfigInputMissing { path } => assert_eq!(path, "hat_crown.png"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn garbage_bytes_are_codec_errors() {
        let err = decode_layer("bad.png", b"definitely not an image").unwrap_err();
        assert!(matches!(err, GenerateError::Codec { .. }));
    }

    #[test]
    fn directory_source_reads_relative_to_root() {
        let root = std::env::temp_dir().join(format!("looks-source-{}", std::process::id()));
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("bg_red.png"), png([255, 0, 0, 255])).unwrap();

        let source = DirectorySource::new(&root);
        let img = source.load("bg_red.png").unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 255]);

        let err = source.read("bg_none.png").unwrap_err();
        assert!(matches!(err, GenerateError::ConfigInputMissing { .. }));

        std::fs::remove_dir_all(&root).unwrap();
    }
}
