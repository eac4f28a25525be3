//! Fixtures shared by the unit tests.

use image::{Rgba, RgbaImage};

use crate::config::{GeneratorConfig, LayerCatalog, PieceDefinition, Rarity};
use crate::layer::{MemorySource, encode_png};

pub fn png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    encode_png(&RgbaImage::from_pixel(width, height, Rgba(color))).unwrap()
}

/// A 2x2 raster, transparent except for one opaque corner pixel.
pub fn corner_png(color: [u8; 4]) -> Vec<u8> {
    let mut img = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0]));
    img.put_pixel(0, 0, Rgba(color));
    encode_png(&img).unwrap()
}

/// Two layers (`bg`, `fg`), each with pieces `a` and `b` of equal weight.
///
/// All four combinations composite to distinct images.
pub fn two_by_two(image_count: usize) -> (GeneratorConfig, MemorySource) {
    let mut config = GeneratorConfig::default();
    config.output.image_count = image_count;
    config.settings.piece_order = vec!["bg".into(), "fg".into()];
    for layer in ["bg", "fg"] {
        let mut catalog = LayerCatalog::default();
        for piece in ["a", "b"] {
            catalog.pieces.insert(
                piece.into(),
                PieceDefinition {
                    rarity: Rarity::Numeric(1.0),
                    ..Default::default()
                },
            );
        }
        config.attributes.insert(layer.into(), catalog);
    }

    let source = MemorySource::new()
        .with("bg_a.png", png(2, 2, [255, 0, 0, 255]))
        .with("bg_b.png", png(2, 2, [0, 255, 0, 255]))
        .with("fg_a.png", corner_png([0, 0, 255, 255]))
        .with("fg_b.png", corner_png([255, 255, 0, 255]));
    (config, source)
}

/// Routes `tracing` output through the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
