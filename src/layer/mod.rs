//! Layer loading and compositing.
//!
//! A finished asset is a stack of decoded piece rasters, bottom layer first.
//! Layer 0 fixes the canvas bounds and is copied verbatim; every later layer
//! is blended on top with straight-alpha source-over compositing.
//!
//! ```text
//! layer 0 ──copy──► canvas
//! layer 1 ──over──► canvas
//!   ...
//! layer n ──over──► canvas ──► RGBA raster
//! ```
//!
//! No scaling or color-space conversion happens here; every layer must share
//! layer 0's pixel bounds.

pub mod source;
pub mod svg;

pub use source::{DirectorySource, MemorySource, PieceSource, decode_layer, encode_png};

use image::{Rgba, RgbaImage};

use crate::error::{GenerateError, GenerateResult};

// ============================================================================
// Canvas
// ============================================================================

/// An in-progress composite.
///
/// Layers are pushed one at a time so a job never holds more than the canvas
/// and the layer being blended.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    image: RgbaImage,
    layers: usize,
}

impl Canvas {
    /// Starts a canvas from layer 0, copied verbatim.
    pub fn from_base(base: RgbaImage) -> Self {
        Self {
            image: base,
            layers: 1,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Number of layers composited so far.
    pub fn layer_count(&self) -> usize {
        self.layers
    }

    /// Blends `layer` over the canvas.
    ///
    /// Fails with [`GenerateError::DimensionMismatch`] when the layer's bounds
    /// differ from the canvas.
    pub fn stack(&mut self, layer: &RgbaImage) -> GenerateResult<()> {
        if layer.dimensions() != self.image.dimensions() {
            return Err(GenerateError::DimensionMismatch {
                index: self.layers,
                expected_width: self.image.width(),
                expected_height: self.image.height(),
                found_width: layer.width(),
                found_height: layer.height(),
            });
        }

        for (dst, src) in self.image.pixels_mut().zip(layer.pixels()) {
            *dst = alpha_blend(*src, *dst);
        }
        self.layers += 1;
        Ok(())
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

/// Composites `layers` in order into one raster.
pub fn composite(layers: &[RgbaImage]) -> GenerateResult<RgbaImage> {
    let (base, rest) = layers
        .split_first()
        .ok_or_else(|| GenerateError::invalid_config("nothing to composite"))?;

    let mut canvas = Canvas::from_base(base.clone());
    for layer in rest {
        canvas.stack(layer)?;
    }
    Ok(canvas.into_image())
}

// ============================================================================
// Blending
// ============================================================================

/// Alpha blends two RGBA pixels (source over destination).
pub fn alpha_blend(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    match src[3] {
        255 => return src,
        0 => return dst,
        _ => {}
    }

    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;

    // Source over compositing
    let out_a = sa + da * (1.0 - sa);

    if out_a == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend = |s: u8, d: u8| -> u8 {
        let sf = s as f32 / 255.0;
        let df = d as f32 / 255.0;
        let out = (sf * sa + df * da * (1.0 - sa)) / out_a;
        (out * 255.0).round() as u8
    };

    Rgba([
        blend(src[0], dst[0]),
        blend(src[1], dst[1]),
        blend(src[2], dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}

// ============================================================================
// Tests
// ============================================================================
