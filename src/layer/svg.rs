//! SVG artwork rasterization using resvg/usvg.
//!
//! SVG pieces are rendered at their intrinsic size so they line up pixel for
//! pixel with raster pieces of the same canvas.

use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};

use crate::error::{GenerateError, GenerateResult};

/// Returns true if `path` or `bytes` look like SVG markup.
pub fn is_svg(path: &str, bytes: &[u8]) -> bool {
    if path.to_ascii_lowercase().ends_with(".svg") {
        return true;
    }
    let head = &bytes[..bytes.len().min(256)];
    let text = String::from_utf8_lossy(head);
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    trimmed.starts_with("<svg") || trimmed.starts_with("<?xml")
}

/// Rasterizes SVG markup at its intrinsic size.
pub fn rasterize_svg(path: &str, bytes: &[u8]) -> GenerateResult<RgbaImage> {
    let opts = Options::default();
    let tree = Tree::from_data(bytes, &opts).map_err(|e| GenerateError::codec(path, e))?;

    let size = tree.size().to_int_size();
    let mut pixmap = Pixmap::new(size.width(), size.height())
        .ok_or_else(|| GenerateError::codec(path, "SVG has an empty canvas"))?;
    resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());

    Ok(pixmap_to_rgba_image(&pixmap))
}

/// Converts a tiny_skia Pixmap to an image::RgbaImage.
fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());

    for (pixel, out) in pixmap.pixels().iter().zip(img.pixels_mut()) {
        // tiny_skia stores premultiplied alpha
        let c = pixel.demultiply();
        *out = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }

    img
}
