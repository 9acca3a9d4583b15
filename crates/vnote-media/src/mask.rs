//! Alpha masks for round video notes.

use std::path::Path;

use image::{Rgba, RgbaImage};

use crate::error::MediaResult;

const OPAQUE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Write a `size`x`size` PNG with an opaque white disc on a transparent background.
pub fn write_circle_mask(path: impl AsRef<Path>, size: u32) -> MediaResult<()> {
    circle_mask(size).save(path.as_ref())?;
    Ok(())
}

fn circle_mask(size: u32) -> RgbaImage {
    let radius = size as f64 / 2.0;
    RgbaImage::from_fn(size, size, |x, y| {
        // Sample pixel centers
        let dx = x as f64 + 0.5 - radius;
        let dy = y as f64 + 0.5 - radius;
        if dx * dx + dy * dy <= radius * radius {
            OPAQUE
        } else {
            TRANSPARENT
        }
    })
}
