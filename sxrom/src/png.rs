//! PNG export. Transparent engine pixels become fully transparent PNG
//! pixels so extracted assets composite cleanly elsewhere.

use std::path::Path;

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use sxr_core::gfx::{Color, ImageMatrix};

pub fn save_png(image: &ImageMatrix, path: &Path) -> Result<()> {
    let mut out = RgbaImage::new(image.width() as u32, image.height() as u32);
    for y in 0..image.height() {
        for x in 0..image.width() {
            let pixel = match image.get(x, y) {
                Some(Color { r, g, b }) => Rgba([r, g, b, 0xFF]),
                None => Rgba([0, 0, 0, 0]),
            };
            out.put_pixel(x as u32, y as u32, pixel);
        }
    }
    out.save(path)
        .with_context(|| format!("writing {}", path.display()))
}
