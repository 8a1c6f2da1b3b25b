//! Palette reads.

use crate::addr::Addr;
use crate::error::Result;
use crate::gfx::color::{snes_to_color, Color};
use crate::rom::Rom;

/// Sprite palettes omit the transparent entry, so raw pixel value 1 maps to
/// the first stored color.
pub const SPRITE_PALETTE_LEN: usize = 15;

/// An ordered run of colors read from the ROM. Index 0 of the raw pixel
/// space is reserved for transparency and has no stored color; use
/// [`Palette::color`] to apply that convention.
#[derive(Clone, Debug)]
pub struct Palette {
    pub addr: Addr,
    pub colors: Vec<Color>,
}

impl Palette {
    /// Color for a raw pixel value. 0 is transparent; value `v` maps to
    /// stored slot `v - 1`.
    pub fn color(&self, value: usize) -> Option<Color> {
        if value == 0 {
            None
        } else {
            self.colors.get(value - 1).copied()
        }
    }
}

/// Reads `length` consecutive color words starting at `addr`.
pub fn read_palette(rom: &Rom, addr: Addr, length: usize) -> Result<Palette> {
    let mut colors = Vec::with_capacity(length);
    for i in 0..length {
        colors.push(snes_to_color(rom.read_u16(addr.offset(i as i32 * 2))?));
    }
    Ok(Palette { addr, colors })
}
