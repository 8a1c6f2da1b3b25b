//! 15-bit packed color conversion.

/// An 8-bit-per-channel RGB color.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Unpacks a hardware color word. Layout is `XBBBBBGGGGGRRRRR`; each 5-bit
/// channel is shifted up to 8 bits. The top bit is unused.
pub fn snes_to_color(word: u16) -> Color {
    Color {
        r: ((word & 0x1F) << 3) as u8,
        g: ((word >> 5 & 0x1F) << 3) as u8,
        b: ((word >> 10 & 0x1F) << 3) as u8,
    }
}

/// Exact inverse of [`snes_to_color`] over the low 15 bits.
pub fn color_to_snes(color: Color) -> u16 {
    (color.r as u16) >> 3 | ((color.g as u16) >> 3) << 5 | ((color.b as u16) >> 3) << 10
}
