//! Planar tile decoding and grid assembly.

use bit_field::BitField;

use crate::gfx::matrix::{ImageMatrix, Matrix, PixelMatrix};
use crate::gfx::palette::Palette;

pub const TILE_SIZE: usize = 8;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Bpp {
    Two,
    Four,
}

impl Bpp {
    pub const fn bytes_per_tile(self) -> usize {
        match self {
            Bpp::Two => 16,
            Bpp::Four => 32,
        }
    }

    fn planes(self) -> usize {
        match self {
            Bpp::Two => 2,
            Bpp::Four => 4,
        }
    }

    /// Colors per palette row at this depth.
    pub fn palette_stride(self) -> usize {
        match self {
            Bpp::Two => 4,
            Bpp::Four => 16,
        }
    }
}

/// One packed tile-map word: `vflip:1 hflip:1 priority:1 palette:3 tile:10`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct TilemapEntry {
    pub tile: u16,
    pub palette: u8,
    pub priority: bool,
    pub h_flip: bool,
    pub v_flip: bool,
}

impl TilemapEntry {
    pub fn from_word(word: u16) -> Self {
        TilemapEntry {
            tile: word.get_bits(0..10),
            palette: word.get_bits(10..13) as u8,
            priority: word.get_bit(13),
            h_flip: word.get_bit(14),
            v_flip: word.get_bit(15),
        }
    }
}

/// Decode options. `suppress_priority` culls tiles of one priority class
/// (background/foreground split renders); `opaque_zero` draws pixel value 0
/// with the palette row's reserved color instead of transparency.
#[derive(Copy, Clone, Default, Debug)]
pub struct TileOptions {
    pub opaque_zero: bool,
    pub suppress_priority: Option<bool>,
}

/// Unpacks the 8x8 tile at `offset` in `tileset` into palette-index pixels.
///
/// Planes 0 and 1 interleave per row in the first 16 bytes; at 4bpp planes
/// 2 and 3 follow the same pattern 16 bytes in. Plane `k` contributes bit
/// `k` of the pixel value, and the most significant bit of every plane byte
/// is the leftmost pixel. Bytes past the end of the tileset read as 0.
pub fn decode_raw_tile(tileset: &[u8], offset: usize, bpp: Bpp) -> PixelMatrix {
    let byte = |i: usize| tileset.get(offset + i).copied().unwrap_or(0);
    let mut pixels = PixelMatrix::new(TILE_SIZE, TILE_SIZE);
    for y in 0..TILE_SIZE {
        let mut planes = [0u8; 4];
        for p in 0..bpp.planes() {
            planes[p] = byte((p / 2) * 16 + y * 2 + p % 2);
        }
        for x in 0..TILE_SIZE {
            let mut value = 0u8;
            for (p, plane) in planes.iter().enumerate() {
                value |= (plane >> (7 - x) & 1) << p;
            }
            pixels.set(x, y, value);
        }
    }
    pixels
}

/// Decodes one tile-map entry against a tileset and palette, producing an
/// 8x8 image with flips applied. A culled priority class comes back fully
/// transparent.
pub fn decode_tile(
    tileset: &[u8],
    entry: TilemapEntry,
    bpp: Bpp,
    palette: &Palette,
    options: TileOptions,
) -> ImageMatrix {
    let mut image = ImageMatrix::new(TILE_SIZE, TILE_SIZE);
    if options.suppress_priority == Some(entry.priority) {
        return image;
    }

    let pixels = decode_raw_tile(tileset, entry.tile as usize * bpp.bytes_per_tile(), bpp);
    let palette_offset = entry.palette as usize * bpp.palette_stride();
    for y in 0..TILE_SIZE {
        for x in 0..TILE_SIZE {
            let value = pixels.get(x, y) as usize;
            if value == 0 && !options.opaque_zero {
                continue;
            }
            image.set(x, y, palette.color(palette_offset + value));
        }
    }

    if entry.h_flip {
        image.flip_horizontal();
    }
    if entry.v_flip {
        image.flip_vertical();
    }
    image
}

/// Lays out same-size blocks row-major, `per_row` to a line. A pure tiling
/// helper shared by tileset dumps and meta-tile assembly.
pub fn assemble_grid<T: Copy + Default>(blocks: &[Matrix<T>], per_row: usize) -> Matrix<T> {
    if blocks.is_empty() || per_row == 0 {
        return Matrix::new(0, 0);
    }
    let (bw, bh) = (blocks[0].width(), blocks[0].height());
    let rows = blocks.len().div_ceil(per_row);
    let mut grid = Matrix::new(bw * per_row, bh * rows);
    for (i, block) in blocks.iter().enumerate() {
        grid.blit(block, (i % per_row) * bw, (i / per_row) * bh);
    }
    grid
}
