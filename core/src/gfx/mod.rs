//! Pixel-level decoding: colors, palettes, tiles and the matrix types
//! everything is assembled with.

pub mod color;
pub mod matrix;
pub mod palette;
pub mod tile;

pub use color::{color_to_snes, snes_to_color, Color};
pub use matrix::{ImageMatrix, Matrix, PixelMatrix};
pub use palette::{read_palette, Palette};
pub use tile::{assemble_grid, decode_raw_tile, decode_tile, Bpp, TileOptions, TilemapEntry};
