//! Sprite structures: header + coordinate table + tile table, and the
//! full-ROM scanner that rediscovers sprite boundaries.

pub mod header;

use log::debug;

use crate::addr::Addr;
use crate::error::{Error, Result};
use crate::gfx::{decode_raw_tile, Bpp, ImageMatrix, Palette, PixelMatrix};
use crate::rom::Rom;

pub use header::{build_header_from_tile_quantity, SpriteHeader};

pub const CANVAS_SIZE: usize = 256;

const TILE_BYTES: usize = Bpp::Four.bytes_per_tile();

/// One drawable piece of a sprite. Large parts are assembled from four
/// consecutive stored 8x8 tiles in top-left, top-right, bottom-left,
/// bottom-right order.
#[derive(Clone, Debug)]
pub enum SpritePart {
    Small {
        tile: Addr,
        x: u8,
        y: u8,
        pixels: PixelMatrix,
    },
    Large {
        tiles: [Addr; 4],
        x: u8,
        y: u8,
        pixels: PixelMatrix,
    },
}

impl SpritePart {
    pub fn coord(&self) -> (u8, u8) {
        match self {
            SpritePart::Small { x, y, .. } | SpritePart::Large { x, y, .. } => (*x, *y),
        }
    }

    pub fn pixels(&self) -> &PixelMatrix {
        match self {
            SpritePart::Small { pixels, .. } | SpritePart::Large { pixels, .. } => pixels,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Sprite {
    pub addr: Addr,
    pub header: SpriteHeader,
    pub parts: Vec<SpritePart>,
}

/// Decodes the sprite structure at `addr`, validating its header first.
pub fn decode_sprite(rom: &Rom, addr: Addr) -> Result<Sprite> {
    let header = SpriteHeader::read(rom, addr)?;
    header.validate(addr)?;

    let coords = addr.offset(8);
    let tiles = coords.offset(header.part_count() as i32 * 2);

    let mut parts = Vec::with_capacity(header.part_count());
    let mut tile_index = 0usize;
    for part in 0..header.part_count() {
        let x = rom.read_u8(coords.offset(part as i32 * 2))?;
        let y = rom.read_u8(coords.offset(part as i32 * 2 + 1))?;
        if part < header.large as usize {
            let mut quad = [Addr::from_linear(0); 4];
            let mut pixels = PixelMatrix::new(16, 16);
            for corner in 0..4 {
                let tile_addr = tiles.offset((tile_index * TILE_BYTES) as i32);
                quad[corner] = tile_addr;
                let data = rom.read_n(tile_addr, TILE_BYTES)?;
                let tile = decode_raw_tile(data, 0, Bpp::Four);
                pixels.blit(&tile, corner % 2 * 8, corner / 2 * 8);
                tile_index += 1;
            }
            parts.push(SpritePart::Large { tiles: quad, x, y, pixels });
        } else {
            let tile_addr = tiles.offset((tile_index * TILE_BYTES) as i32);
            let data = rom.read_n(tile_addr, TILE_BYTES)?;
            let pixels = decode_raw_tile(data, 0, Bpp::Four);
            tile_index += 1;
            parts.push(SpritePart::Small { tile: tile_addr, x, y, pixels });
        }
    }

    Ok(Sprite { addr, header, parts })
}

impl Sprite {
    /// Bytes from the header through the last stored tile.
    pub fn byte_len(&self) -> usize {
        8 + self.header.part_count() * 2 + self.header.stored_tiles() * TILE_BYTES
    }

    fn part_in_canvas(part: &SpritePart) -> bool {
        let (x, y) = part.coord();
        let side = part.pixels().width();
        x as usize + side <= CANVAS_SIZE && y as usize + side <= CANVAS_SIZE
    }

    /// Renders all parts onto a 256x256 canvas. A part falling outside the
    /// canvas is a hard error, not clamped.
    pub fn to_image(&self, palette: &Palette) -> Result<ImageMatrix> {
        let mut canvas = ImageMatrix::new(CANVAS_SIZE, CANVAS_SIZE);
        for part in &self.parts {
            let (x, y) = part.coord();
            if !Self::part_in_canvas(part) {
                return Err(Error::InvalidSprite {
                    addr: self.addr,
                    x: x as usize,
                    y: y as usize,
                });
            }
            let pixels = part.pixels();
            let mut image = ImageMatrix::new(pixels.width(), pixels.height());
            for py in 0..pixels.height() {
                for px in 0..pixels.width() {
                    let value = pixels.get(px, py) as usize;
                    if value != 0 {
                        image.set(px, py, palette.color(value));
                    }
                }
            }
            canvas.overlay(&image, x as usize, y as usize);
        }
        Ok(canvas)
    }
}

/// Walks the whole buffer one byte at a time looking for offsets whose
/// bytes survive header round-trip validation and decode into a sprite that
/// fits its canvas. High-frequency candidate failures are expected and
/// swallowed; only clean hits are returned.
pub fn scan_sprites(rom: &Rom) -> Vec<Sprite> {
    let mut found = Vec::new();
    for offset in 0..rom.len().saturating_sub(8) {
        if offset % 0x10000 == 0 {
            debug!("sprite scan at {:#08x}, {} found", offset, found.len());
        }
        let addr = Addr::from_linear(offset as u32);
        let sprite = match decode_sprite(rom, addr) {
            Ok(sprite) => sprite,
            Err(_) => continue,
        };
        if sprite.parts.iter().all(Sprite::part_in_canvas) {
            found.push(sprite);
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::Color;

    /// 32 bytes of 4bpp tile data rendering every pixel as `value`.
    fn solid_tile(value: u8) -> [u8; 32] {
        let mut data = [0u8; 32];
        for row in 0..8 {
            for plane in 0..4 {
                if value >> plane & 1 == 1 {
                    data[(plane / 2) * 16 + row * 2 + plane % 2] = 0xFF;
                }
            }
        }
        data
    }

    fn gray_palette() -> Palette {
        Palette {
            addr: Addr::from_linear(0),
            colors: (1..16u8).map(|v| Color { r: v, g: v, b: v }).collect(),
        }
    }

    /// Builds a ROM holding one sprite at offset 0: `large` + `small1`
    /// parts, every part at the given coords, tiles filled with value 1.
    fn synthetic_sprite_rom(large: u8, small1: u8, coords: &[(u8, u8)]) -> Rom {
        let header = build_header_from_tile_quantity(large, small1, 0);
        let mut data = vec![
            header.large,
            header.small1,
            header.small1_offset,
            header.small2,
            header.small2_offset,
            header.dma1_count,
            header.dma2_offset,
            header.dma2_count,
        ];
        for &(x, y) in coords {
            data.push(x);
            data.push(y);
        }
        let tiles = large as usize * 4 + small1 as usize;
        for _ in 0..tiles {
            data.extend_from_slice(&solid_tile(1));
        }
        data.resize(0x8000, 0xFF);
        Rom::new(data)
    }

    #[test]
    fn one_large_part_from_four_tiles() {
        let rom = synthetic_sprite_rom(1, 0, &[(40, 60)]);
        let sprite = decode_sprite(&rom, Addr::from_linear(0)).unwrap();
        assert_eq!(sprite.parts.len(), 1);
        match &sprite.parts[0] {
            SpritePart::Large { tiles, x, y, pixels } => {
                assert_eq!((*x, *y), (40, 60));
                assert_eq!(pixels.width(), 16);
                // four consecutive 32-byte tiles after header + 1 coord pair
                let base = 8 + 2;
                for (i, t) in tiles.iter().enumerate() {
                    assert_eq!(t.linear(), base + i * 32);
                }
                for py in 0..16 {
                    for px in 0..16 {
                        assert_eq!(pixels.get(px, py), 1);
                    }
                }
            }
            other => panic!("expected a large part, got {other:?}"),
        }
        assert_eq!(sprite.byte_len(), 8 + 2 + 4 * 32);
    }

    #[test]
    fn image_places_part_at_coordinate() {
        let rom = synthetic_sprite_rom(1, 0, &[(40, 60)]);
        let sprite = decode_sprite(&rom, Addr::from_linear(0)).unwrap();
        let image = sprite.to_image(&gray_palette()).unwrap();
        assert_eq!(image.get(40, 60), Some(Color { r: 1, g: 1, b: 1 }));
        assert_eq!(image.get(55, 75), Some(Color { r: 1, g: 1, b: 1 }));
        assert_eq!(image.get(39, 60), None);
        assert_eq!(image.get(56, 75), None);
    }

    #[test]
    fn part_outside_canvas_is_fatal() {
        let rom = synthetic_sprite_rom(1, 0, &[(250, 10)]);
        let sprite = decode_sprite(&rom, Addr::from_linear(0)).unwrap();
        assert!(matches!(
            sprite.to_image(&gray_palette()),
            Err(Error::InvalidSprite { .. })
        ));
    }

    #[test]
    fn corrupt_header_is_rejected() {
        let rom = synthetic_sprite_rom(2, 3, &[(0, 0); 5]);
        let mut bytes = rom.read_n(Addr::from_linear(0), 0x8000).unwrap().to_vec();
        bytes[5] ^= 0x01; // dma1_count
        let bad = Rom::new(bytes);
        assert!(matches!(
            decode_sprite(&bad, Addr::from_linear(0)),
            Err(Error::InvalidSpriteHeader(_))
        ));
    }

    #[test]
    fn scan_finds_a_planted_sprite() {
        let mut data = vec![0xFFu8; 0x8000];
        let sprite_rom = synthetic_sprite_rom(1, 2, &[(8, 8), (30, 30), (40, 40)]);
        let len = 8 + 3 * 2 + 6 * 32;
        let bytes = sprite_rom.read_n(Addr::from_linear(0), len).unwrap();
        data[0x1000..0x1000 + len].copy_from_slice(bytes);
        let rom = Rom::new(data);

        let found = scan_sprites(&rom);
        assert!(found.iter().any(|s| s.addr == Addr::from_linear(0x1000)));
    }
}
