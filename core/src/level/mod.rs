//! Level assembly.
//!
//! A level image is reconstructed the way the game itself builds one: an
//! entrance record names a terrain type and a tile-map; the terrain type's
//! loader routine is traced to find which graphics transfer descriptors and
//! palette it would have queued; the transfers are replayed into a 64 KB
//! buffer standing in for video memory; and the tile-map is then rendered
//! as a grid of 32x32 meta-tiles against that buffer.

use hashbrown::HashMap;
use log::debug;

use crate::addr::Addr;
use crate::compress::decompress;
use crate::constants::GameConstants;
use crate::error::{Error, Result};
use crate::gfx::matrix::ImageMatrix;
use crate::gfx::palette::{read_palette, Palette};
use crate::gfx::tile::{decode_tile, Bpp, TileOptions, TilemapEntry, TILE_SIZE};
use crate::rom::Rom;
use crate::trace;

/// Colors addressable by a 4bpp background tile across all 8 palette rows.
pub const LEVEL_PALETTE_LEN: usize = 127;

/// Side length of a meta-tile in pixels. Each meta-tile is a 4x4 grid of
/// 8x8 sub-tiles with per-sub-tile flip and palette metadata.
pub const METATILE_SIZE: usize = 4 * TILE_SIZE;

const SUBTILES_PER_METATILE: usize = 16;
const ENTRANCE_RECORD_LEN: i32 = 8;
const TRANSFER_RECORD_LEN: i32 = 7;
const VRAM_LEN: usize = 0x10000;

/// One per-entrance record: which terrain family the entrance uses and
/// where its tile-map lives.
#[derive(Clone, Debug)]
pub struct Entrance {
    pub index: usize,
    pub terrain: u8,
    pub tilemap_bank: u8,
    /// Level width in meta-tiles.
    pub map_width: u16,
    pub tilemap_start: u16,
    pub tilemap_end: u16,
}

impl Entrance {
    pub fn read(rom: &Rom, constants: &GameConstants, index: usize) -> Result<Entrance> {
        let base = constants.entrance_table.offset(index as i32 * ENTRANCE_RECORD_LEN);
        Ok(Entrance {
            index,
            terrain: rom.read_u8(base)?,
            tilemap_bank: rom.read_u8(base.offset(1))?,
            map_width: rom.read_u16(base.offset(2))?,
            tilemap_start: rom.read_u16(base.offset(4))?,
            tilemap_end: rom.read_u16(base.offset(6))?,
        })
    }

    pub fn tilemap_addr(&self) -> Addr {
        Addr::from_bank_absolute(self.tilemap_bank, self.tilemap_start)
    }

    /// Number of 16-bit map entries between the tile-map bounds.
    pub fn map_len(&self) -> usize {
        usize::from(self.tilemap_end.saturating_sub(self.tilemap_start)) / 2
    }
}

/// One graphics transfer the loader would have queued: copy `tiles` 32-byte
/// tiles from `source` to byte offset `vram_dest` of video memory, with the
/// main chunk flagged as compressed.
#[derive(Copy, Clone, Debug)]
pub struct DmaTransfer {
    pub source: Addr,
    pub vram_dest: u16,
    pub tiles: u8,
    pub compressed: bool,
}

/// Everything the tracer recovers about one terrain family.
#[derive(Clone, Debug)]
pub struct GraphicInfo {
    pub terrain: u8,
    pub transfers: Vec<DmaTransfer>,
    pub palette_addr: Addr,
}

/// Traces terrain `terrain`'s loader routine and extracts its transfer
/// list and palette address.
pub fn graphic_info(rom: &Rom, constants: &GameConstants, terrain: u8) -> Result<GraphicInfo> {
    let loader = Addr::from_linear(
        rom.read_u24(constants.terrain_loader_table.offset(i32::from(terrain) * 3))?,
    );
    debug!("terrain {terrain} loader at {loader}");
    let traced = trace::trace(rom, loader, constants.trace_budget)?;

    let table_offset = trace::find_argument(&traced, constants.terrain_data_sub)?;
    let transfers = read_transfers(rom, constants, table_offset)?;

    // One terrain family loads its palette with a long-addressing LDA
    // instead of going through the shared subroutine.
    let palette_addr = match trace::find_argument(&traced, constants.terrain_palette_sub) {
        Ok(arg) => Addr::from_bank_absolute(constants.palette_bank, arg as u16),
        Err(_) => traced
            .iter()
            .find(|i| i.opcode == 0xAF)
            .map(|i| Addr::from_linear(i.operand_value()))
            .ok_or(Error::ArgumentNotFound(constants.terrain_palette_sub))?,
    };

    Ok(GraphicInfo {
        terrain,
        transfers,
        palette_addr,
    })
}

/// Reads 7-byte transfer records from the descriptor table until the zero
/// flag byte that ends the list. Flag bit 0 marks the compressed chunk.
fn read_transfers(rom: &Rom, constants: &GameConstants, offset: u32) -> Result<Vec<DmaTransfer>> {
    let mut transfers = Vec::new();
    let mut record = constants.dma_table.offset(offset as i32);
    loop {
        let flag = rom.read_u8(record)?;
        if flag == 0 {
            break;
        }
        transfers.push(DmaTransfer {
            source: Addr::from_linear(rom.read_u24(record.offset(1))?),
            vram_dest: rom.read_u16(record.offset(4))?,
            tiles: rom.read_u8(record.offset(6))?,
            compressed: flag & 1 != 0,
        });
        record = record.offset(TRANSFER_RECORD_LEN);
    }
    Ok(transfers)
}

/// Replays the transfer list into a fresh 64 KB video-memory image.
/// Transfers that run past the end of the buffer are clipped, matching
/// hardware wrap-agnostic behavior closely enough for extraction.
pub fn build_vram(rom: &Rom, transfers: &[DmaTransfer]) -> Result<Vec<u8>> {
    let mut vram = vec![0u8; VRAM_LEN];
    for t in transfers {
        let data = if t.compressed {
            decompress(rom, t.source)?
        } else {
            rom.read_n(t.source, usize::from(t.tiles) * 32)?.to_vec()
        };
        let dest = usize::from(t.vram_dest);
        let n = data.len().min(VRAM_LEN.saturating_sub(dest));
        debug!("transfer {} -> VRAM {:#06X} ({n} bytes)", t.source, dest);
        vram[dest..dest + n].copy_from_slice(&data[..n]);
    }
    Ok(vram)
}

/// Decodes one 32x32 meta-tile: sixteen tile-map words at
/// `definitions + index * 32`, laid out as a row-major 4x4 grid.
fn decode_metatile(
    rom: &Rom,
    vram: &[u8],
    definitions: Addr,
    index: u16,
    palette: &Palette,
) -> Result<ImageMatrix> {
    let mut image = ImageMatrix::new(METATILE_SIZE, METATILE_SIZE);
    let base = definitions.offset(i32::from(index) * 32);
    for sub in 0..SUBTILES_PER_METATILE {
        let entry = TilemapEntry::from_word(rom.read_u16(base.offset(sub as i32 * 2))?);
        let tile = decode_tile(vram, entry, Bpp::Four, palette, TileOptions::default());
        image.overlay(&tile, (sub % 4) * TILE_SIZE, (sub / 4) * TILE_SIZE);
    }
    Ok(image)
}

/// Assembles the full level image for one entrance.
///
/// Map entries are 16-bit: a meta-tile index in the low 14 bits plus
/// horizontal (bit 14) and vertical (bit 15) flips applied to the whole
/// meta-tile. The same meta-tile repeats densely across a level, so decoded
/// meta-tiles are cached by index and flipped per placement.
pub fn assemble_level(rom: &Rom, constants: &GameConstants, entrance: usize) -> Result<ImageMatrix> {
    let entrance = Entrance::read(rom, constants, entrance)?;
    let info = graphic_info(rom, constants, entrance.terrain)?;
    let vram = build_vram(rom, &info.transfers)?;
    let palette = read_palette(rom, info.palette_addr, LEVEL_PALETTE_LEN)?;
    let definitions = Addr::from_linear(
        rom.read_u24(constants.metatile_table.offset(i32::from(entrance.terrain) * 3))?,
    );

    let width = usize::from(entrance.map_width.max(1));
    let len = entrance.map_len();
    let height = len.div_ceil(width);
    debug!(
        "entrance {}: {len} map entries, {width}x{height} meta-tiles",
        entrance.index
    );

    let mut cache: HashMap<u16, ImageMatrix> = HashMap::new();
    let mut level = ImageMatrix::new(width * METATILE_SIZE, height * METATILE_SIZE);
    for i in 0..len {
        let word = rom.read_u16(entrance.tilemap_addr().offset(i as i32 * 2))?;
        let index = word & 0x3FFF;
        if !cache.contains_key(&index) {
            let fresh = decode_metatile(rom, &vram, definitions, index, &palette)?;
            cache.insert(index, fresh);
        }
        let mut placed = cache[&index].clone();
        if word & 0x4000 != 0 {
            placed.flip_horizontal();
        }
        if word & 0x8000 != 0 {
            placed.flip_vertical();
        }
        level.overlay(&placed, (i % width) * METATILE_SIZE, (i / width) * METATILE_SIZE);
    }
    Ok(level)
}
