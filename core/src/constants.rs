//! Per-title anchor addresses.
//!
//! The binary formats the engine decodes carry no self-describing markers;
//! the entry points into them (pointer tables, loader subroutines) were
//! found by hand and differ between titles and regions. Everything
//! title-specific is collected here so the decoders stay generic.

use crate::addr::Addr;

/// Hand-discovered anchors for one game image.
#[derive(Debug, Clone)]
pub struct GameConstants {
    /// 3-byte pointers to sprite structures, indexed by sprite number.
    pub sprite_table: Addr,
    /// 3-byte pointers to animation scripts, indexed by animation number.
    pub animation_table: Addr,
    /// 3-byte pointers to entity behavior scripts, indexed by entity number.
    pub entity_table: Addr,

    /// Per-entrance records: terrain type, tile-map bank, map width and
    /// tile-map bounds. 8 bytes each.
    pub entrance_table: Addr,
    /// 3-byte pointers to terrain loader routines, indexed by terrain type.
    pub terrain_loader_table: Addr,
    /// 3-byte pointers to meta-tile definition blocks, indexed by terrain
    /// type.
    pub metatile_table: Addr,
    /// Base of the 7-byte graphics transfer descriptor records. The traced
    /// loader argument is a byte offset into this table.
    pub dma_table: Addr,
    /// Subroutine whose preceding immediate load is the transfer-table
    /// offset for the terrain being loaded.
    pub terrain_data_sub: Addr,
    /// Subroutine whose preceding immediate load is the terrain palette
    /// address (within `palette_bank`). One terrain family never calls it;
    /// see the long-load fallback in the level assembler.
    pub terrain_palette_sub: Addr,
    /// Bank the traced palette argument resolves in.
    pub palette_bank: u8,

    /// Instruction budget for loader traces.
    pub trace_budget: usize,
}

impl GameConstants {
    /// Anchor set for the US revision this tool was developed against.
    pub fn us() -> Self {
        GameConstants {
            sprite_table: Addr::from_linear(0xBC_0000),
            animation_table: Addr::from_linear(0xBC_8C0F),
            entity_table: Addr::from_linear(0xB5_8000),
            entrance_table: Addr::from_linear(0xB9_8000),
            terrain_loader_table: Addr::from_linear(0xB9_A000),
            metatile_table: Addr::from_linear(0xB9_A180),
            dma_table: Addr::from_linear(0xB9_C000),
            terrain_data_sub: Addr::from_linear(0x80_8A4C),
            terrain_palette_sub: Addr::from_linear(0x80_8B91),
            palette_bank: 0xB9,
            trace_budget: 1000,
        }
    }
}

impl Default for GameConstants {
    fn default() -> Self {
        GameConstants::us()
    }
}
