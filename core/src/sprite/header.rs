//! Sprite headers and the VRAM row-packing algorithm.
//!
//! The sprite format has no magic marker. What it does have is redundancy:
//! the five offset/DMA bytes of a header are a pure function of its three
//! tile counts, derived from how the loader packs tiles into VRAM rows.
//! Re-deriving them and comparing is the only way to tell sprite bytes from
//! noise, and is exactly what the full-ROM scanner does.

use crate::addr::Addr;
use crate::error::{Error, Result};
use crate::rom::Rom;

/// Slots per VRAM row in the packing model.
const ROW_SLOTS: usize = 16;

/// Tile counts may not exceed this in a well-formed header.
pub const MAX_GROUP_TILES: u8 = 64;

/// The 8 fixed header bytes preceding a sprite's coordinate and tile
/// tables.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct SpriteHeader {
    pub large: u8,
    pub small1: u8,
    pub small1_offset: u8,
    pub small2: u8,
    pub small2_offset: u8,
    pub dma1_count: u8,
    pub dma2_offset: u8,
    pub dma2_count: u8,
}

impl SpriteHeader {
    pub fn read(rom: &Rom, addr: Addr) -> Result<Self> {
        let b = rom.read_n(addr, 8)?;
        Ok(SpriteHeader {
            large: b[0],
            small1: b[1],
            small1_offset: b[2],
            small2: b[3],
            small2_offset: b[4],
            dma1_count: b[5],
            dma2_offset: b[6],
            dma2_count: b[7],
        })
    }

    /// Total number of parts (one per large or small tile).
    pub fn part_count(&self) -> usize {
        self.large as usize + self.small1 as usize + self.small2 as usize
    }

    /// Number of 8x8 tiles stored in the sprite body. A large part is four
    /// consecutive stored tiles.
    pub fn stored_tiles(&self) -> usize {
        self.large as usize * 4 + self.small1 as usize + self.small2 as usize
    }

    /// Validates a header read from raw bytes: counts in range, and the
    /// derived bytes must round-trip exactly through
    /// [`build_header_from_tile_quantity`].
    pub fn validate(&self, addr: Addr) -> Result<()> {
        let counts_ok = self.large <= MAX_GROUP_TILES
            && self.small1 <= MAX_GROUP_TILES
            && self.small2 <= MAX_GROUP_TILES
            && (self.small2 == 0 || self.small1 > 0)
            && self.part_count() > 0;
        if !counts_ok {
            return Err(Error::InvalidSpriteHeader(addr));
        }
        let derived = build_header_from_tile_quantity(self.large, self.small1, self.small2);
        if derived == *self {
            Ok(())
        } else {
            Err(Error::InvalidSpriteHeader(addr))
        }
    }
}

/// Tracks per-row slot occupancy while packing.
struct VramRows {
    used: Vec<u8>,
}

impl VramRows {
    /// Places a group of `count` small tiles and returns its slot offset.
    ///
    /// A group drops into the first partially filled row with enough free
    /// tail slots; splitting across a row boundary is only allowed when the
    /// group starts on a fresh empty row.
    fn place_group(&mut self, count: u8) -> u8 {
        if count == 0 {
            return 0;
        }
        let count = count as usize;
        for (row, used) in self.used.iter_mut().enumerate() {
            let free = ROW_SLOTS - *used as usize;
            if *used > 0 && free >= count {
                let offset = row * ROW_SLOTS + *used as usize;
                *used += count as u8;
                return offset as u8;
            }
        }
        let offset = self.used.len() * ROW_SLOTS;
        let mut remaining = count;
        while remaining > 0 {
            let take = remaining.min(ROW_SLOTS);
            self.used.push(take as u8);
            remaining -= take;
        }
        offset as u8
    }
}

/// Derives the offset and DMA bytes of a header from its tile counts.
///
/// VRAM rows hold 16 slots and come in top/bottom pairs: large tile `k`
/// takes one slot at column `k % 16` of both rows of pair `k / 16`. Small
/// group 1 packs next, then small group 2, under the tail rule of
/// [`VramRows::place_group`]; row remainders stay empty. DMA group 1 covers
/// the slots used inside the large row pairs, DMA group 2 whatever lands
/// past them.
pub fn build_header_from_tile_quantity(large: u8, small1: u8, small2: u8) -> SpriteHeader {
    let mut rows = VramRows { used: Vec::new() };
    let mut remaining = large as usize;
    while remaining > 0 {
        let cols = remaining.min(ROW_SLOTS) as u8;
        rows.used.push(cols); // top
        rows.used.push(cols); // bottom
        remaining -= cols as usize;
    }
    let large_rows = rows.used.len();

    let small1_offset = rows.place_group(small1);
    let small2_offset = rows.place_group(small2);

    let dma1_count: usize = rows.used[..large_rows].iter().map(|&u| u as usize).sum();
    let dma2_count: usize = rows.used[large_rows..].iter().map(|&u| u as usize).sum();
    let dma2_offset = if dma2_count > 0 { large_rows * ROW_SLOTS } else { 0 };

    SpriteHeader {
        large,
        small1,
        small1_offset,
        small2,
        small2_offset,
        dma1_count: dma1_count as u8,
        dma2_offset: dma2_offset as u8,
        dma2_count: dma2_count as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_large_tile() {
        let h = build_header_from_tile_quantity(1, 0, 0);
        assert_eq!(h.small1_offset, 0);
        assert_eq!(h.small2_offset, 0);
        assert_eq!(h.dma1_count, 2); // one top slot, one bottom slot
        assert_eq!(h.dma2_offset, 0);
        assert_eq!(h.dma2_count, 0);
    }

    #[test]
    fn smalls_pack_into_large_row_tails() {
        // 3 large tiles leave 13 free slots in each of rows 0 and 1
        let h = build_header_from_tile_quantity(3, 5, 4);
        assert_eq!(h.small1_offset, 3); // row 0, after the large tops
        assert_eq!(h.small2_offset, 8); // row 0 still fits 4 more
        assert_eq!(h.dma1_count, 6 + 9);
        assert_eq!(h.dma2_count, 0);
    }

    #[test]
    fn oversized_group_starts_on_a_fresh_row_and_splits() {
        // 15 larges leave a 1-slot tail; a 20-tile group cannot fit any row
        let h = build_header_from_tile_quantity(15, 20, 0);
        assert_eq!(h.small1_offset, 32); // first row past the large pair
        assert_eq!(h.dma1_count, 30);
        assert_eq!(h.dma2_offset, 32);
        assert_eq!(h.dma2_count, 20);
    }

    #[test]
    fn second_group_can_use_the_split_remainder() {
        let h = build_header_from_tile_quantity(16, 20, 10);
        // small1 splits over rows 2..4 (16 + 4); small2 fits after the 4
        assert_eq!(h.small1_offset, 32);
        assert_eq!(h.small2_offset, 32 + 16 + 4);
        assert_eq!(h.dma1_count, 32);
        assert_eq!(h.dma2_offset, 32);
        assert_eq!(h.dma2_count, 30);
    }

    #[test]
    fn no_large_tiles_at_all() {
        let h = build_header_from_tile_quantity(0, 6, 2);
        assert_eq!(h.small1_offset, 0);
        assert_eq!(h.small2_offset, 6);
        assert_eq!(h.dma1_count, 0);
        assert_eq!(h.dma2_offset, 0);
        assert_eq!(h.dma2_count, 8);
    }

    #[test]
    fn round_trip_over_the_count_grid() {
        for large in 0..=MAX_GROUP_TILES {
            for small1 in 0..=MAX_GROUP_TILES {
                for small2 in 0..=MAX_GROUP_TILES {
                    if small2 > 0 && small1 == 0 {
                        continue;
                    }
                    let h = build_header_from_tile_quantity(large, small1, small2);
                    let rebuilt = build_header_from_tile_quantity(h.large, h.small1, h.small2);
                    assert_eq!(h, rebuilt, "({large}, {small1}, {small2})");
                }
            }
        }
    }

    #[test]
    fn corrupted_offsets_fail_validation() {
        let addr = Addr::from_linear(0);
        let mut h = build_header_from_tile_quantity(4, 3, 0);
        assert!(h.validate(addr).is_ok());
        h.small1_offset ^= 1;
        assert!(matches!(h.validate(addr), Err(Error::InvalidSpriteHeader(_))));
    }

    #[test]
    fn out_of_range_counts_fail_validation() {
        let addr = Addr::from_linear(0);
        let mut h = build_header_from_tile_quantity(2, 0, 0);
        h.large = 65;
        assert!(h.validate(addr).is_err());
        // small2 without small1
        let h = SpriteHeader { small1: 0, small2: 1, ..build_header_from_tile_quantity(1, 0, 0) };
        assert!(h.validate(addr).is_err());
    }
}
