//! The two scripted-object stream formats: entity behavior scripts and
//! animation scripts. Both are variable-length instruction streams that end
//! at a sentinel command, with a hard byte bound as a corruption guard.

pub mod anim;
pub mod entity;

use crate::addr::Addr;
use crate::constants::GameConstants;
use crate::error::Result;
use crate::rom::Rom;

pub use anim::{decode_animation, AnimEntry, AnimationInfo};
pub use entity::{decode_entity, Entity, EntityCommand};

/// Streams must reach their sentinel within this many bytes.
pub const SCRIPT_BYTE_LIMIT: usize = 3000;

fn table_pointer(rom: &Rom, table: Addr, index: usize) -> Result<Addr> {
    let raw = rom.read_u24(table.offset(index as i32 * 3))?;
    Ok(Addr::from_linear(raw))
}

/// Resolves a sprite number through the 3-byte pointer table.
pub fn sprite_address(rom: &Rom, constants: &GameConstants, index: usize) -> Result<Addr> {
    table_pointer(rom, constants.sprite_table, index)
}

/// Resolves an animation number through the 3-byte pointer table.
pub fn animation_address(rom: &Rom, constants: &GameConstants, index: usize) -> Result<Addr> {
    table_pointer(rom, constants.animation_table, index)
}

/// Resolves an entity number through the 3-byte pointer table.
pub fn entity_address(rom: &Rom, constants: &GameConstants, index: usize) -> Result<Addr> {
    table_pointer(rom, constants.entity_table, index)
}
