//! Entity behavior scripts: a stream of 16-bit words, one command word plus
//! a fixed number of parameter words each, ending at [`cmd::END`].
//!
//! An entity may inherit from another entity via [`cmd::INHERIT`]; the
//! referenced script is decoded eagerly and attached as a child, and
//! command lookups fall through to children in order. Inheritance forms a
//! DAG in practice; a visited set turns any cycle into a hard error instead
//! of unbounded recursion.

use hashbrown::HashSet;

use crate::addr::Addr;
use crate::error::{Error, Result};
use crate::rom::Rom;
use crate::script::SCRIPT_BYTE_LIMIT;

/// Command words. Anything not equal to [`cmd::END`] is treated as a
/// command with [`param_words`] parameter words.
pub mod cmd {
    /// Stream terminator.
    pub const END: u16 = 0x8000;
    /// Parameter references another entity script to inherit from.
    pub const INHERIT: u16 = 0x8004;
    /// Selects the entity's palette.
    pub const PALETTE: u16 = 0x8011;
    /// Selects the idle animation.
    pub const ANIMATION: u16 = 0x8012;
    /// Selects the sprite shown before any animation runs.
    pub const SPRITE: u16 = 0x8016;
    /// Movement speed pair.
    pub const MOTION: u16 = 0x8020;
    /// Timer setup, two words.
    pub const TIMER: u16 = 0x8023;
    /// Sound effect trigger.
    pub const SOUND: u16 = 0x802B;
}

/// Parameter word count for a command. Unlisted commands take one word.
pub fn param_words(opcode: u16) -> usize {
    match opcode {
        cmd::MOTION | cmd::TIMER => 2,
        _ => 1,
    }
}

#[derive(Clone, Debug)]
pub struct EntityCommand {
    pub addr: Addr,
    pub opcode: u16,
    pub params: Vec<u16>,
}

#[derive(Clone, Debug)]
pub struct Entity {
    pub addr: Addr,
    pub byte_len: usize,
    pub commands: Vec<EntityCommand>,
    /// Inherited entities, in the order their INHERIT commands appear.
    pub children: Vec<Entity>,
}

impl Entity {
    /// First occurrence of `opcode`: own commands first, then inherited
    /// children depth-first in order.
    pub fn find_instruction(&self, opcode: u16) -> Option<&EntityCommand> {
        self.commands
            .iter()
            .find(|c| c.opcode == opcode)
            .or_else(|| self.children.iter().find_map(|c| c.find_instruction(opcode)))
    }
}

/// Decodes the entity script at `addr`, following inheritance eagerly.
pub fn decode_entity(rom: &Rom, addr: Addr) -> Result<Entity> {
    let mut visited = HashSet::new();
    decode_inner(rom, addr, &mut visited)
}

fn decode_inner(rom: &Rom, addr: Addr, visited: &mut HashSet<Addr>) -> Result<Entity> {
    // `visited` holds the current inheritance path; diamonds are legal,
    // revisiting an address still being decoded is not.
    if !visited.insert(addr) {
        return Err(Error::CyclicInheritance(addr));
    }

    let mut commands = Vec::new();
    let mut children = Vec::new();
    let mut consumed = 0usize;
    loop {
        if consumed >= SCRIPT_BYTE_LIMIT {
            return Err(Error::MissingTerminator {
                addr,
                limit: SCRIPT_BYTE_LIMIT,
            });
        }
        let at = addr.offset(consumed as i32);
        let opcode = rom.read_u16(at)?;
        consumed += 2;
        if opcode == cmd::END {
            break;
        }

        let mut params = Vec::with_capacity(param_words(opcode));
        for _ in 0..param_words(opcode) {
            params.push(rom.read_u16(addr.offset(consumed as i32))?);
            consumed += 2;
        }

        if opcode == cmd::INHERIT {
            // references resolve within the entity's own bank
            let target = Addr::from_bank_absolute(addr.bank(), params[0]);
            children.push(decode_inner(rom, target, visited)?);
        }
        commands.push(EntityCommand { addr: at, opcode, params });
    }

    visited.remove(&addr);
    Ok(Entity {
        addr,
        byte_len: consumed,
        commands,
        children,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words_at(data: &mut Vec<u8>, offset: usize, words: &[u16]) {
        if data.len() < offset + words.len() * 2 {
            data.resize(offset + words.len() * 2, 0);
        }
        for (i, w) in words.iter().enumerate() {
            data[offset + i * 2] = *w as u8;
            data[offset + i * 2 + 1] = (*w >> 8) as u8;
        }
    }

    fn rom_of(data: Vec<u8>) -> Rom {
        let mut data = data;
        data.resize(0x8000, 0);
        Rom::new(data)
    }

    #[test]
    fn stops_exactly_at_the_sentinel() {
        let mut data = Vec::new();
        words_at(&mut data, 0, &[cmd::SPRITE, 0x0007, cmd::END, 0xDEAD]);
        let entity = decode_entity(&rom_of(data), Addr::from_linear(0)).unwrap();
        assert_eq!(entity.commands.len(), 1);
        assert_eq!(entity.byte_len, 6);
        assert_eq!(entity.commands[0].params, vec![7]);
    }

    #[test]
    fn default_and_listed_param_counts() {
        let mut data = Vec::new();
        words_at(
            &mut data,
            0,
            &[cmd::MOTION, 1, 2, 0x9123, 3, cmd::END],
        );
        let entity = decode_entity(&rom_of(data), Addr::from_linear(0)).unwrap();
        assert_eq!(entity.commands[0].params, vec![1, 2]);
        // 0x9123 is unlisted: one parameter word by default
        assert_eq!(entity.commands[1].opcode, 0x9123);
        assert_eq!(entity.commands[1].params, vec![3]);
    }

    #[test]
    fn inherited_commands_found_after_own() {
        let mut data = Vec::new();
        words_at(&mut data, 0, &[cmd::INHERIT, 0x1234, cmd::END]);
        words_at(&mut data, 0x1234, &[cmd::PALETTE, 7, cmd::END]);
        let entity = decode_entity(&rom_of(data), Addr::from_linear(0)).unwrap();

        assert_eq!(entity.children.len(), 1);
        let palette = entity.find_instruction(cmd::PALETTE).unwrap();
        assert_eq!(palette.params, vec![7]);
        assert_eq!(palette.addr, Addr::from_linear(0x1234));
        assert!(entity.find_instruction(cmd::SOUND).is_none());
    }

    #[test]
    fn own_command_shadows_inherited() {
        let mut data = Vec::new();
        words_at(&mut data, 0, &[cmd::INHERIT, 0x1000, cmd::PALETTE, 2, cmd::END]);
        words_at(&mut data, 0x1000, &[cmd::PALETTE, 9, cmd::END]);
        let entity = decode_entity(&rom_of(data), Addr::from_linear(0)).unwrap();
        assert_eq!(entity.find_instruction(cmd::PALETTE).unwrap().params, vec![2]);
    }

    #[test]
    fn unterminated_stream_fails_not_loops() {
        // SPRITE/7 repeated forever, never END
        let mut data = Vec::new();
        let words: Vec<u16> = (0..2000).flat_map(|_| [cmd::SPRITE, 7]).collect();
        words_at(&mut data, 0, &words);
        assert!(matches!(
            decode_entity(&rom_of(data), Addr::from_linear(0)),
            Err(Error::MissingTerminator { .. })
        ));
    }

    #[test]
    fn inheritance_cycle_is_detected() {
        let mut data = Vec::new();
        words_at(&mut data, 0, &[cmd::INHERIT, 0x1000, cmd::END]);
        words_at(&mut data, 0x1000, &[cmd::INHERIT, 0x0000, cmd::END]);
        assert!(matches!(
            decode_entity(&rom_of(data), Addr::from_linear(0)),
            Err(Error::CyclicInheritance(_))
        ));
    }
}
