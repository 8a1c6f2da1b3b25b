//! Animation scripts: a byte stream of heterogeneous entries, ending at
//! [`cmd::LOOP`].
//!
//! An entry is either a control command (a recognized command byte plus its
//! parameter bytes) or a sprite-display entry (a duration byte followed by
//! a 16-bit sprite-table index). The two are told apart purely by whether
//! the leading byte is a known command code.

use crate::addr::Addr;
use crate::error::{Error, Result};
use crate::rom::Rom;
use crate::script::SCRIPT_BYTE_LIMIT;

/// Animation command bytes.
pub mod cmd {
    /// Stream terminator; playback loops to the start.
    pub const LOOP: u8 = 0x80;
    /// Switch palette, one parameter.
    pub const PALETTE: u8 = 0x81;
    /// Hold the current frame, one parameter.
    pub const DELAY: u8 = 0x82;
    /// Jump to another animation, two address parameter bytes.
    pub const JUMP: u8 = 0x84;
    /// Trigger a sound effect, one parameter.
    pub const SOUND: u8 = 0x86;
    /// Repeat counter for the following entries, one parameter.
    pub const REPEAT: u8 = 0x88;
    /// Horizontal mirror toggle, no parameters.
    pub const MIRROR: u8 = 0x8A;
}

/// Parameter byte count for a command byte, or `None` if the byte is not a
/// command (making the entry a sprite display).
pub fn command_params(byte: u8) -> Option<usize> {
    match byte {
        cmd::LOOP => Some(0),
        cmd::PALETTE | cmd::DELAY | cmd::SOUND | cmd::REPEAT => Some(1),
        cmd::JUMP => Some(2),
        cmd::MIRROR => Some(0),
        _ => None,
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum AnimEntry {
    Command { opcode: u8, params: Vec<u8> },
    SpriteDisplay { duration: u8, sprite_index: u16 },
}

#[derive(Clone, Debug)]
pub struct AnimationInfo {
    pub addr: Addr,
    pub byte_len: usize,
    pub entries: Vec<AnimEntry>,
}

/// Decodes the animation script at `addr` up to and including its LOOP
/// terminator.
pub fn decode_animation(rom: &Rom, addr: Addr) -> Result<AnimationInfo> {
    let mut entries = Vec::new();
    let mut consumed = 0usize;
    loop {
        if consumed >= SCRIPT_BYTE_LIMIT {
            return Err(Error::MissingTerminator {
                addr,
                limit: SCRIPT_BYTE_LIMIT,
            });
        }
        let lead = rom.read_u8(addr.offset(consumed as i32))?;
        consumed += 1;
        match command_params(lead) {
            Some(_) if lead == cmd::LOOP => break,
            Some(n) => {
                let params = rom.read_n(addr.offset(consumed as i32), n)?.to_vec();
                consumed += n;
                entries.push(AnimEntry::Command { opcode: lead, params });
            }
            None => {
                let sprite_index = rom.read_u16(addr.offset(consumed as i32))?;
                consumed += 2;
                entries.push(AnimEntry::SpriteDisplay {
                    duration: lead,
                    sprite_index,
                });
            }
        }
    }
    Ok(AnimationInfo {
        addr,
        byte_len: consumed,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rom_of(bytes: &[u8]) -> Rom {
        let mut data = bytes.to_vec();
        data.resize(0x8000, 0xEE);
        Rom::new(data)
    }

    #[test]
    fn mixed_entries_and_sentinel() {
        let rom = rom_of(&[
            0x08, 0x34, 0x12, // show sprite 0x1234 for 8 frames
            cmd::DELAY, 0x10,
            0x04, 0x35, 0x12,
            cmd::LOOP,
            0x77, // past the terminator, must not be read
        ]);
        let anim = decode_animation(&rom, Addr::from_linear(0)).unwrap();
        assert_eq!(anim.byte_len, 9);
        assert_eq!(
            anim.entries,
            vec![
                AnimEntry::SpriteDisplay { duration: 8, sprite_index: 0x1234 },
                AnimEntry::Command { opcode: cmd::DELAY, params: vec![0x10] },
                AnimEntry::SpriteDisplay { duration: 4, sprite_index: 0x1235 },
            ]
        );
    }

    #[test]
    fn command_disambiguation_is_by_code_table() {
        // 0x84 is JUMP even though it could look like an 0x84-frame display
        let rom = rom_of(&[cmd::JUMP, 0x00, 0x90, cmd::LOOP]);
        let anim = decode_animation(&rom, Addr::from_linear(0)).unwrap();
        assert_eq!(
            anim.entries,
            vec![AnimEntry::Command { opcode: cmd::JUMP, params: vec![0x00, 0x90] }]
        );
    }

    #[test]
    fn unterminated_stream_fails() {
        // endless sprite displays, never LOOP
        let bytes: Vec<u8> = (0..1200).flat_map(|_| [0x01, 0x00, 0x00]).collect();
        assert!(matches!(
            decode_animation(&rom_of(&bytes), Addr::from_linear(0)),
            Err(Error::MissingTerminator { .. })
        ));
    }
}
