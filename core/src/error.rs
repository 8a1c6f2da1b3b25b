//! Error types for the extraction engine.

use crate::addr::Addr;

pub type Result<T> = core::result::Result<T, Error>;

/// Errors surfaced by decode operations.
///
/// None of these are retried internally. `InvalidSpriteHeader` doubles as a
/// signal during full-ROM scans: the scanner treats it as "not a sprite
/// here" and advances one byte instead of aborting.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A read ran past the end of the ROM buffer.
    #[error("read out of bounds: {addr} (+{len} bytes) in a {rom_len} byte ROM")]
    OutOfBounds { addr: Addr, len: usize, rom_len: usize },

    /// A compressed stream ended before its terminator byte.
    #[error("compressed stream at {0} is truncated")]
    TruncatedStream(Addr),

    /// A back-copy referenced output that has not been produced yet.
    #[error("back-copy at {addr} references unwritten output ({offset}+{len} of {written})")]
    BadBackReference { addr: Addr, offset: usize, len: usize, written: usize },

    /// A command byte outside the four known compression operations.
    #[error("unknown compression command {byte:#04x} at {addr}")]
    UnknownCompressionCommand { byte: u8, addr: Addr },

    /// A script or animation stream exceeded its safety bound without
    /// reaching its sentinel command.
    #[error("no terminator within {limit} bytes of {addr}")]
    MissingTerminator { addr: Addr, limit: usize },

    /// Entity inheritance looped back to an address already being decoded.
    #[error("cyclic entity inheritance through {0}")]
    CyclicInheritance(Addr),

    /// The tracer hit an opcode byte missing from its table.
    #[error("unknown opcode {opcode:#04x} at {addr}")]
    UnknownOpcode { opcode: u8, addr: Addr },

    /// A traced code path never called the expected subroutine. Usually a
    /// wrong anchor in the game constants, or a code variant the trace does
    /// not reach for this entrance/terrain.
    #[error("subroutine {0} not found in traced code")]
    SubroutineNotFound(Addr),

    /// The subroutine was called but no immediate load precedes the call.
    #[error("no immediate load argument before call to {0}")]
    ArgumentNotFound(Addr),

    /// A sprite part was placed outside its 256x256 canvas.
    #[error("invalid sprite at {addr}: part at ({x}, {y}) exceeds canvas")]
    InvalidSprite { addr: Addr, x: usize, y: usize },

    /// Header round-trip validation failed: rebuilding the header from its
    /// own tile counts did not reproduce its offset/DMA bytes.
    #[error("invalid sprite header at {0}")]
    InvalidSpriteHeader(Addr),
}
