//! Extraction engine for SNES-era cartridge images.
//!
//! Everything here is a pure function of a read-only [`rom::Rom`] buffer and
//! an address or index: decoders build fresh values per call and keep no
//! state between calls, so concurrent decodes against the same buffer are
//! fine. The rendering/UI side lives in the `sxrom` binary; this crate only
//! produces pixel matrices and structured records.

pub mod addr;
pub mod compress;
pub mod constants;
pub mod error;
pub mod gfx;
pub mod level;
pub mod rom;
pub mod script;
pub mod sprite;
pub mod trace;

pub use addr::Addr;
pub use constants::GameConstants;
pub use error::{Error, Result};
pub use rom::Rom;
