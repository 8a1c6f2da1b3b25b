//! ROM buffer and typed reads.

use log::info;

use crate::addr::Addr;
use crate::error::{Error, Result};

/// Location of the internal header in a HiROM image.
const HEADER_OFFSET: usize = 0xFFC0;

/// A cartridge image. The engine never mutates this buffer; every decoder
/// borrows it and returns owned results.
#[derive(Clone)]
pub struct Rom {
    data: Vec<u8>,
}

impl Rom {
    /// Wraps a raw file image, stripping the 512-byte copier header some
    /// dump formats prepend.
    pub fn new(mut data: Vec<u8>) -> Self {
        if data.len() % 0x8000 == 512 {
            info!("stripping 512 byte copier header");
            data.drain(..512);
        }
        Rom { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn read_u8(&self, addr: Addr) -> Result<u8> {
        let i = addr.linear();
        self.data.get(i).copied().ok_or(Error::OutOfBounds {
            addr,
            len: 1,
            rom_len: self.data.len(),
        })
    }

    pub fn read_u16(&self, addr: Addr) -> Result<u16> {
        let b = self.read_n(addr, 2)?;
        Ok(b[0] as u16 | (b[1] as u16) << 8)
    }

    pub fn read_u24(&self, addr: Addr) -> Result<u32> {
        let b = self.read_n(addr, 3)?;
        Ok(b[0] as u32 | (b[1] as u32) << 8 | (b[2] as u32) << 16)
    }

    pub fn read_n(&self, addr: Addr, n: usize) -> Result<&[u8]> {
        let i = addr.linear();
        self.data.get(i..i + n).ok_or(Error::OutOfBounds {
            addr,
            len: n,
            rom_len: self.data.len(),
        })
    }

    /// Parses the internal cartridge header. This is the only integrity
    /// check the engine does.
    pub fn header(&self) -> Result<RomHeader> {
        let base = Addr::from_linear(HEADER_OFFSET as u32);
        let raw_title = self.read_n(base, 21)?;
        let title = raw_title
            .iter()
            .map(|&b| if (0x20..0x7F).contains(&b) { b as char } else { ' ' })
            .collect::<String>()
            .trim_end()
            .to_string();
        let complement = self.read_u16(base.offset(0x1C))?;
        let checksum = self.read_u16(base.offset(0x1E))?;
        Ok(RomHeader {
            title,
            checksum,
            complement,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RomHeader {
    pub title: String,
    pub checksum: u16,
    pub complement: u16,
}

impl RomHeader {
    pub fn checksum_ok(&self) -> bool {
        self.checksum ^ self.complement == 0xFFFF
    }
}
