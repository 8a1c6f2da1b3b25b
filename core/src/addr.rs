//! 24-bit SNES addresses.
//!
//! It is a very common mistake to mix up SNES addresses with byte indices
//! into the ROM file, so the engine passes [`Addr`] everywhere and converts
//! to a file offset only at the read site.

use core::fmt;

/// A 24-bit bank:absolute address.
///
/// Addresses at or above `0x800000` sit in the mirrored fast-ROM half of the
/// address space and resolve to the same file offset as their low mirror,
/// which [`Addr::linear`] handles by masking to 22 bits.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Addr(u32);

impl Addr {
    pub fn from_linear(value: u32) -> Self {
        Addr(value & 0xFF_FFFF)
    }

    pub fn from_bank_absolute(bank: u8, absolute: u16) -> Self {
        Addr((bank as u32) << 16 | absolute as u32)
    }

    pub fn bank(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn absolute(self) -> u16 {
        self.0 as u16
    }

    /// Byte offset into the ROM buffer.
    pub fn linear(self) -> usize {
        if self.0 >= 0x80_0000 {
            (self.0 & 0x3F_FFFF) as usize
        } else {
            (self.0 & 0xFF_FFFF) as usize
        }
    }

    /// Pure modular addition; no bounds checking. Reads at an out-of-range
    /// address fail at the read site, not here.
    pub fn offset(self, delta: i32) -> Self {
        Addr(self.0.wrapping_add(delta as u32) & 0xFF_FFFF)
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:02X}:{:04X}", self.bank(), self.absolute())
    }
}

impl fmt::Debug for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bank_absolute_matches_linear_construction() {
        let a = Addr::from_bank_absolute(0xC2, 0x8010);
        assert_eq!(a, Addr::from_linear(0xC28010));
        assert_eq!(a.bank(), 0xC2);
        assert_eq!(a.absolute(), 0x8010);
    }

    #[test]
    fn high_addresses_mirror_to_22_bits() {
        assert_eq!(Addr::from_linear(0xC28010).linear(), 0x028010);
        assert_eq!(Addr::from_linear(0x828010).linear(), 0x028010);
        assert_eq!(Addr::from_linear(0x7E8010).linear(), 0x7E8010);
        assert_eq!(Addr::from_linear(0x028010).linear(), 0x028010);
    }

    #[test]
    fn offset_is_modular() {
        let a = Addr::from_linear(0xFFFFFF);
        assert_eq!(a.offset(1), Addr::from_linear(0));
        assert_eq!(a.offset(-1), Addr::from_linear(0xFFFFFE));
        let b = Addr::from_bank_absolute(0x01, 0xFFFF);
        assert_eq!(b.offset(1).bank(), 0x02);
    }
}
