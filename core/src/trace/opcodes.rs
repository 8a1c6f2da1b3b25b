//! Fixed decode table for the 65816-class instruction set, as far as the
//! tracer needs it: mnemonic and byte length only, no semantics.

/// Length adjustment rule for immediate operands.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum WidthRule {
    Fixed,
    /// One byte longer while the 16-bit memory flag is set.
    Memory,
    /// One byte longer while the 16-bit index flag is set.
    Index,
}

#[derive(Copy, Clone, Debug)]
pub struct OpcodeInfo {
    pub mnemonic: &'static str,
    /// Total instruction length in bytes, before width adjustment.
    pub len: u8,
    pub width: WidthRule,
}

const fn op(mnemonic: &'static str, len: u8) -> OpcodeInfo {
    OpcodeInfo { mnemonic, len, width: WidthRule::Fixed }
}

const fn imm(mnemonic: &'static str, width: WidthRule) -> OpcodeInfo {
    OpcodeInfo { mnemonic, len: 2, width }
}

/// Decode info for one opcode byte, or `None` for bytes the tracer does
/// not know. The table covers the instructions that actually appear in the
/// loader routines being traced; decoding anything else is a hard error
/// rather than a guess.
pub fn lookup(opcode: u8) -> Option<OpcodeInfo> {
    use WidthRule::{Index, Memory};
    let info = match opcode {
        // immediate loads and ALU ops, width-sensitive
        0xA9 => imm("LDA", Memory),
        0xA2 => imm("LDX", Index),
        0xA0 => imm("LDY", Index),
        0x69 => imm("ADC", Memory),
        0xE9 => imm("SBC", Memory),
        0x29 => imm("AND", Memory),
        0x09 => imm("ORA", Memory),
        0x49 => imm("EOR", Memory),
        0xC9 => imm("CMP", Memory),
        0x89 => imm("BIT", Memory),
        0xE0 => imm("CPX", Index),
        0xC0 => imm("CPY", Index),

        // status manipulation
        0xC2 => op("REP", 2),
        0xE2 => op("SEP", 2),

        // control flow
        0x20 => op("JSR", 3),
        0xFC => op("JSR", 3), // (abs,X): target not statically known
        0x22 => op("JSL", 4),
        0x4C => op("JMP", 3),
        0x6C => op("JMP", 3),
        0x7C => op("JMP", 3),
        0x5C => op("JML", 4),
        0x60 => op("RTS", 1),
        0x6B => op("RTL", 1),
        0x40 => op("RTI", 1),

        // branches fall through in a linear trace
        0x80 => op("BRA", 2),
        0x82 => op("BRL", 3),
        0x10 => op("BPL", 2),
        0x30 => op("BMI", 2),
        0x50 => op("BVC", 2),
        0x70 => op("BVS", 2),
        0x90 => op("BCC", 2),
        0xB0 => op("BCS", 2),
        0xD0 => op("BNE", 2),
        0xF0 => op("BEQ", 2),

        // LDA addressing modes
        0xA1 => op("LDA", 2),
        0xA3 => op("LDA", 2),
        0xA5 => op("LDA", 2),
        0xA7 => op("LDA", 2),
        0xAD => op("LDA", 3),
        0xAF => op("LDA", 4),
        0xB1 => op("LDA", 2),
        0xB2 => op("LDA", 2),
        0xB3 => op("LDA", 2),
        0xB5 => op("LDA", 2),
        0xB7 => op("LDA", 2),
        0xB9 => op("LDA", 3),
        0xBD => op("LDA", 3),
        0xBF => op("LDA", 4),
        // LDX / LDY
        0xA6 => op("LDX", 2),
        0xAE => op("LDX", 3),
        0xB6 => op("LDX", 2),
        0xBE => op("LDX", 3),
        0xA4 => op("LDY", 2),
        0xAC => op("LDY", 3),
        0xB4 => op("LDY", 2),
        0xBC => op("LDY", 3),
        // STA
        0x81 => op("STA", 2),
        0x83 => op("STA", 2),
        0x85 => op("STA", 2),
        0x87 => op("STA", 2),
        0x8D => op("STA", 3),
        0x8F => op("STA", 4),
        0x91 => op("STA", 2),
        0x92 => op("STA", 2),
        0x93 => op("STA", 2),
        0x95 => op("STA", 2),
        0x97 => op("STA", 2),
        0x99 => op("STA", 3),
        0x9D => op("STA", 3),
        0x9F => op("STA", 4),
        // STX / STY / STZ
        0x86 => op("STX", 2),
        0x8E => op("STX", 3),
        0x96 => op("STX", 2),
        0x84 => op("STY", 2),
        0x8C => op("STY", 3),
        0x94 => op("STY", 2),
        0x64 => op("STZ", 2),
        0x74 => op("STZ", 2),
        0x9C => op("STZ", 3),
        0x9E => op("STZ", 3),
        // memory ALU forms seen around the loaders
        0x65 => op("ADC", 2),
        0x6D => op("ADC", 3),
        0x7D => op("ADC", 3),
        0x79 => op("ADC", 3),
        0xE5 => op("SBC", 2),
        0xED => op("SBC", 3),
        0x25 => op("AND", 2),
        0x2D => op("AND", 3),
        0x05 => op("ORA", 2),
        0x0D => op("ORA", 3),
        0x45 => op("EOR", 2),
        0x4D => op("EOR", 3),
        0xC5 => op("CMP", 2),
        0xCD => op("CMP", 3),
        0xD9 => op("CMP", 3),
        0xDD => op("CMP", 3),
        0x24 => op("BIT", 2),
        0x2C => op("BIT", 3),
        0xC6 => op("DEC", 2),
        0xCE => op("DEC", 3),
        0xE6 => op("INC", 2),
        0xEE => op("INC", 3),
        0x06 => op("ASL", 2),
        0x0E => op("ASL", 3),
        0x46 => op("LSR", 2),
        0x4E => op("LSR", 3),
        0x26 => op("ROL", 2),
        0x2E => op("ROL", 3),
        0x66 => op("ROR", 2),
        0x6E => op("ROR", 3),
        // stack / push effective
        0xF4 => op("PEA", 3),
        0xD4 => op("PEI", 2),
        0x62 => op("PER", 3),
        // block moves
        0x44 => op("MVP", 3),
        0x54 => op("MVN", 3),

        // single-byte instructions
        0xEA => op("NOP", 1),
        0x18 => op("CLC", 1),
        0x38 => op("SEC", 1),
        0x58 => op("CLI", 1),
        0x78 => op("SEI", 1),
        0xB8 => op("CLV", 1),
        0xD8 => op("CLD", 1),
        0xF8 => op("SED", 1),
        0xFB => op("XCE", 1),
        0xEB => op("XBA", 1),
        0xAA => op("TAX", 1),
        0xA8 => op("TAY", 1),
        0x8A => op("TXA", 1),
        0x98 => op("TYA", 1),
        0x9A => op("TXS", 1),
        0xBA => op("TSX", 1),
        0x9B => op("TXY", 1),
        0xBB => op("TYX", 1),
        0x5B => op("TCD", 1),
        0x7B => op("TDC", 1),
        0x1B => op("TCS", 1),
        0x3B => op("TSC", 1),
        0x48 => op("PHA", 1),
        0x68 => op("PLA", 1),
        0xDA => op("PHX", 1),
        0xFA => op("PLX", 1),
        0x5A => op("PHY", 1),
        0x7A => op("PLY", 1),
        0x08 => op("PHP", 1),
        0x28 => op("PLP", 1),
        0x8B => op("PHB", 1),
        0xAB => op("PLB", 1),
        0x0B => op("PHD", 1),
        0x2B => op("PLD", 1),
        0x4B => op("PHK", 1),
        0x1A => op("INC", 1),
        0x3A => op("DEC", 1),
        0xE8 => op("INX", 1),
        0xC8 => op("INY", 1),
        0xCA => op("DEX", 1),
        0x88 => op("DEY", 1),
        0x0A => op("ASL", 1),
        0x4A => op("LSR", 1),
        0x2A => op("ROL", 1),
        0x6A => op("ROR", 1),

        _ => return None,
    };
    Some(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immediate_loads_carry_width_rules() {
        assert_eq!(lookup(0xA9).unwrap().width, WidthRule::Memory);
        assert_eq!(lookup(0xA2).unwrap().width, WidthRule::Index);
        assert_eq!(lookup(0xAD).unwrap().width, WidthRule::Fixed);
    }

    #[test]
    fn unknown_bytes_have_no_entry() {
        assert!(lookup(0x02).is_none()); // COP, never traced
        assert!(lookup(0xDB).is_none()); // STP
    }
}
