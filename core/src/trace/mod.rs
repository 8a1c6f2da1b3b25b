//! Linear tracer for 65816 loader routines.
//!
//! This is not an emulator. It walks instructions from an entry point,
//! inlining `JSR`/`JSL` callees at the call site, so that a caller can ask
//! "what immediate was loaded just before this subroutine was called" and
//! recover table indices the game passes in registers. Branches are not
//! followed; the trace continues past them linearly, which matches how the
//! loader routines are laid out in practice.

mod opcodes;

pub use opcodes::{lookup, OpcodeInfo, WidthRule};

use log::trace as log_trace;

use crate::addr::Addr;
use crate::error::{Error, Result};
use crate::rom::Rom;

/// One decoded instruction in a trace.
#[derive(Clone, Debug)]
pub struct TracedInstruction {
    pub addr: Addr,
    pub opcode: u8,
    pub mnemonic: &'static str,
    /// Operand bytes in ROM order (little endian).
    pub operand: Vec<u8>,
    /// Statically resolved call target, for `JSR abs` and `JSL` only.
    pub call_target: Option<Addr>,
}

impl TracedInstruction {
    /// Operand decoded as a little-endian integer. Zero for implied
    /// instructions.
    pub fn operand_value(&self) -> u32 {
        self.operand
            .iter()
            .rev()
            .fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
    }

    fn is_call(&self) -> bool {
        self.call_target.is_some()
    }

    fn is_immediate_load(&self) -> bool {
        matches!(self.opcode, 0xA9 | 0xA2 | 0xA0)
    }
}

/// Tracked subset of the processor status register. Only the two width
/// flags matter for instruction lengths.
#[derive(Copy, Clone, Default, Debug)]
struct StatusFlags {
    mem16: bool,
    index16: bool,
}

impl StatusFlags {
    /// Apply a `SEP` (`wide = false`) or `REP` (`wide = true`) operand.
    ///
    /// The pattern `0x30` touches the index flag only. That mirrors how the
    /// game's own code uses `SEP #$30` / `REP #$30` around its loaders, and
    /// extracted data only decodes correctly when traced the same way.
    fn apply(&mut self, operand: u8, wide: bool) {
        match operand & 0x30 {
            0x10 | 0x30 => self.index16 = wide,
            0x20 => self.mem16 = wide,
            _ => {}
        }
    }

    fn operand_len(&self, info: &OpcodeInfo) -> u32 {
        let base = u32::from(info.len) - 1;
        let widen = match info.width {
            WidthRule::Fixed => false,
            WidthRule::Memory => self.mem16,
            WidthRule::Index => self.index16,
        };
        if widen {
            base + 1
        } else {
            base
        }
    }
}

/// Trace from `entry`, inlining subroutine calls, until a terminating
/// instruction or the instruction `budget` is reached.
///
/// `JMP` in any form ends the whole trace: the loaders use it only to tail
/// out into the engine's main loop. `RTS`/`RTL` return to the inlined call
/// site, or end the trace when the call stack is empty. An opcode missing
/// from the decode table is reported as [`Error::UnknownOpcode`] rather
/// than skipped, since a wrong length would desynchronise everything after
/// it.
pub fn trace(rom: &Rom, entry: Addr, budget: usize) -> Result<Vec<TracedInstruction>> {
    let mut out = Vec::new();
    let mut flags = StatusFlags::default();
    let mut returns: Vec<Addr> = Vec::new();
    let mut pc = entry;

    for _ in 0..budget {
        let opcode = rom.read_u8(pc)?;
        let info = lookup(opcode).ok_or(Error::UnknownOpcode { opcode, addr: pc })?;
        let operand_len = flags.operand_len(&info);
        let operand = rom.read_n(pc.offset(1), operand_len as usize)?.to_vec();

        let call_target = match opcode {
            0x20 => {
                let abs = u16::from_le_bytes([operand[0], operand[1]]);
                Some(Addr::from_bank_absolute(pc.bank(), abs))
            }
            0x22 => {
                let long = u32::from(operand[0])
                    | u32::from(operand[1]) << 8
                    | u32::from(operand[2]) << 16;
                Some(Addr::from_linear(long))
            }
            _ => None,
        };

        let insn = TracedInstruction {
            addr: pc,
            opcode,
            mnemonic: info.mnemonic,
            operand,
            call_target,
        };
        log_trace!("{}: {} {:06X}", insn.addr, insn.mnemonic, insn.operand_value());
        let next = pc.offset(1 + operand_len as i32);
        out.push(insn);

        match opcode {
            0xC2 => {
                flags.apply(out[out.len() - 1].operand[0], true);
                pc = next;
            }
            0xE2 => {
                flags.apply(out[out.len() - 1].operand[0], false);
                pc = next;
            }
            0x20 | 0x22 => {
                returns.push(next);
                pc = call_target.unwrap_or(next);
            }
            0x4C | 0x5C | 0x6C | 0x7C => return Ok(out),
            0x60 | 0x6B | 0x40 => match returns.pop() {
                Some(ret) => pc = ret,
                None => return Ok(out),
            },
            _ => pc = next,
        }
    }
    Ok(out)
}

/// Find the immediate argument loaded just before `subroutine` is called
/// within `traced`.
///
/// Scans at most four instructions back from the call for an immediate
/// `LDA`/`LDX`/`LDY`, which covers the game's calling convention of
/// `LDA #arg : JSR sub` with the occasional interleaved flag or transfer
/// instruction.
pub fn find_argument(traced: &[TracedInstruction], subroutine: Addr) -> Result<u32> {
    let call_idx = traced
        .iter()
        .position(|i| i.is_call() && i.call_target == Some(subroutine))
        .ok_or(Error::SubroutineNotFound(subroutine))?;

    traced[..call_idx]
        .iter()
        .rev()
        .take(4)
        .find(|i| i.is_immediate_load())
        .map(TracedInstruction::operand_value)
        .ok_or(Error::ArgumentNotFound(subroutine))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rom_with(code: &[(usize, &[u8])]) -> Rom {
        let mut data = vec![0u8; 0x20000];
        for &(offset, bytes) in code {
            data[offset..offset + bytes.len()].copy_from_slice(bytes);
        }
        Rom::new(data)
    }

    #[test]
    fn linear_trace_decodes_lengths() {
        // LDA #$05, STA $2100, RTS
        let rom = rom_with(&[(0x100, &[0xA9, 0x05, 0x8D, 0x00, 0x21, 0x60])]);
        let t = trace(&rom, Addr::from_linear(0x100), 100).unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t[0].mnemonic, "LDA");
        assert_eq!(t[0].operand_value(), 0x05);
        assert_eq!(t[1].mnemonic, "STA");
        assert_eq!(t[1].operand_value(), 0x2100);
        assert_eq!(t[2].mnemonic, "RTS");
    }

    #[test]
    fn rep_widens_immediates_and_sep_narrows() {
        // REP #$20, LDA #$1234, SEP #$20, LDA #$56, RTS
        let rom = rom_with(&[(
            0x100,
            &[0xC2, 0x20, 0xA9, 0x34, 0x12, 0xE2, 0x20, 0xA9, 0x56, 0x60],
        )]);
        let t = trace(&rom, Addr::from_linear(0x100), 100).unwrap();
        // exactly five instructions: REP and SEP must advance, not re-decode
        let names: Vec<_> = t.iter().map(|i| i.mnemonic).collect();
        assert_eq!(names, ["REP", "LDA", "SEP", "LDA", "RTS"]);
        assert_eq!(t[1].operand_value(), 0x1234);
        assert_eq!(t[3].operand_value(), 0x56);
    }

    #[test]
    fn pattern_30_touches_the_index_flag_only() {
        // REP #$30 must leave the accumulator at 8 bits, so the LDA that
        // follows stays 2 bytes long and the trailing RTS is found.
        let rom = rom_with(&[(0x100, &[0xC2, 0x30, 0xA9, 0x11, 0xA2, 0x22, 0x33, 0x60])]);
        let t = trace(&rom, Addr::from_linear(0x100), 100).unwrap();
        assert_eq!(t[1].operand_value(), 0x11);
        assert_eq!(t[2].operand_value(), 0x3322); // LDX widened by the index flag
        assert_eq!(t[3].mnemonic, "RTS");
    }

    #[test]
    fn jsr_inlines_the_callee() {
        // $00:8000: LDA #$42, JSR $8010, RTS... callee: NOP, RTS
        let rom = rom_with(&[
            (0x8000, &[0xA9, 0x42, 0x20, 0x10, 0x80, 0x60]),
            (0x8010, &[0xEA, 0x60]),
        ]);
        let t = trace(&rom, Addr::from_linear(0x8000), 100).unwrap();
        let names: Vec<_> = t.iter().map(|i| i.mnemonic).collect();
        assert_eq!(names, ["LDA", "JSR", "NOP", "RTS", "RTS"]);

        let arg = find_argument(&t, Addr::from_bank_absolute(0x00, 0x8010)).unwrap();
        assert_eq!(arg, 0x42);
    }

    #[test]
    fn jmp_ends_the_whole_trace() {
        let rom = rom_with(&[
            (0x8000, &[0x20, 0x10, 0x80, 0xA9, 0x99, 0x60]),
            (0x8010, &[0x4C, 0x00, 0x90]), // callee tails out with JMP
        ]);
        let t = trace(&rom, Addr::from_linear(0x8000), 100).unwrap();
        assert_eq!(t.last().unwrap().mnemonic, "JMP");
        // nothing after the call site was traced
        assert!(!t.iter().any(|i| i.operand_value() == 0x99));
    }

    #[test]
    fn budget_stops_runaway_traces() {
        // A run of NOPs with no terminator decodes forever without a cap.
        let rom = rom_with(&[(0x100, &[0xEA; 0x40])]);
        let t = trace(&rom, Addr::from_linear(0x100), 10).unwrap();
        assert_eq!(t.len(), 10);
    }

    #[test]
    fn unknown_opcode_is_fatal() {
        let rom = rom_with(&[(0x100, &[0xA9, 0x01, 0x02])]); // COP
        let err = trace(&rom, Addr::from_linear(0x100), 100).unwrap_err();
        assert!(matches!(err, Error::UnknownOpcode { opcode: 0x02, .. }));
    }

    #[test]
    fn argument_scan_is_bounded() {
        // Five padding instructions between the load and the call.
        let rom = rom_with(&[
            (0x8000, &[0xA9, 0x42, 0xEA, 0xEA, 0xEA, 0xEA, 0xEA, 0x20, 0x20, 0x80, 0x60]),
            (0x8020, &[0x60]),
        ]);
        let t = trace(&rom, Addr::from_linear(0x8000), 100).unwrap();
        let err = find_argument(&t, Addr::from_bank_absolute(0x00, 0x8020)).unwrap_err();
        assert!(matches!(err, Error::ArgumentNotFound(_)));
    }
}
