//! Table-driven disassembler.
//!
//! Reads through `Bus::peek`, so producing a listing never disturbs
//! emulated state.

use std::collections::BTreeMap;
use std::io;

use emu_core::Bus;

use crate::opcodes::{self, AddressingMode};

/// Disassemble every instruction starting in `start..=stop`.
///
/// The map key is the address of each instruction's opcode byte. Operands
/// that run past `stop` are still read, so the last instruction is always
/// complete.
pub fn disassemble<B: Bus + ?Sized>(bus: &B, start: u16, stop: u16) -> BTreeMap<u16, String> {
    let mut lines = BTreeMap::new();
    // Walk in u32 so a range ending at $FFFF terminates.
    let mut addr = u32::from(start);
    let end = u32::from(stop);

    let next = |addr: &mut u32| -> u8 {
        let value = bus.peek(*addr as u16);
        *addr += 1;
        value
    };

    while addr <= end {
        let line_addr = addr as u16;
        let instruction = opcodes::decode(next(&mut addr));
        let mut text = format!("${line_addr:04X}: {} ", instruction.mnemonic);

        match instruction.mode {
            AddressingMode::Implicit => {}
            AddressingMode::Immediate => {
                let value = next(&mut addr);
                text.push_str(&format!("#${value:02X} "));
            }
            AddressingMode::ZeroPage => {
                let lo = next(&mut addr);
                text.push_str(&format!("${lo:02X} "));
            }
            AddressingMode::ZeroPageX | AddressingMode::IndirectX => {
                let lo = next(&mut addr);
                text.push_str(&format!("${lo:02X}, X "));
            }
            AddressingMode::ZeroPageY | AddressingMode::IndirectY => {
                let lo = next(&mut addr);
                text.push_str(&format!("${lo:02X}, Y "));
            }
            AddressingMode::Absolute => {
                let word = u16::from_le_bytes([next(&mut addr), next(&mut addr)]);
                text.push_str(&format!("${word:04X} "));
            }
            AddressingMode::AbsoluteX => {
                let word = u16::from_le_bytes([next(&mut addr), next(&mut addr)]);
                text.push_str(&format!("${word:04X}, X "));
            }
            AddressingMode::AbsoluteY => {
                let word = u16::from_le_bytes([next(&mut addr), next(&mut addr)]);
                text.push_str(&format!("${word:04X}, Y "));
            }
            AddressingMode::Indirect => {
                let word = u16::from_le_bytes([next(&mut addr), next(&mut addr)]);
                text.push_str(&format!("(${word:04X}) "));
            }
            AddressingMode::Relative => {
                let offset = next(&mut addr);
                let target = (addr as u16).wrapping_add(offset as i8 as u16);
                text.push_str(&format!("${offset:04X} [${target:04X}] "));
            }
        }

        text.push('{');
        text.push_str(instruction.mode.tag());
        text.push('}');
        lines.insert(line_addr, text);
    }

    lines
}

/// Write a listing one line per instruction, in address order.
///
/// # Errors
///
/// Returns any error from the underlying writer.
pub fn write_listing<W: io::Write>(lines: &BTreeMap<u16, String>, mut out: W) -> io::Result<()> {
    for line in lines.values() {
        writeln!(out, "{line}")?;
    }
    Ok(())
}
