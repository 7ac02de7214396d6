//! MOS 6502 CPU core as found in the Ricoh 2A03.
//!
//! Execution is table-driven: every opcode maps to a mnemonic, an operation,
//! an addressing mode and a base cycle cost. An instruction takes effect on
//! its first cycle and the CPU then idles for the rest of its cost, so cycle
//! counts match hardware even though bus accesses inside an instruction are
//! not spread across cycles.
//!
//! Decimal mode is not implemented. The D flag can be set and cleared but
//! ADC and SBC always use binary arithmetic.

mod cpu;
mod disassembler;
pub mod flags;
mod opcodes;
mod registers;

pub use cpu::Mos6502;
pub use disassembler::{disassemble, write_listing};
pub use flags::Status;
pub use opcodes::{AddressingMode, Instruction, OPCODES, Operation, decode};
pub use registers::Registers;
