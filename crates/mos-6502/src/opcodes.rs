//! Opcode lookup table.
//!
//! Each of the 256 opcode bytes maps to a mnemonic, an operation tag, an
//! addressing-mode tag and a base cycle count. Undocumented opcodes decode
//! to a `???` placeholder that burns the documented number of cycles.

/// Operand resolution strategy for an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    /// No operand, or the accumulator (`ASL A`).
    Implicit,
    /// `#$nn`
    Immediate,
    /// `$nn`
    ZeroPage,
    /// `$nn,X` (wraps within page zero)
    ZeroPageX,
    /// `$nn,Y` (wraps within page zero)
    ZeroPageY,
    /// Signed 8-bit branch offset.
    Relative,
    /// `$nnnn`
    Absolute,
    /// `$nnnn,X`
    AbsoluteX,
    /// `$nnnn,Y`
    AbsoluteY,
    /// `($nnnn)`, JMP only.
    Indirect,
    /// `($nn,X)`
    IndirectX,
    /// `($nn),Y`
    IndirectY,
}

impl AddressingMode {
    /// Short tag used in disassembly output.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Implicit => "IMP",
            Self::Immediate => "IMM",
            Self::ZeroPage => "ZP0",
            Self::ZeroPageX => "ZPX",
            Self::ZeroPageY => "ZPY",
            Self::Relative => "REL",
            Self::Absolute => "ABS",
            Self::AbsoluteX => "ABX",
            Self::AbsoluteY => "ABY",
            Self::Indirect => "IND",
            Self::IndirectX => "IZX",
            Self::IndirectY => "IZY",
        }
    }

    /// Number of operand bytes following the opcode.
    #[must_use]
    pub const fn operand_len(self) -> u16 {
        match self {
            Self::Implicit => 0,
            Self::Immediate
            | Self::ZeroPage
            | Self::ZeroPageX
            | Self::ZeroPageY
            | Self::Relative
            | Self::IndirectX
            | Self::IndirectY => 1,
            Self::Absolute | Self::AbsoluteX | Self::AbsoluteY | Self::Indirect => 2,
        }
    }
}

/// Operation performed once the operand address is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Adc,
    And,
    Asl,
    Bcc,
    Bcs,
    Beq,
    Bit,
    Bmi,
    Bne,
    Bpl,
    Brk,
    Bvc,
    Bvs,
    Clc,
    Cld,
    Cli,
    Clv,
    Cmp,
    Cpx,
    Cpy,
    Dec,
    Dex,
    Dey,
    Eor,
    Inc,
    Inx,
    Iny,
    Jmp,
    Jsr,
    Lda,
    Ldx,
    Ldy,
    Lsr,
    Nop,
    Ora,
    Pha,
    Php,
    Pla,
    Plp,
    Rol,
    Ror,
    Rti,
    Rts,
    Sbc,
    Sec,
    Sed,
    Sei,
    Sta,
    Stx,
    Sty,
    Tax,
    Tay,
    Tsx,
    Txa,
    Txs,
    Tya,
    /// Undocumented opcode placeholder.
    Xxx,
}

/// One entry of the opcode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub mnemonic: &'static str,
    pub operation: Operation,
    pub mode: AddressingMode,
    /// Base cycle count before page-cross and branch penalties.
    pub cycles: u8,
}

const fn ins(
    mnemonic: &'static str,
    operation: Operation,
    mode: AddressingMode,
    cycles: u8,
) -> Instruction {
    Instruction {
        mnemonic,
        operation,
        mode,
        cycles,
    }
}

use AddressingMode as M;
use Operation as O;

/// The 256-entry decode table, indexed by opcode byte.
#[rustfmt::skip]
pub static OPCODES: [Instruction; 256] = [
    // 0x00
    ins("BRK", O::Brk, M::Immediate, 7), ins("ORA", O::Ora, M::IndirectX, 6), ins("???", O::Xxx, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 8),
    ins("???", O::Nop, M::Implicit, 3), ins("ORA", O::Ora, M::ZeroPage, 3), ins("ASL", O::Asl, M::ZeroPage, 5), ins("???", O::Xxx, M::Implicit, 5),
    ins("PHP", O::Php, M::Implicit, 3), ins("ORA", O::Ora, M::Immediate, 2), ins("ASL", O::Asl, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 2),
    ins("???", O::Nop, M::Implicit, 4), ins("ORA", O::Ora, M::Absolute, 4), ins("ASL", O::Asl, M::Absolute, 6), ins("???", O::Xxx, M::Implicit, 6),
    // 0x10
    ins("BPL", O::Bpl, M::Relative, 2), ins("ORA", O::Ora, M::IndirectY, 5), ins("???", O::Xxx, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 8),
    ins("???", O::Nop, M::Implicit, 4), ins("ORA", O::Ora, M::ZeroPageX, 4), ins("ASL", O::Asl, M::ZeroPageX, 6), ins("???", O::Xxx, M::Implicit, 6),
    ins("CLC", O::Clc, M::Implicit, 2), ins("ORA", O::Ora, M::AbsoluteY, 4), ins("???", O::Nop, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 7),
    ins("???", O::Nop, M::Implicit, 4), ins("ORA", O::Ora, M::AbsoluteX, 4), ins("ASL", O::Asl, M::AbsoluteX, 7), ins("???", O::Xxx, M::Implicit, 7),
    // 0x20
    ins("JSR", O::Jsr, M::Absolute, 6), ins("AND", O::And, M::IndirectX, 6), ins("???", O::Xxx, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 8),
    ins("BIT", O::Bit, M::ZeroPage, 3), ins("AND", O::And, M::ZeroPage, 3), ins("ROL", O::Rol, M::ZeroPage, 5), ins("???", O::Xxx, M::Implicit, 5),
    ins("PLP", O::Plp, M::Implicit, 4), ins("AND", O::And, M::Immediate, 2), ins("ROL", O::Rol, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 2),
    ins("BIT", O::Bit, M::Absolute, 4), ins("AND", O::And, M::Absolute, 4), ins("ROL", O::Rol, M::Absolute, 6), ins("???", O::Xxx, M::Implicit, 6),
    // 0x30
    ins("BMI", O::Bmi, M::Relative, 2), ins("AND", O::And, M::IndirectY, 5), ins("???", O::Xxx, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 8),
    ins("???", O::Nop, M::Implicit, 4), ins("AND", O::And, M::ZeroPageX, 4), ins("ROL", O::Rol, M::ZeroPageX, 6), ins("???", O::Xxx, M::Implicit, 6),
    ins("SEC", O::Sec, M::Implicit, 2), ins("AND", O::And, M::AbsoluteY, 4), ins("???", O::Nop, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 7),
    ins("???", O::Nop, M::Implicit, 4), ins("AND", O::And, M::AbsoluteX, 4), ins("ROL", O::Rol, M::AbsoluteX, 7), ins("???", O::Xxx, M::Implicit, 7),
    // 0x40
    ins("RTI", O::Rti, M::Implicit, 6), ins("EOR", O::Eor, M::IndirectX, 6), ins("???", O::Xxx, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 8),
    ins("???", O::Nop, M::Implicit, 3), ins("EOR", O::Eor, M::ZeroPage, 3), ins("LSR", O::Lsr, M::ZeroPage, 5), ins("???", O::Xxx, M::Implicit, 5),
    ins("PHA", O::Pha, M::Implicit, 3), ins("EOR", O::Eor, M::Immediate, 2), ins("LSR", O::Lsr, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 2),
    ins("JMP", O::Jmp, M::Absolute, 3), ins("EOR", O::Eor, M::Absolute, 4), ins("LSR", O::Lsr, M::Absolute, 6), ins("???", O::Xxx, M::Implicit, 6),
    // 0x50
    ins("BVC", O::Bvc, M::Relative, 2), ins("EOR", O::Eor, M::IndirectY, 5), ins("???", O::Xxx, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 8),
    ins("???", O::Nop, M::Implicit, 4), ins("EOR", O::Eor, M::ZeroPageX, 4), ins("LSR", O::Lsr, M::ZeroPageX, 6), ins("???", O::Xxx, M::Implicit, 6),
    ins("CLI", O::Cli, M::Implicit, 2), ins("EOR", O::Eor, M::AbsoluteY, 4), ins("???", O::Nop, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 7),
    ins("???", O::Nop, M::Implicit, 4), ins("EOR", O::Eor, M::AbsoluteX, 4), ins("LSR", O::Lsr, M::AbsoluteX, 7), ins("???", O::Xxx, M::Implicit, 7),
    // 0x60
    ins("RTS", O::Rts, M::Implicit, 6), ins("ADC", O::Adc, M::IndirectX, 6), ins("???", O::Xxx, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 8),
    ins("???", O::Nop, M::Implicit, 3), ins("ADC", O::Adc, M::ZeroPage, 3), ins("ROR", O::Ror, M::ZeroPage, 5), ins("???", O::Xxx, M::Implicit, 5),
    ins("PLA", O::Pla, M::Implicit, 4), ins("ADC", O::Adc, M::Immediate, 2), ins("ROR", O::Ror, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 2),
    ins("JMP", O::Jmp, M::Indirect, 5), ins("ADC", O::Adc, M::Absolute, 4), ins("ROR", O::Ror, M::Absolute, 6), ins("???", O::Xxx, M::Implicit, 6),
    // 0x70
    ins("BVS", O::Bvs, M::Relative, 2), ins("ADC", O::Adc, M::IndirectY, 5), ins("???", O::Xxx, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 8),
    ins("???", O::Nop, M::Implicit, 4), ins("ADC", O::Adc, M::ZeroPageX, 4), ins("ROR", O::Ror, M::ZeroPageX, 6), ins("???", O::Xxx, M::Implicit, 6),
    ins("SEI", O::Sei, M::Implicit, 2), ins("ADC", O::Adc, M::AbsoluteY, 4), ins("???", O::Nop, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 7),
    ins("???", O::Nop, M::Implicit, 4), ins("ADC", O::Adc, M::AbsoluteX, 4), ins("ROR", O::Ror, M::AbsoluteX, 7), ins("???", O::Xxx, M::Implicit, 7),
    // 0x80
    ins("???", O::Nop, M::Implicit, 2), ins("STA", O::Sta, M::IndirectX, 6), ins("???", O::Nop, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 6),
    ins("STY", O::Sty, M::ZeroPage, 3), ins("STA", O::Sta, M::ZeroPage, 3), ins("STX", O::Stx, M::ZeroPage, 3), ins("???", O::Xxx, M::Implicit, 3),
    ins("DEY", O::Dey, M::Implicit, 2), ins("???", O::Nop, M::Implicit, 2), ins("TXA", O::Txa, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 2),
    ins("STY", O::Sty, M::Absolute, 4), ins("STA", O::Sta, M::Absolute, 4), ins("STX", O::Stx, M::Absolute, 4), ins("???", O::Xxx, M::Implicit, 4),
    // 0x90
    ins("BCC", O::Bcc, M::Relative, 2), ins("STA", O::Sta, M::IndirectY, 6), ins("???", O::Xxx, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 6),
    ins("STY", O::Sty, M::ZeroPageX, 4), ins("STA", O::Sta, M::ZeroPageX, 4), ins("STX", O::Stx, M::ZeroPageY, 4), ins("???", O::Xxx, M::Implicit, 4),
    ins("TYA", O::Tya, M::Implicit, 2), ins("STA", O::Sta, M::AbsoluteY, 5), ins("TXS", O::Txs, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 5),
    ins("???", O::Nop, M::Implicit, 5), ins("STA", O::Sta, M::AbsoluteX, 5), ins("???", O::Xxx, M::Implicit, 5), ins("???", O::Xxx, M::Implicit, 5),
    // 0xA0
    ins("LDY", O::Ldy, M::Immediate, 2), ins("LDA", O::Lda, M::IndirectX, 6), ins("LDX", O::Ldx, M::Immediate, 2), ins("???", O::Xxx, M::Implicit, 6),
    ins("LDY", O::Ldy, M::ZeroPage, 3), ins("LDA", O::Lda, M::ZeroPage, 3), ins("LDX", O::Ldx, M::ZeroPage, 3), ins("???", O::Xxx, M::Implicit, 3),
    ins("TAY", O::Tay, M::Implicit, 2), ins("LDA", O::Lda, M::Immediate, 2), ins("TAX", O::Tax, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 2),
    ins("LDY", O::Ldy, M::Absolute, 4), ins("LDA", O::Lda, M::Absolute, 4), ins("LDX", O::Ldx, M::Absolute, 4), ins("???", O::Xxx, M::Implicit, 4),
    // 0xB0
    ins("BCS", O::Bcs, M::Relative, 2), ins("LDA", O::Lda, M::IndirectY, 5), ins("???", O::Xxx, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 5),
    ins("LDY", O::Ldy, M::ZeroPageX, 4), ins("LDA", O::Lda, M::ZeroPageX, 4), ins("LDX", O::Ldx, M::ZeroPageY, 4), ins("???", O::Xxx, M::Implicit, 4),
    ins("CLV", O::Clv, M::Implicit, 2), ins("LDA", O::Lda, M::AbsoluteY, 4), ins("TSX", O::Tsx, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 4),
    ins("LDY", O::Ldy, M::AbsoluteX, 4), ins("LDA", O::Lda, M::AbsoluteX, 4), ins("LDX", O::Ldx, M::AbsoluteY, 4), ins("???", O::Xxx, M::Implicit, 4),
    // 0xC0
    ins("CPY", O::Cpy, M::Immediate, 2), ins("CMP", O::Cmp, M::IndirectX, 6), ins("???", O::Nop, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 8),
    ins("CPY", O::Cpy, M::ZeroPage, 3), ins("CMP", O::Cmp, M::ZeroPage, 3), ins("DEC", O::Dec, M::ZeroPage, 5), ins("???", O::Xxx, M::Implicit, 5),
    ins("INY", O::Iny, M::Implicit, 2), ins("CMP", O::Cmp, M::Immediate, 2), ins("DEX", O::Dex, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 2),
    ins("CPY", O::Cpy, M::Absolute, 4), ins("CMP", O::Cmp, M::Absolute, 4), ins("DEC", O::Dec, M::Absolute, 6), ins("???", O::Xxx, M::Implicit, 6),
    // 0xD0
    ins("BNE", O::Bne, M::Relative, 2), ins("CMP", O::Cmp, M::IndirectY, 5), ins("???", O::Xxx, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 8),
    ins("???", O::Nop, M::Implicit, 4), ins("CMP", O::Cmp, M::ZeroPageX, 4), ins("DEC", O::Dec, M::ZeroPageX, 6), ins("???", O::Xxx, M::Implicit, 6),
    ins("CLD", O::Cld, M::Implicit, 2), ins("CMP", O::Cmp, M::AbsoluteY, 4), ins("NOP", O::Nop, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 7),
    ins("???", O::Nop, M::Implicit, 4), ins("CMP", O::Cmp, M::AbsoluteX, 4), ins("DEC", O::Dec, M::AbsoluteX, 7), ins("???", O::Xxx, M::Implicit, 7),
    // 0xE0
    ins("CPX", O::Cpx, M::Immediate, 2), ins("SBC", O::Sbc, M::IndirectX, 6), ins("???", O::Nop, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 8),
    ins("CPX", O::Cpx, M::ZeroPage, 3), ins("SBC", O::Sbc, M::ZeroPage, 3), ins("INC", O::Inc, M::ZeroPage, 5), ins("???", O::Xxx, M::Implicit, 5),
    ins("INX", O::Inx, M::Implicit, 2), ins("SBC", O::Sbc, M::Immediate, 2), ins("NOP", O::Nop, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 2),
    ins("CPX", O::Cpx, M::Absolute, 4), ins("SBC", O::Sbc, M::Absolute, 4), ins("INC", O::Inc, M::Absolute, 6), ins("???", O::Xxx, M::Implicit, 6),
    // 0xF0
    ins("BEQ", O::Beq, M::Relative, 2), ins("SBC", O::Sbc, M::IndirectY, 5), ins("???", O::Xxx, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 8),
    ins("???", O::Nop, M::Implicit, 4), ins("SBC", O::Sbc, M::ZeroPageX, 4), ins("INC", O::Inc, M::ZeroPageX, 6), ins("???", O::Xxx, M::Implicit, 6),
    ins("SED", O::Sed, M::Implicit, 2), ins("SBC", O::Sbc, M::AbsoluteY, 4), ins("NOP", O::Nop, M::Implicit, 2), ins("???", O::Xxx, M::Implicit, 7),
    ins("???", O::Nop, M::Implicit, 4), ins("SBC", O::Sbc, M::AbsoluteX, 4), ins("INC", O::Inc, M::AbsoluteX, 7), ins("???", O::Xxx, M::Implicit, 7),
];

/// Look up the table entry for an opcode byte.
#[must_use]
pub fn decode(opcode: u8) -> &'static Instruction {
    &OPCODES[usize::from(opcode)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_timings() {
        assert_eq!(decode(0xA9).cycles, 2); // LDA imm
        assert_eq!(decode(0xAD).cycles, 4); // LDA abs
        assert_eq!(decode(0xB1).cycles, 5); // LDA (zp),Y
        assert_eq!(decode(0x9D).cycles, 5); // STA abs,X
        assert_eq!(decode(0x1E).cycles, 7); // ASL abs,X
        assert_eq!(decode(0x20).cycles, 6); // JSR
        assert_eq!(decode(0x6C).cycles, 5); // JMP (ind)
        assert_eq!(decode(0x00).cycles, 7); // BRK
    }

    #[test]
    fn named_opcode_count() {
        // 151 documented opcodes plus the NOP aliases at 0xDA and 0xFA
        let named = OPCODES.iter().filter(|i| i.mnemonic != "???").count();
        assert_eq!(named, 153);
        assert_eq!(decode(0xEA).operation, Operation::Nop);
        assert_eq!(decode(0xEB).operation, Operation::Xxx);
    }

    #[test]
    fn placeholders_are_implicit() {
        for entry in OPCODES.iter().filter(|i| i.mnemonic == "???") {
            assert_eq!(entry.mode, AddressingMode::Implicit);
            assert!(matches!(entry.operation, Operation::Nop | Operation::Xxx));
        }
    }

    #[test]
    fn modes_for_indexed_loads() {
        assert_eq!(decode(0xB6).mode, AddressingMode::ZeroPageY); // LDX zp,Y
        assert_eq!(decode(0xBE).mode, AddressingMode::AbsoluteY); // LDX abs,Y
        assert_eq!(decode(0xA1).mode, AddressingMode::IndirectX);
        assert_eq!(decode(0x0A).mode, AddressingMode::Implicit); // ASL A
    }
}
