//! 6502 CPU implementation.
//!
//! Instruction-atomic execution with cycle-accurate timing. When the cycle
//! counter is zero, `tick()` fetches an opcode, resolves its operand and
//! applies the whole instruction at once, then loads the counter with the
//! instruction's cost. Every later `tick()` only burns one of those cycles.
//!
//! Extra cycles use an AND rule: the addressing mode reports a page cross
//! and the operation reports whether it is sensitive to one. The penalty is
//! only charged when both agree, so `LDA abs,X` pays it and `STA abs,X`
//! (whose base cost already includes the fix-up cycle) does not.

use emu_core::{Bus, Cpu, Observable, Value};
use log::{debug, trace};

use crate::flags::{B, C, D, I, N, U, V, Z};
use crate::opcodes::{self, AddressingMode, Operation};
use crate::Registers;

const NMI_VECTOR: u16 = 0xFFFA;
const RESET_VECTOR: u16 = 0xFFFC;
const IRQ_VECTOR: u16 = 0xFFFE;

/// Unofficial absolute,X NOPs that would pay the page-cross penalty.
/// The 2A03 flavour of the MOS 6502 (no decimal arithmetic).
#[derive(Debug)]
pub struct Mos6502 {
    /// CPU registers.
    pub regs: Registers,

    /// Operand latch. Implicit-mode instructions see the accumulator here.
    fetched: u8,

    /// Opcode of the instruction in flight.
    opcode: u8,

    /// Addressing mode of the instruction in flight.
    mode: AddressingMode,

    /// Cycles remaining before the next opcode fetch.
    cycles: u8,

    /// Effective address resolved by the addressing mode.
    addr_abs: u16,

    /// Sign-extended branch offset.
    addr_rel: u16,

    /// Total cycles ticked since reset.
    total_cycles: u64,

    /// Instructions started since reset.
    operation_count: u64,
}

impl Default for Mos6502 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mos6502 {
    /// Create a CPU ready to fetch at PC 0. Call `reset()` to load the
    /// reset vector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            fetched: 0,
            opcode: 0,
            mode: AddressingMode::Implicit,
            cycles: 0,
            addr_abs: 0,
            addr_rel: 0,
            total_cycles: 0,
            operation_count: 0,
        }
    }

    #[must_use]
    pub fn cycles_remaining(&self) -> u8 {
        self.cycles
    }

    #[must_use]
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    #[must_use]
    pub fn fetched(&self) -> u8 {
        self.fetched
    }

    #[must_use]
    pub fn addr_abs(&self) -> u16 {
        self.addr_abs
    }

    #[must_use]
    pub fn addr_rel(&self) -> u16 {
        self.addr_rel
    }

    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    #[must_use]
    pub fn operation_count(&self) -> u64 {
        self.operation_count
    }

    // =========================================================================
    // Memory helpers
    // =========================================================================

    fn read_word<B: Bus>(bus: &mut B, addr: u16) -> u16 {
        let lo = bus.read(addr);
        let hi = bus.read(addr.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    fn read_operand<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let value = bus.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    fn push<B: Bus>(&mut self, bus: &mut B, value: u8) {
        let addr = self.regs.push();
        bus.write(addr, value);
    }

    fn pop<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let addr = self.regs.pop();
        bus.read(addr)
    }

    fn push_word<B: Bus>(&mut self, bus: &mut B, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.push(bus, hi);
        self.push(bus, lo);
    }

    fn pop_word<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.pop(bus);
        let hi = self.pop(bus);
        u16::from_le_bytes([lo, hi])
    }

    /// Operand value for the instruction in flight. Implicit mode skips the
    /// memory read and returns the latched accumulator.
    fn fetch<B: Bus>(&mut self, bus: &mut B) -> u8 {
        if self.mode != AddressingMode::Implicit {
            self.fetched = bus.read(self.addr_abs);
        }
        self.fetched
    }

    /// Store a shift/rotate result to A or back to memory.
    fn write_back<B: Bus>(&mut self, bus: &mut B, value: u8) {
        if self.mode == AddressingMode::Implicit {
            self.regs.a = value;
        } else {
            bus.write(self.addr_abs, value);
        }
    }

    // =========================================================================
    // Addressing modes
    // =========================================================================

    /// Resolve the operand address. Returns 1 when an indexed mode crossed
    /// a page boundary.
    fn resolve_address<B: Bus>(&mut self, bus: &mut B) -> u8 {
        match self.mode {
            AddressingMode::Implicit => {
                self.fetched = self.regs.a;
                0
            }
            AddressingMode::Immediate => {
                self.addr_abs = self.regs.pc;
                self.regs.pc = self.regs.pc.wrapping_add(1);
                0
            }
            AddressingMode::ZeroPage => {
                self.addr_abs = u16::from(self.read_operand(bus));
                0
            }
            AddressingMode::ZeroPageX => {
                let base = self.read_operand(bus);
                self.addr_abs = u16::from(base.wrapping_add(self.regs.x));
                0
            }
            AddressingMode::ZeroPageY => {
                let base = self.read_operand(bus);
                self.addr_abs = u16::from(base.wrapping_add(self.regs.y));
                0
            }
            AddressingMode::Relative => {
                let offset = self.read_operand(bus);
                self.addr_rel = offset as i8 as u16;
                0
            }
            AddressingMode::Absolute => {
                let lo = self.read_operand(bus);
                let hi = self.read_operand(bus);
                self.addr_abs = u16::from_le_bytes([lo, hi]);
                0
            }
            AddressingMode::AbsoluteX => {
                let index = self.regs.x;
                self.absolute_indexed(bus, index)
            }
            AddressingMode::AbsoluteY => {
                let index = self.regs.y;
                self.absolute_indexed(bus, index)
            }
            AddressingMode::Indirect => {
                let lo = self.read_operand(bus);
                let hi = self.read_operand(bus);
                let ptr = u16::from_le_bytes([lo, hi]);
                // Hardware bug: the high byte never carries into the next page.
                let hi_addr = if lo == 0xFF {
                    ptr & 0xFF00
                } else {
                    ptr.wrapping_add(1)
                };
                self.addr_abs = u16::from_le_bytes([bus.read(ptr), bus.read(hi_addr)]);
                0
            }
            AddressingMode::IndirectX => {
                let ptr = self.read_operand(bus).wrapping_add(self.regs.x);
                let lo = bus.read(u16::from(ptr));
                let hi = bus.read(u16::from(ptr.wrapping_add(1)));
                self.addr_abs = u16::from_le_bytes([lo, hi]);
                0
            }
            AddressingMode::IndirectY => {
                let ptr = self.read_operand(bus);
                let lo = bus.read(u16::from(ptr));
                let hi = bus.read(u16::from(ptr.wrapping_add(1)));
                let base = u16::from_le_bytes([lo, hi]);
                self.addr_abs = base.wrapping_add(u16::from(self.regs.y));
                u8::from(base & 0xFF00 != self.addr_abs & 0xFF00)
            }
        }
    }

    fn absolute_indexed<B: Bus>(&mut self, bus: &mut B, index: u8) -> u8 {
        let lo = self.read_operand(bus);
        let hi = self.read_operand(bus);
        let base = u16::from_le_bytes([lo, hi]);
        self.addr_abs = base.wrapping_add(u16::from(index));
        u8::from(base & 0xFF00 != self.addr_abs & 0xFF00)
    }

    // =========================================================================
    // ALU helpers
    // =========================================================================

    /// Binary add of A, `value` and carry. SBC feeds the inverted operand.
    fn add_with_carry(&mut self, value: u8) {
        let a = u16::from(self.regs.a);
        let m = u16::from(value);
        let temp = a + m + u16::from(self.regs.p.bit(C));

        self.regs.p.set_if(C, temp > 0xFF);
        self.regs.p.set_if(V, (!(a ^ m) & (a ^ temp)) & 0x0080 != 0);
        self.regs.a = temp as u8;
        self.regs.p.update_nz(self.regs.a);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.regs.p.set_if(C, register >= value);
        self.regs.p.update_nz(register.wrapping_sub(value));
    }

    /// Taken-branch timing: one cycle, plus one more across a page.
    fn branch(&mut self, condition: bool) {
        if condition {
            self.cycles += 1;
            let target = self.regs.pc.wrapping_add(self.addr_rel);
            if target & 0xFF00 != self.regs.pc & 0xFF00 {
                self.cycles += 1;
            }
            self.addr_abs = target;
            self.regs.pc = target;
        }
    }

    /// Push PC and status, set I, then jump through `vector`.
    fn enter_interrupt<B: Bus>(&mut self, bus: &mut B, vector: u16, status: u8) {
        self.push_word(bus, self.regs.pc);
        self.push(bus, status);
        self.regs.p.set(I);
        self.addr_abs = vector;
        self.regs.pc = Self::read_word(bus, vector);
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Apply an operation. Returns 1 if it is sensitive to page crossing.
    fn execute<B: Bus>(&mut self, operation: Operation, bus: &mut B) -> u8 {
        match operation {
            // Loads and stores
            Operation::Lda => {
                self.regs.a = self.fetch(bus);
                self.regs.p.update_nz(self.regs.a);
                1
            }
            Operation::Ldx => {
                self.regs.x = self.fetch(bus);
                self.regs.p.update_nz(self.regs.x);
                1
            }
            Operation::Ldy => {
                self.regs.y = self.fetch(bus);
                self.regs.p.update_nz(self.regs.y);
                1
            }
            Operation::Sta => {
                bus.write(self.addr_abs, self.regs.a);
                0
            }
            Operation::Stx => {
                bus.write(self.addr_abs, self.regs.x);
                0
            }
            Operation::Sty => {
                bus.write(self.addr_abs, self.regs.y);
                0
            }

            // Arithmetic and logic
            Operation::Adc => {
                let value = self.fetch(bus);
                self.add_with_carry(value);
                1
            }
            Operation::Sbc => {
                let value = self.fetch(bus);
                self.add_with_carry(value ^ 0xFF);
                1
            }
            Operation::And => {
                self.regs.a &= self.fetch(bus);
                self.regs.p.update_nz(self.regs.a);
                1
            }
            Operation::Eor => {
                self.regs.a ^= self.fetch(bus);
                self.regs.p.update_nz(self.regs.a);
                1
            }
            Operation::Ora => {
                self.regs.a |= self.fetch(bus);
                self.regs.p.update_nz(self.regs.a);
                1
            }
            Operation::Bit => {
                let value = self.fetch(bus);
                self.regs.p.set_if(Z, self.regs.a & value == 0);
                self.regs.p.set_if(N, value & 0x80 != 0);
                self.regs.p.set_if(V, value & 0x40 != 0);
                0
            }
            Operation::Cmp => {
                let value = self.fetch(bus);
                self.compare(self.regs.a, value);
                1
            }
            Operation::Cpx => {
                let value = self.fetch(bus);
                self.compare(self.regs.x, value);
                0
            }
            Operation::Cpy => {
                let value = self.fetch(bus);
                self.compare(self.regs.y, value);
                0
            }

            // Increments and decrements
            Operation::Inc => {
                let value = self.fetch(bus).wrapping_add(1);
                bus.write(self.addr_abs, value);
                self.regs.p.update_nz(value);
                0
            }
            Operation::Dec => {
                let value = self.fetch(bus).wrapping_sub(1);
                bus.write(self.addr_abs, value);
                self.regs.p.update_nz(value);
                0
            }
            Operation::Inx => {
                self.regs.x = self.regs.x.wrapping_add(1);
                self.regs.p.update_nz(self.regs.x);
                0
            }
            Operation::Iny => {
                self.regs.y = self.regs.y.wrapping_add(1);
                self.regs.p.update_nz(self.regs.y);
                0
            }
            Operation::Dex => {
                self.regs.x = self.regs.x.wrapping_sub(1);
                self.regs.p.update_nz(self.regs.x);
                0
            }
            Operation::Dey => {
                self.regs.y = self.regs.y.wrapping_sub(1);
                self.regs.p.update_nz(self.regs.y);
                0
            }

            // Shifts and rotates
            Operation::Asl => {
                let value = self.fetch(bus);
                let result = value << 1;
                self.regs.p.set_if(C, value & 0x80 != 0);
                self.regs.p.update_nz(result);
                self.write_back(bus, result);
                0
            }
            Operation::Lsr => {
                let value = self.fetch(bus);
                let result = value >> 1;
                self.regs.p.set_if(C, value & 0x01 != 0);
                self.regs.p.update_nz(result);
                self.write_back(bus, result);
                0
            }
            Operation::Rol => {
                let value = self.fetch(bus);
                let result = (value << 1) | self.regs.p.bit(C);
                self.regs.p.set_if(C, value & 0x80 != 0);
                self.regs.p.update_nz(result);
                self.write_back(bus, result);
                0
            }
            Operation::Ror => {
                let value = self.fetch(bus);
                let result = (self.regs.p.bit(C) << 7) | (value >> 1);
                self.regs.p.set_if(C, value & 0x01 != 0);
                self.regs.p.update_nz(result);
                self.write_back(bus, result);
                0
            }

            // Branches
            Operation::Bcc => {
                self.branch(!self.regs.p.is_set(C));
                0
            }
            Operation::Bcs => {
                self.branch(self.regs.p.is_set(C));
                0
            }
            Operation::Bne => {
                self.branch(!self.regs.p.is_set(Z));
                0
            }
            Operation::Beq => {
                self.branch(self.regs.p.is_set(Z));
                0
            }
            Operation::Bpl => {
                self.branch(!self.regs.p.is_set(N));
                0
            }
            Operation::Bmi => {
                self.branch(self.regs.p.is_set(N));
                0
            }
            Operation::Bvc => {
                self.branch(!self.regs.p.is_set(V));
                0
            }
            Operation::Bvs => {
                self.branch(self.regs.p.is_set(V));
                0
            }

            // Jumps and subroutines
            Operation::Jmp => {
                self.regs.pc = self.addr_abs;
                0
            }
            Operation::Jsr => {
                let ret = self.regs.pc.wrapping_sub(1);
                self.push_word(bus, ret);
                self.regs.pc = self.addr_abs;
                0
            }
            Operation::Rts => {
                self.regs.pc = self.pop_word(bus).wrapping_add(1);
                0
            }
            Operation::Brk => {
                // Immediate addressing already stepped PC over the padding byte.
                debug!("BRK at ${:04X}", self.regs.pc.wrapping_sub(2));
                let status = self.regs.p.to_byte_brk();
                self.enter_interrupt(bus, IRQ_VECTOR, status);
                0
            }
            Operation::Rti => {
                self.regs.p.0 = self.pop(bus);
                self.regs.p.clear(B);
                self.regs.p.clear(U);
                self.regs.pc = self.pop_word(bus);
                0
            }

            // Stack
            Operation::Pha => {
                self.push(bus, self.regs.a);
                0
            }
            Operation::Php => {
                self.push(bus, self.regs.p.to_byte_brk());
                self.regs.p.clear(B);
                self.regs.p.clear(U);
                0
            }
            Operation::Pla => {
                self.regs.a = self.pop(bus);
                self.regs.p.update_nz(self.regs.a);
                0
            }
            Operation::Plp => {
                self.regs.p.0 = self.pop(bus);
                self.regs.p.clear(B);
                self.regs.p.set(U);
                0
            }

            // Register transfers
            Operation::Tax => {
                self.regs.x = self.regs.a;
                self.regs.p.update_nz(self.regs.x);
                0
            }
            Operation::Tay => {
                self.regs.y = self.regs.a;
                self.regs.p.update_nz(self.regs.y);
                0
            }
            Operation::Txa => {
                self.regs.a = self.regs.x;
                self.regs.p.update_nz(self.regs.a);
                0
            }
            Operation::Tya => {
                self.regs.a = self.regs.y;
                self.regs.p.update_nz(self.regs.a);
                0
            }
            Operation::Tsx => {
                self.regs.x = self.regs.s;
                self.regs.p.update_nz(self.regs.x);
                0
            }
            Operation::Txs => {
                self.regs.s = self.regs.x;
                0
            }

            // Flags
            Operation::Clc => {
                self.regs.p.clear(C);
                0
            }
            Operation::Cld => {
                self.regs.p.clear(D);
                0
            }
            Operation::Cli => {
                self.regs.p.clear(I);
                0
            }
            Operation::Clv => {
                self.regs.p.clear(V);
                0
            }
            Operation::Sec => {
                self.regs.p.set(C);
                0
            }
            Operation::Sed => {
                self.regs.p.set(D);
                0
            }
            Operation::Sei => {
                self.regs.p.set(I);
                0
            }

            Operation::Nop | Operation::Xxx => 0,
        }
    }
}

impl Cpu for Mos6502 {
    type Registers = Registers;

    fn tick<B: Bus>(&mut self, bus: &mut B) {
        if self.cycles == 0 {
            let pc = self.regs.pc;
            self.opcode = bus.read(pc);
            self.regs.p.set(U);
            self.regs.pc = pc.wrapping_add(1);

            let instruction = opcodes::decode(self.opcode);
            trace!("${pc:04X}: {:02X} {}", self.opcode, instruction.mnemonic);

            self.mode = instruction.mode;
            self.cycles = instruction.cycles;
            let mode_extra = self.resolve_address(bus);
            let op_extra = self.execute(instruction.operation, bus);
            self.cycles += mode_extra & op_extra;

            self.regs.p.set(U);
            self.operation_count += 1;
        }

        self.cycles = self.cycles.saturating_sub(1);
        self.total_cycles += 1;
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn registers(&self) -> Registers {
        self.regs
    }

    fn complete(&self) -> bool {
        self.cycles == 0
    }

    fn interrupt<B: Bus>(&mut self, bus: &mut B) -> bool {
        if self.regs.p.is_set(I) {
            return false;
        }
        debug!("IRQ at ${:04X}", self.regs.pc);
        let status = (self.regs.p.0 | U) & !B;
        self.enter_interrupt(bus, IRQ_VECTOR, status);
        self.cycles = 7;
        true
    }

    fn nmi<B: Bus>(&mut self, bus: &mut B) {
        debug!("NMI at ${:04X}", self.regs.pc);
        let status = (self.regs.p.0 | U) & !B;
        self.enter_interrupt(bus, NMI_VECTOR, status);
        self.cycles = 8;
    }

    fn reset<B: Bus>(&mut self, bus: &mut B) {
        self.regs = Registers::new();
        self.regs.pc = Self::read_word(bus, RESET_VECTOR);
        self.addr_abs = 0;
        self.addr_rel = 0;
        self.fetched = 0;
        self.mode = AddressingMode::Implicit;
        self.cycles = 8;
        self.total_cycles = 0;
        self.operation_count = 0;
        debug!("reset: PC=${:04X}", self.regs.pc);
    }
}

impl Observable for Mos6502 {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "pc" => Some(self.regs.pc.into()),
            "a" => Some(self.regs.a.into()),
            "x" => Some(self.regs.x.into()),
            "y" => Some(self.regs.y.into()),
            "s" | "sp" => Some(self.regs.s.into()),
            "p" | "status" => Some(self.regs.p.0.into()),
            "flags.c" | "c" => Some(self.regs.p.is_set(C).into()),
            "flags.z" | "z" => Some(self.regs.p.is_set(Z).into()),
            "flags.i" | "i" => Some(self.regs.p.is_set(I).into()),
            "flags.d" | "d" => Some(self.regs.p.is_set(D).into()),
            "flags.b" | "b" => Some(self.regs.p.is_set(B).into()),
            "flags.u" | "u" => Some(self.regs.p.is_set(U).into()),
            "flags.v" | "v" => Some(self.regs.p.is_set(V).into()),
            "flags.n" | "n" => Some(self.regs.p.is_set(N).into()),
            "opcode" => Some(self.opcode.into()),
            "cycles" => Some(self.cycles.into()),
            "total_cycles" => Some(self.total_cycles.into()),
            "operations" => Some(self.operation_count.into()),
            "complete" => Some(self.complete().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pc", "a", "x", "y", "s", "p", "flags.c", "flags.z", "flags.i", "flags.d", "flags.b",
            "flags.u", "flags.v", "flags.n", "opcode", "cycles", "total_cycles", "operations",
            "complete",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestBus {
        ram: Vec<u8>,
    }

    impl TestBus {
        fn new() -> Self {
            Self {
                ram: vec![0; 0x10000],
            }
        }

        fn load(&mut self, addr: u16, bytes: &[u8]) {
            let start = usize::from(addr);
            self.ram[start..start + bytes.len()].copy_from_slice(bytes);
        }
    }

    impl Bus for TestBus {
        fn read(&mut self, address: u16) -> u8 {
            self.ram[usize::from(address)]
        }

        fn write(&mut self, address: u16, value: u8) {
            self.ram[usize::from(address)] = value;
        }

        fn peek(&self, address: u16) -> u8 {
            self.ram[usize::from(address)]
        }
    }

    /// CPU at $0200 with `program` loaded there.
    fn setup(program: &[u8]) -> (Mos6502, TestBus) {
        let mut bus = TestBus::new();
        bus.load(0x0200, program);
        let mut cpu = Mos6502::new();
        cpu.regs.pc = 0x0200;
        (cpu, bus)
    }

    /// Run one instruction to completion and return the cycles it took.
    fn step(cpu: &mut Mos6502, bus: &mut TestBus) -> u32 {
        let mut cycles = 0;
        loop {
            cpu.tick(bus);
            cycles += 1;
            if cpu.complete() {
                return cycles;
            }
        }
    }

    #[test]
    fn reset_state() {
        let mut bus = TestBus::new();
        bus.load(0xFFFC, &[0x34, 0x12]);
        let mut cpu = Mos6502::new();
        cpu.regs.a = 0x55;
        cpu.regs.p.set(C | N);
        cpu.reset(&mut bus);

        assert_eq!(cpu.regs.a, 0);
        assert_eq!(cpu.regs.x, 0);
        assert_eq!(cpu.regs.y, 0);
        assert_eq!(cpu.regs.s, 0xFD);
        assert_eq!(cpu.regs.p.0, U);
        assert_eq!(cpu.regs.pc, 0x1234);
        assert_eq!(cpu.addr_abs(), 0);
        assert_eq!(cpu.addr_rel(), 0);
        assert_eq!(cpu.fetched(), 0);
        assert_eq!(cpu.cycles_remaining(), 8);
    }

    #[test]
    fn reset_costs_eight_cycles() {
        let mut bus = TestBus::new();
        let mut cpu = Mos6502::new();
        cpu.reset(&mut bus);
        let mut ticks = 0;
        while !cpu.complete() {
            cpu.tick(&mut bus);
            ticks += 1;
        }
        assert_eq!(ticks, 8);
        assert_eq!(cpu.operation_count(), 0);
    }

    #[test]
    fn adc_without_carry() {
        // LDA #$02; ADC #$03
        let (mut cpu, mut bus) = setup(&[0xA9, 0x02, 0x69, 0x03]);
        step(&mut cpu, &mut bus);
        step(&mut cpu, &mut bus);
        assert_eq!(cpu.regs.a, 0x05);
        assert!(!cpu.regs.p.is_set(C));
        assert!(!cpu.regs.p.is_set(Z));
    }

    #[test]
    fn adc_carry_out() {
        // LDA #$FE; ADC #$03
        let (mut cpu, mut bus) = setup(&[0xA9, 0xFE, 0x69, 0x03]);
        step(&mut cpu, &mut bus);
        step(&mut cpu, &mut bus);
        assert_eq!(cpu.regs.a, 0x01);
        assert!(cpu.regs.p.is_set(C));
        assert!(!cpu.regs.p.is_set(V));
    }

    #[test]
    fn adc_signed_overflow() {
        // -10 + -127
        let (mut cpu, mut bus) = setup(&[0xA9, 0xF6, 0x69, 0x81]);
        step(&mut cpu, &mut bus);
        step(&mut cpu, &mut bus);
        assert!(cpu.regs.p.is_set(C));
        assert!(cpu.regs.p.is_set(V));
        assert_eq!(cpu.regs.a, 0x77);
    }

    #[test]
    fn adc_zero_result_sets_zero_flag() {
        // LDA #$FF; ADC #$01
        let (mut cpu, mut bus) = setup(&[0xA9, 0xFF, 0x69, 0x01]);
        step(&mut cpu, &mut bus);
        step(&mut cpu, &mut bus);
        assert_eq!(cpu.regs.a, 0);
        assert!(cpu.regs.p.is_set(Z));
        assert!(cpu.regs.p.is_set(C));
    }

    #[test]
    fn sbc_borrows_through_inverted_add() {
        // SEC; LDA #$05; SBC #$03
        let (mut cpu, mut bus) = setup(&[0x38, 0xA9, 0x05, 0xE9, 0x03]);
        for _ in 0..3 {
            step(&mut cpu, &mut bus);
        }
        assert_eq!(cpu.regs.a, 0x02);
        assert!(cpu.regs.p.is_set(C));

        // CLC; LDA #$00; SBC #$00 -> $FF with borrow
        let (mut cpu, mut bus) = setup(&[0x18, 0xA9, 0x00, 0xE9, 0x00]);
        for _ in 0..3 {
            step(&mut cpu, &mut bus);
        }
        assert_eq!(cpu.regs.a, 0xFF);
        assert!(!cpu.regs.p.is_set(C));
        assert!(cpu.regs.p.is_set(N));
    }

    #[test]
    fn php_pushes_break_and_unused() {
        let mut bus = TestBus::new();
        bus.load(0x0000, &[0x08]); // PHP at the reset target
        let mut cpu = Mos6502::new();
        cpu.reset(&mut bus);
        cpu.cycles = 0;
        let sp = cpu.regs.s;

        step(&mut cpu, &mut bus);
        assert_eq!(bus.ram[0x0100 + usize::from(sp)], 0x30);
        assert_eq!(cpu.regs.s, sp.wrapping_sub(1));
        assert_eq!(cpu.regs.p.0, U);
    }

    #[test]
    fn jsr_pushes_return_address_minus_one() {
        let mut bus = TestBus::new();
        bus.load(0x0000, &[0x20, 0xCD, 0xAB]); // JSR $ABCD
        let mut cpu = Mos6502::new();

        assert_eq!(step(&mut cpu, &mut bus), 6);
        assert_eq!(cpu.regs.pc, 0xABCD);
        assert_eq!(bus.ram[0x01FD], 0x00);
        assert_eq!(bus.ram[0x01FC], 0x02);
    }

    #[test]
    fn jsr_then_rts_resumes_after_call() {
        let (mut cpu, mut bus) = setup(&[0x20, 0x00, 0x03]);
        bus.load(0x0300, &[0x60]); // RTS
        step(&mut cpu, &mut bus);
        assert_eq!(step(&mut cpu, &mut bus), 6);
        assert_eq!(cpu.regs.pc, 0x0203);
        assert_eq!(cpu.regs.s, 0xFD);
    }

    #[test]
    fn indirect_jmp_page_bug() {
        let (mut cpu, mut bus) = setup(&[0x6C, 0xFF, 0x02]);
        bus.ram[0x02FF] = 0x34;
        bus.ram[0x0200] = 0x6C; // high byte comes from $0200 (the JMP opcode)
        bus.ram[0x0300] = 0x56;
        assert_eq!(step(&mut cpu, &mut bus), 5);
        assert_eq!(cpu.regs.pc, 0x6C34);
    }

    #[test]
    fn indirect_jmp_within_page() {
        let (mut cpu, mut bus) = setup(&[0x6C, 0x10, 0x03]);
        bus.load(0x0310, &[0x00, 0x80]);
        step(&mut cpu, &mut bus);
        assert_eq!(cpu.regs.pc, 0x8000);
    }

    #[test]
    fn load_pays_page_cross_penalty() {
        // LDX #$01; LDA $02FF,X
        let (mut cpu, mut bus) = setup(&[0xA2, 0x01, 0xBD, 0xFF, 0x02]);
        bus.ram[0x0300] = 0x99;
        step(&mut cpu, &mut bus);
        assert_eq!(step(&mut cpu, &mut bus), 5);
        assert_eq!(cpu.regs.a, 0x99);
    }

    #[test]
    fn store_does_not_pay_page_cross_penalty() {
        // LDX #$01; STA $02FF,X
        let (mut cpu, mut bus) = setup(&[0xA2, 0x01, 0x9D, 0xFF, 0x02]);
        step(&mut cpu, &mut bus);
        assert_eq!(step(&mut cpu, &mut bus), 5);
    }

    #[test]
    fn indirect_y_page_cross() {
        // LDY #$10; LDA ($80),Y with pointer $03F8
        let (mut cpu, mut bus) = setup(&[0xA0, 0x10, 0xB1, 0x80]);
        bus.load(0x0080, &[0xF8, 0x03]);
        bus.ram[0x0408] = 0x42;
        step(&mut cpu, &mut bus);
        assert_eq!(step(&mut cpu, &mut bus), 6);
        assert_eq!(cpu.regs.a, 0x42);
    }

    #[test]
    fn indexed_indirect_wraps_zero_page() {
        // LDX #$01; LDA ($FE,X) reads pointer from $FF/$00
        let (mut cpu, mut bus) = setup(&[0xA2, 0x01, 0xA1, 0xFE]);
        bus.ram[0x00FF] = 0x00;
        bus.ram[0x0000] = 0x04;
        bus.ram[0x0400] = 0x77;
        step(&mut cpu, &mut bus);
        step(&mut cpu, &mut bus);
        assert_eq!(cpu.regs.a, 0x77);
    }

    #[test]
    fn zero_page_x_wraps() {
        // LDX #$10; LDA $F8,X reads $08
        let (mut cpu, mut bus) = setup(&[0xA2, 0x10, 0xB5, 0xF8]);
        bus.ram[0x0008] = 0x5A;
        step(&mut cpu, &mut bus);
        assert_eq!(step(&mut cpu, &mut bus), 4);
        assert_eq!(cpu.regs.a, 0x5A);
    }

    #[test]
    fn branch_timing() {
        // BNE +2 not taken (Z set via LDA #0)
        let (mut cpu, mut bus) = setup(&[0xA9, 0x00, 0xD0, 0x02]);
        step(&mut cpu, &mut bus);
        assert_eq!(step(&mut cpu, &mut bus), 2);
        assert_eq!(cpu.regs.pc, 0x0204);

        // BEQ +2 taken, same page
        let (mut cpu, mut bus) = setup(&[0xA9, 0x00, 0xF0, 0x02]);
        step(&mut cpu, &mut bus);
        assert_eq!(step(&mut cpu, &mut bus), 3);
        assert_eq!(cpu.regs.pc, 0x0206);

        // BEQ -8 taken, crosses into page $01
        let (mut cpu, mut bus) = setup(&[0xA9, 0x00, 0xF0, 0xF8]);
        step(&mut cpu, &mut bus);
        assert_eq!(step(&mut cpu, &mut bus), 4);
        assert_eq!(cpu.regs.pc, 0x01FC);
    }

    #[test]
    fn compare_sets_carry_zero_negative() {
        // LDA #$40; CMP #$40
        let (mut cpu, mut bus) = setup(&[0xA9, 0x40, 0xC9, 0x40]);
        step(&mut cpu, &mut bus);
        step(&mut cpu, &mut bus);
        assert!(cpu.regs.p.is_set(C));
        assert!(cpu.regs.p.is_set(Z));

        // LDX #$10; CPX #$20
        let (mut cpu, mut bus) = setup(&[0xA2, 0x10, 0xE0, 0x20]);
        step(&mut cpu, &mut bus);
        step(&mut cpu, &mut bus);
        assert!(!cpu.regs.p.is_set(C));
        assert!(!cpu.regs.p.is_set(Z));
        assert!(cpu.regs.p.is_set(N));
    }

    #[test]
    fn shifts_on_accumulator_and_memory() {
        // LDA #$81; ASL A
        let (mut cpu, mut bus) = setup(&[0xA9, 0x81, 0x0A]);
        step(&mut cpu, &mut bus);
        step(&mut cpu, &mut bus);
        assert_eq!(cpu.regs.a, 0x02);
        assert!(cpu.regs.p.is_set(C));

        // SEC; ROR $10 with $10 = $02
        let (mut cpu, mut bus) = setup(&[0x38, 0x66, 0x10]);
        bus.ram[0x0010] = 0x02;
        step(&mut cpu, &mut bus);
        assert_eq!(step(&mut cpu, &mut bus), 5);
        assert_eq!(bus.ram[0x0010], 0x81);
        assert!(!cpu.regs.p.is_set(C));
        assert_eq!(cpu.regs.a, 0);

        // CLC; LDA #$80; ROL A
        let (mut cpu, mut bus) = setup(&[0x18, 0xA9, 0x80, 0x2A]);
        for _ in 0..3 {
            step(&mut cpu, &mut bus);
        }
        assert_eq!(cpu.regs.a, 0x00);
        assert!(cpu.regs.p.is_set(C));
        assert!(cpu.regs.p.is_set(Z));

        // LDA #$01; LSR A
        let (mut cpu, mut bus) = setup(&[0xA9, 0x01, 0x4A]);
        step(&mut cpu, &mut bus);
        step(&mut cpu, &mut bus);
        assert_eq!(cpu.regs.a, 0);
        assert!(cpu.regs.p.is_set(C));
    }

    #[test]
    fn bit_copies_high_bits() {
        let (mut cpu, mut bus) = setup(&[0xA9, 0x01, 0x24, 0x10]);
        bus.ram[0x0010] = 0xC0;
        step(&mut cpu, &mut bus);
        step(&mut cpu, &mut bus);
        assert!(cpu.regs.p.is_set(Z));
        assert!(cpu.regs.p.is_set(N));
        assert!(cpu.regs.p.is_set(V));
    }

    #[test]
    fn brk_and_rti_round_trip() {
        // SEC; BRK; pad
        let (mut cpu, mut bus) = setup(&[0x38, 0x00, 0xFF, 0xEA]);
        bus.load(0xFFFE, &[0x00, 0x04]);
        bus.ram[0x0400] = 0x40; // RTI
        step(&mut cpu, &mut bus);
        assert_eq!(step(&mut cpu, &mut bus), 7);
        assert_eq!(cpu.regs.pc, 0x0400);
        assert!(cpu.regs.p.is_set(I));
        assert_eq!(bus.ram[0x01FD], 0x02);
        assert_eq!(bus.ram[0x01FC], 0x03);
        assert_eq!(bus.ram[0x01FB], 0x31);

        assert_eq!(step(&mut cpu, &mut bus), 6);
        assert_eq!(cpu.regs.pc, 0x0203);
        assert!(!cpu.regs.p.is_set(I));
        assert!(cpu.regs.p.is_set(C));
        assert!(!cpu.regs.p.is_set(B));
    }

    #[test]
    fn nmi_pushes_state_and_vectors() {
        let (mut cpu, mut bus) = setup(&[0xEA]);
        bus.load(0xFFFA, &[0x00, 0x90]);
        cpu.nmi(&mut bus);
        assert_eq!(cpu.regs.pc, 0x9000);
        assert_eq!(cpu.cycles_remaining(), 8);
        assert_eq!(bus.ram[0x01FD], 0x02);
        assert_eq!(bus.ram[0x01FC], 0x00);
        assert_eq!(bus.ram[0x01FB] & (B | U), U);
        assert!(cpu.regs.p.is_set(I));
        assert_eq!(cpu.regs.s, 0xFA);
    }

    #[test]
    fn irq_respects_interrupt_disable() {
        let (mut cpu, mut bus) = setup(&[0xEA]);
        bus.load(0xFFFE, &[0x00, 0xA0]);
        cpu.regs.p.set(I);
        assert!(!cpu.interrupt(&mut bus));
        assert_eq!(cpu.regs.pc, 0x0200);

        cpu.regs.p.clear(I);
        assert!(cpu.interrupt(&mut bus));
        assert_eq!(cpu.regs.pc, 0xA000);
        assert_eq!(cpu.cycles_remaining(), 7);
    }

    #[test]
    fn stack_instructions() {
        // LDA #$80; PHA; LDA #$00; PLA
        let (mut cpu, mut bus) = setup(&[0xA9, 0x80, 0x48, 0xA9, 0x00, 0x68]);
        step(&mut cpu, &mut bus);
        assert_eq!(step(&mut cpu, &mut bus), 3);
        assert_eq!(bus.ram[0x01FD], 0x80);
        step(&mut cpu, &mut bus);
        assert_eq!(step(&mut cpu, &mut bus), 4);
        assert_eq!(cpu.regs.a, 0x80);
        assert!(cpu.regs.p.is_set(N));
        assert_eq!(cpu.regs.s, 0xFD);
    }

    #[test]
    fn placeholder_opcode_burns_cycles() {
        let (mut cpu, mut bus) = setup(&[0x02]);
        assert_eq!(step(&mut cpu, &mut bus), 2);
        assert_eq!(cpu.regs.pc, 0x0201);
    }

    #[test]
    fn unused_flag_forced_after_plp() {
        // LDA #$00; PHA; PLP: the pulled byte clears the Z that LDA set.
        let (mut cpu, mut bus) = setup(&[0xA9, 0x00, 0x48, 0x28]);
        for _ in 0..3 {
            step(&mut cpu, &mut bus);
        }
        assert_eq!(cpu.regs.p.0, U);
    }

    #[test]
    fn plp_takes_flags_from_pulled_byte() {
        // LDA #$02; PHA; PLP: bit 1 of the pulled byte is Z.
        let (mut cpu, mut bus) = setup(&[0xA9, 0x02, 0x48, 0x28]);
        for _ in 0..3 {
            step(&mut cpu, &mut bus);
        }
        assert_eq!(cpu.regs.p.0, U | Z);
    }

    #[test]
    fn observable_registers() {
        let (mut cpu, mut bus) = setup(&[0xA9, 0x42]);
        step(&mut cpu, &mut bus);
        assert_eq!(cpu.query("a"), Some(Value::U8(0x42)));
        assert_eq!(cpu.query("pc"), Some(Value::U16(0x0202)));
        assert_eq!(cpu.query("flags.z"), Some(Value::Bool(false)));
        assert_eq!(cpu.query("operations"), Some(Value::U64(1)));
        assert_eq!(cpu.query("complete"), Some(Value::Bool(true)));
        assert_eq!(cpu.query("bogus"), None);
    }
}
