//! Mapper trait and board implementations.
//!
//! A mapper only translates addresses. The cartridge owns PRG and CHR
//! memory and indexes it with the offsets a mapper hands back, so the same
//! mapper logic works whether the bytes came from a file or a test string.

use std::fmt;

use crate::header::{CHR_BANK_LEN, PRG_BANK_LEN};

/// What a CPU write through the mapper lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuWrite {
    /// Store the value at this PRG offset.
    Mapped(usize),
    /// The write was absorbed by a mapper register.
    Register,
    /// Not the mapper's address. The caller keeps routing.
    Unmapped,
}

/// Address translation from CPU or PPU space into cartridge memory.
///
/// `None` (or [`CpuWrite::Unmapped`]) means the mapper does not claim the
/// address.
pub trait Mapper: fmt::Debug {
    fn cpu_map_read(&self, addr: u16) -> Option<usize>;
    fn cpu_map_write(&mut self, addr: u16, value: u8) -> CpuWrite;
    fn ppu_map_read(&self, addr: u16) -> Option<usize>;
    fn ppu_map_write(&self, addr: u16) -> Option<usize>;

    /// Return bank-switching state to power-on.
    fn reset(&mut self) {}
}

/// Build the mapper for `id`, or `None` if the board is not supported.
#[must_use]
pub fn for_id(id: u8, prg_banks: u8, chr_banks: u8) -> Option<Box<dyn Mapper>> {
    let mapper: Box<dyn Mapper> = match id {
        0 => Box::new(Mapper000::new(prg_banks, chr_banks)),
        2 => Box::new(Mapper002::new(prg_banks, chr_banks)),
        3 => Box::new(Mapper003::new(prg_banks, chr_banks)),
        _ => return None,
    };
    Some(mapper)
}

/// Offset into a 16K or 32K PRG window at $8000-$FFFF.
///
/// A single bank is mirrored into both halves.
fn nrom_prg_offset(addr: u16, prg_banks: u8) -> Option<usize> {
    if addr < 0x8000 {
        return None;
    }
    let mask = if prg_banks > 1 { 0x7FFF } else { 0x3FFF };
    Some(usize::from(addr & mask))
}

/// Pattern memory at PPU $0000-$1FFF.
fn pattern_addr(addr: u16) -> Option<usize> {
    (addr <= 0x1FFF).then_some(usize::from(addr))
}

/// NROM (mapper 0): no bank switching.
///
/// - PRG: 16K mirrored at $8000-$FFFF, or 32K at $8000-$FFFF
/// - CHR: 8K at PPU $0000-$1FFF, writable only when the board has CHR RAM
#[derive(Debug, Clone)]
pub struct Mapper000 {
    prg_banks: u8,
    chr_banks: u8,
}

impl Mapper000 {
    #[must_use]
    pub fn new(prg_banks: u8, chr_banks: u8) -> Self {
        Self {
            prg_banks,
            chr_banks,
        }
    }
}

impl Mapper for Mapper000 {
    fn cpu_map_read(&self, addr: u16) -> Option<usize> {
        nrom_prg_offset(addr, self.prg_banks)
    }

    fn cpu_map_write(&mut self, addr: u16, _value: u8) -> CpuWrite {
        nrom_prg_offset(addr, self.prg_banks).map_or(CpuWrite::Unmapped, CpuWrite::Mapped)
    }

    fn ppu_map_read(&self, addr: u16) -> Option<usize> {
        pattern_addr(addr)
    }

    fn ppu_map_write(&self, addr: u16) -> Option<usize> {
        if self.chr_banks == 0 {
            pattern_addr(addr)
        } else {
            None
        }
    }
}

/// UxROM (mapper 2): switchable 16K PRG bank.
///
/// - $8000-$BFFF: bank selected by the low four bits of any write to $8000+
/// - $C000-$FFFF: fixed to the last bank
/// - CHR: 8K, usually RAM
#[derive(Debug, Clone)]
pub struct Mapper002 {
    prg_banks: u8,
    chr_banks: u8,
    bank_select: u8,
}

impl Mapper002 {
    #[must_use]
    pub fn new(prg_banks: u8, chr_banks: u8) -> Self {
        Self {
            prg_banks,
            chr_banks,
            bank_select: 0,
        }
    }
}

impl Mapper for Mapper002 {
    fn cpu_map_read(&self, addr: u16) -> Option<usize> {
        let banks = self.prg_banks.max(1);
        let bank = match addr {
            0x8000..=0xBFFF => self.bank_select % banks,
            0xC000..=0xFFFF => banks - 1,
            _ => return None,
        };
        Some(usize::from(bank) * PRG_BANK_LEN + usize::from(addr & 0x3FFF))
    }

    fn cpu_map_write(&mut self, addr: u16, value: u8) -> CpuWrite {
        if addr < 0x8000 {
            return CpuWrite::Unmapped;
        }
        self.bank_select = value & 0x0F;
        CpuWrite::Register
    }

    fn ppu_map_read(&self, addr: u16) -> Option<usize> {
        pattern_addr(addr)
    }

    fn ppu_map_write(&self, addr: u16) -> Option<usize> {
        if self.chr_banks == 0 {
            pattern_addr(addr)
        } else {
            None
        }
    }

    fn reset(&mut self) {
        self.bank_select = 0;
    }
}

/// CNROM (mapper 3): switchable 8K CHR bank.
///
/// - PRG: as NROM
/// - CHR: bank selected by the low two bits of any write to $8000+
#[derive(Debug, Clone)]
pub struct Mapper003 {
    prg_banks: u8,
    chr_banks: u8,
    bank_select: u8,
}

impl Mapper003 {
    #[must_use]
    pub fn new(prg_banks: u8, chr_banks: u8) -> Self {
        Self {
            prg_banks,
            chr_banks,
            bank_select: 0,
        }
    }
}

impl Mapper for Mapper003 {
    fn cpu_map_read(&self, addr: u16) -> Option<usize> {
        nrom_prg_offset(addr, self.prg_banks)
    }

    fn cpu_map_write(&mut self, addr: u16, value: u8) -> CpuWrite {
        if addr < 0x8000 {
            return CpuWrite::Unmapped;
        }
        self.bank_select = value & 0x03;
        CpuWrite::Register
    }

    fn ppu_map_read(&self, addr: u16) -> Option<usize> {
        let bank = self.bank_select % self.chr_banks.max(1);
        pattern_addr(addr).map(|offset| usize::from(bank) * CHR_BANK_LEN + offset)
    }

    fn ppu_map_write(&self, _addr: u16) -> Option<usize> {
        None
    }

    fn reset(&mut self) {
        self.bank_select = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapper000_single_bank_mirrors() {
        let mapper = Mapper000::new(1, 1);
        assert_eq!(mapper.cpu_map_read(0x8000), Some(0));
        assert_eq!(mapper.cpu_map_read(0xC000), Some(0));
        assert_eq!(mapper.cpu_map_read(0xFFFC), Some(0x3FFC));
        assert_eq!(mapper.cpu_map_read(0x7FFF), None);
    }

    #[test]
    fn mapper000_two_banks_span_window() {
        let mapper = Mapper000::new(2, 1);
        assert_eq!(mapper.cpu_map_read(0xC000), Some(0x4000));
        assert_eq!(mapper.cpu_map_read(0xFFFF), Some(0x7FFF));
    }

    #[test]
    fn mapper000_translation_is_pure() {
        let mut mapper = Mapper000::new(1, 1);
        let before: Vec<_> = (0x8000..=0xFFFFu16)
            .step_by(0x123)
            .map(|a| mapper.cpu_map_read(a))
            .collect();
        assert_eq!(mapper.cpu_map_write(0x8000, 0xFF), CpuWrite::Mapped(0));
        let after: Vec<_> = (0x8000..=0xFFFFu16)
            .step_by(0x123)
            .map(|a| mapper.cpu_map_read(a))
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn mapper000_chr_rom_declines_writes() {
        let rom = Mapper000::new(1, 1);
        assert_eq!(rom.ppu_map_read(0x1FFF), Some(0x1FFF));
        assert_eq!(rom.ppu_map_read(0x2000), None);
        assert_eq!(rom.ppu_map_write(0x0000), None);

        let ram = Mapper000::new(1, 0);
        assert_eq!(ram.ppu_map_write(0x0010), Some(0x0010));
        assert_eq!(ram.ppu_map_write(0x2000), None);
    }

    #[test]
    fn mapper002_switches_low_window() {
        let mut mapper = Mapper002::new(4, 0);
        assert_eq!(mapper.cpu_map_read(0x8000), Some(0));
        assert_eq!(mapper.cpu_map_read(0xC000), Some(3 * PRG_BANK_LEN));

        assert_eq!(mapper.cpu_map_write(0x8000, 2), CpuWrite::Register);
        assert_eq!(mapper.cpu_map_read(0x8001), Some(2 * PRG_BANK_LEN + 1));
        assert_eq!(mapper.cpu_map_read(0xC000), Some(3 * PRG_BANK_LEN));

        mapper.reset();
        assert_eq!(mapper.cpu_map_read(0x8000), Some(0));
    }

    #[test]
    fn mapper002_wraps_bank_number() {
        let mut mapper = Mapper002::new(2, 0);
        mapper.cpu_map_write(0xFFFF, 0x0F);
        assert_eq!(mapper.cpu_map_read(0x8000), Some(PRG_BANK_LEN));
    }

    #[test]
    fn mapper003_switches_chr_bank() {
        let mut mapper = Mapper003::new(1, 4);
        assert_eq!(mapper.ppu_map_read(0x0100), Some(0x0100));
        mapper.cpu_map_write(0x8000, 0x03);
        assert_eq!(mapper.ppu_map_read(0x0100), Some(3 * CHR_BANK_LEN + 0x0100));
        assert_eq!(mapper.cpu_map_read(0xC000), Some(0));
        assert_eq!(mapper.ppu_map_write(0x0100), None);
    }

    #[test]
    fn unknown_mapper_id() {
        assert!(for_id(0, 1, 1).is_some());
        assert!(for_id(4, 1, 1).is_none());
    }
}
