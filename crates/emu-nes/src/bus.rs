//! NES bus: CPU address routing.
//!
//! The cartridge sees every address first. Whatever it declines falls
//! through to internal RAM ($0000-$1FFF, mirrored every 2KB) or the PPU
//! register window ($2000-$3FFF, mirrored every 8 bytes). The reset vector
//! at $FFFC/$FFFD is backed by a two-byte latch so test programs can boot
//! without a cartridge. Everything else reads as zero and drops writes.

use emu_core::Bus;
use log::trace;
use nes_cartridge::Cartridge;
use ricoh_ppu_2c02::{Ppu, PpuConfig};

/// The NES bus, implementing `emu_core::Bus`.
#[derive(Debug)]
pub struct NesBus {
    /// 2K internal RAM ($0000-$07FF, mirrored to $1FFF).
    pub ram: [u8; 2048],
    /// Reset vector bytes used when no cartridge claims $FFFC/$FFFD.
    pub reset_vector: [u8; 2],
    /// PPU (2C02).
    pub ppu: Ppu,
    /// Cartridge slot.
    pub cartridge: Option<Cartridge>,
}

impl Default for NesBus {
    fn default() -> Self {
        Self::new(PpuConfig::default())
    }
}

impl NesBus {
    #[must_use]
    pub fn new(ppu_config: PpuConfig) -> Self {
        Self {
            ram: [0; 2048],
            reset_vector: [0; 2],
            ppu: Ppu::with_config(ppu_config),
            cartridge: None,
        }
    }

    /// Peek a byte from RAM without side effects.
    #[must_use]
    pub fn peek_ram(&self, addr: u16) -> u8 {
        self.ram[usize::from(addr & 0x07FF)]
    }

    /// Advance the PPU by one dot.
    pub fn tick_ppu(&mut self) {
        self.ppu.tick(&mut self.cartridge);
    }
}

impl Bus for NesBus {
    fn read(&mut self, addr: u16) -> u8 {
        if let Some(value) = self.cartridge.as_ref().and_then(|cart| cart.cpu_read(addr)) {
            return value;
        }
        match addr {
            0x0000..=0x1FFF => self.ram[usize::from(addr & 0x07FF)],
            0x2000..=0x3FFF => self.ppu.cpu_read(addr & 0x0007, &self.cartridge),
            0xFFFC | 0xFFFD => self.reset_vector[usize::from(addr & 1)],
            _ => {
                trace!("unmapped read ${addr:04X}");
                0
            }
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        if self
            .cartridge
            .as_mut()
            .is_some_and(|cart| cart.cpu_write(addr, value))
        {
            return;
        }
        match addr {
            0x0000..=0x1FFF => self.ram[usize::from(addr & 0x07FF)] = value,
            0x2000..=0x3FFF => {
                self.ppu
                    .cpu_write(addr & 0x0007, value, &mut self.cartridge);
            }
            0xFFFC | 0xFFFD => self.reset_vector[usize::from(addr & 1)] = value,
            _ => trace!("unmapped write ${addr:04X} = ${value:02X}"),
        }
    }

    fn peek(&self, addr: u16) -> u8 {
        if let Some(value) = self.cartridge.as_ref().and_then(|cart| cart.cpu_read(addr)) {
            return value;
        }
        match addr {
            0x0000..=0x1FFF => self.peek_ram(addr),
            0x2000..=0x3FFF => self.ppu.cpu_peek(addr & 0x0007, &self.cartridge),
            0xFFFC | 0xFFFD => self.reset_vector[usize::from(addr & 1)],
            _ => 0,
        }
    }
}
