//! Top-level NES system.
//!
//! One bus clock pulse is one PPU dot. The CPU takes every third pulse,
//! starting with the first, so over 3N pulses the PPU runs 3N dots and the
//! CPU N cycles. The PPU's NMI line is sampled after every pulse.
//!
//! One frame = 341 PPU dots × 262 scanlines = 89,342 pulses.

use std::collections::BTreeMap;

use emu_core::{Bus, Cpu, Observable, Tickable, Ticks, Value};
use log::{debug, info};
use mos_6502::{Mos6502, Registers};
use nes_cartridge::{Cartridge, parse_hex_bytes};
use ricoh_ppu_2c02::{FrameBuffer, Rgb};

use crate::bus::NesBus;
use crate::config::NesConfig;
use crate::error::NesError;

/// CPU cycles happen on pulses where `clock_count % CPU_DIVISOR == 0`.
const CPU_DIVISOR: u64 = 3;

/// NES system.
#[derive(Debug)]
pub struct Nes {
    cpu: Mos6502,
    bus: NesBus,
    /// Bus clock pulses since the last reset.
    clock_count: u64,
}

impl Default for Nes {
    fn default() -> Self {
        Self::new()
    }
}

impl Nes {
    /// A powered-off NES with an empty cartridge slot.
    ///
    /// The CPU has not been reset; call [`Nes::reset`] once memory and the
    /// reset vector are in place.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cpu: Mos6502::new(),
            bus: NesBus::default(),
            clock_count: 0,
        }
    }

    /// Create a NES from the given configuration and reset it.
    ///
    /// # Errors
    ///
    /// Returns an error if the ROM data is not a usable iNES image.
    pub fn with_config(config: &NesConfig) -> Result<Self, NesError> {
        let mut nes = Self {
            cpu: Mos6502::new(),
            bus: NesBus::new(config.ppu_config()),
            clock_count: 0,
        };
        if let Some(rom) = &config.rom_data {
            nes.insert_cartridge(Cartridge::from_bytes(rom)?);
        }
        nes.reset();
        Ok(nes)
    }

    /// Replace whatever is in the cartridge slot.
    ///
    /// The system is not reset.
    pub fn insert_cartridge(&mut self, cartridge: Cartridge) {
        info!(
            "Inserted cartridge: mapper {}, {:?} mirroring",
            cartridge.mapper_id(),
            ricoh_ppu_2c02::CartridgeBus::mirroring(&cartridge)
        );
        self.bus.cartridge = Some(cartridge);
    }

    /// Remove and return the cartridge.
    pub fn eject_cartridge(&mut self) -> Option<Cartridge> {
        self.bus.cartridge.take()
    }

    /// Reset the CPU, the PPU and the cartridge mapper, in that order, and
    /// zero the clock counter.
    pub fn reset(&mut self) {
        self.cpu.reset(&mut self.bus);
        self.bus.ppu.reset();
        if let Some(cart) = &mut self.bus.cartridge {
            cart.reset();
        }
        self.clock_count = 0;
        debug!("NES reset, PC=${:04X}", self.cpu.regs.pc);
    }

    /// One bus clock pulse.
    pub fn clock(&mut self) {
        self.bus.tick_ppu();

        if self.clock_count.is_multiple_of(CPU_DIVISOR) {
            self.cpu.tick(&mut self.bus);
        }

        if self.bus.ppu.take_nmi() {
            self.cpu.nmi(&mut self.bus);
        }

        self.clock_count += 1;
    }

    /// Step one instruction.
    ///
    /// Clocks until the in-flight instruction has used its cycles, then on
    /// until the CPU starts the next one. Since an instruction's effects
    /// land on its first cycle, the next instruction has already executed
    /// when this returns.
    pub fn execute_operation(&mut self) {
        self.clock();
        while !self.cpu.complete() {
            self.clock();
        }
        self.clock();
        while self.cpu.complete() {
            self.clock();
        }
    }

    /// Clock until the PPU finishes a frame, then clear the flag.
    ///
    /// Returns the number of pulses run.
    pub fn run_frame(&mut self) -> Ticks {
        let start = self.clock_count;
        while !self.bus.ppu.frame_complete() {
            self.clock();
        }
        self.bus.ppu.clear_frame_complete();
        Ticks::new(self.clock_count - start)
    }

    /// Write a hex program into CPU address space starting at `offset`.
    ///
    /// Bytes go through normal bus routing, so anything outside RAM and
    /// the cartridge's writable range is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`NesError::InvalidHex`] without writing anything if `hex`
    /// does not parse.
    pub fn preload_memory(&mut self, offset: u16, hex: &str) -> Result<(), NesError> {
        let bytes = parse_hex_bytes(hex)?;
        let mut addr = offset;
        for byte in bytes {
            self.bus.write(addr, byte);
            addr = addr.wrapping_add(1);
        }
        Ok(())
    }

    /// Point the reset vector at `addr`.
    pub fn set_code_entry(&mut self, addr: u16) {
        let [lo, hi] = addr.to_le_bytes();
        self.bus.write(0xFFFC, lo);
        self.bus.write(0xFFFD, hi);
    }

    /// Disassemble `start..=stop` without disturbing any device.
    #[must_use]
    pub fn disassemble(&self, start: u16, stop: u16) -> BTreeMap<u16, String> {
        mos_6502::disassemble(&self.bus, start, stop)
    }

    /// Colour of `pixel` (0-3) in `palette` (0-7) as currently programmed.
    #[must_use]
    pub fn palette_colour(&self, palette: u8, pixel: u8) -> Rgb {
        self.bus
            .ppu
            .palette_colour(palette, pixel, &self.bus.cartridge)
    }

    /// Render pattern table `index` (0 or 1) using `palette`.
    #[must_use]
    pub fn pattern_table(&self, index: u8, palette: u8) -> FrameBuffer {
        self.bus
            .ppu
            .pattern_table(index, palette, &self.bus.cartridge)
    }

    /// The 256x240 screen as last rendered.
    #[must_use]
    pub fn screen(&self) -> &FrameBuffer {
        self.bus.ppu.screen()
    }

    #[must_use]
    pub fn frame_complete(&self) -> bool {
        self.bus.ppu.frame_complete()
    }

    #[must_use]
    pub fn registers(&self) -> Registers {
        self.cpu.registers()
    }

    /// Reference to the CPU.
    #[must_use]
    pub fn cpu(&self) -> &Mos6502 {
        &self.cpu
    }

    /// Mutable reference to the CPU.
    pub fn cpu_mut(&mut self) -> &mut Mos6502 {
        &mut self.cpu
    }

    /// Reference to the bus.
    #[must_use]
    pub fn bus(&self) -> &NesBus {
        &self.bus
    }

    /// Mutable reference to the bus.
    pub fn bus_mut(&mut self) -> &mut NesBus {
        &mut self.bus
    }

    /// Bus clock pulses since the last reset.
    #[must_use]
    pub fn clock_count(&self) -> u64 {
        self.clock_count
    }

    /// Instructions started since the last reset.
    #[must_use]
    pub fn operation_count(&self) -> u64 {
        self.cpu.operation_count()
    }
}

impl Tickable for Nes {
    fn tick(&mut self) {
        self.clock();
    }
}

/// Parse `0x1234`, `$1234` or decimal.
fn parse_address(text: &str) -> Option<u16> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16).ok()
    } else if let Some(hex) = text.strip_prefix('$') {
        u16::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

impl Observable for Nes {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("cpu.") {
            self.cpu.query(rest)
        } else if let Some(rest) = path.strip_prefix("ppu.") {
            self.bus.ppu.query(rest)
        } else if let Some(rest) = path.strip_prefix("memory.") {
            parse_address(rest).map(|addr| Value::U8(self.bus.peek(addr)))
        } else {
            match path {
                "clock_count" => Some(self.clock_count.into()),
                "operation_count" => Some(self.operation_count().into()),
                _ => None,
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "cpu.<6502_paths>",
            "ppu.<2c02_paths>",
            "memory.<address>",
            "clock_count",
            "operation_count",
        ]
    }
}
