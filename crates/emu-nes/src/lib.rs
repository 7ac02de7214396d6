//! Cycle-accurate NES core.
//!
//! Ties the 6502 CPU, the 2C02 PPU and the cartridge slot together. The
//! bus clock is the PPU dot clock; the CPU runs at a third of it, giving a
//! 3:1 PPU:CPU ratio.
//!
//! One frame = 341 PPU dots × 262 scanlines = 89,342 bus pulses.
//!
//! Only the background layer is rendered. There is no APU, no sprite
//! compositing and no controller input.

mod bus;
mod config;
mod error;
mod nes;

pub use bus::NesBus;
pub use config::NesConfig;
pub use error::NesError;
pub use nes::Nes;

pub use emu_core::{Bus, Cpu, Observable, Tickable, Ticks, Value};
pub use mos_6502::{Mos6502, Registers, write_listing};
pub use nes_cartridge::{Cartridge, CartridgeError, HexError};
pub use ricoh_ppu_2c02::{FB_HEIGHT, FB_WIDTH, FrameBuffer, Mirroring, Rgb};
