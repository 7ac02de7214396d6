//! Ricoh 2C02 picture processing unit.
//!
//! Background rendering only: loopy scroll registers, the eight-dot tile
//! fetch pipeline, nametable and palette RAM, and the CPU-facing register
//! window at $2000-$2007. Pattern memory and nametable mirroring come from
//! the cartridge through [`CartridgeBus`].

mod cartridge_bus;
mod frame;
mod loopy;
mod palette;
mod ppu;

pub use cartridge_bus::{CartridgeBus, Mirroring, NoCartridge};
pub use frame::{FrameBuffer, Rgb};
pub use loopy::LoopyRegister;
pub use palette::PALETTE;
pub use ppu::{DOTS_PER_LINE, FB_HEIGHT, FB_WIDTH, LINES_PER_FRAME, Ppu, PpuConfig};
