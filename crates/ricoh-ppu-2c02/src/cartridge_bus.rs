//! The PPU's view of the cartridge.
//!
//! Pattern memory usually lives on the cartridge, and the cartridge also
//! decides how the four logical nametables fold onto the PPU's two
//! physical ones. The PPU never owns the cartridge; every call that can
//! touch pattern memory borrows one of these.

/// Nametable mirroring mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mirroring {
    /// $2000/$2400 share table 0, $2800/$2C00 share table 1.
    #[default]
    Horizontal,
    /// $2000/$2800 share table 0, $2400/$2C00 share table 1.
    Vertical,
    /// Every quadrant maps to table 0.
    OneScreenLo,
    /// Every quadrant maps to table 1.
    OneScreenHi,
}

/// Cartridge side of the PPU address space ($0000-$3FFF).
pub trait CartridgeBus {
    /// Read a byte if the cartridge claims `addr`.
    fn ppu_read(&self, addr: u16) -> Option<u8>;

    /// Write a byte. Returns true if the cartridge claimed `addr`.
    fn ppu_write(&mut self, addr: u16, value: u8) -> bool;

    /// Current nametable arrangement.
    fn mirroring(&self) -> Mirroring;
}

/// No cartridge inserted: nothing is claimed and nametables fall back to
/// horizontal mirroring.
impl<T: CartridgeBus> CartridgeBus for Option<T> {
    fn ppu_read(&self, addr: u16) -> Option<u8> {
        self.as_ref().and_then(|cart| cart.ppu_read(addr))
    }

    fn ppu_write(&mut self, addr: u16, value: u8) -> bool {
        self.as_mut().is_some_and(|cart| cart.ppu_write(addr, value))
    }

    fn mirroring(&self) -> Mirroring {
        self.as_ref().map_or(Mirroring::Horizontal, CartridgeBus::mirroring)
    }
}

/// A cartridge slot that claims nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCartridge;

impl CartridgeBus for NoCartridge {
    fn ppu_read(&self, _addr: u16) -> Option<u8> {
        None
    }

    fn ppu_write(&mut self, _addr: u16, _value: u8) -> bool {
        false
    }

    fn mirroring(&self) -> Mirroring {
        Mirroring::Horizontal
    }
}
