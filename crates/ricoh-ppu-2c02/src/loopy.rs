//! Loopy scroll/address register.
//!
//! The PPU's `v` (current VRAM address) and `t` (temporary address) share
//! one 15-bit layout:
//!
//! ```text
//! yyy NN YYYYY XXXXX
//! ||| || ||||| +++++-- coarse X scroll
//! ||| || +++++-------- coarse Y scroll
//! ||| |+-------------- horizontal nametable select
//! ||| +--------------- vertical nametable select
//! +++----------------- fine Y scroll
//! ```
//!
//! Fields are stored separately so the rendering code can name them. The
//! packed value is rebuilt on demand and bit 15 never exists.

/// One loopy register, unpacked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopyRegister {
    /// 5 bits.
    pub coarse_x: u8,
    /// 5 bits.
    pub coarse_y: u8,
    /// 1 bit.
    pub nametable_x: u8,
    /// 1 bit.
    pub nametable_y: u8,
    /// 3 bits.
    pub fine_y: u8,
}

impl LoopyRegister {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            coarse_x: 0,
            coarse_y: 0,
            nametable_x: 0,
            nametable_y: 0,
            fine_y: 0,
        }
    }

    /// Build from a packed address. Bit 15 is discarded.
    #[must_use]
    pub const fn from_address(value: u16) -> Self {
        Self {
            coarse_x: (value & 0x1F) as u8,
            coarse_y: ((value >> 5) & 0x1F) as u8,
            nametable_x: ((value >> 10) & 0x01) as u8,
            nametable_y: ((value >> 11) & 0x01) as u8,
            fine_y: ((value >> 12) & 0x07) as u8,
        }
    }

    /// The packed 15-bit value.
    #[must_use]
    pub const fn address(&self) -> u16 {
        (self.coarse_x as u16 & 0x1F)
            | (self.coarse_y as u16 & 0x1F) << 5
            | (self.nametable_x as u16 & 0x01) << 10
            | (self.nametable_y as u16 & 0x01) << 11
            | (self.fine_y as u16 & 0x07) << 12
    }

    /// Overwrite every field from a packed value.
    pub fn set(&mut self, value: u16) {
        *self = Self::from_address(value);
    }

    /// Add to the packed value, carrying across field boundaries.
    pub fn add(&mut self, n: u16) {
        self.set(self.address().wrapping_add(n));
    }

    /// Add one to the packed value.
    pub fn increment(&mut self) {
        self.add(1);
    }
}
