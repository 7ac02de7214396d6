//! NES PPU (2C02) background pipeline.
//!
//! Dot-based rendering. One `tick()` = one PPU dot. Each frame is 341 dots
//! x 262 scanlines.
//!
//! ## Scanline layout
//! - -1: pre-render
//! - 0-239: visible scanlines (render pixels)
//! - 240: post-render (idle)
//! - 241-260: `VBlank`
//!
//! Sprites are not composited. OAM registers exist on the bus but do
//! nothing.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use std::fmt;

use emu_core::{Observable, Value};
use log::{trace, warn};

use crate::cartridge_bus::{CartridgeBus, Mirroring};
use crate::frame::{FrameBuffer, Rgb};
use crate::loopy::LoopyRegister;
use crate::palette::PALETTE;

/// Framebuffer dimensions.
pub const FB_WIDTH: usize = 256;
pub const FB_HEIGHT: usize = 240;

/// Dots per scanline.
pub const DOTS_PER_LINE: u16 = 341;

/// Scanlines per frame, counting the pre-render line.
pub const LINES_PER_FRAME: u16 = 262;

// PPUCTRL bits
const CTRL_NAMETABLE_X: u8 = 0x01;
const CTRL_NAMETABLE_Y: u8 = 0x02;
const CTRL_INCREMENT_32: u8 = 0x04;
const CTRL_BG_PATTERN: u8 = 0x10;
const CTRL_NMI: u8 = 0x80;

// PPUMASK bits
const MASK_SHOW_BG: u8 = 0x08;
const MASK_SHOW_SPRITES: u8 = 0x10;

// PPUSTATUS bits
const STATUS_OVERFLOW: u8 = 0x20;
const STATUS_SPRITE_ZERO: u8 = 0x40;
const STATUS_VBLANK: u8 = 0x80;

/// PPU behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PpuConfig {
    /// Skip dot 0 of scanline 0 on odd frames while rendering is enabled,
    /// as the hardware does. Off by default.
    pub odd_frame_skip: bool,
}

/// PPU 2C02.
pub struct Ppu {
    config: PpuConfig,

    // Internal memory
    nametables: [[u8; 1024]; 2],
    palette_ram: [u8; 32],
    /// Pattern memory used when no cartridge claims $0000-$1FFF.
    pattern_tables: [[u8; 4096]; 2],

    // Registers
    ctrl: u8,
    mask: u8,
    status: u8,

    // Loopy scroll/address registers
    v: LoopyRegister,
    t: LoopyRegister,
    fine_x: u8,
    w: bool,

    // Data read buffer ($2007)
    read_buffer: u8,

    // Rendering position
    scanline: i16,
    cycle: u16,
    odd_frame: bool,

    // Background shift registers
    bg_shift_pattern_lo: u16,
    bg_shift_pattern_hi: u16,
    bg_shift_attrib_lo: u16,
    bg_shift_attrib_hi: u16,
    bg_next_tile_id: u8,
    bg_next_tile_attrib: u8,
    bg_next_tile_lo: u8,
    bg_next_tile_hi: u8,

    // Output
    screen: FrameBuffer,
    frame_complete: bool,
    nmi: bool,
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Ppu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ppu")
            .field("scanline", &self.scanline)
            .field("cycle", &self.cycle)
            .field("ctrl", &self.ctrl)
            .field("mask", &self.mask)
            .field("status", &self.status)
            .field("v", &self.v)
            .field("t", &self.t)
            .field("fine_x", &self.fine_x)
            .finish_non_exhaustive()
    }
}

impl Ppu {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(PpuConfig::default())
    }

    #[must_use]
    pub fn with_config(config: PpuConfig) -> Self {
        Self {
            config,
            nametables: [[0; 1024]; 2],
            palette_ram: [0; 32],
            pattern_tables: [[0; 4096]; 2],
            ctrl: 0,
            mask: 0,
            status: 0,
            v: LoopyRegister::new(),
            t: LoopyRegister::new(),
            fine_x: 0,
            w: false,
            read_buffer: 0,
            scanline: -1, // Start at pre-render
            cycle: 0,
            odd_frame: false,
            bg_shift_pattern_lo: 0,
            bg_shift_pattern_hi: 0,
            bg_shift_attrib_lo: 0,
            bg_shift_attrib_hi: 0,
            bg_next_tile_id: 0,
            bg_next_tile_attrib: 0,
            bg_next_tile_lo: 0,
            bg_next_tile_hi: 0,
            screen: FrameBuffer::new(FB_WIDTH, FB_HEIGHT),
            frame_complete: false,
            nmi: false,
        }
    }

    #[must_use]
    pub fn config(&self) -> PpuConfig {
        self.config
    }

    /// Return registers, latches, raster position, nametables and palette
    /// to power-on values. The internal pattern fallback is left alone.
    pub fn reset(&mut self) {
        self.nametables = [[0; 1024]; 2];
        self.palette_ram = [0; 32];
        self.ctrl = 0;
        self.mask = 0;
        self.status = 0;
        self.v = LoopyRegister::new();
        self.t = LoopyRegister::new();
        self.fine_x = 0;
        self.w = false;
        self.read_buffer = 0;
        self.scanline = -1;
        self.cycle = 0;
        self.odd_frame = false;
        self.bg_shift_pattern_lo = 0;
        self.bg_shift_pattern_hi = 0;
        self.bg_shift_attrib_lo = 0;
        self.bg_shift_attrib_hi = 0;
        self.bg_next_tile_id = 0;
        self.bg_next_tile_attrib = 0;
        self.bg_next_tile_lo = 0;
        self.bg_next_tile_hi = 0;
        self.frame_complete = false;
        self.nmi = false;
    }

    /// One PPU dot.
    pub fn tick(&mut self, cart: &mut dyn CartridgeBus) {
        if self.scanline < 240 {
            self.tick_render_line(cart);
        }

        // VBlank start (241)
        if self.scanline == 241 && self.cycle == 1 {
            self.status |= STATUS_VBLANK;
            if self.ctrl & CTRL_NMI != 0 {
                self.nmi = true;
            }
        }

        self.render_pixel(cart);

        // Advance dot/scanline
        self.cycle += 1;
        if self.cycle >= DOTS_PER_LINE {
            self.cycle = 0;
            self.scanline += 1;
            if self.scanline >= 261 {
                self.scanline = -1;
                self.frame_complete = true;
                self.odd_frame = !self.odd_frame;
            }
        }
    }

    /// Pre-render and visible lines share the fetch pipeline.
    fn tick_render_line(&mut self, cart: &dyn CartridgeBus) {
        if self.scanline == 0
            && self.cycle == 0
            && self.odd_frame
            && self.config.odd_frame_skip
            && self.rendering_enabled()
        {
            self.cycle = 1;
        }

        if self.scanline == -1 && self.cycle == 1 {
            // Clear VBlank, sprite 0 hit, sprite overflow
            self.status &= !(STATUS_VBLANK | STATUS_SPRITE_ZERO | STATUS_OVERFLOW);
        }

        if (2..258).contains(&self.cycle) || (321..338).contains(&self.cycle) {
            self.shift_registers();
            self.bg_fetch_cycle(cart);
        }

        if self.cycle == 256 {
            self.increment_y();
        }
        if self.cycle == 257 {
            self.load_bg_shift_registers();
            self.copy_horizontal();
        }

        // Unused nametable fetches at the end of the line
        if self.cycle == 338 || self.cycle == 340 {
            self.bg_next_tile_id = self.ppu_read(0x2000 | (self.v.address() & 0x0FFF), cart);
        }

        // Copy vertical bits from t to v during dots 280-304
        if self.scanline == -1 && (280..305).contains(&self.cycle) {
            self.copy_vertical();
        }
    }

    fn bg_fetch_cycle(&mut self, cart: &dyn CartridgeBus) {
        match (self.cycle - 1) % 8 {
            0 => {
                self.load_bg_shift_registers();
                let nt_addr = 0x2000 | (self.v.address() & 0x0FFF);
                self.bg_next_tile_id = self.ppu_read(nt_addr, cart);
            }
            2 => {
                let v = self.v;
                let attr_addr = 0x23C0
                    | u16::from(v.nametable_y) << 11
                    | u16::from(v.nametable_x) << 10
                    | u16::from(v.coarse_y >> 2) << 3
                    | u16::from(v.coarse_x >> 2);
                let mut attrib = self.ppu_read(attr_addr, cart);
                // Select the 2-bit palette for this quadrant
                if v.coarse_y & 0x02 != 0 {
                    attrib >>= 4;
                }
                if v.coarse_x & 0x02 != 0 {
                    attrib >>= 2;
                }
                self.bg_next_tile_attrib = attrib & 0x03;
            }
            4 => {
                let addr = self.bg_pattern_addr();
                self.bg_next_tile_lo = self.ppu_read(addr, cart);
            }
            6 => {
                let addr = self.bg_pattern_addr() + 8;
                self.bg_next_tile_hi = self.ppu_read(addr, cart);
            }
            7 => self.increment_x(),
            _ => {}
        }
    }

    fn bg_pattern_addr(&self) -> u16 {
        let table = u16::from(self.ctrl & CTRL_BG_PATTERN != 0) << 12;
        table + (u16::from(self.bg_next_tile_id) << 4) + u16::from(self.v.fine_y)
    }

    fn load_bg_shift_registers(&mut self) {
        self.bg_shift_pattern_lo =
            (self.bg_shift_pattern_lo & 0xFF00) | u16::from(self.bg_next_tile_lo);
        self.bg_shift_pattern_hi =
            (self.bg_shift_pattern_hi & 0xFF00) | u16::from(self.bg_next_tile_hi);

        let attrib_lo = if self.bg_next_tile_attrib & 0x01 != 0 { 0xFF } else { 0x00 };
        let attrib_hi = if self.bg_next_tile_attrib & 0x02 != 0 { 0xFF } else { 0x00 };
        self.bg_shift_attrib_lo = (self.bg_shift_attrib_lo & 0xFF00) | attrib_lo;
        self.bg_shift_attrib_hi = (self.bg_shift_attrib_hi & 0xFF00) | attrib_hi;
    }

    fn shift_registers(&mut self) {
        if self.mask & MASK_SHOW_BG == 0 {
            return;
        }
        self.bg_shift_pattern_lo <<= 1;
        self.bg_shift_pattern_hi <<= 1;
        self.bg_shift_attrib_lo <<= 1;
        self.bg_shift_attrib_hi <<= 1;
    }

    fn render_pixel(&mut self, cart: &dyn CartridgeBus) {
        if !(0..240).contains(&self.scanline) || !(1..=256).contains(&self.cycle) {
            return;
        }

        let (pixel, palette) = self.bg_pixel();
        let colour = self.palette_colour(palette, pixel, cart);
        self.screen
            .set_pixel(i32::from(self.cycle) - 1, i32::from(self.scanline), colour);
    }

    fn bg_pixel(&self) -> (u8, u8) {
        if self.mask & MASK_SHOW_BG == 0 {
            return (0, 0);
        }

        let bit_select = 0x8000 >> self.fine_x;
        let pixel_lo = u8::from(self.bg_shift_pattern_lo & bit_select != 0);
        let pixel_hi = u8::from(self.bg_shift_pattern_hi & bit_select != 0);
        let palette_lo = u8::from(self.bg_shift_attrib_lo & bit_select != 0);
        let palette_hi = u8::from(self.bg_shift_attrib_hi & bit_select != 0);

        ((pixel_hi << 1) | pixel_lo, (palette_hi << 1) | palette_lo)
    }

    // === Scrolling ===

    fn increment_x(&mut self) {
        if !self.rendering_enabled() {
            return;
        }
        if self.v.coarse_x == 31 {
            self.v.coarse_x = 0;
            self.v.nametable_x ^= 1; // Switch horizontal nametable
        } else {
            self.v.coarse_x += 1;
        }
    }

    fn increment_y(&mut self) {
        if !self.rendering_enabled() {
            return;
        }
        if self.v.fine_y < 7 {
            self.v.fine_y += 1;
            return;
        }
        self.v.fine_y = 0;
        match self.v.coarse_y {
            29 => {
                self.v.coarse_y = 0;
                self.v.nametable_y ^= 1; // Switch vertical nametable
            }
            // Attribute rows: wrap without switching
            31 => self.v.coarse_y = 0,
            _ => self.v.coarse_y += 1,
        }
    }

    fn copy_horizontal(&mut self) {
        if !self.rendering_enabled() {
            return;
        }
        self.v.coarse_x = self.t.coarse_x;
        self.v.nametable_x = self.t.nametable_x;
    }

    fn copy_vertical(&mut self) {
        if !self.rendering_enabled() {
            return;
        }
        self.v.fine_y = self.t.fine_y;
        self.v.coarse_y = self.t.coarse_y;
        self.v.nametable_y = self.t.nametable_y;
    }

    // === Register access (CPU side) ===

    /// CPU read from PPU register ($2000-$2007 mirrored).
    pub fn cpu_read(&mut self, reg: u16, cart: &dyn CartridgeBus) -> u8 {
        match reg & 0x07 {
            // $2002 - PPUSTATUS
            2 => {
                let result = (self.status & 0xE0) | (self.read_buffer & 0x1F);
                self.status &= !STATUS_VBLANK;
                self.w = false;
                result
            }
            // $2007 - PPUDATA
            7 => {
                let addr = self.v.address();
                let mut result = self.read_buffer;
                self.read_buffer = self.ppu_read(addr, cart);
                // Palette reads are not buffered
                if addr & 0x3FFF >= 0x3F00 {
                    result = self.read_buffer;
                }
                self.increment_vram_addr();
                result
            }
            _ => 0, // Write-only registers
        }
    }

    /// Side-effect-free view of a register for debuggers.
    #[must_use]
    pub fn cpu_peek(&self, reg: u16, cart: &dyn CartridgeBus) -> u8 {
        match reg & 0x07 {
            0 => self.ctrl,
            1 => self.mask,
            2 => (self.status & 0xE0) | (self.read_buffer & 0x1F),
            7 => {
                let addr = self.v.address();
                if addr & 0x3FFF >= 0x3F00 {
                    self.ppu_read(addr, cart)
                } else {
                    self.read_buffer
                }
            }
            _ => 0,
        }
    }

    /// CPU write to PPU register ($2000-$2007 mirrored).
    pub fn cpu_write(&mut self, reg: u16, val: u8, cart: &mut dyn CartridgeBus) {
        match reg & 0x07 {
            // $2000 - PPUCTRL
            0 => {
                self.ctrl = val;
                // Nametable select bits go to t
                self.t.nametable_x = u8::from(val & CTRL_NAMETABLE_X != 0);
                self.t.nametable_y = u8::from(val & CTRL_NAMETABLE_Y != 0);
            }
            // $2001 - PPUMASK
            1 => self.mask = val,
            2 => warn!("write ${val:02X} to read-only PPUSTATUS ignored"),
            3 | 4 => trace!("OAM write ${val:02X} to register {} ignored", reg & 0x07),
            // $2005 - PPUSCROLL
            5 => {
                if self.w {
                    self.t.fine_y = val & 0x07;
                    self.t.coarse_y = val >> 3;
                } else {
                    self.fine_x = val & 0x07;
                    self.t.coarse_x = val >> 3;
                }
                self.w = !self.w;
            }
            // $2006 - PPUADDR
            6 => {
                if self.w {
                    // Second write: low byte, copy t to v
                    self.t.set((self.t.address() & 0xFF00) | u16::from(val));
                    self.v = self.t;
                } else {
                    // First write: high byte
                    self.t
                        .set((self.t.address() & 0x00FF) | (u16::from(val & 0x3F) << 8));
                }
                self.w = !self.w;
            }
            // $2007 - PPUDATA
            7 => {
                self.ppu_write(self.v.address(), val, cart);
                self.increment_vram_addr();
            }
            _ => {}
        }
    }

    fn increment_vram_addr(&mut self) {
        let step = if self.ctrl & CTRL_INCREMENT_32 != 0 { 32 } else { 1 };
        self.v.add(step);
    }

    // === PPU memory access ===

    /// Read the PPU address space. The cartridge gets first refusal.
    #[must_use]
    pub fn ppu_read(&self, addr: u16, cart: &dyn CartridgeBus) -> u8 {
        let addr = addr & 0x3FFF;
        if let Some(value) = cart.ppu_read(addr) {
            return value;
        }
        match addr {
            0x0000..=0x1FFF => {
                self.pattern_tables[usize::from(addr >> 12)][usize::from(addr & 0x0FFF)]
            }
            0x2000..=0x3EFF => {
                let (table, offset) = nametable_index(addr, cart.mirroring());
                self.nametables[table][offset]
            }
            _ => self.palette_ram[palette_index(addr)],
        }
    }

    /// Write the PPU address space. The cartridge gets first refusal.
    pub fn ppu_write(&mut self, addr: u16, val: u8, cart: &mut dyn CartridgeBus) {
        let addr = addr & 0x3FFF;
        if cart.ppu_write(addr, val) {
            return;
        }
        match addr {
            0x0000..=0x1FFF => {
                self.pattern_tables[usize::from(addr >> 12)][usize::from(addr & 0x0FFF)] = val;
            }
            0x2000..=0x3EFF => {
                let (table, offset) = nametable_index(addr, cart.mirroring());
                self.nametables[table][offset] = val;
            }
            _ => self.palette_ram[palette_index(addr)] = val,
        }
    }

    // === Output ===

    /// Colour of `pixel` (0-3) in background/sprite palette `palette` (0-7).
    #[must_use]
    pub fn palette_colour(&self, palette: u8, pixel: u8, cart: &dyn CartridgeBus) -> Rgb {
        let addr = 0x3F00 + (u16::from(palette) << 2) + u16::from(pixel);
        PALETTE[usize::from(self.ppu_read(addr, cart) & 0x3F)]
    }

    /// Render pattern table `index` (0 or 1) as a 16x16 grid of tiles.
    #[must_use]
    pub fn pattern_table(&self, index: u8, palette: u8, cart: &dyn CartridgeBus) -> FrameBuffer {
        let mut view = FrameBuffer::new(128, 128);
        let base = u16::from(index & 1) * 0x1000;

        for tile_y in 0..16u16 {
            for tile_x in 0..16u16 {
                let offset = tile_y * 256 + tile_x * 16;
                for row in 0..8u16 {
                    let mut lo = self.ppu_read(base + offset + row, cart);
                    let mut hi = self.ppu_read(base + offset + row + 8, cart);
                    for col in 0..8u16 {
                        let pixel = ((hi & 0x01) << 1) | (lo & 0x01);
                        lo >>= 1;
                        hi >>= 1;
                        view.set_pixel(
                            i32::from(tile_x * 8 + (7 - col)),
                            i32::from(tile_y * 8 + row),
                            self.palette_colour(palette, pixel, cart),
                        );
                    }
                }
            }
        }
        view
    }

    /// Rendered frame (256x240).
    #[must_use]
    pub fn screen(&self) -> &FrameBuffer {
        &self.screen
    }

    /// True once a full frame has been produced. Stays set until cleared.
    #[must_use]
    pub fn frame_complete(&self) -> bool {
        self.frame_complete
    }

    pub fn clear_frame_complete(&mut self) {
        self.frame_complete = false;
    }

    /// Take the pending NMI flag (used by the NES tick loop to signal CPU).
    pub fn take_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi)
    }

    // === Helpers ===

    fn rendering_enabled(&self) -> bool {
        self.mask & (MASK_SHOW_BG | MASK_SHOW_SPRITES) != 0
    }

    /// Current scanline (-1 is pre-render).
    #[must_use]
    pub fn scanline(&self) -> i16 {
        self.scanline
    }

    /// Current dot.
    #[must_use]
    pub fn cycle(&self) -> u16 {
        self.cycle
    }

    #[must_use]
    pub fn vram_addr(&self) -> LoopyRegister {
        self.v
    }

    #[must_use]
    pub fn temp_addr(&self) -> LoopyRegister {
        self.t
    }

    #[must_use]
    pub fn fine_x(&self) -> u8 {
        self.fine_x
    }
}

/// Fold a $2000-$3EFF address onto one of the two physical nametables.
fn nametable_index(addr: u16, mirroring: Mirroring) -> (usize, usize) {
    let addr = addr & 0x0FFF;
    let quadrant = addr >> 10;
    let table = match mirroring {
        Mirroring::Vertical => quadrant & 1,
        Mirroring::Horizontal => quadrant >> 1,
        Mirroring::OneScreenLo => 0,
        Mirroring::OneScreenHi => 1,
    };
    (usize::from(table), usize::from(addr & 0x03FF))
}

/// Palette RAM index. $3F10/$3F14/$3F18/$3F1C alias $3F00/$3F04/$3F08/$3F0C.
fn palette_index(addr: u16) -> usize {
    let index = usize::from(addr & 0x1F);
    if index & 0x13 == 0x10 { index & 0x0F } else { index }
}

impl Observable for Ppu {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "scanline" => Some(self.scanline.into()),
            "cycle" | "dot" => Some(self.cycle.into()),
            "frame_complete" => Some(self.frame_complete.into()),
            "odd_frame" => Some(self.odd_frame.into()),
            "ctrl" => Some(self.ctrl.into()),
            "mask" => Some(self.mask.into()),
            "status" => Some(self.status.into()),
            "v" => Some(self.v.address().into()),
            "t" => Some(self.t.address().into()),
            "fine_x" => Some(self.fine_x.into()),
            "nmi" => Some(self.nmi.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "scanline",
            "cycle",
            "frame_complete",
            "odd_frame",
            "ctrl",
            "mask",
            "status",
            "v",
            "t",
            "fine_x",
            "nmi",
        ]
    }
}
