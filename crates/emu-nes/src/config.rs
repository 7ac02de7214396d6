//! NES configuration.

use ricoh_ppu_2c02::PpuConfig;

/// NES configuration.
#[derive(Debug, Clone, Default)]
pub struct NesConfig {
    /// iNES file contents to insert at power-on. `None` boots with an
    /// empty slot, for programs preloaded into RAM.
    pub rom_data: Option<Vec<u8>>,
    /// Skip dot 0 of scanline 0 on odd frames while rendering is enabled.
    /// Off by default.
    pub odd_frame_skip: bool,
}

impl NesConfig {
    /// Configuration for an iNES image.
    #[must_use]
    pub fn with_rom(rom_data: Vec<u8>) -> Self {
        Self {
            rom_data: Some(rom_data),
            ..Self::default()
        }
    }

    /// The PPU half of the configuration.
    #[must_use]
    pub fn ppu_config(&self) -> PpuConfig {
        PpuConfig {
            odd_frame_skip: self.odd_frame_skip,
        }
    }
}
