use nes_cartridge::{CartridgeError, HexError};
use thiserror::Error;

/// Errors surfaced by the NES system.
#[derive(Debug, Error)]
pub enum NesError {
    #[error("cartridge: {0}")]
    Cartridge(#[from] CartridgeError),
    #[error("invalid hex data: {0}")]
    InvalidHex(#[from] HexError),
}
