use thiserror::Error;

use crate::hex::HexError;

/// Errors raised while building a cartridge.
#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image too short: expected {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    #[error("missing iNES tag")]
    InvalidMagic,
    #[error("header declares no program banks")]
    NoProgramBanks,
    #[error("unsupported mapper: {0}")]
    UnsupportedMapper(u8),
    #[error("program of {len} bytes does not fit in {capacity} bytes")]
    ProgramTooLarge { len: usize, capacity: usize },
    #[error("invalid hex program: {0}")]
    InvalidHex(#[from] HexError),
}
