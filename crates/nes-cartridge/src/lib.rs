//! iNES cartridges and mappers.
//!
//! A [`Cartridge`] owns PRG and CHR memory and delegates address decoding
//! to a [`Mapper`]. Supported boards: NROM (0), UxROM (2) and CNROM (3).
//! The cartridge implements the PPU's [`CartridgeBus`] port so it can be
//! lent to [`ricoh_ppu_2c02::Ppu`] for pattern fetches.

mod cartridge;
mod error;
mod header;
mod hex;
mod mapper;

pub use cartridge::Cartridge;
pub use error::CartridgeError;
pub use header::{CHR_BANK_LEN, HEADER_LEN, Header, INES_TAG, PRG_BANK_LEN, TRAINER_LEN};
pub use hex::{HexError, parse_hex_bytes};
pub use mapper::{CpuWrite, Mapper, Mapper000, Mapper002, Mapper003};
pub use ricoh_ppu_2c02::{CartridgeBus, Mirroring};
