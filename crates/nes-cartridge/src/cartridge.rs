//! Cartridge: header, PRG/CHR memory and the mapper that addresses them.

use std::fmt;
use std::path::Path;

use log::{info, warn};
use ricoh_ppu_2c02::{CartridgeBus, Mirroring};

use crate::CartridgeError;
use crate::header::{CHR_BANK_LEN, HEADER_LEN, Header, PRG_BANK_LEN, TRAINER_LEN};
use crate::hex::parse_hex_bytes;
use crate::mapper::{self, CpuWrite, Mapper};

/// A loaded cartridge.
pub struct Cartridge {
    header: Header,
    mapper: Box<dyn Mapper>,
    prg: Vec<u8>,
    chr: Vec<u8>,
}

impl Cartridge {
    /// Build a cartridge from a header and raw memory blocks.
    ///
    /// PRG is sized to the header's bank count, zero-filled or truncated as
    /// needed. With no CHR banks the board gets 8KB of zeroed CHR RAM.
    /// The header tag is not checked.
    ///
    /// # Errors
    ///
    /// Fails on zero program banks or a mapper id without an implementation.
    pub fn new(header: Header, mut prg: Vec<u8>, mut chr: Vec<u8>) -> Result<Self, CartridgeError> {
        if header.prg_banks == 0 {
            return Err(CartridgeError::NoProgramBanks);
        }
        let id = header.mapper_id();
        let Some(mapper) = mapper::for_id(id, header.prg_banks, header.chr_banks) else {
            warn!("Unsupported mapper {id}");
            return Err(CartridgeError::UnsupportedMapper(id));
        };

        prg.resize(header.prg_len(), 0);
        chr.resize(header.chr_len().max(CHR_BANK_LEN), 0);

        info!(
            "Cartridge: mapper {id}, {} PRG bank(s), {} CHR bank(s), {:?} mirroring",
            header.prg_banks,
            header.chr_banks,
            header.mirroring()
        );

        Ok(Self {
            header,
            mapper,
            prg,
            chr,
        })
    }

    /// Parse an iNES image.
    ///
    /// # Errors
    ///
    /// Fails if the tag is missing, the image is shorter than its header
    /// declares, or [`Cartridge::new`] rejects the header.
    pub fn from_bytes(data: &[u8]) -> Result<Self, CartridgeError> {
        let header = Header::parse(data)?;
        if !header.has_ines_tag() {
            return Err(CartridgeError::InvalidMagic);
        }
        if header.prg_banks == 0 {
            return Err(CartridgeError::NoProgramBanks);
        }
        let expected = header.image_len();
        if data.len() < expected {
            return Err(CartridgeError::TooShort {
                expected,
                actual: data.len(),
            });
        }

        let prg_start = HEADER_LEN + if header.has_trainer() { TRAINER_LEN } else { 0 };
        let chr_start = prg_start + header.prg_len();
        let prg = data[prg_start..chr_start].to_vec();
        let chr = data[chr_start..chr_start + header.chr_len()].to_vec();

        Self::new(header, prg, chr)
    }

    /// Load an iNES file from disk.
    ///
    /// # Errors
    ///
    /// I/O failures surface as [`CartridgeError::Io`]; the image itself is
    /// checked as in [`Cartridge::from_bytes`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CartridgeError> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        info!("Loading {}", path.display());
        Self::from_bytes(&data)
    }

    /// A hand-made mapper 0 cartridge for running test programs.
    ///
    /// The program is placed at the start of a single 16KB bank, so it
    /// appears at both $8000 and $C000. The reset vector points at `entry`.
    ///
    /// # Errors
    ///
    /// Fails if `hex` does not parse or the program would overlap the
    /// interrupt vectors.
    pub fn from_hex_program(hex: &str, entry: u16) -> Result<Self, CartridgeError> {
        let program = parse_hex_bytes(hex)?;
        let capacity = PRG_BANK_LEN - 6;
        if program.len() > capacity {
            return Err(CartridgeError::ProgramTooLarge {
                len: program.len(),
                capacity,
            });
        }

        let mut prg = program;
        prg.resize(PRG_BANK_LEN, 0);
        let [lo, hi] = entry.to_le_bytes();
        prg[0xFFFC & 0x3FFF] = lo;
        prg[0xFFFD & 0x3FFF] = hi;

        Self::new(Header::nrom(1, 1), prg, Vec::new())
    }

    /// CPU-side read. `None` when the mapper does not claim `addr`.
    #[must_use]
    pub fn cpu_read(&self, addr: u16) -> Option<u8> {
        self.mapper
            .cpu_map_read(addr)
            .map(|offset| self.prg.get(offset).copied().unwrap_or(0))
    }

    /// CPU-side write. Returns true if the cartridge claimed `addr`.
    pub fn cpu_write(&mut self, addr: u16, value: u8) -> bool {
        match self.mapper.cpu_map_write(addr, value) {
            CpuWrite::Mapped(offset) => {
                if let Some(byte) = self.prg.get_mut(offset) {
                    *byte = value;
                }
                true
            }
            CpuWrite::Register => true,
            CpuWrite::Unmapped => false,
        }
    }

    /// Return the mapper to its power-on banks.
    pub fn reset(&mut self) {
        self.mapper.reset();
    }

    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    #[must_use]
    pub fn mapper_id(&self) -> u8 {
        self.header.mapper_id()
    }

    #[must_use]
    pub fn prg(&self) -> &[u8] {
        &self.prg
    }

    #[must_use]
    pub fn chr(&self) -> &[u8] {
        &self.chr
    }
}

impl CartridgeBus for Cartridge {
    fn ppu_read(&self, addr: u16) -> Option<u8> {
        self.mapper
            .ppu_map_read(addr)
            .map(|offset| self.chr.get(offset).copied().unwrap_or(0))
    }

    fn ppu_write(&mut self, addr: u16, value: u8) -> bool {
        let Some(offset) = self.mapper.ppu_map_write(addr) else {
            return false;
        };
        if let Some(byte) = self.chr.get_mut(offset) {
            *byte = value;
        }
        true
    }

    fn mirroring(&self) -> Mirroring {
        self.header.mirroring()
    }
}

impl fmt::Debug for Cartridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cartridge")
            .field("header", &self.header)
            .field("mapper", &self.mapper)
            .field("prg_len", &self.prg.len())
            .field("chr_len", &self.chr.len())
            .finish()
    }
}
