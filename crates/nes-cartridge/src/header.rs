//! The 16-byte iNES header.

use ricoh_ppu_2c02::Mirroring;

use crate::CartridgeError;

/// Size of the header in bytes.
pub const HEADER_LEN: usize = 16;
/// Size of the optional trainer block that follows the header.
pub const TRAINER_LEN: usize = 512;
/// Size of one program bank.
pub const PRG_BANK_LEN: usize = 16 * 1024;
/// Size of one character bank.
pub const CHR_BANK_LEN: usize = 8 * 1024;

/// The `NES<EOF>` tag that opens every iNES image.
pub const INES_TAG: [u8; 4] = *b"NES\x1A";

/// Parsed iNES header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub tag: [u8; 4],
    pub prg_banks: u8,
    pub chr_banks: u8,
    /// Flags 6: mirroring, battery, trainer, mapper low nibble.
    pub mapper1: u8,
    /// Flags 7: mapper high nibble.
    pub mapper2: u8,
    pub prg_ram_size: u8,
    pub tv_system1: u8,
    pub tv_system2: u8,
}

impl Header {
    /// Header for an in-memory mapper 0 cartridge.
    #[must_use]
    pub fn nrom(prg_banks: u8, chr_banks: u8) -> Self {
        Self {
            tag: INES_TAG,
            prg_banks,
            chr_banks,
            mapper1: 0,
            mapper2: 0,
            prg_ram_size: 0,
            tv_system1: 0,
            tv_system2: 0,
        }
    }

    /// Read the header fields from the start of `data`.
    ///
    /// The tag is not checked here.
    ///
    /// # Errors
    ///
    /// Returns [`CartridgeError::TooShort`] if `data` holds fewer than 16
    /// bytes.
    pub fn parse(data: &[u8]) -> Result<Self, CartridgeError> {
        let bytes = data.get(..HEADER_LEN).ok_or(CartridgeError::TooShort {
            expected: HEADER_LEN,
            actual: data.len(),
        })?;
        Ok(Self {
            tag: [bytes[0], bytes[1], bytes[2], bytes[3]],
            prg_banks: bytes[4],
            chr_banks: bytes[5],
            mapper1: bytes[6],
            mapper2: bytes[7],
            prg_ram_size: bytes[8],
            tv_system1: bytes[9],
            tv_system2: bytes[10],
        })
    }

    #[must_use]
    pub fn has_ines_tag(&self) -> bool {
        self.tag == INES_TAG
    }

    /// Mapper number from the high nibbles of both flag bytes.
    #[must_use]
    pub fn mapper_id(&self) -> u8 {
        (self.mapper2 & 0xF0) | (self.mapper1 >> 4)
    }

    #[must_use]
    pub fn mirroring(&self) -> Mirroring {
        if self.mapper1 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        }
    }

    #[must_use]
    pub fn has_trainer(&self) -> bool {
        self.mapper1 & 0x04 != 0
    }

    #[must_use]
    pub fn prg_len(&self) -> usize {
        usize::from(self.prg_banks) * PRG_BANK_LEN
    }

    /// Bytes of character memory in the image. Zero means the board
    /// carries 8KB of CHR RAM instead.
    #[must_use]
    pub fn chr_len(&self) -> usize {
        usize::from(self.chr_banks) * CHR_BANK_LEN
    }

    /// Total image length this header declares.
    #[must_use]
    pub fn image_len(&self) -> usize {
        let trainer = if self.has_trainer() { TRAINER_LEN } else { 0 };
        HEADER_LEN + trainer + self.prg_len() + self.chr_len()
    }

    /// Serialise back to the 16-byte on-disk form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0; HEADER_LEN];
        bytes[..4].copy_from_slice(&self.tag);
        bytes[4] = self.prg_banks;
        bytes[5] = self.chr_banks;
        bytes[6] = self.mapper1;
        bytes[7] = self.mapper2;
        bytes[8] = self.prg_ram_size;
        bytes[9] = self.tv_system1;
        bytes[10] = self.tv_system2;
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapper_id_uses_both_high_nibbles() {
        let mut header = Header::nrom(1, 1);
        header.mapper1 = 0x31;
        header.mapper2 = 0x40;
        assert_eq!(header.mapper_id(), 0x43);
        assert_eq!(header.mirroring(), Mirroring::Vertical);
    }

    #[test]
    fn trainer_adds_to_image_length() {
        let mut header = Header::nrom(2, 1);
        assert_eq!(header.image_len(), 16 + 32768 + 8192);
        header.mapper1 |= 0x04;
        assert!(header.has_trainer());
        assert_eq!(header.image_len(), 16 + 512 + 32768 + 8192);
    }

    #[test]
    fn parse_reads_fields_in_order() {
        let raw = [
            b'N', b'E', b'S', 0x1A, 2, 0, 0x21, 0x00, 1, 0, 0, 0, 0, 0, 0, 0,
        ];
        let header = Header::parse(&raw).unwrap();
        assert!(header.has_ines_tag());
        assert_eq!(header.prg_banks, 2);
        assert_eq!(header.chr_banks, 0);
        assert_eq!(header.mapper_id(), 2);
        assert_eq!(header.prg_ram_size, 1);
        assert_eq!(header.chr_len(), 0);
        assert_eq!(header.to_bytes(), raw);
    }

    #[test]
    fn parse_rejects_short_input() {
        let err = Header::parse(&[0x4E, 0x45]).unwrap_err();
        assert!(matches!(
            err,
            CartridgeError::TooShort {
                expected: 16,
                actual: 2
            }
        ));
    }
}
