//! Hex-string parsing for hand-assembled programs.

use thiserror::Error;

/// A hex string that could not be turned into bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexError {
    #[error("invalid hex digit {found:?} at position {position}")]
    InvalidDigit { position: usize, found: char },
    #[error("hex string has an odd number of digits ({0})")]
    OddLength(usize),
}

/// Parse a string of hex digit pairs into bytes.
///
/// Pairs may be written back to back (`"A9428D"`) or separated by
/// whitespace (`"A9 42 8D"`). Whitespace inside a pair is rejected. Both
/// cases are accepted for the digits themselves.
///
/// # Errors
///
/// Returns [`HexError::InvalidDigit`] for any character that is neither a
/// hex digit nor whitespace between pairs, and [`HexError::OddLength`] when
/// the digits do not pair up.
pub fn parse_hex_bytes(text: &str) -> Result<Vec<u8>, HexError> {
    let mut bytes = Vec::with_capacity(text.len() / 2);
    let mut high: Option<u8> = None;
    let mut digits = 0;

    for (position, found) in text.chars().enumerate() {
        if found.is_whitespace() {
            if high.is_some() {
                return Err(HexError::InvalidDigit { position, found });
            }
            continue;
        }
        let nibble = found
            .to_digit(16)
            .ok_or(HexError::InvalidDigit { position, found })? as u8;
        digits += 1;
        match high.take() {
            Some(hi) => bytes.push((hi << 4) | nibble),
            None => high = Some(nibble),
        }
    }

    if high.is_some() {
        return Err(HexError::OddLength(digits));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_and_spaced_forms_agree() {
        let packed = parse_hex_bytes("A2 0A8E0000").unwrap();
        let spaced = parse_hex_bytes("A2 0A 8E 00 00").unwrap();
        assert_eq!(packed, vec![0xA2, 0x0A, 0x8E, 0x00, 0x00]);
        assert_eq!(packed, spaced);
    }

    #[test]
    fn lowercase_digits() {
        assert_eq!(parse_hex_bytes("ea ff").unwrap(), vec![0xEA, 0xFF]);
    }

    #[test]
    fn empty_string_is_empty_program() {
        assert_eq!(parse_hex_bytes("").unwrap(), Vec::<u8>::new());
        assert_eq!(parse_hex_bytes("   ").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn rejects_non_hex() {
        assert_eq!(
            parse_hex_bytes("A9 4G"),
            Err(HexError::InvalidDigit {
                position: 4,
                found: 'G'
            })
        );
    }

    #[test]
    fn rejects_split_pair() {
        assert_eq!(
            parse_hex_bytes("A 9"),
            Err(HexError::InvalidDigit {
                position: 1,
                found: ' '
            })
        );
    }

    #[test]
    fn rejects_dangling_digit() {
        assert_eq!(parse_hex_bytes("A9 4"), Err(HexError::OddLength(3)));
    }
}
