//! Bit-level codec for the program image format.
//!
//! On the wire a byte is an 8-character `0`/`1` token and a half-word a
//! pair of bytes, high byte first. Inside the machine a byte is a plain
//! `u8` and a half-word a `u16`; width validation only happens here, at
//! the input boundary.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("malformed byte token {token:?}: expected 8 binary digits")]
    MalformedByte { token: String },

    #[error("malformed hex literal {token:?}")]
    MalformedHex { token: String },
}

/// Error raised when a program image contains an invalid token
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid token at index {index}")]
pub struct ImageError {
    pub index: usize,
    #[source]
    pub source: EncodingError,
}

/// Parse a single byte token: exactly 8 binary digits
///
/// # Errors
///
/// Fails on any other length or alphabet.
pub fn parse_byte(token: &str) -> Result<u8, EncodingError> {
    let malformed = || EncodingError::MalformedByte {
        token: token.into(),
    };

    // `from_str_radix` alone would accept a leading `+`
    if token.len() != 8 || !token.bytes().all(|b| b == b'0' || b == b'1') {
        return Err(malformed());
    }

    u8::from_str_radix(token, 2).map_err(|_| malformed())
}

/// Render a byte as its 8-character token
#[must_use]
pub fn format_byte(byte: u8) -> String {
    format!("{byte:08b}")
}

/// Compose a half-word from its two bytes, high byte first
#[must_use]
pub const fn halfword(high: u8, low: u8) -> u16 {
    u16::from_be_bytes([high, low])
}

/// Split a half-word into its `(high, low)` byte pair
#[must_use]
pub const fn halfword_bytes(halfword: u16) -> (u8, u8) {
    let [high, low] = halfword.to_be_bytes();
    (high, low)
}

/// Render a half-word as 16 binary digits, high byte first
#[must_use]
pub fn format_halfword(halfword: u16) -> String {
    format!("{halfword:016b}")
}

/// Hex rendering for logs and CLI tooling, `0x` prefixed
#[must_use]
pub fn format_hex(value: u16) -> String {
    format!("{value:#x}")
}

/// Parse a hex literal, with or without the `0x` prefix
///
/// # Errors
///
/// Fails on anything that is not a hex number fitting a half-word.
pub fn parse_hex(token: &str) -> Result<u16, EncodingError> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    u16::from_str_radix(digits, 16).map_err(|_| EncodingError::MalformedHex {
        token: token.into(),
    })
}

/// Parse a whole program image: whitespace separated byte tokens
///
/// # Errors
///
/// Fails on the first invalid token, naming its index.
pub fn parse_image(source: &str) -> Result<Vec<u8>, ImageError> {
    source
        .split_whitespace()
        .enumerate()
        .map(|(index, token)| {
            parse_byte(token).map_err(|source| ImageError { index, source })
        })
        .collect()
}

/// Render a byte sequence in the program image format
#[must_use]
pub fn format_image(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&byte| format_byte(byte))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_byte_test() {
        assert_eq!(parse_byte("00000000"), Ok(0));
        assert_eq!(parse_byte("00000101"), Ok(5));
        assert_eq!(parse_byte("11111111"), Ok(255));

        assert!(parse_byte("").is_err());
        assert!(parse_byte("0000000").is_err()); // Too short
        assert!(parse_byte("000000000").is_err()); // Too long
        assert!(parse_byte("0000000 ").is_err());
        assert!(parse_byte("00000002").is_err());
        assert!(parse_byte("+0000001").is_err());
    }

    #[test]
    fn byte_roundtrip_test() {
        for n in u8::MIN..=u8::MAX {
            assert_eq!(parse_byte(&format_byte(n)), Ok(n));
        }
    }

    #[test]
    fn halfword_roundtrip_test() {
        for n in [0, 1, 0x00ff, 0x0100, 0x1234, 0xfffe, u16::MAX] {
            let (high, low) = halfword_bytes(n);
            assert_eq!(halfword(high, low), n);
        }
    }

    #[test]
    fn halfword_is_big_endian_test() {
        assert_eq!(halfword(0x12, 0x34), 0x1234);
        assert_eq!(halfword_bytes(0x1234), (0x12, 0x34));
        assert_eq!(format_halfword(0x0105), "0000000100000101");
    }

    #[test]
    fn hex_test() {
        assert_eq!(format_hex(0x2a), "0x2a");
        assert_eq!(parse_hex("0x2a"), Ok(0x2a));
        assert_eq!(parse_hex("2a"), Ok(0x2a));
        assert_eq!(parse_hex("0xffff"), Ok(0xffff));
        assert!(parse_hex("0x10000").is_err()); // Out of bounds
        assert!(parse_hex("nope").is_err());
    }

    #[test]
    fn parse_image_test() {
        assert_eq!(parse_image("00000001 11111111"), Ok(vec![1, 255]));
        assert_eq!(parse_image("00000001\n11111111\t00000000"), Ok(vec![1, 255, 0]));
        assert_eq!(parse_image(""), Ok(vec![]));

        let err = parse_image("00000001 0000002").unwrap_err();
        assert_eq!(err.index, 1);
    }

    #[test]
    fn format_image_test() {
        assert_eq!(format_image(&[3, 0, 1]), "00000011 00000000 00000001");
        assert_eq!(parse_image(&format_image(&[0, 127, 255])), Ok(vec![0, 127, 255]));
    }
}
