//! Parse number literals.
//!
//! It parses base 10, base 16 (prefixed by `0x`) and base 2 (prefixed
//! by `0b`) number literals, bounded to a half-word.

use std::str::FromStr;

use nom::branch::alt;
use nom::bytes::complete::{tag_no_case, take_while1};
use nom::combinator::map_res;
use nom::IResult;

/// Parse a decimal number
fn from_decimal(input: &str) -> Result<u16, std::num::ParseIntError> {
    u16::from_str(input)
}

/// Parse a hexadecimal number
fn from_hexadecimal(input: &str) -> Result<u16, std::num::ParseIntError> {
    u16::from_str_radix(input, 16)
}

/// Extract a hexadecimal literal
fn take_hexadecimal_literal(input: &str) -> IResult<&str, &str> {
    let (input, _) = tag_no_case("0x")(input)?;
    take_while1(|c: char| c.is_ascii_hexdigit())(input)
}

/// Parse a binary number
fn from_binary(input: &str) -> Result<u16, std::num::ParseIntError> {
    u16::from_str_radix(input, 2)
}

/// Extract a binary literal
fn take_binary_literal(input: &str) -> IResult<&str, &str> {
    let (input, _) = tag_no_case("0b")(input)?;
    take_while1(|c: char| c == '0' || c == '1')(input)
}

/// Parse a number literal
pub fn parse_literal(input: &str) -> IResult<&str, u16> {
    alt((
        map_res(take_hexadecimal_literal, from_hexadecimal),
        map_res(take_binary_literal, from_binary),
        map_res(take_while1(|c: char| c.is_ascii_digit()), from_decimal),
    ))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_decimal_test() {
        assert_eq!(from_decimal("16"), Ok(16));
        assert_eq!(from_decimal("65535"), Ok(65535)); // Upper boundary
        assert!(from_decimal("65536").is_err()); // Out of bounds
        assert!(from_decimal("foo").is_err());
    }

    #[test]
    fn from_hexadecimal_test() {
        assert_eq!(from_hexadecimal("4F"), Ok(0x4f));
        assert_eq!(from_hexadecimal("4f"), Ok(0x4f)); // Lower case works
        assert_eq!(from_hexadecimal("ffff"), Ok(0xffff)); // Upper boundary
        assert!(from_hexadecimal("10000").is_err()); // Out of bounds
        assert!(from_hexadecimal("foo").is_err());
    }

    #[test]
    fn take_hexadecimal_literal_test() {
        assert_eq!(take_hexadecimal_literal("0x4F"), Ok(("", "4F")));
        assert_eq!(take_hexadecimal_literal("0X4f"), Ok(("", "4f")));
        assert!(take_hexadecimal_literal("0xzz").is_err()); // Invalid
        assert!(take_hexadecimal_literal("ffff").is_err()); // No prefix
    }

    #[test]
    fn take_binary_literal_test() {
        assert_eq!(take_binary_literal("0b10"), Ok(("", "10")));
        assert_eq!(take_binary_literal("0B10"), Ok(("", "10")));
        assert!(take_binary_literal("0binvalid").is_err()); // Invalid
        assert!(take_binary_literal("10").is_err()); // No prefix
    }

    #[test]
    fn parse_literal_test() {
        // Decimal
        assert_eq!(parse_literal("100"), Ok(("", 100)));
        assert_eq!(parse_literal("65535"), Ok(("", 0xffff))); // Upper bound
        assert!(parse_literal("65536").is_err()); // Out of bounds

        // Hexadecimal
        assert_eq!(parse_literal("0x4f"), Ok(("", 0x4f)));
        assert_eq!(parse_literal("0xffff"), Ok(("", 0xffff))); // Upper bound

        // Binary
        assert_eq!(parse_literal("0b10"), Ok(("", 2)));
        assert_eq!(parse_literal("0b1111111111111111"), Ok(("", 0xffff))); // Upper bound
    }
}
