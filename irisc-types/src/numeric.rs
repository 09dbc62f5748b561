//! Numeric literal parsing shared by the assembler and the sweep layer.
//!
//! Literals are decimal or `0x`-prefixed hexadecimal, with an optional
//! leading `-`. The accepted domain is the union of `i64` and `u64`;
//! negative values are returned in two's complement.

use thiserror::Error;

/// Failure to interpret a numeric literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumberError {
    /// The literal is not a well-formed decimal or hexadecimal number.
    #[error("malformed number: `{0}`")]
    Malformed(String),

    /// The literal does not fit the requested width.
    #[error("number out of range: `{0}`")]
    OutOfRange(String),
}

/// Parse a decimal or `0x` hexadecimal literal into its two's complement
/// `u64` representation.
pub fn parse_number(s: &str) -> Result<u64, NumberError> {
    let malformed = || NumberError::Malformed(s.to_string());

    if let Some(rest) = s.strip_prefix('-') {
        let magnitude = if let Some(hex) = rest.strip_prefix("0x") {
            i64::from_str_radix(hex, 16)
        } else {
            rest.parse::<i64>()
        }
        .map_err(|_| malformed())?;

        Ok(magnitude.wrapping_neg() as u64)
    } else if let Some(hex) = s.strip_prefix("0x") {
        u64::from_str_radix(hex, 16).map_err(|_| malformed())
    } else {
        s.parse::<u64>().map_err(|_| malformed())
    }
}

/// Parse a non-negative literal that must fit in 32 bits, such as a base
/// address.
pub fn parse_u32(s: &str) -> Result<u32, NumberError> {
    let value = parse_number(s)?;
    u32::try_from(value).map_err(|_| NumberError::OutOfRange(s.to_string()))
}
