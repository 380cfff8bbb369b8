//! Conversions from decimal literals to 8-bit instruction fields.
use regex::Regex;
use super::error::Error;

lazy_static! {
    static ref DECIMAL: Regex = Regex::new(r"^-?[0-9]+$").unwrap();
}

/// Parses a decimal literal operand. Only plain decimal integers with an
/// optional leading minus are accepted.
pub fn parse_decimal(token: &str, line: usize) -> Result<i64, Error> {
    if !DECIMAL.is_match(token) {
        return Err(Error::Encoding {
            line,
            value: token.to_owned(),
            reason: "not a decimal integer",
        });
    }

    token.parse::<i64>().map_err(|_| Error::Encoding {
        line,
        value: token.to_owned(),
        reason: "value does not fit in 64 bits",
    })
}

/// Encodes `value` as an 8-bit two's-complement field.
/// Values outside [-128, 127] are rejected.
pub fn encode_signed8(value: i64, line: usize) -> Result<u8, Error> {
    if value < i8::MIN as i64 || value > i8::MAX as i64 {
        return Err(Error::Encoding {
            line,
            value: value.to_string(),
            reason: "signed value must be in -128..=127",
        });
    }
    Ok(value as i8 as u8)
}

/// Encodes `value` as an 8-bit unsigned field. Addresses must be positive.
pub fn encode_unsigned8(value: i64, line: usize) -> Result<u8, Error> {
    if value < 0 {
        return Err(Error::Encoding {
            line,
            value: value.to_string(),
            reason: "address is negative",
        });
    }
    if value > u8::MAX as i64 {
        return Err(Error::Encoding {
            line,
            value: value.to_string(),
            reason: "address must be in 0..=255",
        });
    }
    Ok(value as u8)
}
