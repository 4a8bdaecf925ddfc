//! Oracle NUMBER decoding
//!
//! A NUMBER is an exponent byte followed by up to 20 base-100 mantissa
//! digits. Positive values set the exponent's high bit and store each digit
//! plus one. Negative values invert the exponent byte, store `101 - digit`
//! and usually end in a 102 terminator.

use std::fmt;

use crate::error::{Error, Result};

/// Largest number of base-100 digits a NUMBER carries
const MAX_MANTISSA_BYTES: usize = 20;

/// Decoded Oracle NUMBER, kept in decimal text form so no precision is lost
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleNumber {
    /// Decimal representation
    pub value: String,
    /// Whether the number has no fractional part
    pub is_integer: bool,
    /// Whether this is the special -1e126 value
    pub is_max_negative: bool,
}

impl OracleNumber {
    /// Create a number from its decimal representation
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let is_integer = !value.contains('.');
        Self {
            value,
            is_integer,
            is_max_negative: false,
        }
    }

    /// Decimal text
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Convert to i64, failing for fractions and out-of-range values
    pub fn to_i64(&self) -> Result<i64> {
        if self.is_max_negative || !self.is_integer {
            return Err(Error::DataConversion(format!("{} is not an i64", self)));
        }
        self.value
            .parse()
            .map_err(|e| Error::DataConversion(format!("{} is not an i64: {}", self.value, e)))
    }

    /// Convert to f64, possibly losing precision
    pub fn to_f64(&self) -> Result<f64> {
        if self.is_max_negative {
            return Ok(-1e126);
        }
        self.value
            .parse()
            .map_err(|e| Error::DataConversion(format!("{} is not an f64: {}", self.value, e)))
    }
}

impl fmt::Display for OracleNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_max_negative {
            f.write_str("-1e126")
        } else {
            f.write_str(&self.value)
        }
    }
}

/// Decode a NUMBER from its wire bytes
pub fn decode_oracle_number(data: &[u8]) -> Result<OracleNumber> {
    let (&exponent_byte, mut mantissa) = data
        .split_first()
        .ok_or_else(|| Error::DataConversion("empty NUMBER".to_string()))?;
    let positive = exponent_byte & 0x80 != 0;

    if mantissa.is_empty() {
        return Ok(if positive {
            OracleNumber::new("0")
        } else {
            OracleNumber {
                value: String::new(),
                is_integer: false,
                is_max_negative: true,
            }
        });
    }

    if !positive && mantissa.last() == Some(&102) {
        mantissa = &mantissa[..mantissa.len() - 1];
    }
    if mantissa.len() > MAX_MANTISSA_BYTES {
        return Err(Error::DataConversion(format!(
            "NUMBER mantissa of {} bytes",
            mantissa.len()
        )));
    }

    let exponent = if positive {
        exponent_byte as i32 - 193
    } else {
        (!exponent_byte) as i32 - 193
    };

    let mut digits = String::with_capacity(mantissa.len() * 2);
    for &byte in mantissa {
        let pair = if positive {
            byte.wrapping_sub(1)
        } else {
            101u8.wrapping_sub(byte)
        };
        if pair > 99 {
            return Err(Error::DataConversion(format!("invalid NUMBER digit byte {}", byte)));
        }
        digits.push(char::from(b'0' + pair / 10));
        digits.push(char::from(b'0' + pair % 10));
    }

    // position of the decimal point within `digits`
    let point = (exponent + 1) * 2;
    let (int_part, frac_part) = if point <= 0 {
        (String::new(), "0".repeat((-point) as usize) + &digits)
    } else if point as usize >= digits.len() {
        let zeros = "0".repeat(point as usize - digits.len());
        (digits + &zeros, String::new())
    } else {
        let (i, f) = digits.split_at(point as usize);
        (i.to_string(), f.to_string())
    };

    let int_part = int_part.trim_start_matches('0');
    let frac_part = frac_part.trim_end_matches('0');

    let mut value = String::with_capacity(int_part.len() + frac_part.len() + 3);
    if !positive {
        value.push('-');
    }
    value.push_str(if int_part.is_empty() { "0" } else { int_part });
    if !frac_part.is_empty() {
        value.push('.');
        value.push_str(frac_part);
    }

    Ok(OracleNumber {
        value,
        is_integer: frac_part.is_empty(),
        is_max_negative: false,
    })
}
