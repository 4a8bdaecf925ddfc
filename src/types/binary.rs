//! BINARY_FLOAT and BINARY_DOUBLE decoding
//!
//! Values are big-endian IEEE 754 with the sign handling changed so that the
//! bytes sort correctly: positive values have the sign bit set, negative
//! values have every bit inverted.

use crate::error::{Error, Result};

fn fixed<const N: usize>(data: &[u8], name: &str) -> Result<[u8; N]> {
    data.get(..N)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| Error::DataConversion(format!("{} requires {} bytes, got {}", name, N, data.len())))
}

/// Decode a 4-byte BINARY_FLOAT
pub fn decode_binary_float(data: &[u8]) -> Result<f32> {
    let bits = u32::from_be_bytes(fixed::<4>(data, "BINARY_FLOAT")?);
    let bits = if bits & 0x8000_0000 != 0 {
        bits & 0x7fff_ffff
    } else {
        !bits
    };
    Ok(f32::from_bits(bits))
}

/// Decode an 8-byte BINARY_DOUBLE
pub fn decode_binary_double(data: &[u8]) -> Result<f64> {
    let bits = u64::from_be_bytes(fixed::<8>(data, "BINARY_DOUBLE")?);
    let bits = if bits & 0x8000_0000_0000_0000 != 0 {
        bits & 0x7fff_ffff_ffff_ffff
    } else {
        !bits
    };
    Ok(f64::from_bits(bits))
}
