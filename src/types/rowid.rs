//! Physical ROWID codec
//!
//! A physical ROWID addresses a row by four fields. Its textual form is 18
//! characters: each field is written independently, right to left, six bits
//! per character, into a fixed-width slot of 6, 3, 6 and 3 characters.
//!
//! ```text
//! OOOOOO FFF BBBBBB RRR
//! rba    part block  slot
//! ```

use std::fmt;
use std::str::FromStr;

use crate::buffer::ReadBuffer;
use crate::constants::MAX_ROWID_LENGTH;
use crate::error::{Error, Result};

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const RBA_CHARS: usize = 6;
const PARTITION_CHARS: usize = 3;
const BLOCK_CHARS: usize = 6;
const SLOT_CHARS: usize = 3;

/// Decoded physical ROWID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RowId {
    /// Relative block address (data object number)
    pub rba: u32,
    /// Partition id (relative file number)
    pub partition_id: u16,
    /// Block number within the data file
    pub block_num: u32,
    /// Slot number within the block
    pub slot_num: u16,
}

impl RowId {
    /// Create a new ROWID
    pub fn new(rba: u32, partition_id: u16, block_num: u32, slot_num: u16) -> Self {
        Self {
            rba,
            partition_id,
            block_num,
            slot_num,
        }
    }

    /// An all-zero ROWID means "no row"
    pub fn is_null(&self) -> bool {
        self.rba == 0 && self.partition_id == 0 && self.block_num == 0 && self.slot_num == 0
    }

    /// Encode to the 18-character text form, or `None` for the all-zero ROWID
    pub fn encode(&self) -> Option<String> {
        if self.is_null() {
            return None;
        }
        let mut out = [0u8; MAX_ROWID_LENGTH];
        let mut offset = 0;
        for (value, width) in [
            (self.rba as u64, RBA_CHARS),
            (self.partition_id as u64, PARTITION_CHARS),
            (self.block_num as u64, BLOCK_CHARS),
            (self.slot_num as u64, SLOT_CHARS),
        ] {
            convert_base64(&mut out[offset..offset + width], value);
            offset += width;
        }
        // every byte comes from the ASCII alphabet
        Some(out.iter().map(|&b| b as char).collect())
    }

    /// Read the wire form: ub4 rba, ub2 partition, one skipped byte, ub4
    /// block, ub2 slot
    pub fn read(buf: &mut ReadBuffer) -> Result<Self> {
        let rba = buf.read_ub4()?;
        let partition_id = buf.read_ub2()?;
        buf.skip_ub1()?;
        let block_num = buf.read_ub4()?;
        let slot_num = buf.read_ub2()?;
        Ok(Self::new(rba, partition_id, block_num, slot_num))
    }

    /// Decode the fixed-width binary form used inside UROWID values:
    /// a type byte of 1 followed by big-endian rba, partition, block, slot
    pub fn from_physical_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < 13 || data[0] != 1 {
            return Err(Error::DataConversion(format!(
                "not a physical ROWID ({} bytes)",
                data.len()
            )));
        }
        Ok(Self::new(
            u32::from_be_bytes([data[1], data[2], data[3], data[4]]),
            u16::from_be_bytes([data[5], data[6]]),
            u32::from_be_bytes([data[7], data[8], data[9], data[10]]),
            u16::from_be_bytes([data[11], data[12]]),
        ))
    }
}

/// Write `value` into `field` right to left, six bits per character
fn convert_base64(field: &mut [u8], mut value: u64) {
    for slot in field.iter_mut().rev() {
        *slot = ALPHABET[(value & 0x3f) as usize];
        value >>= 6;
    }
}

fn parse_base64(field: &[u8]) -> Result<u64> {
    field.iter().try_fold(0u64, |acc, &c| {
        let digit = ALPHABET
            .iter()
            .position(|&a| a == c)
            .ok_or_else(|| Error::DataConversion(format!("invalid ROWID character {:?}", c as char)))?;
        Ok((acc << 6) | digit as u64)
    })
}

impl FromStr for RowId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != MAX_ROWID_LENGTH {
            return Err(Error::DataConversion(format!(
                "ROWID must be {} characters, got {}",
                MAX_ROWID_LENGTH,
                bytes.len()
            )));
        }
        let (rba, rest) = bytes.split_at(RBA_CHARS);
        let (partition, rest) = rest.split_at(PARTITION_CHARS);
        let (block, slot) = rest.split_at(BLOCK_CHARS);

        let field = |chars: &[u8], max: u64| -> Result<u64> {
            let value = parse_base64(chars)?;
            if value > max {
                return Err(Error::DataConversion(format!("ROWID field out of range: {}", value)));
            }
            Ok(value)
        };

        Ok(RowId::new(
            field(rba, u32::MAX as u64)? as u32,
            field(partition, u16::MAX as u64)? as u16,
            field(block, u32::MAX as u64)? as u32,
            field(slot, u16::MAX as u64)? as u16,
        ))
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.encode() {
            Some(s) => f.write_str(&s),
            None => f.write_str("NULL"),
        }
    }
}
