//! Write buffer for encoding TNS protocol data

use bytes::{BufMut, Bytes, BytesMut};

use crate::constants::length;
use crate::error::{Error, Result};

/// Largest chunk written for long length-prefixed data
const CHUNK_SIZE: usize = 32767;

/// A buffer for writing TNS protocol data
#[derive(Debug)]
pub struct WriteBuffer {
    data: BytesMut,
    max_capacity: Option<usize>,
}

impl WriteBuffer {
    /// Create a new WriteBuffer with default capacity
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create a new WriteBuffer with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(capacity),
            max_capacity: None,
        }
    }

    /// Create a WriteBuffer that refuses to grow past `max_capacity` bytes
    pub fn with_max_capacity(max_capacity: usize) -> Self {
        Self {
            data: BytesMut::with_capacity(max_capacity),
            max_capacity: Some(max_capacity),
        }
    }

    /// Number of bytes written so far
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if nothing has been written
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// View the written bytes
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Freeze into immutable bytes
    pub fn freeze(self) -> Bytes {
        self.data.freeze()
    }

    #[inline]
    fn ensure_capacity(&self, n: usize) -> Result<()> {
        if let Some(max) = self.max_capacity {
            if self.data.len() + n > max {
                return Err(Error::BufferOverflow {
                    needed: n,
                    available: max.saturating_sub(self.data.len()),
                });
            }
        }
        Ok(())
    }

    // =========================================================================
    // Raw writes
    // =========================================================================

    /// Write a single byte
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.ensure_capacity(1)?;
        self.data.put_u8(value);
        Ok(())
    }

    /// Write raw bytes
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_capacity(bytes.len())?;
        self.data.put_slice(bytes);
        Ok(())
    }

    /// Write a big-endian u16
    pub fn write_u16_be(&mut self, value: u16) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    /// Write a big-endian u32
    pub fn write_u32_be(&mut self, value: u32) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    /// Write a big-endian u64
    pub fn write_u64_be(&mut self, value: u64) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    // =========================================================================
    // TTC variable-length integers
    // =========================================================================

    /// Write a UB1
    #[inline]
    pub fn write_ub1(&mut self, value: u8) -> Result<()> {
        self.write_u8(value)
    }

    /// Write the minimal length byte plus big-endian bytes of `value`
    fn write_ub_value(&mut self, value: u64) -> Result<()> {
        let len = match value {
            0 => return self.write_u8(0),
            1..=0xff => 1,
            0x100..=0xffff => 2,
            0x1_0000..=0xffff_ffff => 4,
            _ => 8,
        };
        self.write_u8(len as u8)?;
        self.write_bytes(&value.to_be_bytes()[8 - len..])
    }

    /// Write a UB2
    pub fn write_ub2(&mut self, value: u16) -> Result<()> {
        self.write_ub_value(value as u64)
    }

    /// Write a UB4
    pub fn write_ub4(&mut self, value: u32) -> Result<()> {
        self.write_ub_value(value as u64)
    }

    /// Write a UB8
    pub fn write_ub8(&mut self, value: u64) -> Result<()> {
        self.write_ub_value(value)
    }

    // =========================================================================
    // Length-prefixed byte sequences
    // =========================================================================

    /// Write a length-prefixed byte sequence
    ///
    /// `None` is written as the NULL indicator. Data longer than 252 bytes is
    /// written in chunks after the long indicator, terminated by a zero chunk.
    pub fn write_bytes_with_length(&mut self, bytes: Option<&[u8]>) -> Result<()> {
        let Some(data) = bytes else {
            return self.write_u8(length::NULL_INDICATOR);
        };
        if data.len() <= length::MAX_SHORT as usize {
            self.write_u8(data.len() as u8)?;
            return self.write_bytes(data);
        }
        self.write_u8(length::LONG_INDICATOR)?;
        for chunk in data.chunks(CHUNK_SIZE) {
            self.write_ub4(chunk.len() as u32)?;
            self.write_bytes(chunk)?;
        }
        self.write_ub4(0)
    }

    /// Write a length-prefixed UTF-8 string
    pub fn write_string_with_length(&mut self, s: Option<&str>) -> Result<()> {
        self.write_bytes_with_length(s.map(str::as_bytes))
    }

    /// Overwrite a big-endian u16 at `pos`
    pub fn patch_u16_be(&mut self, pos: usize, value: u16) -> Result<()> {
        self.patch(pos, &value.to_be_bytes())
    }

    /// Overwrite a big-endian u32 at `pos`
    pub fn patch_u32_be(&mut self, pos: usize, value: u32) -> Result<()> {
        self.patch(pos, &value.to_be_bytes())
    }

    fn patch(&mut self, pos: usize, bytes: &[u8]) -> Result<()> {
        if pos + bytes.len() > self.data.len() {
            return Err(Error::BufferOverflow {
                needed: bytes.len(),
                available: self.data.len().saturating_sub(pos),
            });
        }
        self.data[pos..pos + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

impl Default for WriteBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<[u8]> for WriteBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
