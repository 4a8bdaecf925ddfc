//! Read buffer for decoding TNS protocol data
//!
//! A cursor over an immutable [`Bytes`] payload. Integer reads follow the TTC
//! variable-length conventions (a length byte followed by that many big-endian
//! bytes); byte sequences use the single-byte length prefix with the reserved
//! NULL, escape and chunked sentinels.

use bytes::Bytes;
use tracing::warn;

use crate::constants::{csfrm, length};
use crate::error::{Error, Result};

/// A buffer for reading TNS protocol data
#[derive(Debug, Clone)]
pub struct ReadBuffer {
    data: Bytes,
    pos: usize,
}

impl ReadBuffer {
    /// Create a new ReadBuffer from bytes
    pub fn new(data: Bytes) -> Self {
        Self { data, pos: 0 }
    }

    /// Create a new ReadBuffer from a byte slice
    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    /// Current read position
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total length of the underlying data
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer holds no data at all
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of bytes left to read
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Check if there are at least `n` bytes remaining
    #[inline]
    pub fn has_remaining(&self, n: usize) -> bool {
        self.remaining() >= n
    }

    /// Unread part of the buffer
    #[inline]
    pub fn remaining_slice(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    /// Skip `n` bytes
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure_remaining(n)?;
        self.pos += n;
        Ok(())
    }

    #[inline]
    fn ensure_remaining(&self, n: usize) -> Result<()> {
        if self.remaining() < n {
            Err(Error::BufferUnderflow {
                needed: n,
                available: self.remaining(),
            })
        } else {
            Ok(())
        }
    }

    // =========================================================================
    // Raw reads
    // =========================================================================

    /// Read a single byte
    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure_remaining(1)?;
        let value = self.data[self.pos];
        self.pos += 1;
        Ok(value)
    }

    /// Peek at the next byte without consuming it
    pub fn peek_u8(&self) -> Result<u8> {
        self.ensure_remaining(1)?;
        Ok(self.data[self.pos])
    }

    /// Read `n` bytes as a zero-copy slice of the underlying buffer
    pub fn read_bytes(&mut self, n: usize) -> Result<Bytes> {
        self.ensure_remaining(n)?;
        let bytes = self.data.slice(self.pos..self.pos + n);
        self.pos += n;
        Ok(bytes)
    }

    /// Read `n` bytes into a new Vec
    pub fn read_bytes_vec(&mut self, n: usize) -> Result<Vec<u8>> {
        Ok(self.read_bytes(n)?.to_vec())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.ensure_remaining(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[self.pos..self.pos + N]);
        self.pos += N;
        Ok(out)
    }

    /// Read a big-endian u16
    pub fn read_u16_be(&mut self) -> Result<u16> {
        self.read_array().map(u16::from_be_bytes)
    }

    /// Read a big-endian i16
    pub fn read_i16_be(&mut self) -> Result<i16> {
        self.read_array().map(i16::from_be_bytes)
    }

    /// Read a big-endian u32
    pub fn read_u32_be(&mut self) -> Result<u32> {
        self.read_array().map(u32::from_be_bytes)
    }

    /// Read a big-endian u64
    pub fn read_u64_be(&mut self) -> Result<u64> {
        self.read_array().map(u64::from_be_bytes)
    }

    // =========================================================================
    // TTC variable-length integers
    // =========================================================================

    /// Read a UB1
    #[inline]
    pub fn read_ub1(&mut self) -> Result<u8> {
        self.read_u8()
    }

    /// Read the length byte of a UBn value; the high bit carries the sign
    fn read_ub_length(&mut self) -> Result<(u8, bool)> {
        let len = self.read_u8()?;
        Ok((len & 0x7f, len & 0x80 != 0))
    }

    fn read_ub_value(&mut self, max_len: u8) -> Result<(u64, bool)> {
        let (len, negative) = self.read_ub_length()?;
        if len > max_len {
            return Err(Error::InvalidLengthIndicator(len));
        }
        let mut value = 0u64;
        for b in self.read_bytes(len as usize)?.iter() {
            value = (value << 8) | *b as u64;
        }
        Ok((value, negative))
    }

    /// Sign-and-magnitude value of at most four bytes
    fn read_sb_value(&mut self, max_len: u8) -> Result<i64> {
        let (magnitude, negative) = self.read_ub_value(max_len)?;
        let magnitude = magnitude as i64;
        Ok(if negative { -magnitude } else { magnitude })
    }

    /// Read a UB2 (length byte followed by up to 2 big-endian bytes)
    pub fn read_ub2(&mut self) -> Result<u16> {
        self.read_ub_value(2).map(|(v, _)| v as u16)
    }

    /// Read an SB2; the sign travels in the length byte
    pub fn read_sb2(&mut self) -> Result<i16> {
        let value = self.read_sb_value(2)?;
        i16::try_from(value)
            .map_err(|_| Error::DataConversion(format!("SB2 value {} out of range", value)))
    }

    /// Read a UB4 (length byte followed by up to 4 big-endian bytes)
    pub fn read_ub4(&mut self) -> Result<u32> {
        self.read_ub_value(4).map(|(v, _)| v as u32)
    }

    /// Read an SB4; the sign travels in the length byte
    pub fn read_sb4(&mut self) -> Result<i32> {
        let value = self.read_sb_value(4)?;
        i32::try_from(value)
            .map_err(|_| Error::DataConversion(format!("SB4 value {} out of range", value)))
    }

    /// Read a UB8 (length byte followed by up to 8 big-endian bytes)
    pub fn read_ub8(&mut self) -> Result<u64> {
        self.read_ub_value(8).map(|(v, _)| v)
    }

    /// Skip a UB1
    pub fn skip_ub1(&mut self) -> Result<()> {
        self.skip(1)
    }

    /// Skip a UB2
    pub fn skip_ub2(&mut self) -> Result<()> {
        self.read_ub_value(2).map(|_| ())
    }

    /// Skip a UB4
    pub fn skip_ub4(&mut self) -> Result<()> {
        self.read_ub_value(4).map(|_| ())
    }

    /// Skip a UB8
    pub fn skip_ub8(&mut self) -> Result<()> {
        self.read_ub_value(8).map(|_| ())
    }

    // =========================================================================
    // Length-prefixed byte sequences
    // =========================================================================

    /// Read chunks of `ub4 length + bytes` until a zero-length chunk
    fn read_chunks(&mut self) -> Result<Bytes> {
        let mut result = Vec::new();
        loop {
            let chunk_len = self.read_ub4()? as usize;
            if chunk_len == 0 {
                break;
            }
            result.extend_from_slice(&self.read_bytes(chunk_len)?);
        }
        Ok(Bytes::from(result))
    }

    /// Read a length-prefixed byte sequence
    ///
    /// Returns None for the NULL indicator (255). A length of 254 introduces
    /// chunked data; 253 escapes a length byte that would collide with the
    /// sentinels.
    pub fn read_bytes_with_length(&mut self) -> Result<Option<Bytes>> {
        let len = self.read_u8()?;
        match len {
            length::NULL_INDICATOR => Ok(None),
            length::LONG_INDICATOR => self.read_chunks().map(Some),
            length::ESCAPE_CHAR => {
                let actual = self.read_u8()? as usize;
                self.read_bytes(actual).map(Some)
            }
            _ => self.read_bytes(len as usize).map(Some),
        }
    }

    /// Read a column value slice, where zero length also means NULL
    pub fn read_oracle_slice(&mut self) -> Result<Option<Bytes>> {
        match self.read_bytes_with_length()? {
            Some(bytes) if bytes.is_empty() => Ok(None),
            other => Ok(other),
        }
    }

    /// Read raw bytes whose first length byte may introduce chunked data
    pub fn read_raw_bytes_chunked(&mut self) -> Result<Bytes> {
        let len = self.read_u8()?;
        if len == length::LONG_INDICATOR {
            self.read_chunks()
        } else {
            self.read_bytes(len as usize)
        }
    }

    /// Skip raw bytes whose first length byte may introduce chunked data
    pub fn skip_raw_bytes_chunked(&mut self) -> Result<()> {
        self.read_raw_bytes_chunked().map(|_| ())
    }

    /// Read a length-prefixed UTF-8 string, failing on invalid UTF-8
    pub fn read_string_with_length(&mut self) -> Result<Option<String>> {
        match self.read_bytes_with_length()? {
            None => Ok(None),
            Some(bytes) => String::from_utf8(bytes.to_vec())
                .map(Some)
                .map_err(|e| Error::DataConversion(e.to_string())),
        }
    }

    /// Read a metadata string: a UB4 byte count, then a length-prefixed string
    /// when the count is nonzero
    pub fn read_string_with_ub4_length(&mut self) -> Result<Option<String>> {
        if self.read_ub4()? == 0 {
            return Ok(None);
        }
        self.read_string_with_length()
    }

    /// Read a length-prefixed string honoring the charset form
    ///
    /// Reads one length byte. A length of zero or the NULL indicator yields
    /// `None` without consuming anything further. Otherwise exactly that many
    /// bytes are read and decoded as UTF-8 for [`csfrm::IMPLICIT`] or as
    /// big-endian UTF-16 for any other form. Malformed text also yields `None`;
    /// callers that need strict validation must re-check the raw bytes.
    pub fn read_string_with_charset(&mut self, charset_form: u8) -> Result<Option<String>> {
        let len = self.read_u8()?;
        if len == 0 || len == length::NULL_INDICATOR {
            return Ok(None);
        }
        let bytes = self.read_bytes(len as usize)?;
        let decoded = decode_text(&bytes, charset_form);
        if decoded.is_none() {
            warn!(
                charset_form,
                len, "malformed string bytes for charset form, treating as NULL"
            );
        }
        Ok(decoded)
    }
}

/// Decode text bytes as UTF-8 (implicit form) or big-endian UTF-16
pub(crate) fn decode_text(bytes: &[u8], charset_form: u8) -> Option<String> {
    if charset_form == csfrm::IMPLICIT {
        return std::str::from_utf8(bytes).ok().map(str::to_owned);
    }
    if bytes.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).ok()
}

impl From<Bytes> for ReadBuffer {
    fn from(data: Bytes) -> Self {
        Self::new(data)
    }
}

impl From<Vec<u8>> for ReadBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self::new(Bytes::from(data))
    }
}

impl From<&[u8]> for ReadBuffer {
    fn from(data: &[u8]) -> Self {
        Self::from_slice(data)
    }
}
