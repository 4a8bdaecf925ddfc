//! LOB locator interpretation
//!
//! A LOB column arrives as an opaque locator. Besides identifying the value on
//! the server, the locator's flag bytes describe it: temporary or persistent,
//! initialized, and whether its character data is stored in a variable-length
//! charset (UTF-16) rather than the database charset.

use bytes::Bytes;

use crate::buffer::ReadBuffer;
use crate::constants::{csfrm, lob_flags, OracleType};
use crate::error::{Error, Result};

/// Character encoding of CLOB/NCLOB contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobEncoding {
    /// UTF-8 (database charset)
    Utf8,
    /// Big-endian UTF-16
    Utf16,
}

impl LobEncoding {
    /// IANA-style name of the encoding
    pub fn name(&self) -> &'static str {
        match self {
            LobEncoding::Utf8 => "UTF-8",
            LobEncoding::Utf16 => "UTF-16BE",
        }
    }
}

/// Determine the encoding of a LOB's character data
///
/// National-charset columns are always UTF-16. Otherwise the variable-length
/// charset bit in flag byte 3 decides; a locator too short to contain that
/// byte is never indexed and reads as UTF-8.
pub fn locator_encoding(locator: &[u8], charset_form: u8) -> LobEncoding {
    if charset_form == csfrm::NCHAR {
        return LobEncoding::Utf16;
    }
    if locator.len() > lob_flags::LOC_OFFSET_FLAG_3
        && locator[lob_flags::LOC_OFFSET_FLAG_3] & lob_flags::LOC_FLAGS_VAR_LENGTH_CHARSET != 0
    {
        return LobEncoding::Utf16;
    }
    LobEncoding::Utf8
}

/// LOB locator - holds the reference to a LOB stored in the database
#[derive(Debug, Clone, PartialEq)]
pub struct LobLocator {
    locator: Bytes,
    size: u64,
    chunk_size: u32,
    oracle_type: OracleType,
    charset_form: u8,
}

impl LobLocator {
    /// Wrap raw locator bytes received from the server
    ///
    /// Creating a LOB without a server-issued locator (for example to bind a
    /// value too large to send inline) is not supported and reported as
    /// [`Error::Unsupported`].
    pub fn new(
        locator: Bytes,
        size: u64,
        chunk_size: u32,
        oracle_type: OracleType,
        charset_form: u8,
    ) -> Result<Self> {
        if locator.is_empty() {
            return Err(Error::Unsupported(format!(
                "creating a {} without a locator",
                oracle_type.name(charset_form)
            )));
        }
        Ok(Self {
            locator,
            size,
            chunk_size,
            oracle_type,
            charset_form,
        })
    }

    /// Read a LOB column value from row data
    ///
    /// Layout: ub4 byte count (0 means NULL), then for everything but BFILE a
    /// ub8 size and ub4 chunk size, then the length-prefixed locator.
    pub fn read(buf: &mut ReadBuffer, oracle_type: OracleType, charset_form: u8) -> Result<Option<Self>> {
        if buf.read_ub4()? == 0 {
            return Ok(None);
        }
        let (size, chunk_size) = if oracle_type == OracleType::Bfile {
            (0, 0)
        } else {
            (buf.read_ub8()?, buf.read_ub4()?)
        };
        match buf.read_bytes_with_length()? {
            None => Ok(None),
            Some(locator) => Self::new(locator, size, chunk_size, oracle_type, charset_form).map(Some),
        }
    }

    /// Size of the LOB in bytes (BLOB) or characters (CLOB)
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Chunk size for read/write operations
    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// Oracle type of the column
    pub fn oracle_type(&self) -> OracleType {
        self.oracle_type
    }

    /// Charset form of the column
    pub fn charset_form(&self) -> u8 {
        self.charset_form
    }

    /// Raw locator bytes
    pub fn locator_bytes(&self) -> &Bytes {
        &self.locator
    }

    fn flag(&self, offset: usize, mask: u8) -> bool {
        self.locator.get(offset).is_some_and(|b| b & mask != 0)
    }

    /// Check if the locator is initialized
    pub fn is_initialized(&self) -> bool {
        self.flag(lob_flags::LOC_OFFSET_FLAG_2, lob_flags::LOC_FLAGS_INIT)
    }

    /// Check if this is a temporary LOB
    pub fn is_temporary(&self) -> bool {
        self.flag(lob_flags::LOC_OFFSET_FLAG_4, lob_flags::LOC_FLAGS_TEMP)
    }

    /// Check if the locator itself says it refers to binary data
    pub fn is_binary(&self) -> bool {
        self.flag(lob_flags::LOC_OFFSET_FLAG_1, lob_flags::LOC_FLAGS_BLOB)
    }

    /// Encoding of this LOB's character data
    pub fn encoding(&self) -> LobEncoding {
        locator_encoding(&self.locator, self.charset_form)
    }
}
