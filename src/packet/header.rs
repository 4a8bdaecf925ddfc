//! TNS packet header encoding/decoding
//!
//! The TNS packet header is 8 bytes:
//!
//! ```text
//! +--------+--------+--------+--------+--------+--------+--------+--------+
//! | Length (2 or 4) | Pkt Checksum(2) | Type(1)| Flags(1)| Hdr Checksum(2)|
//! +--------+--------+--------+--------+--------+--------+--------+--------+
//! ```
//!
//! Once a large SDU has been negotiated (protocol 315+) the length occupies all
//! four leading bytes and there is no packet checksum.

use bytes::Bytes;

use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::constants::{PacketType, PACKET_HEADER_SIZE};
use crate::error::{Error, Result};

/// TNS packet header (8 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Total packet length including header
    pub length: u32,
    /// Packet type
    pub packet_type: PacketType,
    /// Packet flags
    pub flags: u8,
}

impl PacketHeader {
    /// Create a new packet header
    pub fn new(packet_type: PacketType, length: u32) -> Self {
        Self {
            length,
            packet_type,
            flags: 0,
        }
    }

    /// Parse a header from the first 8 bytes of `data`
    pub fn parse(data: &[u8], large_sdu: bool) -> Result<Self> {
        if data.len() < PACKET_HEADER_SIZE {
            return Err(Error::PacketTooShort {
                expected: PACKET_HEADER_SIZE,
                actual: data.len(),
            });
        }
        let mut buf = ReadBuffer::from_slice(&data[..PACKET_HEADER_SIZE]);
        Self::read(&mut buf, large_sdu)
    }

    /// Read a header from a buffer
    ///
    /// An unknown packet type aborts decoding: packet layout depends on the
    /// type, so the packet cannot be skipped generically.
    pub fn read(buf: &mut ReadBuffer, large_sdu: bool) -> Result<Self> {
        let length = if large_sdu {
            buf.read_u32_be()?
        } else {
            let len = buf.read_u16_be()? as u32;
            buf.skip(2)?; // packet checksum
            len
        };
        let packet_type = PacketType::try_from(buf.read_u8()?)?;
        let flags = buf.read_u8()?;
        buf.skip(2)?; // header checksum

        if (length as usize) < PACKET_HEADER_SIZE {
            return Err(Error::PacketTooShort {
                expected: PACKET_HEADER_SIZE,
                actual: length as usize,
            });
        }

        Ok(Self {
            length,
            packet_type,
            flags,
        })
    }

    /// Write the header to a buffer
    pub fn write(&self, buf: &mut WriteBuffer, large_sdu: bool) -> Result<()> {
        if large_sdu {
            buf.write_u32_be(self.length)?;
        } else {
            let length = u16::try_from(self.length).map_err(|_| {
                Error::Protocol(format!(
                    "packet length {} does not fit a small-SDU header",
                    self.length
                ))
            })?;
            buf.write_u16_be(length)?;
            buf.write_u16_be(0)?;
        }
        buf.write_u8(self.packet_type.code())?;
        buf.write_u8(self.flags)?;
        buf.write_u16_be(0)
    }

    /// Encode the header to bytes
    pub fn to_bytes(&self, large_sdu: bool) -> Result<Bytes> {
        let mut buf = WriteBuffer::with_capacity(PACKET_HEADER_SIZE);
        self.write(&mut buf, large_sdu)?;
        Ok(buf.freeze())
    }

    /// Payload length (total length minus header)
    pub fn payload_length(&self) -> usize {
        (self.length as usize).saturating_sub(PACKET_HEADER_SIZE)
    }
}
