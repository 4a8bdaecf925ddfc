//! TNS packet framing
//!
//! Splits a byte stream into packets (8-byte header plus payload) and exposes
//! the TTC message bytes carried by DATA packets. Socket setup lives outside
//! this crate; [`read_packet`] accepts anything implementing
//! [`tokio::io::AsyncRead`].

mod header;

pub use header::PacketHeader;

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

use crate::buffer::WriteBuffer;
use crate::constants::{data_flags, PacketType, PACKET_HEADER_SIZE};
use crate::error::{Error, Result};

/// A complete TNS packet with header and payload
#[derive(Debug, Clone)]
pub struct Packet {
    /// The packet header
    pub header: PacketHeader,
    /// Everything after the 8-byte header
    pub payload: Bytes,
}

impl Packet {
    /// Split a complete packet into header and payload
    pub fn from_bytes(data: Bytes, large_sdu: bool) -> Result<Self> {
        let header = PacketHeader::parse(&data, large_sdu)?;
        let total = header.length as usize;
        if data.len() < total {
            return Err(Error::PacketTooShort {
                expected: total,
                actual: data.len(),
            });
        }
        Ok(Self {
            header,
            payload: data.slice(PACKET_HEADER_SIZE..total),
        })
    }

    /// Build a DATA packet around a TTC message payload
    pub fn data(data_flags: u16, message: &[u8], large_sdu: bool) -> Result<Bytes> {
        let length = (PACKET_HEADER_SIZE + 2 + message.len()) as u32;
        let mut buf = WriteBuffer::with_capacity(length as usize);
        PacketHeader::new(PacketType::Data, length).write(&mut buf, large_sdu)?;
        buf.write_u16_be(data_flags)?;
        buf.write_bytes(message)?;
        Ok(buf.freeze())
    }

    /// Get the packet type
    pub fn packet_type(&self) -> PacketType {
        self.header.packet_type
    }

    /// Check if this is a DATA packet
    pub fn is_data(&self) -> bool {
        self.header.packet_type == PacketType::Data
    }

    /// Data flags of a DATA packet
    pub fn data_flags(&self) -> Result<u16> {
        self.expect_data()?;
        Ok(u16::from_be_bytes([self.payload[0], self.payload[1]]))
    }

    /// TTC message bytes of a DATA packet (payload without the data flags)
    pub fn data_payload(&self) -> Result<Bytes> {
        self.expect_data()?;
        Ok(self.payload.slice(2..))
    }

    /// Whether the server flagged end-of-file on this DATA packet
    pub fn is_eof(&self) -> bool {
        self.data_flags()
            .map(|flags| flags & data_flags::EOF != 0)
            .unwrap_or(false)
    }

    fn expect_data(&self) -> Result<()> {
        if !self.is_data() {
            return Err(Error::Protocol(format!(
                "expected DATA packet, got {}",
                self.header.packet_type
            )));
        }
        if self.payload.len() < 2 {
            return Err(Error::PacketTooShort {
                expected: PACKET_HEADER_SIZE + 2,
                actual: PACKET_HEADER_SIZE + self.payload.len(),
            });
        }
        Ok(())
    }
}

/// Read from `reader` until `buf` is full or the stream ends
async fn read_full<R>(reader: &mut R, buf: &mut [u8]) -> Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Read one packet from a byte stream
///
/// A stream that ends before the first header byte yields
/// [`Error::ConnectionClosed`]; one that ends inside a packet yields
/// [`Error::PacketTooShort`].
pub async fn read_packet<R>(reader: &mut R, large_sdu: bool) -> Result<Packet>
where
    R: AsyncRead + Unpin,
{
    let mut header_bytes = [0u8; PACKET_HEADER_SIZE];
    let got = read_full(reader, &mut header_bytes).await?;
    if got == 0 {
        return Err(Error::ConnectionClosed);
    }
    if got < PACKET_HEADER_SIZE {
        return Err(Error::PacketTooShort {
            expected: PACKET_HEADER_SIZE,
            actual: got,
        });
    }

    let header = PacketHeader::parse(&header_bytes, large_sdu)?;
    let mut payload = vec![0u8; header.payload_length()];
    let got = read_full(reader, &mut payload).await?;
    if got < payload.len() {
        return Err(Error::PacketTooShort {
            expected: header.length as usize,
            actual: PACKET_HEADER_SIZE + got,
        });
    }

    trace!(
        packet_type = header.packet_type.name(),
        length = header.length,
        "received packet"
    );

    Ok(Packet {
        header,
        payload: Bytes::from(payload),
    })
}
