//! Fetch request
//!
//! Asks the server for the next batch of rows from an open cursor. The
//! response is handled by [`ResponseProcessor`](super::ResponseProcessor).

use bytes::Bytes;

use crate::buffer::WriteBuffer;
use crate::constants::{FunctionCode, MessageType};
use crate::error::Result;
use crate::packet::Packet;

/// Write the header shared by all TTC function calls
pub(crate) fn write_function_header(
    buf: &mut WriteBuffer,
    function: FunctionCode,
    sequence: u8,
) -> Result<()> {
    buf.write_u8(MessageType::Function.code())?;
    buf.write_u8(function as u8)?;
    buf.write_u8(sequence)
}

/// Fetch message to retrieve rows from a cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchMessage {
    cursor_id: u16,
    num_rows: u32,
    sequence: u8,
}

impl FetchMessage {
    /// Create a new fetch message
    pub fn new(cursor_id: u16, num_rows: u32) -> Self {
        Self {
            cursor_id,
            num_rows,
            sequence: 0,
        }
    }

    /// Set the call sequence number
    pub fn with_sequence(mut self, sequence: u8) -> Self {
        self.sequence = sequence;
        self
    }

    /// Get the cursor ID
    pub fn cursor_id(&self) -> u16 {
        self.cursor_id
    }

    /// Get the number of rows to fetch
    pub fn num_rows(&self) -> u32 {
        self.num_rows
    }

    /// Encode the TTC message
    pub fn encode(&self, buf: &mut WriteBuffer) -> Result<()> {
        write_function_header(buf, FunctionCode::Fetch, self.sequence)?;
        buf.write_ub4(self.cursor_id as u32)?;
        buf.write_ub4(self.num_rows)
    }

    /// Build the complete DATA packet
    pub fn build_request(&self, large_sdu: bool) -> Result<Bytes> {
        let mut buf = WriteBuffer::new();
        self.encode(&mut buf)?;
        Packet::data(0, buf.as_slice(), large_sdu)
    }
}
