//! Response dispatch
//!
//! A server response to an execute or fetch call is a sequence of TTC
//! messages, each introduced by a one byte message type. The processor walks
//! them in order and applies each one to the cursor it was created for.

use bytes::Bytes;
use tracing::{debug, trace, warn};

use crate::buffer::ReadBuffer;
use crate::capabilities::Capabilities;
use crate::constants::{csfrm, error_code, MessageType};
use crate::cursor::Cursor;
use crate::error::{Error, OracleErrorInfo, Result};
use crate::messages::{parse_describe_info, parse_error_info};

/// Applies one server response to a cursor
///
/// The bit vector announced by ROW_HEADER or BIT_VECTOR applies to the next
/// ROW_DATA only; it is dropped once that row has been read.
pub struct ResponseProcessor<'a> {
    cursor: &'a mut Cursor,
    ttc_field_version: u8,
    end_of_response_marker: bool,
    bit_vector: Option<Bytes>,
    call_status: u32,
}

impl<'a> ResponseProcessor<'a> {
    /// Create a processor for a cursor on a connection with the given
    /// capabilities
    pub fn new(cursor: &'a mut Cursor, caps: &Capabilities) -> Self {
        Self {
            cursor,
            ttc_field_version: caps.ttc_field_version,
            end_of_response_marker: caps.supports_end_of_response(),
            bit_vector: None,
            call_status: 0,
        }
    }

    /// Process a response message stream (the DATA payload after its flags)
    ///
    /// A server error is returned only after the whole stream has been
    /// consumed, so row counts and the last ROWID are recorded either way.
    pub fn process(mut self, message: &[u8]) -> Result<()> {
        let mut buf = ReadBuffer::from_slice(message);
        let mut pending_error = None;
        self.cursor.begin_round_trip()?;

        while buf.remaining() > 0 {
            let message_type = MessageType::try_from(buf.read_u8()?)?;
            trace!(message_type = message_type.name(), remaining = buf.remaining(), "dispatch");

            match message_type {
                MessageType::DescribeInfo => {
                    buf.skip_raw_bytes_chunked()?;
                    let info = parse_describe_info(&mut buf, self.ttc_field_version)?;
                    self.cursor.apply_describe(info);
                }
                MessageType::RowHeader => self.process_row_header(&mut buf)?,
                MessageType::RowData => {
                    self.cursor.read_row(&mut buf, self.bit_vector.as_deref())?;
                    self.bit_vector = None;
                }
                MessageType::BitVector => {
                    buf.skip_ub2()?; // num columns sent
                    let num_bytes = self.cursor.num_columns().div_ceil(8);
                    self.bit_vector = Some(buf.read_bytes(num_bytes)?);
                }
                MessageType::Error => {
                    let info = parse_error_info(&mut buf, self.ttc_field_version)?;
                    if let Err(err) = self.apply_error_info(info) {
                        pending_error = Some(err);
                    }
                    if !self.end_of_response_marker {
                        break;
                    }
                }
                MessageType::Warning => self.process_warning(&mut buf)?,
                MessageType::Parameter => self.process_return_parameters(&mut buf)?,
                MessageType::Status => {
                    self.call_status = buf.read_ub4()?;
                    buf.skip_ub2()?; // end to end seq#
                }
                MessageType::EndOfResponse => break,
                other => {
                    return Err(Error::UnexpectedMessage {
                        message_type: other,
                        context: "cursor response",
                    })
                }
            }
        }

        debug!(
            rows = self.cursor.buffer_row_count(),
            more_rows = self.cursor.more_rows_to_fetch(),
            call_status = self.call_status,
            "response processed"
        );
        match pending_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn process_row_header(&mut self, buf: &mut ReadBuffer) -> Result<()> {
        buf.skip_ub1()?; // flags
        buf.skip_ub2()?; // num requests
        buf.skip_ub4()?; // iteration number
        buf.skip_ub4()?; // num iters
        buf.skip_ub2()?; // buffer length
        let num_bytes = buf.read_ub4()? as usize;
        if num_bytes > 0 {
            buf.skip_ub1()?; // repeated length
            self.bit_vector = Some(buf.read_bytes(num_bytes)?);
        }
        if buf.read_ub4()? > 0 {
            buf.skip_raw_bytes_chunked()?; // rxhrid
        }
        Ok(())
    }

    fn process_warning(&mut self, buf: &mut ReadBuffer) -> Result<()> {
        let code = buf.read_ub2()? as u32;
        let num_bytes = buf.read_ub2()?;
        buf.skip_ub2()?; // flags
        let message = if code != 0 && num_bytes > 0 {
            buf.read_string_with_charset(csfrm::IMPLICIT)?.unwrap_or_default()
        } else {
            String::new()
        };
        warn!(code, message = %message, "server warning");
        let mut info = OracleErrorInfo::new(code, message);
        info.is_warning = true;
        self.cursor.set_warning(info);
        Ok(())
    }

    fn process_return_parameters(&mut self, buf: &mut ReadBuffer) -> Result<()> {
        let num_params = buf.read_ub2()?; // al8o4l
        for _ in 0..num_params {
            buf.skip_ub4()?;
        }
        let al8txl = buf.read_ub2()?;
        if al8txl > 0 {
            buf.skip(al8txl as usize)?;
        }
        let num_pairs = buf.read_ub2()?;
        for _ in 0..num_pairs {
            buf.read_bytes_with_length()?; // text value
            buf.read_bytes_with_length()?; // binary value
            buf.skip_ub2()?; // keyword num
        }
        let num_bytes = buf.read_ub2()?; // registration
        if num_bytes > 0 {
            buf.skip(num_bytes as usize)?;
        }

        if self.cursor.dml_row_counts_requested() {
            let num_rows = buf.read_ub4()? as usize;
            let mut row_counts = Vec::with_capacity(num_rows);
            for _ in 0..num_rows {
                row_counts.push(buf.read_ub8()?);
            }
            self.cursor.set_dml_row_counts(row_counts);
        }
        Ok(())
    }

    fn apply_error_info(&mut self, info: OracleErrorInfo) -> Result<()> {
        if info.cursor_id != 0 && self.cursor.statement().cursor_id() == 0 {
            self.cursor.statement_mut().set_cursor_id(info.cursor_id);
        }
        self.cursor.set_row_count(info.row_count);
        if info.rowid.is_some() {
            self.cursor.set_last_rowid(info.rowid);
        }

        match info.code {
            0 => {
                if info.is_warning {
                    warn!(cursor_id = info.cursor_id, "statement compiled with warnings");
                    self.cursor.set_warning(info);
                }
                Ok(())
            }
            error_code::NO_DATA_FOUND => {
                self.cursor.end_of_fetch();
                Ok(())
            }
            error_code::ARRAY_DML_ERRORS => {
                debug!(failed_rows = info.batch_errors.len(), "batch completed with row errors");
                self.cursor.set_batch_errors(info.batch_errors);
                Ok(())
            }
            _ => Err(Error::Oracle(Box::new(info))),
        }
    }
}
