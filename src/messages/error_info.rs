//! ERROR / end-of-call message body
//!
//! Every call ends with this block, successful or not. Besides the error
//! number and text it carries the cursor id, rows processed, the last ROWID
//! touched and, for batched DML, per-row error codes, offsets and messages.

use crate::buffer::{ReadBuffer, WriteBuffer};
use crate::constants::{ccap_value, length};
use crate::error::{BatchError, Error, OracleErrorInfo, Result};
use crate::types::RowId;

/// Flag bit announcing a compilation warning
const FLAGS_COMPILATION_WARNING: u8 = 0x20;

/// Batch arrays carry at most this many offsets
const MAX_BATCH_OFFSETS: u32 = 65535;

/// Read an array of `count` elements, chunk-framed when the first byte is
/// the long-length indicator
fn read_batch_array<T>(
    buf: &mut ReadBuffer,
    count: usize,
    mut read: impl FnMut(&mut ReadBuffer) -> Result<T>,
) -> Result<Vec<T>> {
    let first_byte = buf.read_u8()?;
    let chunked = first_byte == length::LONG_INDICATOR;
    let mut items = Vec::with_capacity(count);
    for _ in 0..count {
        if chunked {
            buf.skip_ub4()?; // chunk length
        }
        items.push(read(buf)?);
    }
    if chunked {
        buf.skip(1)?; // end marker
    }
    Ok(items)
}

/// Parse an ERROR message body
pub fn parse_error_info(buf: &mut ReadBuffer, ttc_field_version: u8) -> Result<OracleErrorInfo> {
    buf.skip_ub4()?; // end of call status
    buf.skip_ub2()?; // end to end seq#
    buf.skip_ub4()?; // current row number
    buf.skip_ub2()?; // error number
    buf.skip_ub2()?; // array elem error
    buf.skip_ub2()?; // array elem error
    let cursor_id = buf.read_ub2()?;
    let pos = buf.read_sb2()?;
    buf.skip_ub1()?; // sql type
    buf.skip_ub1()?; // fatal?
    buf.skip_ub1()?; // flags
    buf.skip_ub1()?; // user cursor options
    buf.skip_ub1()?; // UPI parameter
    let flags = buf.read_u8()?;
    let rowid = RowId::read(buf)?;
    buf.skip_ub4()?; // OS error
    buf.skip_ub1()?; // statement number
    buf.skip_ub1()?; // call number
    buf.skip_ub2()?; // padding
    buf.skip_ub4()?; // success iters
    if buf.read_ub4()? > 0 {
        buf.skip_raw_bytes_chunked()?; // oerrdd
    }

    let num_codes = buf.read_ub2()? as usize;
    let codes = if num_codes > 0 {
        read_batch_array(buf, num_codes, |b| b.read_ub2())?
    } else {
        Vec::new()
    };

    let num_offsets = buf.read_ub4()?;
    if num_offsets > MAX_BATCH_OFFSETS {
        return Err(Error::Protocol(format!(
            "{} batch error offsets exceed the maximum of {}",
            num_offsets, MAX_BATCH_OFFSETS
        )));
    }
    let offsets = if num_offsets > 0 {
        read_batch_array(buf, num_offsets as usize, |b| b.read_ub4())?
    } else {
        Vec::new()
    };

    let num_messages = buf.read_ub2()?;
    let mut messages = Vec::with_capacity(num_messages as usize);
    if num_messages > 0 {
        buf.skip(1)?; // packed size
        for _ in 0..num_messages {
            buf.skip_ub2()?; // chunk length
            let message = buf.read_string_with_length()?.unwrap_or_default();
            messages.push(message.trim_end().to_string());
            buf.skip(2)?; // end marker
        }
    }

    let code = buf.read_ub4()?;
    let row_count = buf.read_ub8()?;
    if ttc_field_version >= ccap_value::FIELD_VERSION_20_1 {
        buf.skip_ub4()?; // sql type
        buf.skip_ub4()?; // server checksum
    }
    let message = if code != 0 {
        buf.read_string_with_length()?
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default()
    } else {
        String::new()
    };

    let batch_errors = codes
        .iter()
        .enumerate()
        .map(|(i, &code)| {
            BatchError::new(
                offsets.get(i).map_or(i, |&o| o as usize),
                code as u32,
                messages.get(i).cloned().unwrap_or_default(),
            )
        })
        .collect();

    Ok(OracleErrorInfo {
        code,
        cursor_id,
        pos,
        row_count,
        is_warning: flags & FLAGS_COMPILATION_WARNING != 0,
        message,
        rowid: Some(rowid).filter(|r| !r.is_null()),
        batch_errors,
    })
}

/// Encode an ERROR message body (without the message type byte)
pub fn write_error_info(
    buf: &mut WriteBuffer,
    info: &OracleErrorInfo,
    ttc_field_version: u8,
) -> Result<()> {
    buf.write_ub4(0)?; // end of call status
    buf.write_ub2(0)?; // end to end seq#
    buf.write_ub4(0)?; // current row number
    buf.write_ub2(0)?; // error number
    buf.write_ub2(0)?;
    buf.write_ub2(0)?;
    buf.write_ub2(info.cursor_id)?;
    buf.write_ub2(info.pos.max(0) as u16)?;
    for _ in 0..5 {
        buf.write_u8(0)?;
    }
    buf.write_u8(if info.is_warning { FLAGS_COMPILATION_WARNING } else { 0 })?;
    let rowid = info.rowid.unwrap_or_default();
    buf.write_ub4(rowid.rba)?;
    buf.write_ub2(rowid.partition_id)?;
    buf.write_u8(0)?;
    buf.write_ub4(rowid.block_num)?;
    buf.write_ub2(rowid.slot_num)?;
    buf.write_ub4(0)?; // OS error
    buf.write_u8(0)?;
    buf.write_u8(0)?;
    buf.write_ub2(0)?;
    buf.write_ub4(0)?; // success iters
    buf.write_ub4(0)?; // oerrdd

    let batch = &info.batch_errors;
    buf.write_ub2(batch.len() as u16)?;
    if !batch.is_empty() {
        buf.write_u8(batch.len() as u8)?;
        for e in batch {
            buf.write_ub2(e.code as u16)?;
        }
    }
    buf.write_ub4(batch.len() as u32)?;
    if !batch.is_empty() {
        buf.write_u8(batch.len() as u8)?;
        for e in batch {
            buf.write_ub4(e.row_index as u32)?;
        }
    }
    buf.write_ub2(batch.len() as u16)?;
    if !batch.is_empty() {
        buf.write_u8(0)?;
        for e in batch {
            buf.write_ub2(e.message.len() as u16)?;
            buf.write_string_with_length(Some(&e.message))?;
            buf.write_u16_be(0)?;
        }
    }

    buf.write_ub4(info.code)?;
    buf.write_ub8(info.row_count)?;
    if ttc_field_version >= ccap_value::FIELD_VERSION_20_1 {
        buf.write_ub4(0)?;
        buf.write_ub4(0)?;
    }
    if info.code != 0 {
        buf.write_string_with_length(Some(&info.message))?;
    }
    Ok(())
}
