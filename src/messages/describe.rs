//! Describe info message parsing
//!
//! The DESCRIBE_INFO body lists the columns of a query's result set. Which
//! trailing fields each column carries depends on the negotiated TTC field
//! version.

use crate::buffer::ReadBuffer;
use crate::constants::{ccap_value, OracleType};
use crate::error::{Error, Result};
use crate::variable::ColumnDescribe;

/// Result set shape announced by the server
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescribeInfo {
    /// Maximum row size in bytes
    pub max_row_size: u32,
    /// Column descriptions in select-list order
    pub columns: Vec<ColumnDescribe>,
}

/// Parse a DESCRIBE_INFO body (after its leading chunked header)
pub fn parse_describe_info(buf: &mut ReadBuffer, ttc_field_version: u8) -> Result<DescribeInfo> {
    let max_row_size = buf.read_ub4()?;
    let column_count = buf.read_ub4()? as usize;
    if column_count > 0 {
        buf.skip_ub1()?;
    }

    let mut columns = Vec::with_capacity(column_count);
    for _ in 0..column_count {
        columns.push(parse_column(buf, ttc_field_version)?);
    }

    if buf.read_ub4()? > 0 {
        buf.skip_raw_bytes_chunked()?; // current date
    }
    buf.skip_ub4()?; // dcbflag
    buf.skip_ub4()?; // dcbmdbz
    buf.skip_ub4()?; // dcbmnpr
    buf.skip_ub4()?; // dcbmxpr
    if buf.read_ub4()? > 0 {
        buf.skip_raw_bytes_chunked()?; // dcbqcky
    }

    Ok(DescribeInfo {
        max_row_size,
        columns,
    })
}

fn parse_column(buf: &mut ReadBuffer, ttc_field_version: u8) -> Result<ColumnDescribe> {
    let oracle_type = OracleType::try_from(buf.read_u8()?)?;
    buf.skip_ub1()?; // flags
    let precision = buf.read_u8()? as i8 as i16;
    let scale = buf.read_u8()? as i8 as i16;
    let buffer_size = buf.read_ub4()?;
    buf.skip_ub4()?; // max array elements
    buf.skip_ub8()?; // cont flags
    if buf.read_ub4()? > 0 {
        buf.read_bytes_with_length()?; // OID
    }
    buf.skip_ub2()?; // version
    let charset_id = buf.read_ub2()?;
    let charset_form = buf.read_u8()?;
    let max_size = buf.read_ub4()?;
    if ttc_field_version >= ccap_value::FIELD_VERSION_12_2 {
        buf.skip_ub4()?; // oaccolid
    }
    let nullable = buf.read_u8()? != 0;
    buf.skip_ub1()?; // v7 length of name

    let name = buf
        .read_string_with_ub4_length()?
        .ok_or_else(|| Error::Protocol("column name is required".to_string()))?;
    let type_schema = buf.read_string_with_ub4_length()?;
    let type_name = buf.read_string_with_ub4_length()?;
    buf.skip_ub2()?; // column position
    buf.skip_ub4()?; // uds flags

    let (mut domain_schema, mut domain_name) = (None, None);
    if ttc_field_version >= ccap_value::FIELD_VERSION_23_1 {
        domain_schema = buf.read_string_with_ub4_length()?;
        domain_name = buf.read_string_with_ub4_length()?;
    }
    if ttc_field_version >= ccap_value::FIELD_VERSION_23_1_EXT_3 && buf.read_ub4()? > 0 {
        buf.skip_ub1()?;
        let count = buf.read_ub4()?;
        buf.skip_ub1()?;
        for _ in 0..count {
            buf.read_string_with_ub4_length()?; // key
            buf.read_string_with_ub4_length()?; // value
            buf.skip_ub4()?; // flags
        }
        buf.skip_ub4()?; // flags
    }
    if ttc_field_version >= ccap_value::FIELD_VERSION_23_4 {
        buf.skip_ub4()?; // vector dimensions
        buf.skip_ub1()?; // vector format
        buf.skip_ub1()?; // vector flags
    }

    Ok(ColumnDescribe {
        name,
        oracle_type,
        precision,
        scale,
        buffer_size,
        max_size,
        charset_id,
        charset_form,
        nullable,
        type_schema,
        type_name,
        domain_schema,
        domain_name,
    })
}
