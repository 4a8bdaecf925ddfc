//! Typed access to fetched values
//!
//! A [`Cell`] is a short-lived view of one column of one row. Converting it
//! into a Rust value goes through [`OracleDecode`]; a failed conversion
//! becomes a [`DecodeError`] naming the column, the requested type, the raw
//! bytes and the call site.
//!
//! ```rust
//! use tns_core::{Cell, ColumnDescribe, OracleType, RawValue};
//! use bytes::Bytes;
//!
//! let column = ColumnDescribe::new("ID", OracleType::Number);
//! let value = RawValue::Bytes(Bytes::from_static(&[0xc1, 0x2b]));
//! let cell = Cell::new(Some(&value), &column, 0);
//! assert_eq!(cell.decode::<i64>().unwrap(), 42);
//! assert!(cell.decode::<bool>().is_err());
//! ```

use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, FixedOffset, NaiveDateTime};

use crate::buffer::decode_text;
use crate::constants::OracleType;
use crate::error::{DecodeError, DecodeFailure, Result};
use crate::types::{
    decode_binary_double, decode_binary_float, decode_oracle_date, decode_oracle_number,
    decode_oracle_timestamp, decode_oracle_timestamp_tz, LobLocator, OracleNumber, RowId,
};
use crate::variable::{ColumnDescribe, RawValue};

type DecodeResult<T> = std::result::Result<T, DecodeFailure>;

/// Decodes JSON column contents
pub trait JsonDecoder: fmt::Debug + Send + Sync {
    /// Turn the column bytes into a JSON value, or explain why not
    fn decode(&self, bytes: &[u8]) -> std::result::Result<serde_json::Value, String>;
}

/// JSON decoder for values transferred as JSON text
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeJsonDecoder;

impl JsonDecoder for SerdeJsonDecoder {
    fn decode(&self, bytes: &[u8]) -> std::result::Result<serde_json::Value, String> {
        serde_json::from_slice(bytes).map_err(|e| e.to_string())
    }
}

/// Settings shared by every decode call
#[derive(Debug, Clone)]
pub struct DecodingContext {
    json: Arc<dyn JsonDecoder>,
}

impl Default for DecodingContext {
    fn default() -> Self {
        Self {
            json: Arc::new(SerdeJsonDecoder),
        }
    }
}

impl DecodingContext {
    /// Context with the default decoders
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the JSON decoder
    pub fn with_json_decoder(mut self, decoder: impl JsonDecoder + 'static) -> Self {
        self.json = Arc::new(decoder);
        self
    }

    /// The JSON decoder in use
    pub fn json_decoder(&self) -> &dyn JsonDecoder {
        self.json.as_ref()
    }
}

/// One column's value within one row
#[derive(Debug, Clone, Copy)]
pub struct Cell<'a> {
    value: Option<&'a RawValue>,
    column: &'a ColumnDescribe,
    index: usize,
}

impl<'a> Cell<'a> {
    /// View a value (None for SQL NULL) of the column at `index`
    pub fn new(value: Option<&'a RawValue>, column: &'a ColumnDescribe, index: usize) -> Self {
        Self {
            value,
            column,
            index,
        }
    }

    /// Raw bytes, `None` for SQL NULL; a LOB yields its locator
    pub fn bytes(&self) -> Option<&'a [u8]> {
        self.value.map(|v| &v.as_bytes()[..])
    }

    /// The fetched value
    pub fn raw(&self) -> Option<&'a RawValue> {
        self.value
    }

    /// Whether the value is SQL NULL
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// Oracle type the value was fetched as
    pub fn oracle_type(&self) -> OracleType {
        self.column.oracle_type
    }

    /// Column name
    pub fn column_name(&self) -> &'a str {
        &self.column.name
    }

    /// Zero-based column index
    pub fn column_index(&self) -> usize {
        self.index
    }

    /// Column metadata
    pub fn column(&self) -> &'a ColumnDescribe {
        self.column
    }

    /// Decode with the default context
    #[track_caller]
    pub fn decode<T: OracleDecode>(&self) -> Result<T> {
        self.decode_with(&DecodingContext::default())
    }

    /// Decode with an explicit context
    #[track_caller]
    pub fn decode_with<T: OracleDecode>(&self, ctx: &DecodingContext) -> Result<T> {
        let location = Location::caller();
        T::decode(self, ctx).map_err(|failure| {
            DecodeError {
                failure,
                column_name: self.column.name.clone(),
                column_index: self.index,
                target_type: std::any::type_name::<T>(),
                oracle_type: self.column.oracle_type,
                raw: self.value.map(|v| v.as_bytes().clone()),
                file: location.file(),
                line: location.line(),
            }
            .into()
        })
    }

    fn required(&self) -> DecodeResult<&'a [u8]> {
        self.bytes().ok_or(DecodeFailure::MissingData)
    }

    fn text(&self) -> DecodeResult<String> {
        let bytes = self.required()?;
        decode_text(bytes, self.column.charset_form).ok_or_else(|| {
            DecodeFailure::FailedToDecode("invalid character data for charset form".to_string())
        })
    }

    fn number(&self) -> DecodeResult<OracleNumber> {
        match self.oracle_type() {
            OracleType::Number | OracleType::BinaryInteger => {
                decode_oracle_number(self.required()?).map_err(failed)
            }
            _ => Err(DecodeFailure::TypeMismatch),
        }
    }
}

fn failed(err: impl fmt::Display) -> DecodeFailure {
    DecodeFailure::FailedToDecode(err.to_string())
}

fn is_text(oracle_type: OracleType) -> bool {
    matches!(oracle_type, OracleType::Varchar | OracleType::Char | OracleType::Long)
}

/// Conversion from a fetched cell into a Rust value
///
/// Implementations report NULL for non-optional targets as
/// [`DecodeFailure::MissingData`] and never substitute defaults.
pub trait OracleDecode: Sized {
    /// Decode the cell
    fn decode(cell: &Cell<'_>, ctx: &DecodingContext) -> DecodeResult<Self>;
}

impl<T: OracleDecode> OracleDecode for Option<T> {
    fn decode(cell: &Cell<'_>, ctx: &DecodingContext) -> DecodeResult<Self> {
        if cell.is_null() {
            Ok(None)
        } else {
            T::decode(cell, ctx).map(Some)
        }
    }
}

impl OracleDecode for String {
    fn decode(cell: &Cell<'_>, _ctx: &DecodingContext) -> DecodeResult<Self> {
        match cell.oracle_type() {
            t if is_text(t) => cell.text(),
            OracleType::Number | OracleType::BinaryInteger => Ok(cell.number()?.to_string()),
            OracleType::Rowid | OracleType::Urowid => {
                String::from_utf8(cell.required()?.to_vec()).map_err(failed)
            }
            _ => Err(DecodeFailure::TypeMismatch),
        }
    }
}

impl OracleDecode for i64 {
    fn decode(cell: &Cell<'_>, _ctx: &DecodingContext) -> DecodeResult<Self> {
        cell.number()?.to_i64().map_err(failed)
    }
}

impl OracleDecode for i32 {
    fn decode(cell: &Cell<'_>, ctx: &DecodingContext) -> DecodeResult<Self> {
        let wide = i64::decode(cell, ctx)?;
        i32::try_from(wide).map_err(|_| failed(format!("{} does not fit in i32", wide)))
    }
}

impl OracleDecode for f64 {
    fn decode(cell: &Cell<'_>, _ctx: &DecodingContext) -> DecodeResult<Self> {
        match cell.oracle_type() {
            OracleType::BinaryDouble => decode_binary_double(cell.required()?).map_err(failed),
            OracleType::BinaryFloat => decode_binary_float(cell.required()?)
                .map(f64::from)
                .map_err(failed),
            _ => cell.number()?.to_f64().map_err(failed),
        }
    }
}

impl OracleDecode for f32 {
    fn decode(cell: &Cell<'_>, _ctx: &DecodingContext) -> DecodeResult<Self> {
        match cell.oracle_type() {
            OracleType::BinaryFloat => decode_binary_float(cell.required()?).map_err(failed),
            _ => Err(DecodeFailure::TypeMismatch),
        }
    }
}

impl OracleDecode for bool {
    fn decode(cell: &Cell<'_>, _ctx: &DecodingContext) -> DecodeResult<Self> {
        if cell.oracle_type() != OracleType::Boolean {
            return Err(DecodeFailure::TypeMismatch);
        }
        match cell.required()?.last() {
            Some(&b) => Ok(b == 1),
            None => Err(failed("empty BOOLEAN value")),
        }
    }
}

impl OracleDecode for Bytes {
    fn decode(cell: &Cell<'_>, _ctx: &DecodingContext) -> DecodeResult<Self> {
        match (cell.oracle_type(), cell.raw()) {
            (_, None) => Err(DecodeFailure::MissingData),
            (OracleType::Raw | OracleType::LongRaw, Some(RawValue::Bytes(b))) => Ok(b.clone()),
            _ => Err(DecodeFailure::TypeMismatch),
        }
    }
}

impl OracleDecode for Vec<u8> {
    fn decode(cell: &Cell<'_>, ctx: &DecodingContext) -> DecodeResult<Self> {
        Bytes::decode(cell, ctx).map(|b| b.to_vec())
    }
}

impl OracleDecode for OracleNumber {
    fn decode(cell: &Cell<'_>, _ctx: &DecodingContext) -> DecodeResult<Self> {
        cell.number()
    }
}

impl OracleDecode for NaiveDateTime {
    fn decode(cell: &Cell<'_>, _ctx: &DecodingContext) -> DecodeResult<Self> {
        match cell.oracle_type() {
            OracleType::Date => decode_oracle_date(cell.required()?).map_err(failed),
            OracleType::Timestamp | OracleType::TimestampLtz => {
                decode_oracle_timestamp(cell.required()?).map_err(failed)
            }
            _ => Err(DecodeFailure::TypeMismatch),
        }
    }
}

impl OracleDecode for DateTime<FixedOffset> {
    fn decode(cell: &Cell<'_>, _ctx: &DecodingContext) -> DecodeResult<Self> {
        match cell.oracle_type() {
            OracleType::TimestampTz => decode_oracle_timestamp_tz(cell.required()?).map_err(failed),
            _ => Err(DecodeFailure::TypeMismatch),
        }
    }
}

impl OracleDecode for RowId {
    fn decode(cell: &Cell<'_>, _ctx: &DecodingContext) -> DecodeResult<Self> {
        if cell.oracle_type() != OracleType::Rowid {
            return Err(DecodeFailure::TypeMismatch);
        }
        let text = std::str::from_utf8(cell.required()?).map_err(failed)?;
        text.parse().map_err(failed)
    }
}

impl OracleDecode for LobLocator {
    fn decode(cell: &Cell<'_>, _ctx: &DecodingContext) -> DecodeResult<Self> {
        match cell.raw() {
            None => Err(DecodeFailure::MissingData),
            Some(RawValue::Lob(lob)) => Ok(lob.clone()),
            Some(RawValue::Bytes(_)) => Err(DecodeFailure::TypeMismatch),
        }
    }
}

impl OracleDecode for serde_json::Value {
    fn decode(cell: &Cell<'_>, ctx: &DecodingContext) -> DecodeResult<Self> {
        match cell.oracle_type() {
            OracleType::Json => ctx.json_decoder().decode(cell.required()?).map_err(failed),
            t if is_text(t) => ctx
                .json_decoder()
                .decode(cell.text()?.as_bytes())
                .map_err(failed),
            _ => Err(DecodeFailure::TypeMismatch),
        }
    }
}
