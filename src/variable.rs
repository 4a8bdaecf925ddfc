//! Fetch variables
//!
//! A [`Variable`] is one column slot of a cursor. It is built from the
//! server's column description, sized to the fetch array size, and holds the
//! raw values of the rows received in the current round-trip.

use bytes::Bytes;
use tracing::debug;

use crate::buffer::ReadBuffer;
use crate::constants::{csfrm, OracleType};
use crate::error::Result;
use crate::types::{LobLocator, RowId};

/// Column metadata as described by the server
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescribe {
    /// Column name
    pub name: String,
    /// Oracle data type
    pub oracle_type: OracleType,
    /// Precision (for NUMBER)
    pub precision: i16,
    /// Scale (for NUMBER)
    pub scale: i16,
    /// Buffer size for fetching
    pub buffer_size: u32,
    /// Maximum data size
    pub max_size: u32,
    /// Character set id
    pub charset_id: u16,
    /// Character set form
    pub charset_form: u8,
    /// Whether NULL values are allowed
    pub nullable: bool,
    /// Schema of a named type
    pub type_schema: Option<String>,
    /// Name of a named type
    pub type_name: Option<String>,
    /// Data use case domain schema (23ai+)
    pub domain_schema: Option<String>,
    /// Data use case domain name (23ai+)
    pub domain_name: Option<String>,
}

impl ColumnDescribe {
    /// Describe a column by name and type; character types default to the
    /// implicit charset form
    pub fn new(name: impl Into<String>, oracle_type: OracleType) -> Self {
        Self {
            name: name.into(),
            oracle_type,
            precision: 0,
            scale: 0,
            buffer_size: 0,
            max_size: 0,
            charset_id: 0,
            charset_form: if oracle_type.is_character() {
                csfrm::IMPLICIT
            } else {
                0
            },
            nullable: true,
            type_schema: None,
            type_name: None,
            domain_schema: None,
            domain_name: None,
        }
    }

    /// Set the charset form
    pub fn with_charset_form(mut self, charset_form: u8) -> Self {
        self.charset_form = charset_form;
        self
    }

    /// Type name as Oracle reports it, e.g. `NCLOB` for a national CLOB
    pub fn type_display_name(&self) -> &'static str {
        self.oracle_type.name(self.charset_form)
    }
}

/// One fetched column value
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Bytes exactly as received (for ROWID, the 18-character text)
    Bytes(Bytes),
    /// A LOB locator
    Lob(LobLocator),
}

impl RawValue {
    /// The bytes behind this value; a LOB yields its locator
    pub fn as_bytes(&self) -> &Bytes {
        match self {
            RawValue::Bytes(b) => b,
            RawValue::Lob(lob) => lob.locator_bytes(),
        }
    }
}

/// A fetched column slot and its value buffer
#[derive(Debug, Clone)]
pub struct Variable {
    name: String,
    oracle_type: OracleType,
    charset_form: u8,
    num_elements: u32,
    buffer_size: u32,
    precision: i16,
    scale: i16,
    nullable: bool,
    describe: ColumnDescribe,
    values: Vec<Option<RawValue>>,
    last_value: Option<RawValue>,
}

impl Variable {
    /// Build a fetch variable from a column description
    ///
    /// With `fetch_lobs` off, LOB columns are fetched inline: BLOB becomes
    /// LONG RAW, CLOB becomes LONG and NCLOB becomes LONG in the national
    /// charset.
    pub fn for_fetch(describe: &ColumnDescribe, num_elements: u32, fetch_lobs: bool) -> Self {
        let oracle_type = match describe.oracle_type {
            OracleType::Blob if !fetch_lobs => OracleType::LongRaw,
            OracleType::Clob if !fetch_lobs => OracleType::Long,
            other => other,
        };
        if oracle_type != describe.oracle_type {
            debug!(
                column = %describe.name,
                from = describe.type_display_name(),
                to = oracle_type.name(describe.charset_form),
                "fetching LOB column inline"
            );
        }

        let mut var = Self {
            name: describe.name.clone(),
            oracle_type,
            charset_form: describe.charset_form,
            num_elements,
            buffer_size: describe.buffer_size,
            precision: describe.precision,
            scale: describe.scale,
            nullable: describe.nullable,
            describe: describe.clone(),
            values: Vec::new(),
            last_value: None,
        };
        var.finalize();
        var
    }

    /// Size the value buffer to the element count, dropping held values
    pub fn finalize(&mut self) {
        self.values = Vec::with_capacity(self.num_elements as usize);
        self.last_value = None;
    }

    /// Column name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type the values are fetched as
    pub fn oracle_type(&self) -> OracleType {
        self.oracle_type
    }

    /// Charset form of the values
    pub fn charset_form(&self) -> u8 {
        self.charset_form
    }

    /// Number of rows the buffer is sized for
    pub fn num_elements(&self) -> u32 {
        self.num_elements
    }

    /// Declared buffer size
    pub fn buffer_size(&self) -> u32 {
        self.buffer_size
    }

    /// Declared precision
    pub fn precision(&self) -> i16 {
        self.precision
    }

    /// Declared scale
    pub fn scale(&self) -> i16 {
        self.scale
    }

    /// Whether the column allows NULL
    pub fn nullable(&self) -> bool {
        self.nullable
    }

    /// Column description this variable was built from
    pub fn describe(&self) -> &ColumnDescribe {
        &self.describe
    }

    /// Description of the values as fetched (after any LOB downgrade)
    pub fn fetched_describe(&self) -> ColumnDescribe {
        ColumnDescribe {
            oracle_type: self.oracle_type,
            ..self.describe.clone()
        }
    }

    /// Rows held in the current buffer
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a buffered row, `None` for SQL NULL or an index past the end
    pub fn value(&self, index: usize) -> Option<&RawValue> {
        self.values.get(index).and_then(Option::as_ref)
    }

    /// Drop the buffered rows before a new round-trip; the last value is kept
    /// for duplicate-column elimination
    pub fn clear_buffer(&mut self) {
        self.values.clear();
    }

    /// Read this column's value for the next row from row data
    pub fn read_value(&mut self, buf: &mut ReadBuffer) -> Result<()> {
        let value = match self.oracle_type {
            OracleType::Blob | OracleType::Clob | OracleType::Bfile => {
                LobLocator::read(buf, self.oracle_type, self.charset_form)?.map(RawValue::Lob)
            }
            OracleType::Rowid => {
                if buf.read_ub1()? == 0 {
                    None
                } else {
                    RowId::read(buf)?
                        .encode()
                        .map(|text| RawValue::Bytes(Bytes::from(text)))
                }
            }
            OracleType::Long | OracleType::LongRaw => {
                let value = buf.read_oracle_slice()?.map(RawValue::Bytes);
                buf.read_sb4()?; // null indicator
                buf.skip_ub4()?; // return code
                value
            }
            _ => buf.read_oracle_slice()?.map(RawValue::Bytes),
        };
        self.push(value);
        Ok(())
    }

    /// Repeat the previous row's value, as flagged by the row bit vector
    pub fn push_duplicate(&mut self) {
        self.push(self.last_value.clone());
    }

    fn push(&mut self, value: Option<RawValue>) {
        self.last_value = value.clone();
        self.values.push(value);
    }
}
