//! Fetched rows

use std::sync::Arc;

use crate::cell::{Cell, DecodingContext, OracleDecode};
use crate::error::{Error, Result};
use crate::variable::{ColumnDescribe, RawValue};

/// One row of a result set
///
/// Values are cheap clones of the fetch buffers; column metadata is shared
/// by every row of the cursor.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Arc<[ColumnDescribe]>,
    values: Vec<Option<RawValue>>,
}

impl Row {
    /// Create a row from column metadata and values in select-list order
    pub fn new(columns: Arc<[ColumnDescribe]>, values: Vec<Option<RawValue>>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Number of columns
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row has no columns
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column metadata
    pub fn columns(&self) -> &[ColumnDescribe] {
        &self.columns
    }

    /// Raw values in select-list order
    pub fn values(&self) -> &[Option<RawValue>] {
        &self.values
    }

    /// Cell at a zero-based index
    pub fn cell(&self, index: usize) -> Option<Cell<'_>> {
        let column = self.columns.get(index)?;
        let value = self.values.get(index)?;
        Some(Cell::new(value.as_ref(), column, index))
    }

    /// Cell of the named column (case-insensitive)
    pub fn cell_by_name(&self, name: &str) -> Option<Cell<'_>> {
        let index = self
            .columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))?;
        self.cell(index)
    }

    /// Decode the column at `index`
    #[track_caller]
    pub fn decode<T: OracleDecode>(&self, index: usize, ctx: &DecodingContext) -> Result<T> {
        match self.cell(index) {
            Some(cell) => cell.decode_with(ctx),
            None => Err(Error::ColumnNotFound(format!(
                "index {} of {} columns",
                index,
                self.len()
            ))),
        }
    }

    /// Decode the column at `index` with the default context
    #[track_caller]
    pub fn get<T: OracleDecode>(&self, index: usize) -> Result<T> {
        self.decode(index, &DecodingContext::default())
    }

    /// Decode the named column with the default context
    #[track_caller]
    pub fn get_by_name<T: OracleDecode>(&self, name: &str) -> Result<T> {
        match self.cell_by_name(name) {
            Some(cell) => cell.decode(),
            None => Err(Error::ColumnNotFound(name.to_string())),
        }
    }
}
