//! Cursor fetch engine
//!
//! A [`Cursor`] owns the fetch variables of one statement and the buffer of
//! rows received in the latest round-trip. Rows are handed out one at a time
//! with [`Cursor::next_row`]; when the buffer runs dry the caller either
//! sends [`Cursor::fetch_message`] and feeds the reply to
//! [`Cursor::process_response`], or learns that the result set is done.
//!
//! ```text
//! Created -> Describing -> Fetching -> Exhausted
//!                             ^   |
//!                             +---+ fetch round-trip
//! ```

use std::sync::Arc;

use tracing::{debug, trace};

use crate::buffer::ReadBuffer;
use crate::capabilities::Capabilities;
use crate::config::FetchOptions;
use crate::error::{BatchError, Error, OracleErrorInfo, Result};
use crate::messages::{DescribeInfo, FetchMessage, ResponseProcessor};
use crate::row::Row;
use crate::statement::Statement;
use crate::types::RowId;
use crate::variable::{ColumnDescribe, Variable};

/// Where a cursor is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// No response processed and no columns known
    Created,
    /// Column metadata known, no rows received yet
    Describing,
    /// Rows buffered or more rows available on the server
    Fetching,
    /// Every row has been handed out and the server has no more
    Exhausted,
}

/// Outcome of [`Cursor::next_row`]
#[derive(Debug, Clone)]
pub enum FetchStatus {
    /// The next row of the result set
    Row(Row),
    /// The buffer is empty but the server has more rows
    NeedsFetch,
    /// No more rows; no further round-trip is needed
    Exhausted,
}

/// A statement's fetch state
#[derive(Debug)]
pub struct Cursor {
    statement: Statement,
    prefetch_rows: u32,
    array_size: u32,
    fetch_array_size: u32,
    fetch_lobs: bool,
    fetch_vars: Vec<Variable>,
    columns: Option<Arc<[ColumnDescribe]>>,
    more_rows_to_fetch: bool,
    buffer_row_count: usize,
    buffer_index: usize,
    last_row_index: u64,
    row_count: u64,
    round_trips: u64,
    dml_row_counts_requested: bool,
    dml_row_counts: Vec<u64>,
    last_rowid: Option<RowId>,
    batch_errors: Option<Vec<BatchError>>,
    warning: Option<OracleErrorInfo>,
}

impl Cursor {
    /// Create a cursor for a statement
    pub fn new(statement: Statement, options: &FetchOptions) -> Self {
        let more_rows_to_fetch = statement.is_query();
        Self {
            statement,
            prefetch_rows: options.prefetch_rows,
            array_size: options.array_size,
            fetch_array_size: options.array_size.max(1),
            fetch_lobs: options.fetch_lobs,
            fetch_vars: Vec::new(),
            columns: None,
            more_rows_to_fetch,
            buffer_row_count: 0,
            buffer_index: 0,
            last_row_index: 0,
            row_count: 0,
            round_trips: 0,
            dml_row_counts_requested: false,
            dml_row_counts: Vec::new(),
            last_rowid: None,
            batch_errors: None,
            warning: None,
        }
    }

    /// The statement this cursor executes
    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    /// Mutable access to the statement
    pub fn statement_mut(&mut self) -> &mut Statement {
        &mut self.statement
    }

    /// Rows requested with the execute call
    pub fn prefetch_rows(&self) -> u32 {
        self.prefetch_rows
    }

    /// Rows requested per fetch, as configured
    pub fn array_size(&self) -> u32 {
        self.array_size
    }

    /// Rows requested per fetch, as sent to the server
    pub fn fetch_array_size(&self) -> u32 {
        self.fetch_array_size
    }

    /// Ask the server for per-row counts of a batched DML execution
    pub fn request_dml_row_counts(&mut self, enabled: bool) {
        self.dml_row_counts_requested = enabled;
    }

    /// Whether per-row DML counts were requested
    pub fn dml_row_counts_requested(&self) -> bool {
        self.dml_row_counts_requested
    }

    /// Current lifecycle state
    pub fn state(&self) -> CursorState {
        if self.round_trips == 0 {
            return if self.fetch_vars.is_empty() {
                CursorState::Created
            } else {
                CursorState::Describing
            };
        }
        if !self.more_rows_to_fetch && self.buffer_index >= self.buffer_row_count {
            CursorState::Exhausted
        } else {
            CursorState::Fetching
        }
    }

    /// Build the fetch variable for the column at `position`
    ///
    /// A position equal to the current count appends; a lower one replaces
    /// the existing variable.
    ///
    /// # Panics
    ///
    /// Panics if `position` is past the number of variables already built,
    /// since that would leave a hole in the select list.
    pub fn create_fetch_variable(&mut self, describe: &ColumnDescribe, position: usize) {
        let populated = self.fetch_vars.len();
        assert!(
            position <= populated,
            "fetch variable position {} is past the {} populated positions",
            position,
            populated
        );
        let num_elements = self.fetch_array_size.max(self.prefetch_rows);
        let var = Variable::for_fetch(describe, num_elements, self.fetch_lobs);
        if position == populated {
            self.fetch_vars.push(var);
        } else {
            self.fetch_vars[position] = var;
        }
        self.columns = None;
    }

    /// Replace the select list with a freshly described one
    pub fn apply_describe(&mut self, info: DescribeInfo) {
        debug!(
            cursor_id = self.statement.cursor_id(),
            columns = info.columns.len(),
            max_row_size = info.max_row_size,
            "describe received"
        );
        self.fetch_vars.truncate(info.columns.len());
        for (position, describe) in info.columns.iter().enumerate() {
            self.create_fetch_variable(describe, position);
        }
    }

    /// Fetch variables in select-list order
    pub fn fetch_variables(&self) -> &[Variable] {
        &self.fetch_vars
    }

    /// Number of columns in the select list
    pub fn num_columns(&self) -> usize {
        self.fetch_vars.len()
    }

    /// Column metadata of the rows this cursor returns
    pub fn columns(&mut self) -> Arc<[ColumnDescribe]> {
        self.columns
            .get_or_insert_with(|| {
                self.fetch_vars
                    .iter()
                    .map(Variable::fetched_describe)
                    .collect()
            })
            .clone()
    }

    /// Whether the server has rows beyond the current buffer
    pub fn more_rows_to_fetch(&self) -> bool {
        self.more_rows_to_fetch
    }

    /// Rows received in the latest round-trip
    pub fn buffer_row_count(&self) -> usize {
        self.buffer_row_count
    }

    /// Rows of the buffer already handed out
    pub fn buffer_index(&self) -> usize {
        self.buffer_index
    }

    /// Rows handed out over the cursor's lifetime
    pub fn last_row_index(&self) -> u64 {
        self.last_row_index
    }

    /// Rows processed as reported by the server
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Per-row counts of the last batched DML execution
    pub fn dml_row_counts(&self) -> &[u64] {
        &self.dml_row_counts
    }

    /// ROWID of the last row touched
    pub fn last_rowid(&self) -> Option<RowId> {
        self.last_rowid
    }

    /// Row failures of the last batched DML execution
    pub fn batch_errors(&self) -> Option<&[BatchError]> {
        self.batch_errors.as_deref()
    }

    /// Warning attached to the last response
    pub fn warning(&self) -> Option<&OracleErrorInfo> {
        self.warning.as_ref()
    }

    /// Hand out the next buffered row
    pub fn next_row(&mut self) -> FetchStatus {
        if self.buffer_index < self.buffer_row_count {
            let index = self.buffer_index;
            let values = self
                .fetch_vars
                .iter()
                .map(|var| var.value(index).cloned())
                .collect();
            let row = Row::new(self.columns(), values);
            self.buffer_index += 1;
            self.last_row_index += 1;
            return FetchStatus::Row(row);
        }
        if self.more_rows_to_fetch {
            FetchStatus::NeedsFetch
        } else {
            FetchStatus::Exhausted
        }
    }

    /// Build the request for the next batch of rows
    pub fn fetch_message(&self) -> Result<FetchMessage> {
        let cursor_id = self.statement.cursor_id();
        if cursor_id == 0 {
            return Err(Error::Protocol(
                "cursor has not been opened on the server".to_string(),
            ));
        }
        if !self.more_rows_to_fetch {
            return Err(Error::Protocol("no more rows to fetch".to_string()));
        }
        if self.buffer_index < self.buffer_row_count {
            return Err(Error::Protocol(format!(
                "{} buffered rows have not been consumed",
                self.buffer_row_count - self.buffer_index
            )));
        }
        Ok(FetchMessage::new(cursor_id, self.fetch_array_size))
    }

    /// Apply a server response (the DATA payload after its flags)
    ///
    /// Rows of the previous response must all have been read; otherwise
    /// this fails with [`Error::Protocol`] and the buffer is left intact.
    pub fn process_response(&mut self, message: &[u8], caps: &Capabilities) -> Result<()> {
        ResponseProcessor::new(self, caps).process(message)
    }

    /// Reset the row buffer for a new response; rows still buffered would
    /// be lost, so they must be consumed first
    pub(crate) fn begin_round_trip(&mut self) -> Result<()> {
        if self.buffer_index < self.buffer_row_count {
            return Err(Error::Protocol(format!(
                "{} buffered rows have not been consumed",
                self.buffer_row_count - self.buffer_index
            )));
        }
        self.round_trips += 1;
        self.buffer_row_count = 0;
        self.buffer_index = 0;
        self.warning = None;
        for var in &mut self.fetch_vars {
            var.clear_buffer();
        }
        Ok(())
    }

    /// Read one ROW_DATA body; columns whose bit is clear repeat the
    /// previous row's value
    pub(crate) fn read_row(&mut self, buf: &mut ReadBuffer, bit_vector: Option<&[u8]>) -> Result<()> {
        if self.fetch_vars.is_empty() {
            return Err(Error::Protocol(
                "row data received before column metadata".to_string(),
            ));
        }
        for (column, var) in self.fetch_vars.iter_mut().enumerate() {
            if is_duplicate(bit_vector, column) {
                var.push_duplicate();
            } else {
                var.read_value(buf)?;
            }
        }
        self.buffer_row_count += 1;
        trace!(row = self.buffer_row_count, "row buffered");
        Ok(())
    }

    pub(crate) fn end_of_fetch(&mut self) {
        self.more_rows_to_fetch = false;
    }

    pub(crate) fn set_row_count(&mut self, row_count: u64) {
        self.row_count = row_count;
    }

    pub(crate) fn set_last_rowid(&mut self, rowid: Option<RowId>) {
        self.last_rowid = rowid;
    }

    pub(crate) fn set_dml_row_counts(&mut self, row_counts: Vec<u64>) {
        self.dml_row_counts = row_counts;
    }

    pub(crate) fn set_batch_errors(&mut self, errors: Vec<BatchError>) {
        self.batch_errors = Some(errors);
    }

    pub(crate) fn set_warning(&mut self, warning: OracleErrorInfo) {
        self.warning = Some(warning);
    }
}

fn is_duplicate(bit_vector: Option<&[u8]>, column: usize) -> bool {
    match bit_vector.and_then(|bits| bits.get(column / 8)) {
        Some(byte) => byte & (1 << (column % 8)) == 0,
        None => false,
    }
}
