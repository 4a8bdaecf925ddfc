//! Error types for the TNS protocol core
//!
//! Framing, decode, server-reported and transaction failures all converge on
//! [`Error`]. The structured payloads ([`OracleErrorInfo`], [`DecodeError`],
//! [`TransactionError`](crate::transaction::TransactionError)) are boxed so the
//! enum itself stays small on the happy path.

use std::fmt;
use std::io;

use bytes::Bytes;
use thiserror::Error;

use crate::constants::{error_code, MessageType, OracleType};
use crate::transaction::TransactionError;
use crate::types::RowId;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the protocol core
#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum Error {
    // =========================================================================
    // Protocol Errors
    // =========================================================================
    /// Unknown packet type code in a packet header
    #[error("invalid packet type: {0}")]
    InvalidPacketType(u8),

    /// Unknown message type code inside a DATA packet
    #[error("invalid message type: {0}")]
    InvalidMessageType(u8),

    /// Known message type that has no meaning in the current exchange
    #[error("unexpected {message_type} message while processing {context}")]
    UnexpectedMessage {
        message_type: MessageType,
        context: &'static str,
    },

    /// Packet too short to contain a valid header or its declared payload
    #[error("packet too short: expected at least {expected} bytes, got {actual}")]
    PacketTooShort { expected: usize, actual: usize },

    /// General protocol error
    #[error("protocol error: {0}")]
    Protocol(String),

    // =========================================================================
    // Buffer Errors
    // =========================================================================
    /// Not enough data to read
    #[error("buffer underflow: need {needed} bytes but only {available} available")]
    BufferUnderflow { needed: usize, available: usize },

    /// Not enough space to write
    #[error("buffer overflow: need {needed} bytes but only {available} available")]
    BufferOverflow { needed: usize, available: usize },

    /// Invalid length indicator
    #[error("invalid length indicator: {0}")]
    InvalidLengthIndicator(u8),

    // =========================================================================
    // Data Errors
    // =========================================================================
    /// Unknown Oracle type number in column metadata
    #[error("invalid Oracle type: {0}")]
    InvalidOracleType(u8),

    /// No column with this index or name in the row
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// A cell could not be converted to the requested Rust type
    #[error(transparent)]
    Decode(Box<DecodeError>),

    /// Low-level value conversion failure
    #[error("data conversion error: {0}")]
    DataConversion(String),

    // =========================================================================
    // Server Errors
    // =========================================================================
    /// Error reported by the database server
    #[error("{0}")]
    Oracle(Box<OracleErrorInfo>),

    /// Commit/rollback sequencing failure
    #[error(transparent)]
    Transaction(Box<TransactionError>),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid connection string
    #[error("invalid connection string: {0}")]
    InvalidConnectionString(String),

    /// Operation is recognised but not supported by this implementation
    #[error("unsupported: {0}")]
    Unsupported(String),

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// Underlying I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Peer closed the stream
    #[error("connection closed unexpectedly")]
    ConnectionClosed,
}

impl Error {
    /// Create a server error with only a code and message
    pub fn oracle(code: u32, message: impl Into<String>) -> Self {
        Error::Oracle(Box::new(OracleErrorInfo::new(code, message)))
    }

    /// Server error code, if this is a server-reported error
    pub fn oracle_code(&self) -> Option<u32> {
        match self {
            Error::Oracle(info) => Some(info.code),
            _ => None,
        }
    }

    /// Check if this is a "no data found" error
    pub fn is_no_data_found(&self) -> bool {
        self.oracle_code() == Some(error_code::NO_DATA_FOUND)
    }

    /// Check if this error leaves the connection unusable
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Error::Io(_)
                | Error::ConnectionClosed
                | Error::InvalidPacketType(_)
                | Error::InvalidMessageType(_)
                | Error::PacketTooShort { .. }
        )
    }
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Error::Decode(Box::new(err))
    }
}

impl From<OracleErrorInfo> for Error {
    fn from(info: OracleErrorInfo) -> Self {
        Error::Oracle(Box::new(info))
    }
}

impl From<TransactionError> for Error {
    fn from(err: TransactionError) -> Self {
        Error::Transaction(Box::new(err))
    }
}

// =============================================================================
// Server-reported errors
// =============================================================================

/// Error or end-of-call information reported by the server
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OracleErrorInfo {
    /// Oracle error number (0 when the call succeeded)
    pub code: u32,
    /// Cursor the error refers to
    pub cursor_id: u16,
    /// Offset into the statement text where the error was detected
    pub pos: i16,
    /// Rows processed by the call
    pub row_count: u64,
    /// Set when the message describes a warning rather than an error
    pub is_warning: bool,
    /// Server message text
    pub message: String,
    /// Last row touched by a DML statement
    pub rowid: Option<RowId>,
    /// Per-row failures of a batched DML execution
    pub batch_errors: Vec<BatchError>,
}

impl OracleErrorInfo {
    /// Create error info with only a code and message
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            ..Default::default()
        }
    }

    /// Whether the call completed without error
    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    /// Whether this is the end-of-fetch signal
    pub fn is_no_data_found(&self) -> bool {
        self.code == error_code::NO_DATA_FOUND
    }
}

impl fmt::Display for OracleErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = format!("ORA-{:05}:", self.code);
        if self.message.starts_with(&prefix) {
            f.write_str(&self.message)
        } else {
            write!(f, "{} {}", prefix, self.message)
        }
    }
}

impl std::error::Error for OracleErrorInfo {}

/// Failure of a single row within a batched DML execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchError {
    /// Zero-based index of the failed row within the batch
    pub row_index: usize,
    /// Oracle error code
    pub code: u32,
    /// Error message
    pub message: String,
}

impl BatchError {
    /// Create a new batch error
    pub fn new(row_index: usize, code: u32, message: impl Into<String>) -> Self {
        Self {
            row_index,
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: ORA-{:05}: {}", self.row_index, self.code, self.message)
    }
}

impl std::error::Error for BatchError {}

// =============================================================================
// Cell decode errors
// =============================================================================

/// Why a cell could not be decoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeFailure {
    /// The cell is NULL but the target type cannot represent NULL
    MissingData,
    /// The column's Oracle type cannot be converted to the target type
    TypeMismatch,
    /// The bytes are malformed for the column's Oracle type
    FailedToDecode(String),
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeFailure::MissingData => f.write_str("unexpected NULL"),
            DecodeFailure::TypeMismatch => f.write_str("type mismatch"),
            DecodeFailure::FailedToDecode(reason) => write!(f, "failed to decode: {}", reason),
        }
    }
}

/// A cell decode failure, attributed to one column and one call site
#[derive(Debug, Clone)]
pub struct DecodeError {
    /// What went wrong
    pub failure: DecodeFailure,
    /// Name of the column
    pub column_name: String,
    /// Zero-based column index
    pub column_index: usize,
    /// Rust type the caller asked for
    pub target_type: &'static str,
    /// Oracle type of the column
    pub oracle_type: OracleType,
    /// Raw bytes of the cell (None for NULL)
    pub raw: Option<Bytes>,
    /// Source file of the decode call
    pub file: &'static str,
    /// Source line of the decode call
    pub line: u32,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot decode column {} ({:?}, index {}) as {} at {}:{}: {}",
            self.column_name,
            self.oracle_type,
            self.column_index,
            self.target_type,
            self.file,
            self.line,
            self.failure
        )?;
        match &self.raw {
            Some(raw) => write!(f, " [bytes: {}]", hex::encode(raw)),
            None => f.write_str(" [NULL]"),
        }
    }
}

impl std::error::Error for DecodeError {}
