//! TNS protocol constants
//!
//! Wire codes for packet types, TTC message types, Oracle data types and the
//! handful of length, charset and flag values the decoder depends on. None of
//! these values may change between releases; they are fixed by the server.

use crate::error::Error;

// =============================================================================
// Packet Types
// =============================================================================

/// TNS packet types (found in packet header byte 4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    /// Initial connection request from client
    Connect = 1,
    /// Server accepts connection
    Accept = 2,
    /// Server refuses connection
    Refuse = 4,
    /// Server redirects to different address
    Redirect = 5,
    /// Data packet (contains TTC messages)
    Data = 6,
    /// Request packet resend
    Resend = 11,
    /// Marker packet (break/reset/interrupt)
    Marker = 12,
    /// Control packet (inband notifications)
    Control = 14,
}

impl PacketType {
    /// Canonical protocol name of this packet type
    pub fn name(&self) -> &'static str {
        match self {
            PacketType::Connect => "CONNECT",
            PacketType::Accept => "ACCEPT",
            PacketType::Refuse => "REFUSE",
            PacketType::Redirect => "REDIRECT",
            PacketType::Data => "DATA",
            PacketType::Resend => "RESEND",
            PacketType::Marker => "MARKER",
            PacketType::Control => "CONTROL",
        }
    }

    /// Wire code of this packet type
    #[inline]
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u8> for PacketType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PacketType::Connect),
            2 => Ok(PacketType::Accept),
            4 => Ok(PacketType::Refuse),
            5 => Ok(PacketType::Redirect),
            6 => Ok(PacketType::Data),
            11 => Ok(PacketType::Resend),
            12 => Ok(PacketType::Marker),
            14 => Ok(PacketType::Control),
            _ => Err(Error::InvalidPacketType(value)),
        }
    }
}

impl std::fmt::Display for PacketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Data Flags (for DATA packets)
// =============================================================================

/// Data flags (first 2 bytes of DATA packet payload)
#[allow(missing_docs)]
pub mod data_flags {
    pub const EOF: u16 = 0x0040;
    pub const END_OF_REQUEST: u16 = 0x0800;
    pub const END_OF_RESPONSE: u16 = 0x2000;
}

// =============================================================================
// Message Types (within DATA packets)
// =============================================================================

/// Message types found in DATA packet payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Protocol negotiation
    Protocol = 1,
    /// Data type negotiation
    DataTypes = 2,
    /// TTC function call
    Function = 3,
    /// Error (also used as end-of-call status)
    Error = 4,
    /// Row header
    RowHeader = 6,
    /// Row data
    RowData = 7,
    /// Return parameters
    Parameter = 8,
    /// Call status
    Status = 9,
    /// I/O vector
    IoVector = 11,
    /// LOB data
    LobData = 14,
    /// Warning
    Warning = 15,
    /// Column describe information
    DescribeInfo = 16,
    /// Piggyback function
    Piggyback = 17,
    /// Flush out binds
    FlushOutBinds = 19,
    /// Duplicate-column bit vector
    BitVector = 21,
    /// Server-side piggyback
    ServerSidePiggyback = 23,
    /// One-way function
    OnewayFn = 26,
    /// Implicit result set
    ImplicitResultset = 27,
    /// Renegotiate
    Renegotiate = 28,
    /// End of response marker (protocol 319+)
    EndOfResponse = 29,
    /// Session cookie
    Cookie = 30,
}

impl MessageType {
    /// Canonical protocol name of this message type
    pub fn name(&self) -> &'static str {
        match self {
            MessageType::Protocol => "PROTOCOL",
            MessageType::DataTypes => "DATA_TYPES",
            MessageType::Function => "FUNCTION",
            MessageType::Error => "ERROR",
            MessageType::RowHeader => "ROW_HEADER",
            MessageType::RowData => "ROW_DATA",
            MessageType::Parameter => "PARAMETER",
            MessageType::Status => "STATUS",
            MessageType::IoVector => "IO_VECTOR",
            MessageType::LobData => "LOB_DATA",
            MessageType::Warning => "WARNING",
            MessageType::DescribeInfo => "DESCRIBE_INFO",
            MessageType::Piggyback => "PIGGYBACK",
            MessageType::FlushOutBinds => "FLUSH_OUT_BINDS",
            MessageType::BitVector => "BIT_VECTOR",
            MessageType::ServerSidePiggyback => "SERVER_SIDE_PIGGYBACK",
            MessageType::OnewayFn => "ONEWAY_FN",
            MessageType::ImplicitResultset => "IMPLICIT_RESULTSET",
            MessageType::Renegotiate => "RENEGOTIATE",
            MessageType::EndOfResponse => "END_OF_RESPONSE",
            MessageType::Cookie => "COOKIE",
        }
    }

    /// Wire code of this message type
    #[inline]
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u8> for MessageType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, <Self as TryFrom<u8>>::Error> {
        match value {
            1 => Ok(MessageType::Protocol),
            2 => Ok(MessageType::DataTypes),
            3 => Ok(MessageType::Function),
            4 => Ok(MessageType::Error),
            6 => Ok(MessageType::RowHeader),
            7 => Ok(MessageType::RowData),
            8 => Ok(MessageType::Parameter),
            9 => Ok(MessageType::Status),
            11 => Ok(MessageType::IoVector),
            14 => Ok(MessageType::LobData),
            15 => Ok(MessageType::Warning),
            16 => Ok(MessageType::DescribeInfo),
            17 => Ok(MessageType::Piggyback),
            19 => Ok(MessageType::FlushOutBinds),
            21 => Ok(MessageType::BitVector),
            23 => Ok(MessageType::ServerSidePiggyback),
            26 => Ok(MessageType::OnewayFn),
            27 => Ok(MessageType::ImplicitResultset),
            28 => Ok(MessageType::Renegotiate),
            29 => Ok(MessageType::EndOfResponse),
            30 => Ok(MessageType::Cookie),
            _ => Err(Error::InvalidMessageType(value)),
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// TTC Function Codes
// =============================================================================

/// TTC (Two-Task Common) function codes used by the fetch engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FunctionCode {
    /// Fetch rows
    Fetch = 5,
    /// Commit transaction
    Commit = 14,
    /// Rollback transaction
    Rollback = 15,
}

// =============================================================================
// Protocol Versions
// =============================================================================

/// Protocol version constants
pub mod version {
    /// Minimum version using a 4-byte packet length (large SDU)
    pub const MIN_LARGE_SDU: u16 = 315;
    /// Minimum version supporting END_OF_RESPONSE messages
    pub const MIN_END_OF_RESPONSE: u16 = 319;
}

// =============================================================================
// Character Sets
// =============================================================================

/// Character set ID constants
#[allow(missing_docs)]
pub mod charset {
    pub const AL16UTF8: u16 = 208;
    pub const UTF8: u16 = 873;
    pub const UTF16: u16 = 2000;
}

/// Character set form (CSFRM) constants
pub mod csfrm {
    /// Implicit charset (database charset, UTF-8 on the wire)
    pub const IMPLICIT: u8 = 1;
    /// National charset (UTF-16 on the wire)
    pub const NCHAR: u8 = 2;
}

// =============================================================================
// Compile-Time Capabilities
// =============================================================================

/// Compile-time capability index constants
#[allow(missing_docs)]
pub mod ccap_index {
    pub const FIELD_VERSION: usize = 7;
    pub const MAX: usize = 53;
}

/// TTC field versions, as negotiated through the compile-time capabilities
#[allow(missing_docs)]
pub mod ccap_value {
    pub const FIELD_VERSION_12_1: u8 = 7;
    pub const FIELD_VERSION_12_2: u8 = 8;
    pub const FIELD_VERSION_18_1: u8 = 10;
    pub const FIELD_VERSION_19_1: u8 = 12;
    pub const FIELD_VERSION_20_1: u8 = 16;
    pub const FIELD_VERSION_23_1: u8 = 17;
    pub const FIELD_VERSION_23_1_EXT_3: u8 = 20;
    pub const FIELD_VERSION_23_4: u8 = 24;
    pub const FIELD_VERSION_MAX: u8 = 24;
}

/// Runtime capability index constants
#[allow(missing_docs)]
pub mod rcap_index {
    pub const TTC: usize = 6;
    pub const MAX: usize = 11;
}

/// Runtime capability values
#[allow(missing_docs)]
pub mod rcap_value {
    pub const TTC_32K: u8 = 0x04;
}

// =============================================================================
// TNS Length Indicators
// =============================================================================

/// TNS length indicator constants
pub mod length {
    /// Maximum length that fits in a single byte
    pub const MAX_SHORT: u8 = 252;
    /// Escape character for special values
    pub const ESCAPE_CHAR: u8 = 253;
    /// Indicates chunked data follows
    pub const LONG_INDICATOR: u8 = 254;
    /// Indicates NULL value
    pub const NULL_INDICATOR: u8 = 255;
}

// =============================================================================
// Oracle Data Types (ORA_TYPE_NUM)
// =============================================================================

/// Oracle internal data type numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OracleType {
    /// VARCHAR2 / NVARCHAR2
    Varchar = 1,
    /// NUMBER
    Number = 2,
    /// BINARY_INTEGER (PL/SQL)
    BinaryInteger = 3,
    /// LONG / LONG NVARCHAR
    Long = 8,
    /// ROWID
    Rowid = 11,
    /// DATE
    Date = 12,
    /// RAW
    Raw = 23,
    /// LONG RAW
    LongRaw = 24,
    /// CHAR / NCHAR
    Char = 96,
    /// BINARY_FLOAT
    BinaryFloat = 100,
    /// BINARY_DOUBLE
    BinaryDouble = 101,
    /// CLOB / NCLOB
    Clob = 112,
    /// BLOB
    Blob = 113,
    /// BFILE
    Bfile = 114,
    /// JSON (21c+)
    Json = 119,
    /// TIMESTAMP
    Timestamp = 180,
    /// TIMESTAMP WITH TIME ZONE
    TimestampTz = 181,
    /// UROWID
    Urowid = 208,
    /// TIMESTAMP WITH LOCAL TIME ZONE
    TimestampLtz = 231,
    /// BOOLEAN (23c+)
    Boolean = 252,
}

impl OracleType {
    /// Check if this type is fetched through a LOB locator
    pub fn is_lob(&self) -> bool {
        matches!(self, OracleType::Clob | OracleType::Blob | OracleType::Bfile)
    }

    /// Check if values of this type are character data
    pub fn is_character(&self) -> bool {
        matches!(
            self,
            OracleType::Varchar | OracleType::Char | OracleType::Long | OracleType::Clob
        )
    }

    /// SQL name of this type, taking the charset form into account
    pub fn name(&self, charset_form: u8) -> &'static str {
        let nchar = charset_form == csfrm::NCHAR;
        match self {
            OracleType::Varchar if nchar => "NVARCHAR2",
            OracleType::Varchar => "VARCHAR2",
            OracleType::Number => "NUMBER",
            OracleType::BinaryInteger => "BINARY_INTEGER",
            OracleType::Long if nchar => "LONG NVARCHAR",
            OracleType::Long => "LONG",
            OracleType::Rowid => "ROWID",
            OracleType::Date => "DATE",
            OracleType::Raw => "RAW",
            OracleType::LongRaw => "LONG RAW",
            OracleType::Char if nchar => "NCHAR",
            OracleType::Char => "CHAR",
            OracleType::BinaryFloat => "BINARY_FLOAT",
            OracleType::BinaryDouble => "BINARY_DOUBLE",
            OracleType::Clob if nchar => "NCLOB",
            OracleType::Clob => "CLOB",
            OracleType::Blob => "BLOB",
            OracleType::Bfile => "BFILE",
            OracleType::Json => "JSON",
            OracleType::Timestamp => "TIMESTAMP",
            OracleType::TimestampTz => "TIMESTAMP WITH TIME ZONE",
            OracleType::Urowid => "UROWID",
            OracleType::TimestampLtz => "TIMESTAMP WITH LOCAL TIME ZONE",
            OracleType::Boolean => "BOOLEAN",
        }
    }
}

impl TryFrom<u8> for OracleType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(OracleType::Varchar),
            2 => Ok(OracleType::Number),
            3 => Ok(OracleType::BinaryInteger),
            8 => Ok(OracleType::Long),
            11 => Ok(OracleType::Rowid),
            12 => Ok(OracleType::Date),
            23 => Ok(OracleType::Raw),
            24 => Ok(OracleType::LongRaw),
            96 => Ok(OracleType::Char),
            100 => Ok(OracleType::BinaryFloat),
            101 => Ok(OracleType::BinaryDouble),
            112 => Ok(OracleType::Clob),
            113 => Ok(OracleType::Blob),
            114 => Ok(OracleType::Bfile),
            119 => Ok(OracleType::Json),
            180 => Ok(OracleType::Timestamp),
            181 => Ok(OracleType::TimestampTz),
            208 => Ok(OracleType::Urowid),
            231 => Ok(OracleType::TimestampLtz),
            252 => Ok(OracleType::Boolean),
            _ => Err(Error::InvalidOracleType(value)),
        }
    }
}

// =============================================================================
// LOB Locator Layout
// =============================================================================

/// LOB locator byte offsets and flag bits
#[allow(missing_docs)]
pub mod lob_flags {
    pub const LOC_OFFSET_FLAG_1: usize = 4;
    pub const LOC_OFFSET_FLAG_2: usize = 5;
    pub const LOC_OFFSET_FLAG_3: usize = 6;
    pub const LOC_OFFSET_FLAG_4: usize = 7;

    // byte 1 at offset 4
    pub const LOC_FLAGS_BLOB: u8 = 0x01;
    pub const LOC_FLAGS_VALUE_BASED: u8 = 0x20;
    pub const LOC_FLAGS_ABSTRACT: u8 = 0x40;

    // byte 2 at offset 5
    pub const LOC_FLAGS_INIT: u8 = 0x08;

    // byte 3 at offset 6
    pub const LOC_FLAGS_VAR_LENGTH_CHARSET: u8 = 0x80;

    // byte 4 at offset 7
    pub const LOC_FLAGS_TEMP: u8 = 0x01;
}

// =============================================================================
// Error Codes
// =============================================================================

/// Oracle error code constants
#[allow(missing_docs)]
pub mod error_code {
    pub const NO_DATA_FOUND: u32 = 1403;
    pub const ARRAY_DML_ERRORS: u32 = 24381;
}

// =============================================================================
// Packet Header
// =============================================================================

/// TNS packet header size in bytes
pub const PACKET_HEADER_SIZE: usize = 8;

/// Length of an encoded physical ROWID string
pub const MAX_ROWID_LENGTH: usize = 18;
