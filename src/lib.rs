#![warn(missing_docs)]

//! # tns-core
//!
//! Decode/encode core of the Oracle TNS thin-client protocol and the cursor
//! fetch engine built on it. No OCI or Oracle client libraries are involved;
//! the crate works on bytes and leaves sockets, authentication and session
//! management to the caller.
//!
//! ## What is here
//!
//! - **Wire taxonomy** - packet and message type codes, Oracle type numbers
//! - **Buffers** - TTC variable-length integers and length-prefixed strings
//! - **Packets** - header parsing and async packet reads over any `AsyncRead`
//! - **Cursor engine** - describe handling, row buffering, duplicate-column
//!   elimination, end-of-fetch and batch DML outcomes
//! - **Cell decoding** - NUMBER, DATE/TIMESTAMP, BINARY_FLOAT/DOUBLE, ROWID,
//!   LOB locators and JSON into Rust types, with structured errors
//! - **Session plumbing** - client identity, cookie cache, transaction
//!   sequencing
//!
//! ## Fetching rows
//!
//! The caller owns the transport. A cursor says when it needs another
//! round-trip and builds the request for it:
//!
//! ```rust,no_run
//! use tns_core::{Capabilities, Cursor, FetchStatus, Result};
//!
//! # async fn exchange(_request: bytes::Bytes) -> Result<bytes::Bytes> { unimplemented!() }
//! async fn collect_ids(cursor: &mut Cursor, caps: &Capabilities) -> Result<Vec<i64>> {
//!     let mut ids = Vec::new();
//!     loop {
//!         match cursor.next_row() {
//!             FetchStatus::Row(row) => ids.push(row.get::<i64>(0)?),
//!             FetchStatus::NeedsFetch => {
//!                 let request = cursor.fetch_message()?.build_request(caps.uses_large_sdu())?;
//!                 // `exchange` returns the response's DATA payload without its flags
//!                 let reply = exchange(request).await?;
//!                 cursor.process_response(&reply, caps)?;
//!             }
//!             FetchStatus::Exhausted => return Ok(ids),
//!         }
//!     }
//! }
//! ```
//!
//! ## Data Types
//!
//! | Oracle Type | Rust Type |
//! |-------------|-----------|
//! | NUMBER | `i32`, `i64`, `f64`, `String`, [`OracleNumber`] |
//! | VARCHAR2, CHAR, LONG (and N- variants) | `String` |
//! | DATE, TIMESTAMP | `chrono::NaiveDateTime` |
//! | TIMESTAMP WITH TIME ZONE | `chrono::DateTime<FixedOffset>` |
//! | BINARY_FLOAT | `f32`, `f64` |
//! | BINARY_DOUBLE | `f64` |
//! | RAW, LONG RAW | `Vec<u8>`, `bytes::Bytes` |
//! | ROWID | [`RowId`], `String` |
//! | CLOB, NCLOB, BLOB, BFILE | [`LobLocator`] |
//! | BOOLEAN | `bool` |
//! | JSON | `serde_json::Value` |
//!
//! Every target also decodes as `Option<T>`, which is the only way to
//! receive SQL NULL.

pub mod buffer;
pub mod capabilities;
pub mod cell;
pub mod config;
pub mod constants;
pub mod cookie;
pub mod cursor;
pub mod error;
pub mod identity;
pub mod messages;
pub mod packet;
pub mod row;
pub mod statement;
pub mod transaction;
pub mod types;
pub mod variable;

// Re-export commonly used types
pub use capabilities::Capabilities;
pub use cell::{Cell, DecodingContext, JsonDecoder, OracleDecode, SerdeJsonDecoder};
pub use config::{Config, FetchOptions, ServiceMethod};
pub use constants::{FunctionCode, MessageType, OracleType, PacketType};
pub use cookie::{ConnectionCookie, CookieCache};
pub use cursor::{Cursor, CursorState, FetchStatus};
pub use error::{BatchError, DecodeError, DecodeFailure, Error, OracleErrorInfo, Result};
pub use identity::ConnectIdentity;
pub use messages::{FetchMessage, ResponseProcessor};
pub use packet::{read_packet, Packet, PacketHeader};
pub use row::Row;
pub use statement::{Statement, StatementType};
pub use transaction::{TransactionControl, TransactionError, TransactionScope};
pub use types::{LobEncoding, LobLocator, OracleNumber, RowId};
pub use variable::{ColumnDescribe, RawValue, Variable};

// Re-export serde_json for users working with JSON columns
pub use serde_json;
