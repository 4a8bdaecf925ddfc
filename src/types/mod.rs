//! Oracle data type decoding
//!
//! Wire-format decoders for the column types a fetch can return. Row cells
//! reach these through [`crate::cell::OracleDecode`].

mod binary;
mod datetime;
mod lob;
mod number;
mod rowid;

pub use binary::{decode_binary_double, decode_binary_float};
pub use datetime::{decode_oracle_date, decode_oracle_timestamp, decode_oracle_timestamp_tz};
pub use lob::{locator_encoding, LobEncoding, LobLocator};
pub use number::{decode_oracle_number, OracleNumber};
pub use rowid::RowId;
