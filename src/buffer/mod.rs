//! Buffer abstractions for TNS protocol encoding/decoding
//!
//! [`ReadBuffer`] walks a received payload, [`WriteBuffer`] assembles an
//! outgoing one. Both follow the TTC variable-length integer and
//! length-prefixed byte conventions.

mod read;
mod write;

pub(crate) use read::decode_text;
pub use read::ReadBuffer;
pub use write::WriteBuffer;
