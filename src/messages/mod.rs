//! TTC messages
//!
//! Decoders for the message bodies found in DATA packet payloads, the
//! FETCH request builder, and the dispatcher that drives a cursor through
//! one server response.

mod describe;
mod error_info;
mod fetch;
mod response;

pub use describe::{parse_describe_info, DescribeInfo};
pub use error_info::{parse_error_info, write_error_info};
pub use fetch::FetchMessage;
pub use response::ResponseProcessor;

pub(crate) use fetch::write_function_header;
