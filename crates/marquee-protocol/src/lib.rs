//! Wire protocol for the marquee relay.
//!
//! Two formats live here:
//!
//! - the client request: one message of `/`-separated `name = 'value'`
//!   tokens in fixed positional order (movie, location, date, time), and
//!   the downstream query string built from it;
//! - the response stream: NUL-terminated messages of at most
//!   [`MAX_MESSAGE_BYTES`] payload bytes, ended by one of two sentinel
//!   payloads ([`SENTINEL_NO_RESULTS`] / [`SENTINEL_DONE`]).

mod message;
mod query;
mod request;

pub use message::{
    MAX_MESSAGE_BYTES, MessageReader, Reply, SENTINEL_DONE, SENTINEL_NO_RESULTS, write_message,
};
pub use query::{QUERY_BASE, build_query};
pub use request::{FIELD_NAMES, ParseError, Request, decode_request, encode_wire};
