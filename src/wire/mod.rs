//! Command wire mapper.
//!
//! Translates [`CecCommand`](crate::types::CecCommand)s to and from the
//! adapter's frame layout and keeps the per-attempt bookkeeping needed to
//! correlate adapter replies with the request that caused them.
//!
//! The serial link is one in-order channel shared by bus traffic and adapter
//! housekeeping, and the adapter may report received bus bytes between a
//! request and its reply. Replies are therefore matched by message code
//! ([`AdapterFrame::response_to`](crate::codec::AdapterFrame::response_to)),
//! never by position.

mod correlation;
mod mapper;
mod message;

pub use mapper::{CommandAssembler, Decoded, decode, encode};
pub use message::{AdapterMessage, MessageState, build_frame};
