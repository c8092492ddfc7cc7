//! SSE (Server-Sent Events) stream parser
//!
//! Parses the SSE format used by the analytics backend streaming API:
//! - `event: <type>` - event type line (optional; the backend usually omits
//!   it and carries the discriminator in the JSON payload instead)
//! - `data: <json>` - data payload line
//! - Empty line - signals end of event
//! - Lines starting with `:` - comments / keep-alives (ignored)
//!
//! # Module structure
//! - `events` - typed [`AgentEvent`] enum plus line/error types
//! - `parser` - parsing logic ([`SseParser`], [`parse_sse_line`],
//!   [`parse_event`])

mod events;
mod parser;

pub use events::{AgentEvent, SseLine, SseParseError};
pub use parser::{parse_event, parse_sse_line, SseParser};
