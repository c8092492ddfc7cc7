//! Error types shared across the client core.
//!
//! Streaming errors get their own module with user-facing messages and
//! error codes; the store, embed, and transport layers define their error
//! enums next to the code that produces them.

mod stream;

pub use stream::StreamError;
