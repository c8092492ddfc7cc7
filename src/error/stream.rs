//! Streaming-related error types.
//!
//! These errors represent the ways an in-flight analysis request can fail:
//! the connection drops, the stream goes silent, or the backend explicitly
//! reports that the analysis did not succeed.

use std::fmt;

/// Terminal failure of a streaming analysis session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// Stream connection was lost or closed before a final response arrived.
    ConnectionLost { message: String },

    /// No event received within the configured inactivity window.
    Timeout { duration_secs: u64 },

    /// Backend reported `success: false` on its final response.
    Upstream,
}

impl StreamError {
    /// Check if this error is likely transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StreamError::ConnectionLost { .. } | StreamError::Timeout { .. }
        )
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            StreamError::ConnectionLost { .. } => {
                "Connection to the server was lost. Please check your connection and try again."
                    .to_string()
            }
            StreamError::Timeout { duration_secs } => {
                format!(
                    "No response from the server for {} seconds. The connection may have been lost.",
                    duration_secs
                )
            }
            StreamError::Upstream => {
                "The analysis failed on the server. Please try rephrasing your question."
                    .to_string()
            }
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            StreamError::ConnectionLost { .. } => "E_STREAM_CONN",
            StreamError::Timeout { .. } => "E_STREAM_TIMEOUT",
            StreamError::Upstream => "E_STREAM_UPSTREAM",
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::ConnectionLost { message } => {
                write!(f, "Stream connection lost: {}", message)
            }
            StreamError::Timeout { duration_secs } => {
                write!(f, "Stream timeout after {} seconds", duration_secs)
            }
            StreamError::Upstream => {
                write!(f, "Backend reported analysis failure")
            }
        }
    }
}

impl std::error::Error for StreamError {}
