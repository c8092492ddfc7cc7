use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::result::ClassifiedResult;
use crate::stream::ProgressLine;

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// Submitted by the user.
    User,
    /// Final assistant response.
    Assistant,
    /// Transient placeholder while a response is streaming. Never persisted.
    AssistantPending,
}

/// Message content - raw text, a classified result, an error payload, or the
/// in-flight progress display of a pending response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageBody {
    Text { text: String },
    Result { result: ClassifiedResult },
    Error { message: String },
    InProgress { lines: Vec<ProgressLine> },
}

/// A single message within a thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Monotonic message id, unique within the store.
    pub id: i64,
    pub role: MessageRole,
    pub body: MessageBody,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a user message.
    pub fn user(id: i64, text: impl Into<String>) -> Self {
        Self {
            id,
            role: MessageRole::User,
            body: MessageBody::Text { text: text.into() },
            created_at: Utc::now(),
        }
    }

    /// Create the in-progress placeholder for a streaming response.
    pub fn pending(id: i64) -> Self {
        Self {
            id,
            role: MessageRole::AssistantPending,
            body: MessageBody::InProgress { lines: Vec::new() },
            created_at: Utc::now(),
        }
    }

    /// Create a final assistant message carrying a classified result.
    pub fn assistant(id: i64, result: ClassifiedResult) -> Self {
        Self {
            id,
            role: MessageRole::Assistant,
            body: MessageBody::Result { result },
            created_at: Utc::now(),
        }
    }

    /// Create an assistant error message.
    pub fn error(id: i64, message: impl Into<String>) -> Self {
        Self {
            id,
            role: MessageRole::Assistant,
            body: MessageBody::Error {
                message: message.into(),
            },
            created_at: Utc::now(),
        }
    }

    /// Check whether this is the transient in-progress placeholder.
    pub fn is_pending(&self) -> bool {
        self.role == MessageRole::AssistantPending
    }

    /// Replace the progress display of a pending message.
    ///
    /// No-op for non-pending messages.
    pub fn set_progress(&mut self, lines: Vec<ProgressLine>) {
        if self.is_pending() {
            self.body = MessageBody::InProgress { lines };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message() {
        let msg = Message::user(1, "보여줘");
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(
            msg.body,
            MessageBody::Text {
                text: "보여줘".to_string()
            }
        );
        assert!(!msg.is_pending());
    }

    #[test]
    fn test_pending_message() {
        let msg = Message::pending(2);
        assert!(msg.is_pending());
        assert_eq!(msg.body, MessageBody::InProgress { lines: Vec::new() });
    }

    #[test]
    fn test_set_progress_on_pending() {
        let mut msg = Message::pending(3);
        let lines = vec![ProgressLine::new("🤖", "Starting analysis")];
        msg.set_progress(lines.clone());
        assert_eq!(msg.body, MessageBody::InProgress { lines });
    }

    #[test]
    fn test_set_progress_ignored_for_final_message() {
        let mut msg = Message::user(4, "hello");
        msg.set_progress(vec![ProgressLine::new("🤖", "ignored")]);
        assert_eq!(
            msg.body,
            MessageBody::Text {
                text: "hello".to_string()
            }
        );
    }

    #[test]
    fn test_error_message() {
        let msg = Message::error(5, "connection lost");
        assert_eq!(msg.role, MessageRole::Assistant);
        assert!(matches!(msg.body, MessageBody::Error { .. }));
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&MessageRole::AssistantPending).expect("serialize");
        assert_eq!(json, "\"assistant_pending\"");
    }

    #[test]
    fn test_body_tagged_serialization() {
        let body = MessageBody::Text {
            text: "hi".to_string(),
        };
        let json = serde_json::to_string(&body).expect("serialize");
        assert!(json.contains(r#""kind":"text""#));
    }
}
