use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::message::Message;

/// Maximum number of characters kept when deriving a thread title from the
/// first user message.
pub const TITLE_MAX_CHARS: usize = 30;

/// A conversation thread: an ordered message history plus the backend-side
/// session identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationThread {
    /// Client-generated thread identifier.
    pub id: String,
    /// Title derived from the first user message; empty until one arrives.
    #[serde(default)]
    pub title: String,
    /// Opaque token correlating this thread with backend agent context.
    /// Distinct from the thread id.
    pub session_token: String,
    /// Ordered message history.
    #[serde(default)]
    pub messages: Vec<Message>,
    /// When the thread was created.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl ConversationThread {
    /// Create a new empty thread with fresh identifiers.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: String::new(),
            session_token: Uuid::new_v4().to_string(),
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Derive a display title from user message text.
    ///
    /// Truncates to [`TITLE_MAX_CHARS`] characters with an ellipsis.
    pub fn derive_title(text: &str) -> String {
        let trimmed = text.trim();
        if trimmed.chars().count() <= TITLE_MAX_CHARS {
            trimmed.to_string()
        } else {
            let head: String = trimmed.chars().take(TITLE_MAX_CHARS).collect();
            format!("{}…", head)
        }
    }

    /// Check whether this thread currently holds an in-progress placeholder.
    pub fn has_pending(&self) -> bool {
        self.messages.iter().any(|m| m.is_pending())
    }
}

impl Default for ConversationThread {
    fn default() -> Self {
        Self::new()
    }
}
