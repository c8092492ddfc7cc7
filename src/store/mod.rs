//! Conversation store: ordered threads, each with its own session token and
//! message history.
//!
//! Invariants:
//! - at least one thread always exists (deleting the last one is rejected)
//! - exactly one thread is active at a time
//! - at most one in-progress placeholder message exists per thread
//!
//! # Module structure
//! - `persist` - JSON file persistence under the data directory

pub mod persist;

use thiserror::Error;

use crate::models::{ConversationThread, Message, MessageBody};
use crate::stream::ProgressLine;

/// Errors from conversation store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot delete the last remaining conversation")]
    LastThread,

    #[error("unknown thread: {0}")]
    UnknownThread(String),

    #[error("a response is already in progress for this conversation")]
    PendingExists,

    #[error("no in-progress message to replace")]
    NoPlaceholder,

    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Holds every conversation thread and tracks the active one.
#[derive(Debug)]
pub struct ConversationStore {
    threads: Vec<ConversationThread>,
    active_idx: usize,
    next_message_id: i64,
}

impl ConversationStore {
    /// Create a store with one fresh, active thread.
    pub fn new() -> Self {
        Self {
            threads: vec![ConversationThread::new()],
            active_idx: 0,
            next_message_id: 1,
        }
    }

    /// Build a store from persisted threads.
    ///
    /// An empty list falls back to a fresh store. Any stray in-progress
    /// placeholder from an interrupted session is scrubbed.
    pub fn from_threads(mut threads: Vec<ConversationThread>) -> Self {
        if threads.is_empty() {
            return Self::new();
        }
        for thread in &mut threads {
            thread.messages.retain(|m| !m.is_pending());
        }
        let next_message_id = threads
            .iter()
            .flat_map(|t| t.messages.iter())
            .map(|m| m.id)
            .max()
            .unwrap_or(0)
            + 1;
        Self {
            threads,
            active_idx: 0,
            next_message_id,
        }
    }

    /// All threads, in creation order.
    pub fn threads(&self) -> &[ConversationThread] {
        &self.threads
    }

    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    /// The active thread. At least one thread always exists.
    pub fn active_thread(&self) -> &ConversationThread {
        &self.threads[self.active_idx]
    }

    /// Look up a thread by id.
    pub fn get(&self, thread_id: &str) -> Option<&ConversationThread> {
        self.threads.iter().find(|t| t.id == thread_id)
    }

    /// Create a fresh thread and make it active. Returns its id.
    pub fn create_thread(&mut self) -> String {
        let thread = ConversationThread::new();
        let id = thread.id.clone();
        self.threads.push(thread);
        self.active_idx = self.threads.len() - 1;
        id
    }

    /// Make the given thread active.
    pub fn set_active(&mut self, thread_id: &str) -> Result<(), StoreError> {
        let idx = self.index_of(thread_id)?;
        self.active_idx = idx;
        Ok(())
    }

    /// Delete a thread.
    ///
    /// Refused when it is the sole remaining thread; the thread list is left
    /// unchanged in that case.
    pub fn delete_thread(&mut self, thread_id: &str) -> Result<(), StoreError> {
        if self.threads.len() == 1 {
            return Err(StoreError::LastThread);
        }
        let idx = self.index_of(thread_id)?;
        self.threads.remove(idx);
        if self.active_idx >= self.threads.len() {
            self.active_idx = self.threads.len() - 1;
        } else if idx < self.active_idx {
            self.active_idx -= 1;
        }
        Ok(())
    }

    /// Session token correlating a thread with backend agent context.
    pub fn session_token(&self, thread_id: &str) -> Result<&str, StoreError> {
        let idx = self.index_of(thread_id)?;
        Ok(&self.threads[idx].session_token)
    }

    /// Append a user message, deriving the thread title from the first one.
    pub fn append_user(&mut self, thread_id: &str, text: &str) -> Result<i64, StoreError> {
        let idx = self.index_of(thread_id)?;
        let id = self.alloc_id();
        let thread = &mut self.threads[idx];
        if thread.title.is_empty() {
            thread.title = ConversationThread::derive_title(text);
        }
        thread.messages.push(Message::user(id, text));
        Ok(id)
    }

    /// Create the in-progress placeholder for a streaming response.
    ///
    /// At most one placeholder may exist per thread.
    pub fn begin_placeholder(&mut self, thread_id: &str) -> Result<i64, StoreError> {
        let idx = self.index_of(thread_id)?;
        let id = self.alloc_id();
        let thread = &mut self.threads[idx];
        if thread.has_pending() {
            return Err(StoreError::PendingExists);
        }
        thread.messages.push(Message::pending(id));
        Ok(id)
    }

    /// Update the placeholder's progress display.
    ///
    /// Returns false when the thread has no placeholder (e.g. it was already
    /// resolved or abandoned).
    pub fn update_placeholder(&mut self, thread_id: &str, lines: Vec<ProgressLine>) -> bool {
        let Ok(idx) = self.index_of(thread_id) else {
            return false;
        };
        match self.threads[idx].messages.iter_mut().find(|m| m.is_pending()) {
            Some(message) => {
                message.set_progress(lines);
                true
            }
            None => false,
        }
    }

    /// Replace the placeholder with the final or error message.
    ///
    /// The placeholder is removed and the terminal message appended; this
    /// happens exactly once per request.
    pub fn replace_placeholder(
        &mut self,
        thread_id: &str,
        body: MessageBody,
    ) -> Result<i64, StoreError> {
        let idx = self.index_of(thread_id)?;
        let id = self.alloc_id();
        let thread = &mut self.threads[idx];
        let Some(pos) = thread.messages.iter().position(|m| m.is_pending()) else {
            return Err(StoreError::NoPlaceholder);
        };
        thread.messages.remove(pos);
        let message = match body {
            MessageBody::Result { result } => Message::assistant(id, result),
            MessageBody::Error { message } => Message::error(id, message),
            MessageBody::Text { text } => {
                Message::assistant(id, crate::models::ClassifiedResult::Text { text })
            }
            MessageBody::InProgress { .. } => return Err(StoreError::NoPlaceholder),
        };
        thread.messages.push(message);
        Ok(id)
    }

    /// Drop the placeholder without a terminal message (abandoned stream).
    ///
    /// Returns whether a placeholder existed.
    pub fn discard_placeholder(&mut self, thread_id: &str) -> bool {
        let Ok(idx) = self.index_of(thread_id) else {
            return false;
        };
        let messages = &mut self.threads[idx].messages;
        let before = messages.len();
        messages.retain(|m| !m.is_pending());
        before != messages.len()
    }

    fn index_of(&self, thread_id: &str) -> Result<usize, StoreError> {
        self.threads
            .iter()
            .position(|t| t.id == thread_id)
            .ok_or_else(|| StoreError::UnknownThread(thread_id.to_string()))
    }

    fn alloc_id(&mut self) -> i64 {
        let id = self.next_message_id;
        self.next_message_id += 1;
        id
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisResult, ClassifiedResult, MessageRole};

    #[test]
    fn test_new_store_has_one_active_thread() {
        let store = ConversationStore::new();
        assert_eq!(store.thread_count(), 1);
        assert_eq!(store.active_thread().id, store.threads()[0].id);
    }

    #[test]
    fn test_create_thread_becomes_active() {
        let mut store = ConversationStore::new();
        let id = store.create_thread();
        assert_eq!(store.thread_count(), 2);
        assert_eq!(store.active_thread().id, id);
    }

    #[test]
    fn test_delete_last_thread_rejected() {
        let mut store = ConversationStore::new();
        let id = store.active_thread().id.clone();
        let result = store.delete_thread(&id);
        assert!(matches!(result, Err(StoreError::LastThread)));
        // Thread list unchanged.
        assert_eq!(store.thread_count(), 1);
        assert_eq!(store.active_thread().id, id);
    }

    #[test]
    fn test_delete_active_thread_activates_another() {
        let mut store = ConversationStore::new();
        let first = store.active_thread().id.clone();
        let second = store.create_thread();
        store.delete_thread(&second).expect("delete");
        assert_eq!(store.active_thread().id, first);
    }

    #[test]
    fn test_delete_earlier_thread_keeps_active() {
        let mut store = ConversationStore::new();
        let first = store.active_thread().id.clone();
        let second = store.create_thread();
        store.delete_thread(&first).expect("delete");
        assert_eq!(store.active_thread().id, second);
    }

    #[test]
    fn test_delete_unknown_thread() {
        let mut store = ConversationStore::new();
        store.create_thread();
        assert!(matches!(
            store.delete_thread("missing"),
            Err(StoreError::UnknownThread(_))
        ));
    }

    #[test]
    fn test_append_user_derives_title_once() {
        let mut store = ConversationStore::new();
        let id = store.active_thread().id.clone();
        store
            .append_user(&id, "2025년 1월 VOC 데이터를 분석해줘")
            .expect("append");
        assert_eq!(store.active_thread().title, "2025년 1월 VOC 데이터를 분석해줘");

        store.append_user(&id, "다른 질문").expect("append");
        // Title stays pinned to the first message.
        assert_eq!(store.active_thread().title, "2025년 1월 VOC 데이터를 분석해줘");
    }

    #[test]
    fn test_append_user_truncates_long_title() {
        let mut store = ConversationStore::new();
        let id = store.active_thread().id.clone();
        let long = "월별 채널별 카테고리별 우선순위별 상태별 VOC 접수 현황을 모두 보여주세요";
        store.append_user(&id, long).expect("append");
        let title = &store.active_thread().title;
        assert_eq!(title.chars().count(), 31);
        assert!(title.ends_with('…'));
    }

    #[test]
    fn test_placeholder_lifecycle() {
        let mut store = ConversationStore::new();
        let id = store.active_thread().id.clone();
        store.append_user(&id, "질문").expect("append");
        store.begin_placeholder(&id).expect("placeholder");
        assert!(store.active_thread().has_pending());

        // Second placeholder is rejected.
        assert!(matches!(
            store.begin_placeholder(&id),
            Err(StoreError::PendingExists)
        ));

        store.update_placeholder(&id, vec![ProgressLine::new("🤖", "분석 시작")]);

        let result = ClassifiedResult::Analysis(AnalysisResult {
            query_id: Some("Q1".to_string()),
            ..Default::default()
        });
        store
            .replace_placeholder(
                &id,
                MessageBody::Result {
                    result: result.clone(),
                },
            )
            .expect("replace");

        let thread = store.active_thread();
        assert!(!thread.has_pending());
        let last = thread.messages.last().expect("message");
        assert_eq!(last.role, MessageRole::Assistant);
        assert_eq!(last.body, MessageBody::Result { result });
    }

    #[test]
    fn test_replace_placeholder_exactly_once() {
        let mut store = ConversationStore::new();
        let id = store.active_thread().id.clone();
        store.begin_placeholder(&id).expect("placeholder");
        store
            .replace_placeholder(
                &id,
                MessageBody::Error {
                    message: "connection lost".to_string(),
                },
            )
            .expect("replace");
        // Nothing left to replace.
        assert!(matches!(
            store.replace_placeholder(
                &id,
                MessageBody::Error {
                    message: "again".to_string()
                }
            ),
            Err(StoreError::NoPlaceholder)
        ));
        assert_eq!(store.active_thread().messages.len(), 1);
    }

    #[test]
    fn test_discard_placeholder() {
        let mut store = ConversationStore::new();
        let id = store.active_thread().id.clone();
        store.begin_placeholder(&id).expect("placeholder");
        assert!(store.discard_placeholder(&id));
        assert!(!store.discard_placeholder(&id));
        assert!(store.active_thread().messages.is_empty());
    }

    #[test]
    fn test_update_placeholder_without_one_is_noop() {
        let mut store = ConversationStore::new();
        let id = store.active_thread().id.clone();
        assert!(!store.update_placeholder(&id, vec![]));
    }

    #[test]
    fn test_session_token_distinct_from_thread_id() {
        let store = ConversationStore::new();
        let thread = store.active_thread();
        let token = store.session_token(&thread.id).expect("token");
        assert_ne!(token, thread.id);
    }

    #[test]
    fn test_message_ids_monotonic_across_threads() {
        let mut store = ConversationStore::new();
        let first = store.active_thread().id.clone();
        let a = store.append_user(&first, "one").expect("append");
        let second = store.create_thread();
        let b = store.append_user(&second, "two").expect("append");
        assert!(b > a);
    }

    #[test]
    fn test_from_threads_scrubs_pending_and_continues_ids() {
        let mut thread = ConversationThread::new();
        thread.messages.push(Message::user(7, "질문"));
        thread.messages.push(Message::pending(8));

        let mut store = ConversationStore::from_threads(vec![thread]);
        assert!(!store.active_thread().has_pending());
        let id = store.active_thread().id.clone();
        let next = store.append_user(&id, "next").expect("append");
        assert!(next > 7);
    }

    #[test]
    fn test_from_threads_empty_falls_back_to_fresh() {
        let store = ConversationStore::from_threads(Vec::new());
        assert_eq!(store.thread_count(), 1);
    }
}
