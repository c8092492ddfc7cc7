//! Application orchestration: wires the store, transport, reducer, embed
//! cache, and notices together.
//!
//! One stream may be in flight per conversation at a time; a second
//! submission is rejected here, at the boundary, before any reducer exists.
//! Stream results come back through an mpsc channel tagged with a generation
//! counter so resolutions from abandoned streams are dropped instead of
//! leaking into newer conversations.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::client::ChatTransport;
use crate::config::AppConfig;
use crate::embed::{EmbedCache, EmbedError, ShowOutcome};
use crate::error::StreamError;
use crate::models::{ChatRequest, MessageBody};
use crate::notice::NoticeCenter;
use crate::store::ConversationStore;
use crate::stream::{run_stream, Outcome, ProgressLine, StreamReducer};

/// Messages delivered from stream tasks back to the app loop.
#[derive(Debug)]
pub enum AppMessage {
    /// Progress update for an in-flight request.
    Progress {
        thread_id: String,
        generation: u64,
        lines: Vec<ProgressLine>,
    },
    /// Terminal resolution of a request.
    StreamResolved {
        thread_id: String,
        generation: u64,
        outcome: Outcome,
    },
}

/// Identity of the stream currently in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
struct InFlight {
    thread_id: String,
    generation: u64,
}

/// Application root owning all client-side state.
pub struct App {
    config: AppConfig,
    pub store: ConversationStore,
    pub embeds: EmbedCache,
    pub notices: NoticeCenter,
    transport: Arc<dyn ChatTransport>,
    message_tx: mpsc::UnboundedSender<AppMessage>,
    in_flight: Option<InFlight>,
    generation: u64,
}

impl App {
    /// Build the app and the receiver its stream tasks report into.
    pub fn new(
        config: AppConfig,
        transport: Arc<dyn ChatTransport>,
        store: ConversationStore,
        embeds: EmbedCache,
    ) -> (Self, mpsc::UnboundedReceiver<AppMessage>) {
        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let notices = NoticeCenter::new(config.notice_ttl);
        (
            Self {
                config,
                store,
                embeds,
                notices,
                transport,
                message_tx,
                in_flight: None,
                generation: 0,
            },
            message_rx,
        )
    }

    /// Whether a stream is currently in flight.
    pub fn is_streaming(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Submit a question on the active thread.
    ///
    /// Returns whether a stream was actually started. Empty input and
    /// double-submission are rejected here with a notice, never inside the
    /// reducer.
    pub fn submit(&mut self, text: &str) -> bool {
        let content = text.trim();
        if content.is_empty() {
            return false;
        }

        if self.in_flight.is_some() {
            self.notices
                .push_warning("Please wait for the current response to complete.");
            return false;
        }

        let thread_id = self.store.active_thread().id.clone();
        let session_token = match self.store.session_token(&thread_id) {
            Ok(token) => token.to_string(),
            Err(e) => {
                self.notices.push_error(e.to_string());
                return false;
            }
        };

        if let Err(e) = self.store.append_user(&thread_id, content) {
            self.notices.push_error(e.to_string());
            return false;
        }
        if let Err(e) = self.store.begin_placeholder(&thread_id) {
            self.notices.push_error(e.to_string());
            return false;
        }

        self.generation += 1;
        let generation = self.generation;
        self.in_flight = Some(InFlight {
            thread_id: thread_id.clone(),
            generation,
        });

        let request =
            ChatRequest::with_session(content, session_token).with_mode(self.config.mode);
        let transport = Arc::clone(&self.transport);
        let tx = self.message_tx.clone();
        let idle_timeout = self.config.stream_idle_timeout;

        tokio::spawn(async move {
            let mut reducer = StreamReducer::new();
            let outcome = match transport.stream_chat(&request).await {
                Ok(events) => {
                    let progress_tx = tx.clone();
                    let progress_thread = thread_id.clone();
                    run_stream(events, &mut reducer, idle_timeout, move |lines| {
                        let _ = progress_tx.send(AppMessage::Progress {
                            thread_id: progress_thread.clone(),
                            generation,
                            lines,
                        });
                    })
                    .await
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to open stream");
                    Outcome::Failure(StreamError::ConnectionLost {
                        message: e.to_string(),
                    })
                }
            };

            let _ = tx.send(AppMessage::StreamResolved {
                thread_id,
                generation,
                outcome,
            });
        });

        true
    }

    /// Apply one message from a stream task.
    pub fn handle_message(&mut self, message: AppMessage) {
        match message {
            AppMessage::Progress {
                thread_id,
                generation,
                lines,
            } => {
                if !self.is_current(&thread_id, generation) {
                    return;
                }
                self.store.update_placeholder(&thread_id, lines);
            }
            AppMessage::StreamResolved {
                thread_id,
                generation,
                outcome,
            } => {
                if !self.is_current(&thread_id, generation) {
                    tracing::debug!(thread_id = %thread_id, generation, "stale resolution dropped");
                    return;
                }
                self.in_flight = None;

                let body = match outcome {
                    Outcome::Success(result) => MessageBody::Result { result },
                    Outcome::Failure(error) => {
                        self.notices.push_error(error.user_message());
                        MessageBody::Error {
                            message: error.user_message(),
                        }
                    }
                };
                if let Err(e) = self.store.replace_placeholder(&thread_id, body) {
                    tracing::warn!(thread_id = %thread_id, error = %e, "placeholder already gone");
                }
            }
        }
    }

    /// Start a fresh conversation, abandoning any in-flight stream.
    ///
    /// The old stream is not stopped at the transport level; its eventual
    /// resolution is simply discarded by the generation check, and its
    /// placeholder never leaks into the new thread.
    pub fn new_conversation(&mut self) -> String {
        if let Some(in_flight) = self.in_flight.take() {
            self.store.discard_placeholder(&in_flight.thread_id);
            tracing::debug!(thread_id = %in_flight.thread_id, "abandoned in-flight stream");
        }
        self.store.create_thread()
    }

    /// Switch the active conversation.
    pub fn switch_conversation(&mut self, thread_id: &str) {
        if let Err(e) = self.store.set_active(thread_id) {
            self.notices.push_warning(e.to_string());
        }
    }

    /// Delete a conversation; deleting the sole remaining one is refused.
    pub fn delete_conversation(&mut self, thread_id: &str) {
        if let Err(e) = self.store.delete_thread(thread_id) {
            self.notices.push_warning(e.to_string());
        }
    }

    /// Show a dashboard embed.
    pub fn show_dashboard(&mut self, url: &str, title: &str) {
        match self.embeds.show(url, title) {
            Ok(ShowOutcome::Opened) => {
                self.notices.push_info(format!("Dashboard opened: {}", title));
            }
            Ok(ShowOutcome::AlreadyVisible) => {
                self.notices.push_info("Dashboard is already open.");
            }
            Err(EmbedError::InvalidUrl { url }) => {
                self.notices
                    .push_warning(format!("Invalid dashboard URL: {}", url));
            }
            Err(e) => {
                self.embeds.mark_load_failed(url, e.to_string());
                self.notices.push_error(format!(
                    "Dashboard failed to load ({}). Try opening it externally.",
                    e
                ));
            }
        }
    }

    /// Hide any visible dashboard.
    pub fn hide_dashboard(&mut self) {
        self.embeds.hide();
    }

    /// Periodic housekeeping: expire stale notices.
    pub fn tick(&mut self) {
        self.notices.prune();
    }

    /// The directory conversations persist under.
    pub fn data_dir(&self) -> std::path::PathBuf {
        self.config.resolved_data_dir()
    }

    fn is_current(&self, thread_id: &str, generation: u64) -> bool {
        self.in_flight
            .as_ref()
            .map(|f| f.thread_id == thread_id && f.generation == generation)
            .unwrap_or(false)
    }
}
