//! HTTP client for the analytics backend.
//!
//! Provides the streaming trace endpoint (SSE) plus the session endpoints.
//! The [`ChatTransport`] trait keeps the transport injectable so the app and
//! its tests can run against a scripted event source instead of a live
//! server.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::stream::{self, Stream};
use futures_util::StreamExt;
use reqwest::Client;

use crate::config::AppConfig;
use crate::models::{ChatRequest, SessionInfo};
use crate::sse::{AgentEvent, SseParseError, SseParser};

/// Default backend base URL for local development.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Stream of parsed agent events with a terminal completion-or-error signal.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<AgentEvent, ClientError>> + Send>>;

/// Error type for backend client operations.
#[derive(Debug)]
pub enum ClientError {
    /// HTTP request failed
    Http(reqwest::Error),
    /// SSE parsing failed
    SseParse(SseParseError),
    /// JSON deserialization failed
    Json(serde_json::Error),
    /// Server returned an error status
    ServerError { status: u16, message: String },
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Http(e) => write!(f, "HTTP error: {}", e),
            ClientError::SseParse(e) => write!(f, "SSE parse error: {}", e),
            ClientError::Json(e) => write!(f, "JSON error: {}", e),
            ClientError::ServerError { status, message } => {
                write!(f, "Server error ({}): {}", status, message)
            }
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Http(e) => Some(e),
            ClientError::SseParse(e) => Some(e),
            ClientError::Json(e) => Some(e),
            ClientError::ServerError { .. } => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Http(e)
    }
}

impl From<SseParseError> for ClientError {
    fn from(e: SseParseError) -> Self {
        ClientError::SseParse(e)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Json(e)
    }
}

/// Transport seam between the app and the backend.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Open the streaming trace endpoint for one request.
    async fn stream_chat(&self, request: &ChatRequest) -> Result<EventStream, ClientError>;
}

/// Client for the analytics backend API.
pub struct AnalyticsClient {
    /// Base URL for the backend API
    pub base_url: String,
    /// Reusable HTTP client
    client: Client,
}

impl AnalyticsClient {
    /// Create a client with the default base URL.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL.to_string())
    }

    /// Create a client with a custom base URL.
    pub fn with_base_url(base_url: String) -> Self {
        Self {
            base_url,
            client: Client::new(),
        }
    }

    /// Create a client from application configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::with_base_url(config.base_url.clone())
    }

    /// Open the supervisor trace stream for a chat request.
    ///
    /// Sends `POST /api/chat/stream/trace` and returns a stream of typed
    /// agent events; SSE framing is decoded here so consumers only see
    /// parsed events.
    pub async fn stream_chat(&self, request: &ChatRequest) -> Result<EventStream, ClientError> {
        let url = format!("{}/api/chat/stream/trace", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::ServerError { status, message });
        }

        // Fused so the end-of-stream flush can safely poll again.
        let bytes_stream = response.bytes_stream().fuse();

        // Decode the byte stream into lines, feed them to the SSE parser,
        // and emit each complete event as it forms.
        let event_stream = stream::unfold(
            (bytes_stream, SseParser::new(), String::new()),
            |(mut bytes_stream, mut parser, mut buffer)| async move {
                loop {
                    if let Some(newline_pos) = buffer.find('\n') {
                        let line = buffer[..newline_pos].trim_end_matches('\r').to_string();
                        buffer = buffer[newline_pos + 1..].to_string();

                        match parser.feed_line(&line) {
                            Ok(Some(event)) => {
                                return Some((Ok(event), (bytes_stream, parser, buffer)));
                            }
                            Ok(None) => continue,
                            Err(e) => {
                                return Some((
                                    Err(ClientError::SseParse(e)),
                                    (bytes_stream, parser, buffer),
                                ));
                            }
                        }
                    }

                    match bytes_stream.next().await {
                        Some(Ok(chunk)) => {
                            buffer.push_str(&String::from_utf8_lossy(&chunk));
                        }
                        Some(Err(e)) => {
                            return Some((
                                Err(ClientError::Http(e)),
                                (bytes_stream, parser, buffer),
                            ));
                        }
                        None => {
                            // Stream ended - flush any trailing line, then a
                            // final empty line so a last unterminated event
                            // still emits.
                            for line in [buffer.trim_end_matches('\r').to_string(), String::new()]
                            {
                                match parser.feed_line(&line) {
                                    Ok(Some(event)) => {
                                        return Some((
                                            Ok(event),
                                            (bytes_stream, parser, String::new()),
                                        ));
                                    }
                                    Ok(None) => {}
                                    Err(e) => {
                                        return Some((
                                            Err(ClientError::SseParse(e)),
                                            (bytes_stream, parser, String::new()),
                                        ));
                                    }
                                }
                            }
                            return None;
                        }
                    }
                }
            },
        );

        Ok(Box::pin(event_stream))
    }

    /// Fetch session detail from the backend.
    pub async fn fetch_session(&self, session_id: &str) -> Result<SessionInfo, ClientError> {
        let url = format!("{}/api/session/{}", self.base_url, session_id);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::ServerError { status, message });
        }

        Ok(response.json().await?)
    }

    /// Clear a backend session.
    pub async fn clear_session(&self, session_id: &str) -> Result<(), ClientError> {
        let url = format!("{}/api/session/{}", self.base_url, session_id);
        let response = self.client.delete(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::ServerError { status, message });
        }

        Ok(())
    }
}

impl Default for AnalyticsClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatTransport for AnalyticsClient {
    async fn stream_chat(&self, request: &ChatRequest) -> Result<EventStream, ClientError> {
        AnalyticsClient::stream_chat(self, request).await
    }
}
