//! Typed events pushed by the backend during a streaming analysis request.

use serde_json::Value;

/// One event of the supervisor agent's trace stream.
///
/// Unknown discriminators land in [`AgentEvent::Other`] so new backend event
/// kinds degrade gracefully instead of breaking the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// Stream opened; the backend announces the analysis is starting.
    StreamStart { message: Option<String> },
    /// Supervisor reasoning step; `content` may span multiple lines.
    Reasoning { content: String },
    /// A sub-agent was invoked.
    AgentStart {
        agent: Option<String>,
        display_name: Option<String>,
        message: Option<String>,
    },
    /// Knowledge-base lookup finished.
    KnowledgeBase { references_count: u64 },
    /// A generated query started executing.
    QueryExecution { query_id: Option<String> },
    /// A visualization is being built.
    VisualizationCreated { chart_type: Option<String> },
    /// Non-terminal diagnostic; the stream may continue after this.
    Error { message: String },
    /// Terminal event carrying the final payload.
    FinalResponse { success: bool, result: Value },
    /// Forward-compatible catch-all for unrecognized event kinds.
    Other {
        kind: String,
        message: Option<String>,
    },
}

impl AgentEvent {
    /// Returns the event kind as a string for debugging purposes.
    pub fn kind(&self) -> &str {
        match self {
            AgentEvent::StreamStart { .. } => "stream_start",
            AgentEvent::Reasoning { .. } => "reasoning",
            AgentEvent::AgentStart { .. } => "agent_start",
            AgentEvent::KnowledgeBase { .. } => "knowledge_base",
            AgentEvent::QueryExecution { .. } => "query_execution",
            AgentEvent::VisualizationCreated { .. } => "visualization_created",
            AgentEvent::Error { .. } => "error",
            AgentEvent::FinalResponse { .. } => "final_response",
            AgentEvent::Other { kind, .. } => kind,
        }
    }

    /// Whether this event ends the request lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentEvent::FinalResponse { .. })
    }
}

/// Represents a parsed SSE line.
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine {
    /// Event type declaration (e.g., "event: reasoning")
    Event(String),
    /// Data payload (e.g., "data: {\"type\": \"stream_start\"}")
    Data(String),
    /// Empty line - signals end of event
    Empty,
    /// Comment line (starts with ':')
    Comment(String),
}

/// Errors that can occur during SSE parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum SseParseError {
    /// Invalid JSON in data payload
    InvalidJson { event_type: String, source: String },
    /// Missing data for event
    MissingData { event_type: String },
}

impl std::fmt::Display for SseParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SseParseError::InvalidJson { event_type, source } => {
                write!(f, "Invalid JSON for event '{}': {}", event_type, source)
            }
            SseParseError::MissingData { event_type } => {
                write!(f, "Missing data for event type: {}", event_type)
            }
        }
    }
}

impl std::error::Error for SseParseError {}
