//! SSE stream parsing logic
//!
//! Contains the stateful [`SseParser`] for accumulating lines and emitting
//! events, plus the payload deserialization for each event kind.

use serde::Deserialize;
use serde_json::Value;

use super::events::{AgentEvent, SseLine, SseParseError};

/// Parse a single SSE line into its component type.
pub fn parse_sse_line(line: &str) -> SseLine {
    if line.is_empty() {
        return SseLine::Empty;
    }

    if let Some(stripped) = line.strip_prefix(':') {
        return SseLine::Comment(stripped.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("event:") {
        return SseLine::Event(rest.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("data:") {
        return SseLine::Data(rest.trim().to_string());
    }

    // Unknown line format - treat as comment
    SseLine::Comment(line.to_string())
}

// Internal payload structs; the backend flattens everything at the root of
// each event's JSON object.

#[derive(Deserialize)]
struct StreamStartPayload {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct ReasoningPayload {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct AgentStartPayload {
    #[serde(default)]
    agent: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct KnowledgeBasePayload {
    #[serde(default)]
    references_count: u64,
}

#[derive(Deserialize)]
struct QueryExecutionPayload {
    #[serde(default)]
    query_id: Option<String>,
}

#[derive(Deserialize)]
struct VisualizationCreatedPayload {
    #[serde(default)]
    chart_type: Option<String>,
}

#[derive(Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct FinalResponsePayload {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    result: Value,
}

fn decode<'a, T: Deserialize<'a>>(event_type: &str, data: &'a str) -> Result<T, SseParseError> {
    serde_json::from_str(data).map_err(|e| SseParseError::InvalidJson {
        event_type: event_type.to_string(),
        source: e.to_string(),
    })
}

/// Parse an SSE event type and data payload into a typed [`AgentEvent`].
///
/// Unknown event types never error: they become [`AgentEvent::Other`],
/// keeping the stream resilient to new backend event kinds.
pub fn parse_event(event_type: &str, data: &str) -> Result<AgentEvent, SseParseError> {
    match event_type {
        "stream_start" => {
            let p: StreamStartPayload = decode(event_type, data)?;
            Ok(AgentEvent::StreamStart { message: p.message })
        }
        "reasoning" => {
            let p: ReasoningPayload = decode(event_type, data)?;
            Ok(AgentEvent::Reasoning { content: p.content })
        }
        "agent_start" => {
            let p: AgentStartPayload = decode(event_type, data)?;
            Ok(AgentEvent::AgentStart {
                agent: p.agent,
                display_name: p.display_name,
                message: p.message,
            })
        }
        "knowledge_base" => {
            let p: KnowledgeBasePayload = decode(event_type, data)?;
            Ok(AgentEvent::KnowledgeBase {
                references_count: p.references_count,
            })
        }
        "query_execution" => {
            let p: QueryExecutionPayload = decode(event_type, data)?;
            Ok(AgentEvent::QueryExecution {
                query_id: p.query_id,
            })
        }
        "visualization_created" => {
            let p: VisualizationCreatedPayload = decode(event_type, data)?;
            Ok(AgentEvent::VisualizationCreated {
                chart_type: p.chart_type,
            })
        }
        "error" => {
            let p: ErrorPayload = decode(event_type, data)?;
            Ok(AgentEvent::Error {
                message: p
                    .message
                    .or(p.error)
                    .unwrap_or_else(|| "stream error".to_string()),
            })
        }
        "final_response" => {
            let p: FinalResponsePayload = decode(event_type, data)?;
            Ok(AgentEvent::FinalResponse {
                success: p.success,
                result: p.result,
            })
        }
        other => {
            // Unknown kinds still surface their human-readable message when
            // they carry one.
            let message = serde_json::from_str::<Value>(data)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string));
            Ok(AgentEvent::Other {
                kind: other.to_string(),
                message,
            })
        }
    }
}

/// Stateful SSE parser that accumulates lines and emits complete events.
#[derive(Debug, Default)]
pub struct SseParser {
    /// Current event type being accumulated, when an `event:` line was seen.
    current_event_type: Option<String>,
    /// Accumulated data lines (SSE allows multiple `data:` lines).
    data_buffer: Vec<String>,
}

impl SseParser {
    /// Create a new SSE parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a line to the parser, potentially returning a complete event.
    ///
    /// Returns:
    /// - `Ok(Some(event))` - a complete event was parsed
    /// - `Ok(None)` - line consumed but event incomplete
    /// - `Err(error)` - parse error occurred
    pub fn feed_line(&mut self, line: &str) -> Result<Option<AgentEvent>, SseParseError> {
        match parse_sse_line(line) {
            SseLine::Event(event_type) => {
                self.current_event_type = Some(event_type);
                Ok(None)
            }
            SseLine::Data(data) => {
                self.data_buffer.push(data);
                Ok(None)
            }
            SseLine::Empty => self.try_emit_event(),
            SseLine::Comment(_) => Ok(None),
        }
    }

    /// Try to emit a complete event from accumulated state.
    fn try_emit_event(&mut self) -> Result<Option<AgentEvent>, SseParseError> {
        if self.current_event_type.is_none() && self.data_buffer.is_empty() {
            return Ok(None);
        }

        let mut event_type = self.current_event_type.take();
        let data = self.data_buffer.join("\n");
        self.data_buffer.clear();

        // The backend sends bare `data: {"type": "...", ...}` frames; recover
        // the discriminator from the JSON payload when no event: line exists.
        if event_type.is_none() && !data.is_empty() {
            if let Ok(json) = serde_json::from_str::<Value>(&data) {
                if let Some(t) = json.get("type").and_then(Value::as_str) {
                    event_type = Some(t.to_string());
                }
            }
        }

        match event_type {
            Some(et) => {
                if data.is_empty() {
                    Err(SseParseError::MissingData { event_type: et })
                } else {
                    parse_event(&et, &data).map(Some)
                }
            }
            None => {
                // Data with no recoverable discriminator: surface as an
                // unknown event rather than dropping it.
                if data.is_empty() {
                    Ok(None)
                } else {
                    parse_event("", &data).map(Some)
                }
            }
        }
    }

    /// Reset the parser state.
    pub fn reset(&mut self) {
        self.current_event_type = None;
        self.data_buffer.clear();
    }
}
