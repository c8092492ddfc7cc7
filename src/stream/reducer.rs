//! The streaming session state machine.
//!
//! Consumes the ordered event sequence of one in-flight request, projects it
//! into progress lines, and resolves exactly once with a terminal outcome.
//! The reducer is independent of any transport: tests drive it with a literal
//! array of events.

use crate::classify;
use crate::error::StreamError;
use crate::models::ClassifiedResult;
use crate::sse::AgentEvent;

use super::progress::{agent_icon, ProgressBuffer, ProgressLine, DEFAULT_ICON};

const REASONING_ICON: &str = "💭";
const KNOWLEDGE_ICON: &str = "📚";
const QUERY_ICON: &str = "🗄️";
const CHART_ICON: &str = "📊";
const ERROR_ICON: &str = "⚠️";

/// Lifecycle phase of a streaming session.
///
/// `Idle` is initial, `Resolved` is terminal; between them the phase tracks
/// the most recent activity kind for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Started,
    Reasoning,
    AgentActive,
    ToolEvent,
    Resolved,
}

/// Terminal outcome of a streaming session.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(ClassifiedResult),
    Failure(StreamError),
}

/// State machine reducing one request's event stream.
#[derive(Debug)]
pub struct StreamReducer {
    phase: SessionPhase,
    progress: ProgressBuffer,
    /// Icon of the most recent step, for the in-flight indicator.
    current_icon: String,
    outcome: Option<Outcome>,
}

impl Default for StreamReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamReducer {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Idle,
            progress: ProgressBuffer::new(),
            current_icon: DEFAULT_ICON.to_string(),
            outcome: None,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Whether the session reached its terminal state.
    pub fn is_resolved(&self) -> bool {
        self.outcome.is_some()
    }

    /// Terminal outcome, present once resolved.
    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// Current progress lines, oldest first.
    pub fn progress_lines(&self) -> Vec<ProgressLine> {
        self.progress.snapshot()
    }

    /// Icon of the most recent step.
    pub fn current_icon(&self) -> &str {
        &self.current_icon
    }

    /// Apply one stream event.
    ///
    /// Once resolved the reducer accepts no further events for this request.
    pub fn handle_event(&mut self, event: AgentEvent) {
        if self.is_resolved() {
            tracing::debug!(kind = event.kind(), "event after resolution ignored");
            return;
        }

        match event {
            AgentEvent::StreamStart { message } => {
                self.phase = SessionPhase::Started;
                let text = message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "Starting analysis...".to_string());
                self.push_line(DEFAULT_ICON, text);
            }
            AgentEvent::Reasoning { content } => {
                self.phase = SessionPhase::Reasoning;
                // Multi-line reasoning payloads are summarized to their
                // headline.
                let headline = content.lines().next().unwrap_or("").trim().to_string();
                if !headline.is_empty() {
                    self.push_line(REASONING_ICON, headline);
                }
            }
            AgentEvent::AgentStart {
                agent,
                display_name,
                message,
            } => {
                self.phase = SessionPhase::AgentActive;
                let name = display_name
                    .filter(|n| !n.trim().is_empty())
                    .or_else(|| agent.filter(|a| !a.trim().is_empty()))
                    .unwrap_or_else(|| "Agent".to_string());
                let activity = message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "invoking...".to_string());
                let icon = agent_icon(&name);
                self.push_line(icon, format!("{}: {}", name, activity.trim()));
            }
            AgentEvent::KnowledgeBase { references_count } => {
                self.phase = SessionPhase::ToolEvent;
                self.push_line(
                    KNOWLEDGE_ICON,
                    format!("Knowledge base: {} reference(s) found", references_count),
                );
            }
            AgentEvent::QueryExecution { query_id } => {
                self.phase = SessionPhase::ToolEvent;
                let text = match query_id {
                    Some(id) => format!("Running query {}", id),
                    None => "Running query".to_string(),
                };
                self.push_line(QUERY_ICON, text);
            }
            AgentEvent::VisualizationCreated { chart_type } => {
                self.phase = SessionPhase::ToolEvent;
                let text = match chart_type {
                    Some(kind) => format!("Building {} chart", kind),
                    None => "Building chart".to_string(),
                };
                self.push_line(CHART_ICON, text);
            }
            AgentEvent::Error { message } => {
                // Diagnostic only: the stream may continue, or later end
                // without a terminal event.
                self.push_line(ERROR_ICON, format!("Error: {}", message));
            }
            AgentEvent::FinalResponse { success, result } => {
                if success {
                    let classified = classify::classify(result);
                    self.progress.clear();
                    self.outcome = Some(Outcome::Success(classified));
                } else {
                    self.outcome = Some(Outcome::Failure(StreamError::Upstream));
                }
                self.phase = SessionPhase::Resolved;
            }
            AgentEvent::Other { kind, message } => match message {
                Some(text) if !text.trim().is_empty() => {
                    self.push_line(DEFAULT_ICON, text);
                }
                _ => {
                    tracing::trace!(kind = %kind, "unrecognized event ignored");
                }
            },
        }
    }

    /// Resolve as a failure unless already resolved.
    ///
    /// Used when the stream closes, errors, or goes silent without a terminal
    /// event. Resolution stays exactly-once: a second call is a no-op.
    pub fn resolve_failure(&mut self, error: StreamError) {
        if self.is_resolved() {
            tracing::debug!(code = error.error_code(), "duplicate resolution ignored");
            return;
        }
        self.outcome = Some(Outcome::Failure(error));
        self.phase = SessionPhase::Resolved;
    }

    fn push_line(&mut self, icon: &str, text: impl Into<String>) {
        self.current_icon = icon.to_string();
        self.progress.push(ProgressLine::new(icon, text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClassifiedResult;
    use crate::stream::MAX_PROGRESS_LINES;
    use serde_json::json;

    fn final_ok(result: serde_json::Value) -> AgentEvent {
        AgentEvent::FinalResponse {
            success: true,
            result,
        }
    }

    #[test]
    fn test_initial_phase_is_idle() {
        let reducer = StreamReducer::new();
        assert_eq!(reducer.phase(), SessionPhase::Idle);
        assert!(!reducer.is_resolved());
        assert!(reducer.progress_lines().is_empty());
    }

    #[test]
    fn test_stream_start_transitions_and_seeds_progress() {
        let mut reducer = StreamReducer::new();
        reducer.handle_event(AgentEvent::StreamStart {
            message: Some("분석 시작".to_string()),
        });
        assert_eq!(reducer.phase(), SessionPhase::Started);
        let lines = reducer.progress_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "분석 시작");
    }

    #[test]
    fn test_stream_start_default_text() {
        let mut reducer = StreamReducer::new();
        reducer.handle_event(AgentEvent::StreamStart { message: None });
        assert_eq!(reducer.progress_lines()[0].text, "Starting analysis...");
    }

    #[test]
    fn test_reasoning_keeps_headline_only() {
        let mut reducer = StreamReducer::new();
        reducer.handle_event(AgentEvent::Reasoning {
            content: "To address this request, I'll need to:\n1. Refine the query\n2. Query the DB"
                .to_string(),
        });
        let lines = reducer.progress_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "To address this request, I'll need to:");
        assert_eq!(reducer.phase(), SessionPhase::Reasoning);
    }

    #[test]
    fn test_empty_reasoning_appends_nothing() {
        let mut reducer = StreamReducer::new();
        reducer.handle_event(AgentEvent::Reasoning {
            content: "\n\n".to_string(),
        });
        assert!(reducer.progress_lines().is_empty());
    }

    #[test]
    fn test_agent_start_name_and_icon() {
        let mut reducer = StreamReducer::new();
        reducer.handle_event(AgentEvent::AgentStart {
            agent: Some("voc_db".to_string()),
            display_name: Some("Database Agent".to_string()),
            message: Some("Database Agent 호출 중...".to_string()),
        });
        let lines = reducer.progress_lines();
        assert_eq!(lines[0].icon, "🗄️");
        assert!(lines[0].text.starts_with("Database Agent:"));
        assert_eq!(reducer.phase(), SessionPhase::AgentActive);
    }

    #[test]
    fn test_agent_start_fallback_chain() {
        // display_name empty -> raw agent id -> generic label
        let mut reducer = StreamReducer::new();
        reducer.handle_event(AgentEvent::AgentStart {
            agent: Some("refine-01".to_string()),
            display_name: Some("".to_string()),
            message: None,
        });
        let lines = reducer.progress_lines();
        assert_eq!(lines[0].text, "refine-01: invoking...");
        assert_eq!(lines[0].icon, DEFAULT_ICON);

        let mut reducer = StreamReducer::new();
        reducer.handle_event(AgentEvent::AgentStart {
            agent: None,
            display_name: None,
            message: Some(" 호출 중...".to_string()),
        });
        assert_eq!(reducer.progress_lines()[0].text, "Agent: 호출 중...");
    }

    #[test]
    fn test_knowledge_base_reports_count() {
        let mut reducer = StreamReducer::new();
        reducer.handle_event(AgentEvent::KnowledgeBase {
            references_count: 5,
        });
        assert!(reducer.progress_lines()[0].text.contains('5'));
        assert_eq!(reducer.phase(), SessionPhase::ToolEvent);
    }

    #[test]
    fn test_query_execution_names_query() {
        let mut reducer = StreamReducer::new();
        reducer.handle_event(AgentEvent::QueryExecution {
            query_id: Some("VOC_2025_01".to_string()),
        });
        assert_eq!(reducer.progress_lines()[0].text, "Running query VOC_2025_01");
    }

    #[test]
    fn test_visualization_names_chart_category() {
        let mut reducer = StreamReducer::new();
        reducer.handle_event(AgentEvent::VisualizationCreated {
            chart_type: Some("pie".to_string()),
        });
        assert_eq!(reducer.progress_lines()[0].text, "Building pie chart");
    }

    #[test]
    fn test_error_event_does_not_resolve() {
        let mut reducer = StreamReducer::new();
        reducer.handle_event(AgentEvent::Error {
            message: "rate limited".to_string(),
        });
        assert!(!reducer.is_resolved());
        assert!(reducer.progress_lines()[0].text.contains("rate limited"));
    }

    #[test]
    fn test_unknown_event_with_message_appends_line() {
        let mut reducer = StreamReducer::new();
        reducer.handle_event(AgentEvent::Other {
            kind: "action_complete".to_string(),
            message: Some("voc-query 작업 완료".to_string()),
        });
        assert_eq!(reducer.progress_lines()[0].text, "voc-query 작업 완료");
    }

    #[test]
    fn test_unknown_event_without_message_ignored() {
        let mut reducer = StreamReducer::new();
        reducer.handle_event(AgentEvent::Other {
            kind: "usage".to_string(),
            message: None,
        });
        assert!(reducer.progress_lines().is_empty());
    }

    #[test]
    fn test_success_resolution_classifies_and_drops_progress() {
        let mut reducer = StreamReducer::new();
        reducer.handle_event(AgentEvent::StreamStart {
            message: Some("분석 시작".to_string()),
        });
        reducer.handle_event(AgentEvent::AgentStart {
            agent: Some("DB Agent".to_string()),
            display_name: None,
            message: Some("조회 중".to_string()),
        });
        reducer.handle_event(final_ok(json!({"query_id": "Q1", "explanation": "설명"})));

        assert_eq!(reducer.phase(), SessionPhase::Resolved);
        assert!(reducer.progress_lines().is_empty());
        match reducer.outcome() {
            Some(Outcome::Success(ClassifiedResult::Analysis(analysis))) => {
                assert_eq!(analysis.query_id, Some("Q1".to_string()));
                assert_eq!(analysis.explanation, Some("설명".to_string()));
            }
            other => panic!("expected analysis success, got {:?}", other),
        }
    }

    #[test]
    fn test_failure_resolution_on_success_false() {
        let mut reducer = StreamReducer::new();
        reducer.handle_event(AgentEvent::StreamStart { message: None });
        reducer.handle_event(AgentEvent::FinalResponse {
            success: false,
            result: json!(null),
        });
        assert_eq!(
            reducer.outcome(),
            Some(&Outcome::Failure(StreamError::Upstream))
        );
    }

    #[test]
    fn test_events_after_resolution_ignored() {
        let mut reducer = StreamReducer::new();
        reducer.handle_event(final_ok(json!("done")));
        let outcome = reducer.outcome().cloned();

        reducer.handle_event(AgentEvent::StreamStart { message: None });
        reducer.handle_event(final_ok(json!("other")));

        assert_eq!(reducer.outcome().cloned(), outcome);
        assert!(reducer.progress_lines().is_empty());
    }

    #[test]
    fn test_resolve_failure_is_exactly_once() {
        let mut reducer = StreamReducer::new();
        reducer.resolve_failure(StreamError::ConnectionLost {
            message: "eof".to_string(),
        });
        reducer.resolve_failure(StreamError::Timeout { duration_secs: 10 });
        assert_eq!(
            reducer.outcome(),
            Some(&Outcome::Failure(StreamError::ConnectionLost {
                message: "eof".to_string(),
            }))
        );
    }

    #[test]
    fn test_resolve_failure_after_success_ignored() {
        let mut reducer = StreamReducer::new();
        reducer.handle_event(final_ok(json!("done")));
        reducer.resolve_failure(StreamError::ConnectionLost {
            message: "late".to_string(),
        });
        assert!(matches!(reducer.outcome(), Some(Outcome::Success(_))));
    }

    #[test]
    fn test_progress_buffer_never_exceeds_cap() {
        let mut reducer = StreamReducer::new();
        for i in 0..60 {
            reducer.handle_event(AgentEvent::Reasoning {
                content: format!("step {}", i),
            });
            assert!(reducer.progress_lines().len() <= MAX_PROGRESS_LINES);
        }
        let lines = reducer.progress_lines();
        assert_eq!(lines.len(), MAX_PROGRESS_LINES);
        assert_eq!(lines[MAX_PROGRESS_LINES - 1].text, "step 59");
    }

    #[test]
    fn test_current_icon_tracks_latest_step() {
        let mut reducer = StreamReducer::new();
        assert_eq!(reducer.current_icon(), DEFAULT_ICON);
        reducer.handle_event(AgentEvent::KnowledgeBase {
            references_count: 2,
        });
        assert_eq!(reducer.current_icon(), KNOWLEDGE_ICON);
        reducer.handle_event(AgentEvent::AgentStart {
            agent: None,
            display_name: Some("QuickSight Agent".to_string()),
            message: None,
        });
        assert_eq!(reducer.current_icon(), "📊");
    }

    #[test]
    fn test_full_trace_scenario() {
        let events = vec![
            AgentEvent::StreamStart {
                message: Some("분석 시작".to_string()),
            },
            AgentEvent::AgentStart {
                agent: Some("DB Agent".to_string()),
                display_name: None,
                message: Some("조회 중".to_string()),
            },
            final_ok(json!({"query_id": "Q1", "explanation": "설명"})),
        ];

        let mut reducer = StreamReducer::new();
        for event in events {
            reducer.handle_event(event);
        }

        match reducer.outcome() {
            Some(Outcome::Success(ClassifiedResult::Analysis(analysis))) => {
                assert_eq!(analysis.query_id, Some("Q1".to_string()));
            }
            other => panic!("expected composite success, got {:?}", other),
        }
    }
}
