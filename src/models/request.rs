use serde::{Deserialize, Serialize};

/// Backend agent mode selector.
///
/// Serialized as the backend's literal mode strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AgentMode {
    /// Supervisor agent orchestrating the full sub-agent chain.
    #[default]
    #[serde(rename = "Supervisor Agent")]
    Supervisor,
    /// Mocked visualization agent, useful for offline development.
    #[serde(rename = "QuickSight Mocking Agent")]
    QuickSightMock,
}

/// Optional per-request agent override.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentConfig {
    pub agent_id: String,
    pub agent_alias_id: String,
}

/// Request structure for the chat and streaming endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatRequest {
    /// The natural-language question to analyze.
    pub message: String,
    /// Session token for backend conversational context. None asks the
    /// backend to allocate a fresh session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Which backend agent handles the request.
    pub mode: AgentMode,
    /// Optional agent override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_config: Option<AgentConfig>,
}

impl ChatRequest {
    /// Create a request without an existing session.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: None,
            mode: AgentMode::default(),
            agent_config: None,
        }
    }

    /// Create a request bound to an existing session token.
    pub fn with_session(message: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: Some(session_id.into()),
            mode: AgentMode::default(),
            agent_config: None,
        }
    }

    /// Set the agent mode (builder pattern).
    pub fn with_mode(mut self, mode: AgentMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set an agent override (builder pattern).
    pub fn with_agent_config(mut self, config: AgentConfig) -> Self {
        self.agent_config = Some(config);
        self
    }
}

/// Session detail returned by the backend session endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionInfo {
    pub session_id: String,
    #[serde(default)]
    pub messages: Vec<serde_json::Value>,
    #[serde(default)]
    pub created_at: String,
}
