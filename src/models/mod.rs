//! Data models for conversations, requests, and classified results.

mod message;
mod request;
mod result;
mod thread;

pub use message::{Message, MessageBody, MessageRole};
pub use request::{AgentConfig, AgentMode, ChatRequest, SessionInfo};
pub use result::{
    AnalysisResult, ChartData, ChartResult, ChartSeries, ClassifiedResult, EmbedPointer,
    TableColumn, TableResult,
};
pub use thread::{ConversationThread, TITLE_MAX_CHARS};
