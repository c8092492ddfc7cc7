//! Streaming session reduction - the client-side state machine for one
//! in-flight analysis request.
//!
//! # Module structure
//! - `progress` - progress-line type, icon lookup, bounded buffer
//! - `reducer` - the [`StreamReducer`] state machine
//! - `runner` - async driver guaranteeing terminal resolution

mod progress;
mod reducer;
mod runner;

pub use progress::{agent_icon, ProgressBuffer, ProgressLine, DEFAULT_ICON, MAX_PROGRESS_LINES};
pub use reducer::{Outcome, SessionPhase, StreamReducer};
pub use runner::run_stream;
