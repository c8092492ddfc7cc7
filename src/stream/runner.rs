//! Async driver for a streaming session.
//!
//! Feeds a transport event stream into a [`StreamReducer`] and guarantees a
//! terminal outcome on every exit path: terminal event, stream close,
//! transport error, or inactivity timeout. The placeholder message can never
//! be left stuck in-progress.

use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tokio::time::timeout;

use crate::client::ClientError;
use crate::error::StreamError;
use crate::sse::AgentEvent;

use super::progress::ProgressLine;
use super::reducer::{Outcome, StreamReducer};

/// Drive `events` to completion, reporting progress after every applied
/// event.
///
/// `idle_timeout` bounds the silence between consecutive events; when it
/// fires the session resolves as a timeout failure. Always returns the
/// reducer's terminal outcome.
pub async fn run_stream<S, F>(
    mut events: S,
    reducer: &mut StreamReducer,
    idle_timeout: Duration,
    mut on_progress: F,
) -> Outcome
where
    S: Stream<Item = Result<AgentEvent, ClientError>> + Unpin,
    F: FnMut(Vec<ProgressLine>),
{
    while !reducer.is_resolved() {
        match timeout(idle_timeout, events.next()).await {
            Err(_) => {
                tracing::warn!(secs = idle_timeout.as_secs(), "stream went silent");
                reducer.resolve_failure(StreamError::Timeout {
                    duration_secs: idle_timeout.as_secs(),
                });
            }
            Ok(None) => {
                reducer.resolve_failure(StreamError::ConnectionLost {
                    message: "stream ended without a final response".to_string(),
                });
            }
            Ok(Some(Err(e))) => {
                tracing::warn!(error = %e, "transport error mid-stream");
                reducer.resolve_failure(StreamError::ConnectionLost {
                    message: e.to_string(),
                });
            }
            Ok(Some(Ok(event))) => {
                reducer.handle_event(event);
                if !reducer.is_resolved() {
                    on_progress(reducer.progress_lines());
                }
            }
        }
    }

    reducer
        .outcome()
        .cloned()
        .unwrap_or_else(|| {
            Outcome::Failure(StreamError::ConnectionLost {
                message: "stream closed".to_string(),
            })
        })
}
