//! Shared fixtures for integration tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream;
use tokio::sync::mpsc;

use sightline::app::{App, AppMessage};
use sightline::client::{ChatTransport, ClientError, EventStream};
use sightline::config::AppConfig;
use sightline::embed::{EmbedCache, NullSurfaceFactory};
use sightline::models::ChatRequest;
use sightline::sse::AgentEvent;
use sightline::store::ConversationStore;

/// Transport that replays a scripted event list instead of hitting a server.
pub struct ScriptedTransport {
    events: Vec<AgentEvent>,
}

impl ScriptedTransport {
    pub fn new(events: Vec<AgentEvent>) -> Self {
        Self { events }
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn stream_chat(&self, _request: &ChatRequest) -> Result<EventStream, ClientError> {
        let events: Vec<Result<AgentEvent, ClientError>> =
            self.events.iter().cloned().map(Ok).collect();
        Ok(Box::pin(stream::iter(events)))
    }
}

/// Build an app wired to a scripted transport and a fast idle timeout.
pub fn scripted_app(
    events: Vec<AgentEvent>,
) -> (App, mpsc::UnboundedReceiver<AppMessage>) {
    let config = AppConfig::new()
        .with_app_url("http://localhost:3000")
        .with_stream_idle_timeout(Duration::from_millis(200));
    App::new(
        config,
        Arc::new(ScriptedTransport::new(events)),
        ConversationStore::new(),
        EmbedCache::new(Box::new(NullSurfaceFactory::new()), None),
    )
}

/// Pump app messages until the stream resolves.
pub async fn drain_until_resolved(app: &mut App, rx: &mut mpsc::UnboundedReceiver<AppMessage>) {
    while let Some(msg) = rx.recv().await {
        let resolved = matches!(msg, AppMessage::StreamResolved { .. });
        app.handle_message(msg);
        if resolved {
            break;
        }
    }
}
