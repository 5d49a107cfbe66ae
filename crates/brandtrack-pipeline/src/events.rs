//! Event fan-out for pipeline consumers.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Something the pipeline did that downstream consumers may care about.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    MentionPersisted {
        mention_id: i64,
        public_id: Uuid,
        platform: String,
        sentiment_label: String,
    },
    AlertFired {
        mention_id: i64,
        config_id: i64,
        config_public_id: Uuid,
        config_name: String,
        reasons: Vec<String>,
    },
}

/// Receives pipeline events. Implementations absorb and log their own
/// delivery failures; publishing never feeds back into cycle control flow.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, event: PipelineEvent);
}

/// Fan-out over a `tokio::sync::broadcast` channel. Anything holding a
/// subscription sees every event published after it subscribed.
pub struct BroadcastSink {
    tx: broadcast::Sender<PipelineEvent>,
}

impl BroadcastSink {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl EventSink for BroadcastSink {
    async fn publish(&self, event: PipelineEvent) {
        // send only errors when nobody is subscribed
        if self.tx.send(event).is_err() {
            tracing::trace!("pipeline event dropped, no subscribers");
        }
    }
}

/// Sink that discards everything. Used by one-shot CLI runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

#[async_trait]
impl EventSink for NullSink {
    async fn publish(&self, _event: PipelineEvent) {}
}
