//! Per-execution progress pub/sub (spec §4.5). Each execution owns one
//! [`ExecutionChannel`]: a bounded broadcast channel plus the latest
//! published `execution_update`, so a subscriber attaching mid-run still
//! gets a coherent starting point before it sees subsequent messages.
//!
//! Publication never blocks the engine: `tokio::sync::broadcast` drops the
//! oldest buffered message for a lagging subscriber rather than applying
//! backpressure to the sender, which is exactly the drop-oldest-to-the-
//! subscriber, never-to-the-engine policy spec §5 asks for.

use std::sync::Arc;

use dashmap::DashMap;
use nebula_core::ExecutionId;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

/// Default per-execution broadcast buffer. Past this many unconsumed
/// messages a lagging subscriber starts missing the oldest ones; it never
/// blocks or drops the engine's own progress.
const CHANNEL_CAPACITY: usize = 256;

/// The three message shapes spec §4.5 defines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressMessage {
    ExecutionUpdate {
        status: String,
        progress: Value,
        result: Option<Value>,
        error: Option<Value>,
        identity: Value,
    },
    InputRequest {
        question: String,
        full_output: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
    InputReceived {
        input: String,
    },
}

/// One execution's broadcast channel plus the last `ExecutionUpdate`
/// published on it, so a late subscriber can be brought up to date.
struct ExecutionChannel {
    sender: broadcast::Sender<ProgressMessage>,
    latest_update: RwLock<Option<ProgressMessage>>,
}

impl ExecutionChannel {
    fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            latest_update: RwLock::new(None),
        }
    }
}

/// A live subscription: the snapshot seen at attach time (if any had
/// already been published), then everything published afterward.
pub struct Subscription {
    pub snapshot: Option<ProgressMessage>,
    pub receiver: broadcast::Receiver<ProgressMessage>,
}

/// Registry of per-execution channels, sharded by [`ExecutionId`] via
/// `DashMap` so attach/detach on one execution never contends with another
/// (spec §5: "Subscriber table per execution: exclusive on attach/detach").
#[derive(Default)]
pub struct ProgressBus {
    channels: DashMap<ExecutionId, Arc<ExecutionChannel>>,
}

impl ProgressBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a message for `execution_id`, creating its channel on
    /// first use. Never blocks: a channel with no subscribers, or only
    /// lagging ones, still accepts the send.
    pub fn publish(&self, execution_id: &ExecutionId, message: ProgressMessage) {
        let channel = self
            .channels
            .entry(execution_id.clone())
            .or_insert_with(|| Arc::new(ExecutionChannel::new()))
            .clone();

        if let ProgressMessage::ExecutionUpdate { .. } = &message {
            *channel.latest_update.write() = Some(message.clone());
        }
        // No subscribers is not an error; broadcast::Sender::send only
        // fails when the receiver count is zero, which we don't care about.
        let _ = channel.sender.send(message);
    }

    /// Attaches a new subscriber to `execution_id`, returning the current
    /// snapshot (if any) followed by a receiver for everything published
    /// from this point on.
    #[must_use]
    pub fn subscribe(&self, execution_id: &ExecutionId) -> Subscription {
        let channel = self
            .channels
            .entry(execution_id.clone())
            .or_insert_with(|| Arc::new(ExecutionChannel::new()))
            .clone();
        let snapshot = channel.latest_update.read().clone();
        let receiver = channel.sender.subscribe();
        Subscription { snapshot, receiver }
    }

    /// Drops an execution's channel entirely, disconnecting every
    /// subscriber. Called by the retention store on eviction (spec §4.7:
    /// "Removal also drops the execution's pending input requests and
    /// subscribers").
    pub fn remove(&self, execution_id: &ExecutionId) {
        self.channels.remove(execution_id);
    }
}
