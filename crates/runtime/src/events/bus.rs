//! Topic-based event bus implementation.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::{BoardSnapshot, CombatUpdate, LogLines};

/// Topics for event routing.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Board re-renders (figure positions, doors).
    Board,
    /// Combat thread updates (dice breakdowns).
    Combat,
    /// Match log lines.
    Log,
}

/// Event wrapper carrying the typed payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Board(BoardSnapshot),
    Combat(CombatUpdate),
    Log(LogLines),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Board(_) => Topic::Board,
            Event::Combat(_) => Topic::Combat,
            Event::Log(_) => Topic::Log,
        }
    }
}

/// Topic-based event bus. The channel set is fixed at construction, so
/// publishing and subscribing are lock-free. Consumers subscribe to the
/// topics they care about; publishing without subscribers is normal.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<HashMap<Topic, broadcast::Sender<Event>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut channels = HashMap::new();
        channels.insert(Topic::Board, broadcast::channel(capacity).0);
        channels.insert(Topic::Combat, broadcast::channel(capacity).0);
        channels.insert(Topic::Log, broadcast::channel(capacity).0);
        Self {
            channels: Arc::new(channels),
        }
    }

    /// Publish an event to its topic. Best-effort: a subscriber-less
    /// channel is not an error.
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if let Some(tx) = self.channels.get(&topic)
            && tx.send(event).is_err()
        {
            tracing::trace!(?topic, "no subscribers");
        }
    }

    /// Subscribe to one topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.channels
            .get(&topic)
            .map(|tx| tx.subscribe())
            .unwrap_or_else(|| broadcast::channel(1).0.subscribe())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
