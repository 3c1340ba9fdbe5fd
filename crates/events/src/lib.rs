//! In-process activity event bus backed by a `tokio::sync::broadcast`
//! channel.
//!
//! [`EventBus`] is how subscribed consumers learn about new activity scores
//! without polling the manager: every completed camera refresh publishes one
//! [`ActivityEvent`]. Designed to be shared via `Arc<EventBus>`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// Published after every completed camera refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    /// Decimal-string camera id.
    pub camera_id: String,
    /// Keypoint count from the last algorithm run.
    pub activity: usize,
    /// Whether the fetched frame differed from the cached one.
    pub frame_changed: bool,
    /// When the refresh completed (UTC).
    pub timestamp: DateTime<Utc>,
}

/// In-process fan-out bus for [`ActivityEvent`]s.
///
/// Any number of subscribers independently receive every published event;
/// slow receivers observe `RecvError::Lagged` once the buffer wraps.
pub struct EventBus {
    sender: broadcast::Sender<ActivityEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With zero receivers the event is silently dropped; activity history
    /// is kept by the manager, not by this bus.
    pub fn publish(&self, event: ActivityEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ActivityEvent> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
