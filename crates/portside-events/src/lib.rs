//! Unidirectional backend-to-frontend event bus.
//!
//! Three topics only: `app:log`, `connection:created`, `connection:deleted`.
//! The bus never replays past events to a new subscriber and never
//! blocks a producer waiting for a consumer — if nobody is listening,
//! the event is simply dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppLog {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// A single emission on the bus. The payloads for the connection topics
/// are carried as `serde_json::Value` rather than a concrete `Connection`
/// type so this crate doesn't need to depend on the registry crate that
/// produces them.
#[derive(Debug, Clone)]
pub enum Event {
    AppLog(AppLog),
    ConnectionCreated(serde_json::Value),
    ConnectionDeleted { id: String },
}

impl Event {
    pub fn topic(&self) -> &'static str {
        match self {
            Event::AppLog(_) => "app:log",
            Event::ConnectionCreated(_) => "connection:created",
            Event::ConnectionDeleted { .. } => "connection:deleted",
        }
    }
}

/// Handle shared by every component that wants to publish or subscribe.
/// Cloning is cheap; all clones share the same underlying channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _receiver) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Drops the event silently when there are no subscribers, per the
    /// bus's no-backpressure contract.
    pub fn emit(&self, event: Event) {
        let _ = self.sender.send(event);
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.emit(Event::AppLog(AppLog {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }));
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_emitted_event() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.emit(Event::ConnectionDeleted { id: "abc".to_string() });
        let received = rx.recv().await.unwrap();
        assert_eq!(received.topic(), "connection:deleted");
    }

    #[test]
    fn emit_without_subscribers_does_not_panic() {
        let bus = EventBus::new();
        bus.log(LogLevel::Info, "no one is listening");
    }

    #[tokio::test]
    async fn each_subscriber_gets_its_own_copy() {
        let bus = EventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();
        bus.log(LogLevel::Warn, "fan-out");
        assert!(matches!(a.recv().await.unwrap(), Event::AppLog(_)));
        assert!(matches!(b.recv().await.unwrap(), Event::AppLog(_)));
    }
}
