//! Event bus connecting the engine to its embedding application.
//!
//! Two signals cross the boundary: the application publishes
//! `EmailVerified` when the wallet's email becomes verified (the linking
//! flow suspends on it), and the engine publishes `RealtimeRestart` after
//! every session establishment so authenticated realtime subscriptions can
//! reconnect with the fresh token.

use tokio::sync::broadcast;

use crate::error::SessionError;

/// Capacity of the broadcast channel. Receivers that lag simply miss
/// intermediate events; every signal here is edge-triggered and safe to lose.
const EVENT_CAPACITY: usize = 16;

/// Signals exchanged between the engine and its embedding application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The wallet's email address became verified (published externally).
    EmailVerified,
    /// A session was (re-)established; restart authenticated realtime
    /// subscriptions (published by the engine).
    RealtimeRestart,
}

/// Broadcast bus for [`SessionEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Create a new bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    /// Subscribe to future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. Dropped silently when nobody is subscribed.
    pub fn publish(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait on an already-subscribed receiver until `wanted` is observed.
///
/// The receiver must be subscribed before checking the condition the event
/// confirms, otherwise the edge can be lost between check and wait.
///
/// # Errors
///
/// Returns [`SessionError::EventBusClosed`] if every sender is dropped
/// while waiting.
pub(crate) async fn wait_for(
    rx: &mut broadcast::Receiver<SessionEvent>,
    wanted: SessionEvent,
) -> Result<(), SessionError> {
    loop {
        match rx.recv().await {
            Ok(event) if event == wanted => return Ok(()),
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => return Err(SessionError::EventBusClosed),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_for_skips_other_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(SessionEvent::RealtimeRestart);
        bus.publish(SessionEvent::EmailVerified);

        wait_for(&mut rx, SessionEvent::EmailVerified).await.unwrap();
    }

    #[tokio::test]
    async fn test_wait_for_reports_closed_bus() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        drop(bus);

        let result = wait_for(&mut rx, SessionEvent::EmailVerified).await;
        assert!(matches!(result, Err(SessionError::EventBusClosed)));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_silent() {
        let bus = EventBus::new();
        bus.publish(SessionEvent::RealtimeRestart);
    }
}
