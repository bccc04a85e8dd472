//! Session lifecycle events
//!
//! The client never navigates anywhere itself. When the session changes it
//! publishes a [`SessionEvent`]; whatever drives the UI subscribes and
//! decides what to show (typically the login view on `Expired`).

use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Credentials were exchanged for an access token
    LoggedIn,
    /// The access token was renewed transparently
    Refreshed,
    /// The session could not be renewed and the token was cleared
    Expired,
    /// The user logged out and the token was cleared
    LoggedOut,
}

/// Fan-out of session events to any number of observers
#[derive(Clone)]
pub struct SessionEvents {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    pub(crate) fn publish(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.sender.send(event);
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let events = SessionEvents::new();
        events.publish(SessionEvent::LoggedIn);
    }

    #[tokio::test]
    async fn test_every_subscriber_sees_event() {
        let events = SessionEvents::new();
        let mut first = events.subscribe();
        let mut second = events.subscribe();

        events.publish(SessionEvent::Expired);

        assert_eq!(first.recv().await.unwrap(), SessionEvent::Expired);
        assert_eq!(second.recv().await.unwrap(), SessionEvent::Expired);
    }
}
