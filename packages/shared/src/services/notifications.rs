use async_trait::async_trait;

use crate::models::events::LobbyEvent;

#[cfg(test)]
use mockall::automock;

pub type NotificationError = Box<dyn std::error::Error + Send + Sync>;

/// Delivery seam for pushing events to clients. At-most-once: a failed or
/// unroutable send is logged by the caller and dropped, never retried.
/// Lobby state stays consistent either way; the periodic sweep recovers a
/// missed invite.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify(
        &self,
        participant_id: &str,
        event: &LobbyEvent,
    ) -> Result<(), NotificationError>;

    async fn broadcast(&self, event: &LobbyEvent) -> Result<(), NotificationError>;
}

/// Swallows every event. Used when running without a realtime transport.
#[derive(Debug, Clone, Default)]
pub struct NoopDispatcher;

#[async_trait]
impl NotificationDispatcher for NoopDispatcher {
    async fn notify(
        &self,
        _participant_id: &str,
        _event: &LobbyEvent,
    ) -> Result<(), NotificationError> {
        Ok(())
    }

    async fn broadcast(&self, _event: &LobbyEvent) -> Result<(), NotificationError> {
        Ok(())
    }
}
