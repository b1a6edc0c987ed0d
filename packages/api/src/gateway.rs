use std::collections::HashMap;

use async_trait::async_trait;
use axum::extract::ws::Message;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use shared::models::events::LobbyEvent;
use shared::services::notifications::{NotificationDispatcher, NotificationError};

/// Registry of connected clients: participant id -> sender feeding that
/// client's socket. Populated on connect, cleared on disconnect. The
/// senders are the only per-connection state the server keeps.
#[derive(Default)]
pub struct WebSocketGateway {
    connections: RwLock<HashMap<String, mpsc::UnboundedSender<Message>>>,
}

impl WebSocketGateway {
    pub fn new() -> Self {
        WebSocketGateway::default()
    }

    pub async fn register(&self, participant_id: &str, sender: mpsc::UnboundedSender<Message>) {
        let mut connections = self.connections.write().await;
        if connections
            .insert(participant_id.to_string(), sender)
            .is_some()
        {
            debug!("Replaced existing socket for player {}", participant_id);
        }
        info!("Registered socket for player {}", participant_id);
    }

    pub async fn unregister(&self, participant_id: &str) {
        if self
            .connections
            .write()
            .await
            .remove(participant_id)
            .is_some()
        {
            info!("Cleaned up socket for player {}", participant_id);
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

#[async_trait]
impl NotificationDispatcher for WebSocketGateway {
    async fn notify(
        &self,
        participant_id: &str,
        event: &LobbyEvent,
    ) -> Result<(), NotificationError> {
        let payload = serde_json::to_string(event)?;
        let connections = self.connections.read().await;
        match connections.get(participant_id) {
            Some(sender) => {
                sender.send(Message::Text(payload.into()))?;
                Ok(())
            }
            None => {
                warn!(
                    "No socket found for player {}; dropping notification",
                    participant_id
                );
                Ok(())
            }
        }
    }

    async fn broadcast(&self, event: &LobbyEvent) -> Result<(), NotificationError> {
        let payload = serde_json::to_string(event)?;
        let connections = self.connections.read().await;
        for (participant_id, sender) in connections.iter() {
            if sender
                .send(Message::Text(payload.clone().into()))
                .is_err()
            {
                warn!("Failed to broadcast to player {}", participant_id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn notify_reaches_only_the_addressed_player() {
        let gateway = WebSocketGateway::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        gateway.register("a", tx_a).await;
        gateway.register("b", tx_b).await;

        gateway
            .notify("a", &LobbyEvent::QueueUpdated)
            .await
            .unwrap();

        let message = rx_a.try_recv().unwrap();
        match message {
            Message::Text(text) => assert!(text.contains("queueUpdated")),
            other => panic!("expected text frame, got {:?}", other),
        }
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn notify_without_a_socket_is_dropped_silently() {
        let gateway = WebSocketGateway::new();
        gateway
            .notify("ghost", &LobbyEvent::QueueUpdated)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn broadcast_reaches_every_connection() {
        let gateway = WebSocketGateway::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        gateway.register("a", tx_a).await;
        gateway.register("b", tx_b).await;

        gateway
            .broadcast(&LobbyEvent::TablesUpdated)
            .await
            .unwrap();

        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[tokio::test]
    async fn unregister_removes_the_connection() {
        let gateway = WebSocketGateway::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        gateway.register("a", tx).await;
        assert_eq!(gateway.connection_count().await, 1);

        gateway.unregister("a").await;
        assert_eq!(gateway.connection_count().await, 0);
    }
}
