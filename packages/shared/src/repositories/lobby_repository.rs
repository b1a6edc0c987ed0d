use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::snapshot::PersistedLobby;
use crate::repositories::errors::lobby_repository_errors::LobbyRepositoryError;

#[cfg(test)]
use mockall::automock;

/// Durable storage for the lobby. A committed mutation must be saved
/// before the matching notifications go out; `load` reflects the latest
/// committed `save`.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LobbyRepository: Send + Sync {
    async fn save(&self, lobby: &PersistedLobby) -> Result<(), LobbyRepositoryError>;
    async fn load(&self) -> Result<Option<PersistedLobby>, LobbyRepositoryError>;
}

/// Keeps the latest snapshot in process memory. Default for tests and for
/// deployments that accept losing the lobby on restart.
#[derive(Default)]
pub struct InMemoryLobbyRepository {
    slot: RwLock<Option<PersistedLobby>>,
}

impl InMemoryLobbyRepository {
    pub fn new() -> Self {
        InMemoryLobbyRepository::default()
    }
}

#[async_trait]
impl LobbyRepository for InMemoryLobbyRepository {
    async fn save(&self, lobby: &PersistedLobby) -> Result<(), LobbyRepositoryError> {
        *self.slot.write().await = Some(lobby.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Option<PersistedLobby>, LobbyRepositoryError> {
        Ok(self.slot.read().await.clone())
    }
}

/// Writes the snapshot as JSON to a single file, via a temp file and
/// rename so a crash mid-write never leaves a torn state behind.
pub struct JsonFileLobbyRepository {
    path: PathBuf,
}

impl JsonFileLobbyRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileLobbyRepository { path: path.into() }
    }
}

#[async_trait]
impl LobbyRepository for JsonFileLobbyRepository {
    async fn save(&self, lobby: &PersistedLobby) -> Result<(), LobbyRepositoryError> {
        let json = serde_json::to_vec_pretty(lobby)
            .map_err(|e| LobbyRepositoryError::Serialization(e.to_string()))?;

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| LobbyRepositoryError::Io(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| LobbyRepositoryError::Io(e.to_string()))?;

        debug!("Persisted lobby state to {}", self.path.display());
        Ok(())
    }

    async fn load(&self) -> Result<Option<PersistedLobby>, LobbyRepositoryError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| LobbyRepositoryError::Serialization(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LobbyRepositoryError::Io(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::participant::Participant;
    use crate::models::queue::QueueEntry;
    use crate::models::table::Table;
    use chrono::Utc;

    fn sample_lobby() -> PersistedLobby {
        let mut table = Table::new(1);
        table.seat_first(Participant::new("p1", "Ada"));
        PersistedLobby {
            queue: vec![QueueEntry {
                participant: Participant::new("p2", "Grace"),
                enqueued_at: Utc::now(),
            }],
            tables: vec![table],
            cooldowns: vec![],
        }
    }

    #[tokio::test]
    async fn in_memory_repository_returns_latest_save() {
        let repository = InMemoryLobbyRepository::new();
        assert!(repository.load().await.unwrap().is_none());

        repository.save(&sample_lobby()).await.unwrap();

        let loaded = repository.load().await.unwrap().unwrap();
        assert_eq!(loaded.queue[0].participant.id, "p2");
        assert_eq!(loaded.tables[0].number, 1);
    }

    #[tokio::test]
    async fn json_file_repository_round_trips() {
        let path = std::env::temp_dir().join(format!("lobby-{}.json", uuid::Uuid::new_v4()));
        let repository = JsonFileLobbyRepository::new(&path);

        assert!(repository.load().await.unwrap().is_none());

        repository.save(&sample_lobby()).await.unwrap();
        let loaded = repository.load().await.unwrap().unwrap();
        assert_eq!(loaded.tables[0].seated()[0].id, "p1");

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
