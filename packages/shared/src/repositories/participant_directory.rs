use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use crate::repositories::errors::participant_directory_errors::ParticipantDirectoryError;

#[cfg(test)]
use mockall::automock;

/// Read-only identity source: resolves an opaque participant id to a
/// display name. Provisioning accounts is someone else's job.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ParticipantDirectory: Send + Sync {
    async fn display_name(
        &self,
        participant_id: &str,
    ) -> Result<Option<String>, ParticipantDirectoryError>;
}

/// Directory backed by a fixed id -> display-name map, loaded once at
/// startup from a seeded JSON file.
#[derive(Debug, Clone, Default)]
pub struct StaticParticipantDirectory {
    names: HashMap<String, String>,
}

impl StaticParticipantDirectory {
    pub fn new(names: HashMap<String, String>) -> Self {
        StaticParticipantDirectory { names }
    }

    /// Loads a JSON object of the form `{"participant-id": "Display Name"}`.
    pub async fn from_json_file(
        path: impl AsRef<Path>,
    ) -> Result<Self, ParticipantDirectoryError> {
        let bytes = tokio::fs::read(path.as_ref())
            .await
            .map_err(|e| ParticipantDirectoryError::Io(e.to_string()))?;
        let names: HashMap<String, String> = serde_json::from_slice(&bytes)
            .map_err(|e| ParticipantDirectoryError::Serialization(e.to_string()))?;
        Ok(StaticParticipantDirectory { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[async_trait]
impl ParticipantDirectory for StaticParticipantDirectory {
    async fn display_name(
        &self,
        participant_id: &str,
    ) -> Result<Option<String>, ParticipantDirectoryError> {
        Ok(self.names.get(participant_id).cloned())
    }
}
