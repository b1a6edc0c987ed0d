use serde::{Deserialize, Serialize};

use crate::models::cooldown::CooldownEntry;
use crate::models::participant::Participant;
use crate::models::queue::QueueEntry;
use crate::models::table::{Table, TableState};

/// Read-only view of the lobby for display, taken between actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbySnapshot {
    pub queue: Vec<QueueEntry>,
    pub tables: Vec<TableView>,
}

/// Display form of a single table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableView {
    pub id: String,
    pub number: u32,
    pub seated: Vec<Participant>,
    pub invited: Option<Participant>,
    pub active: bool,
    pub state: TableState,
}

impl TableView {
    pub fn from_table(table: &Table) -> Self {
        TableView {
            id: table.id.clone(),
            number: table.number,
            seated: table.seated().to_vec(),
            invited: table.invite().map(|invite| invite.participant.clone()),
            active: table.is_active(),
            state: table.state(),
        }
    }
}

/// Durable form of the lobby written through the repository. Handshake
/// state is transient and deliberately absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedLobby {
    pub queue: Vec<QueueEntry>,
    pub tables: Vec<Table>,
    pub cooldowns: Vec<CooldownEntry>,
}
