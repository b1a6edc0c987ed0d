use serde::{Deserialize, Serialize};

/// Wire events pushed to clients, tagged with `type` and camelCase keys to
/// match the frontend protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum LobbyEvent {
    /// Sent to a candidate offered a seat.
    TableInvite {
        table_id: String,
        table_number: u32,
        opponent: String,
        invited: String,
    },
    /// Sent to the already-seated player when a candidate is invited.
    OpponentInvited {
        table_id: String,
        table_number: u32,
        candidate: String,
    },
    /// Sent to a candidate whose invite expired.
    TableInviteTimeout { table_id: String },
    /// Sent to the opponent of a claimed winner, asking them to confirm.
    ConfirmWinRequest {
        table_id: String,
        winner_id: String,
        winner_name: String,
    },
    /// Sent to the claimed winner while the opponent decides.
    WaitingForVerification { table_id: String },
    /// Sent to both players once a result is finalized.
    MatchConfirmed { table_id: String, winner_id: String },
    QueueUpdated,
    TablesUpdated,
}

/// A notification plus its routing, collected while the lobby lock is held
/// and dispatched after it is released.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Direct { to: String, event: LobbyEvent },
    Broadcast { event: LobbyEvent },
}

impl Outbound {
    pub fn direct(to: &str, event: LobbyEvent) -> Self {
        Outbound::Direct {
            to: to.to_string(),
            event,
        }
    }

    pub fn broadcast(event: LobbyEvent) -> Self {
        Outbound::Broadcast { event }
    }
}
