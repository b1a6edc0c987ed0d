use serde::{Deserialize, Serialize};

/// Accept or decline a pending table invite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableActionRequest {
    pub table_id: String,
}

/// Opponent's answer to a win claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmWinRequest {
    pub winner_id: String,
    pub confirmed: bool,
}
