/// Caller-facing failures. Each rejects a single requested action and
/// leaves queue and table state untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyServiceError {
    AlreadyQueued,
    AlreadyActive,
    NotInvited,
    TableFull,
    NotOnTable,
    NoOpponent,
    NotFound,
    Repository(String),
}

impl std::fmt::Display for LobbyServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LobbyServiceError::AlreadyQueued => write!(f, "Player is already in the queue"),
            LobbyServiceError::AlreadyActive => {
                write!(f, "Player is already seated at or invited to a table")
            }
            LobbyServiceError::NotInvited => {
                write!(f, "Player was not invited to this table")
            }
            LobbyServiceError::TableFull => write!(f, "Table already has two players"),
            LobbyServiceError::NotOnTable => write!(f, "Player is not seated at this table"),
            LobbyServiceError::NoOpponent => write!(f, "Table has no opponent seated"),
            LobbyServiceError::NotFound => write!(f, "Unknown table or participant"),
            LobbyServiceError::Repository(msg) => write!(f, "Repository error: {}", msg),
        }
    }
}

impl std::error::Error for LobbyServiceError {}
