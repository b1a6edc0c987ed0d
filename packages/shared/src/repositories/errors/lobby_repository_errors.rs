#[derive(Debug)]
pub enum LobbyRepositoryError {
    Io(String),
    Serialization(String),
}

impl std::fmt::Display for LobbyRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LobbyRepositoryError::Io(msg) => write!(f, "I/O error: {}", msg),
            LobbyRepositoryError::Serialization(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for LobbyRepositoryError {}
