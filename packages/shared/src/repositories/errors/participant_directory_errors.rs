#[derive(Debug)]
pub enum ParticipantDirectoryError {
    Io(String),
    Serialization(String),
    Lookup(String),
}

impl std::fmt::Display for ParticipantDirectoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParticipantDirectoryError::Io(msg) => write!(f, "I/O error: {}", msg),
            ParticipantDirectoryError::Serialization(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
            ParticipantDirectoryError::Lookup(msg) => write!(f, "Lookup error: {}", msg),
        }
    }
}

impl std::error::Error for ParticipantDirectoryError {}
