use serde::{Deserialize, Serialize};

/// A player known to the lobby. Identity lives in the external directory;
/// the core only carries the opaque id and the resolved display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub display_name: String,
}

impl Participant {
    pub fn new(id: &str, display_name: &str) -> Self {
        Participant {
            id: id.to_string(),
            display_name: display_name.to_string(),
        }
    }
}
