use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("Conflict writing {path}: it changed since it was read")]
    Conflict { path: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Cannot decode {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No write token configured")]
    MissingToken,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Hint {0} already exists")]
    DuplicateHint(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The hint was committed but linking it to its location failed.
    #[error("Hint {hint_id} was saved but not linked: {source}")]
    Unlinked {
        hint_id: String,
        source: Box<SyncError>,
    },
}

impl SyncError {
    pub(crate) fn decode(path: &str, reason: impl ToString) -> Self {
        SyncError::Decode {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether a user-triggered retry from a fresh read could succeed.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, SyncError::Conflict { .. })
    }

    /// Id of a hint that exists remotely but has no location link yet.
    #[must_use]
    pub fn unlinked_hint(&self) -> Option<&str> {
        match self {
            SyncError::Unlinked { hint_id, .. } => Some(hint_id),
            _ => None,
        }
    }
}
