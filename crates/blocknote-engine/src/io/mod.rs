pub mod fs;
pub mod markdown;
pub mod memory;

pub use fs::FileGateway;
pub use markdown::{from_markdown, to_markdown};
pub use memory::MemoryGateway;

use std::path::PathBuf;

use crate::editing::Document;

/// Identifier of a stored note.
///
/// Restricted to ASCII letters, digits, `-` and `_` so it can name a file
/// under the notes root without escaping or path traversal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NoteId(String);

impl NoteId {
    pub fn parse(raw: &str) -> Result<Self, GatewayError> {
        let valid = !raw.is_empty()
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(GatewayError::InvalidNoteId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for NoteId {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("note not found: {0}")]
    NotFound(NoteId),
    #[error("invalid note id: {0:?}")]
    InvalidNoteId(String),
    #[error("note {note_id} is corrupt: {reason}")]
    Corrupt { note_id: NoteId, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid notes directory: {0}")]
    InvalidNotesDir(PathBuf),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Where documents are loaded from and saved to.
///
/// `save` must be idempotent: resending the same document for the same note
/// leaves storage in the same state. A gateway either stores the whole
/// document or reports an error; it never keeps a partial write.
pub trait PersistenceGateway {
    fn load(&self, note_id: &NoteId) -> Result<Document, GatewayError>;

    fn save(&mut self, note_id: &NoteId, document: &Document) -> Result<(), GatewayError>;
}

/// Parse stored JSON, classifying any failure as corruption of `note_id`
pub(crate) fn decode(note_id: &NoteId, raw: &str) -> Result<Document, GatewayError> {
    Document::from_json(raw).map_err(|err| GatewayError::Corrupt {
        note_id: note_id.clone(),
        reason: err.to_string(),
    })
}
