use std::collections::BTreeMap;

use crate::editing::Document;
use crate::io::{GatewayError, NoteId, PersistenceGateway, decode};

/// In-process gateway holding serialized notes.
///
/// Documents are stored as JSON so loads go through the same decoding (and
/// the same corruption handling) as on-disk notes.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    notes: BTreeMap<NoteId, String>,
    failures_pending: usize,
    saves: usize,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw content for a note, bypassing serialization
    pub fn insert_raw(&mut self, note_id: NoteId, raw: impl Into<String>) {
        self.notes.insert(note_id, raw.into());
    }

    pub fn raw(&self, note_id: &NoteId) -> Option<&str> {
        self.notes.get(note_id).map(String::as_str)
    }

    /// Make the next `count` saves fail with `Unavailable`
    pub fn fail_next_saves(&mut self, count: usize) {
        self.failures_pending = count;
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.saves
    }
}

impl PersistenceGateway for MemoryGateway {
    fn load(&self, note_id: &NoteId) -> Result<Document, GatewayError> {
        let raw = self
            .notes
            .get(note_id)
            .ok_or_else(|| GatewayError::NotFound(note_id.clone()))?;
        decode(note_id, raw)
    }

    fn save(&mut self, note_id: &NoteId, document: &Document) -> Result<(), GatewayError> {
        if self.failures_pending > 0 {
            self.failures_pending -= 1;
            return Err(GatewayError::Unavailable(format!(
                "injected failure saving {note_id}"
            )));
        }
        let json = document.to_json()?;
        self.notes.insert(note_id.clone(), json);
        self.saves += 1;
        Ok(())
    }
}
