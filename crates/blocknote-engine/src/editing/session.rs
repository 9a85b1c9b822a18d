use crate::editing::{
    BlockEngine, BlockId, BlockType, Cmd, Document, EditError, EditEvent, FocusManager, Mode,
    Patch, Snapshot,
};
use crate::io::{GatewayError, NoteId, PersistenceGateway};

/// Where a session lands after a successful save
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AfterSave {
    #[default]
    Editing,
    Viewing,
}

/// Immutable copy of a document taken when a save starts.
///
/// The live document stays editable while the ticket is out; nothing done
/// to it afterwards leaks into this copy.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveTicket {
    note_id: NoteId,
    document: Document,
    revision: u64,
}

impl SaveTicket {
    pub fn note_id(&self) -> &NoteId {
        &self.note_id
    }

    /// Snapshot to persist, plain text already refreshed
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Session revision the snapshot was taken at
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// One note being viewed or edited.
///
/// State machine: `Viewing → Editing → Saving → Editing | Viewing`. All
/// block commands go through [`EditSession::apply`], which marks the session
/// dirty; only a save whose snapshot is still current clears it.
///
/// A session is owned by one caller and driven synchronously. The only step
/// that may take time is the gateway call between [`EditSession::begin_save`]
/// and [`EditSession::finish_save`]; edits made in between stay in memory
/// and keep the session dirty.
#[derive(Debug)]
pub struct EditSession {
    note_id: NoteId,
    document: Document,
    focus: FocusManager,
    dirty: bool,
    /// Bumped on every document mutation
    revision: u64,
    events: Vec<EditEvent>,
    recovery_warning: Option<String>,
}

impl EditSession {
    /// Start viewing `document`. Repeated block ids are replaced with fresh
    /// ones so the session never holds a document it could not reload.
    pub fn new(note_id: NoteId, mut document: Document) -> Self {
        let reassigned = document.reassign_duplicate_ids();
        if reassigned > 0 {
            log::warn!("note {note_id}: gave {reassigned} repeated block ids fresh ids");
        }
        Self {
            note_id,
            document,
            focus: FocusManager::new(),
            dirty: false,
            revision: 0,
            events: Vec::new(),
            recovery_warning: None,
        }
    }

    /// Load a note through `gateway`.
    ///
    /// A note that does not exist is an error. A note whose stored content
    /// cannot be read as a document opens as a fresh document with one empty
    /// text block instead, and [`EditSession::recovery_warning`] says why.
    pub fn open(gateway: &impl PersistenceGateway, note_id: NoteId) -> Result<Self, EditError> {
        match gateway.load(&note_id) {
            Ok(document) => Ok(Self::new(note_id, document)),
            Err(GatewayError::Corrupt { reason, .. }) => {
                log::warn!("note {note_id} is unreadable, starting from an empty document: {reason}");
                let mut session = Self::new(note_id, Document::with_default_block());
                session.recovery_warning = Some(reason);
                Ok(session)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn note_id(&self) -> &NoteId {
        &self.note_id
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn mode(&self) -> Mode {
        self.focus.mode()
    }

    pub fn focused(&self) -> Option<&BlockId> {
        self.focus.focused()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether in-memory content differs from the last successful save
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    /// Set when the note was opened from unreadable stored content
    pub fn recovery_warning(&self) -> Option<&str> {
        self.recovery_warning.as_deref()
    }

    /// Take the events raised since the last call
    pub fn drain_events(&mut self) -> Vec<EditEvent> {
        std::mem::take(&mut self.events)
    }

    /// Read-only view for rendering
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }

    /// `Viewing → Editing`. Idempotent while editing.
    pub fn enter_edit(&mut self) -> Result<(), EditError> {
        match self.mode() {
            Mode::Viewing => {
                let events = self.focus.enter_editing(&mut self.document);
                if events
                    .iter()
                    .any(|e| matches!(e, EditEvent::BlockInserted { .. }))
                {
                    self.mark_dirty();
                }
                self.events.extend(events);
                Ok(())
            }
            Mode::Editing => Ok(()),
            Mode::Saving => Err(self.invalid("start editing")),
        }
    }

    /// `Editing → Viewing`. Unsaved changes stay in memory and dirty.
    pub fn leave_edit(&mut self) -> Result<(), EditError> {
        match self.mode() {
            Mode::Editing => {
                let events = self.focus.leave_editing();
                self.events.extend(events);
                Ok(())
            }
            Mode::Viewing => Ok(()),
            Mode::Saving => Err(self.invalid("stop editing")),
        }
    }

    pub fn focus(&mut self, id: &BlockId) -> Result<(), EditError> {
        let event = self.focus.focus(&self.document, id)?;
        self.events.extend(event);
        Ok(())
    }

    pub fn focus_next(&mut self) -> Result<(), EditError> {
        let event = self.focus.focus_next(&self.document)?;
        self.events.extend(event);
        Ok(())
    }

    pub fn focus_previous(&mut self) -> Result<(), EditError> {
        let event = self.focus.focus_previous(&self.document)?;
        self.events.extend(event);
        Ok(())
    }

    /// Apply one editing command.
    ///
    /// Allowed while editing or while a save is in flight. A stale block id
    /// on an input-layer command (insert-after, remove, commit, delete) is
    /// logged and reported as a `StaleTarget` event instead of failing.
    pub fn apply(&mut self, cmd: Cmd) -> Result<Patch, EditError> {
        if !self.mode().accepts_edits() {
            return Err(self.invalid("edit blocks"));
        }
        let tolerant = cmd.tolerates_stale_target();
        let target = cmd.target().cloned();

        let mut engine = BlockEngine::new(&mut self.document, &mut self.focus);
        let outcome = engine.execute(cmd);
        let mut events = engine.into_events();

        let created = match outcome {
            Ok(created) => created,
            Err(EditError::BlockNotFound(id)) if tolerant => {
                log::warn!("ignoring command for missing block {id}");
                events.push(EditEvent::StaleTarget { id });
                None
            }
            Err(err) => {
                log::debug!("command on {target:?} rejected: {err}");
                return Err(err);
            }
        };

        let patch = Patch {
            events,
            created,
            focus: self.focus.focused().cloned(),
            revision: self.revision,
        };
        if patch.touches_document() {
            self.mark_dirty();
        }
        self.events.extend(patch.events.iter().cloned());
        Ok(Patch {
            revision: self.revision,
            ..patch
        })
    }

    /// Insert a block of `block_type` after `id`; `None` when `id` was stale.
    pub fn insert_after(
        &mut self,
        id: &BlockId,
        block_type: BlockType,
    ) -> Result<Option<BlockId>, EditError> {
        let patch = self.apply(Cmd::InsertAfter {
            id: id.clone(),
            block_type,
        })?;
        Ok(patch.created)
    }

    pub fn remove_block(&mut self, id: &BlockId) -> Result<Patch, EditError> {
        self.apply(Cmd::RemoveBlock { id: id.clone() })
    }

    /// The "commit and advance" input signal
    pub fn commit_and_advance(&mut self, id: &BlockId) -> Result<Patch, EditError> {
        self.apply(Cmd::CommitAndAdvance { id: id.clone() })
    }

    /// The "delete if empty" input signal
    pub fn delete_if_empty(&mut self, id: &BlockId) -> Result<Patch, EditError> {
        self.apply(Cmd::DeleteIfEmpty { id: id.clone() })
    }

    pub fn reorder(&mut self, from: usize, to: usize) -> Result<Patch, EditError> {
        self.apply(Cmd::Reorder { from, to })
    }

    pub fn set_content(
        &mut self,
        id: &BlockId,
        content: impl Into<String>,
    ) -> Result<Patch, EditError> {
        self.apply(Cmd::SetContent {
            id: id.clone(),
            content: content.into(),
        })
    }

    /// `Editing → Saving`: snapshot the document for the gateway.
    ///
    /// Only one save may be in flight; a second call is rejected until
    /// [`EditSession::finish_save`] runs.
    pub fn begin_save(&mut self) -> Result<SaveTicket, EditError> {
        if self.mode() != Mode::Editing {
            return Err(self.invalid("save"));
        }
        if let Err(err) = self.document.validate() {
            log::warn!("refusing to save note {}: {err}", self.note_id);
            return Err(err);
        }
        let mut document = self.document.clone();
        document.refresh_plain_text();
        self.events.extend(self.focus.set_mode(Mode::Saving));
        Ok(SaveTicket {
            note_id: self.note_id.clone(),
            document,
            revision: self.revision,
        })
    }

    /// Complete the save started by `ticket` with the gateway's `result`.
    ///
    /// On success the session is clean again unless it was edited after the
    /// snapshot, and moves to `after`. On failure it returns to Editing with
    /// its dirty flag untouched and the gateway error is handed back.
    pub fn finish_save(
        &mut self,
        ticket: SaveTicket,
        result: Result<(), GatewayError>,
        after: AfterSave,
    ) -> Result<(), EditError> {
        if self.mode() != Mode::Saving {
            return Err(self.invalid("finish a save"));
        }
        match result {
            Ok(()) => {
                if ticket.revision == self.revision {
                    self.dirty = false;
                    self.document
                        .set_plain_text(ticket.document.plain_text().to_string());
                } else {
                    log::debug!(
                        "note {} edited during save ({} -> {}), staying dirty",
                        self.note_id,
                        ticket.revision,
                        self.revision
                    );
                }
                log::info!("saved note {} at revision {}", self.note_id, ticket.revision);
                let events = match after {
                    AfterSave::Editing => self.focus.set_mode(Mode::Editing).into_iter().collect(),
                    AfterSave::Viewing => self.focus.leave_editing(),
                };
                self.events.extend(events);
                Ok(())
            }
            Err(err) => {
                log::warn!("saving note {} failed: {err}", self.note_id);
                self.events.extend(self.focus.set_mode(Mode::Editing));
                Err(err.into())
            }
        }
    }

    /// Snapshot, hand to `gateway`, and settle, in one call.
    pub fn save(
        &mut self,
        gateway: &mut impl PersistenceGateway,
        after: AfterSave,
    ) -> Result<(), EditError> {
        let ticket = self.begin_save()?;
        let result = gateway.save(ticket.note_id(), ticket.document());
        self.finish_save(ticket, result, after)
    }

    /// Replace the session's note. Focus is cleared, the session returns to
    /// Viewing and starts clean; discarding unsaved changes is the caller's
    /// call (see [`EditSession::has_unsaved_changes`]).
    ///
    /// Repeated block ids are reassigned; any other invalid content is
    /// rejected and the current note is kept.
    pub fn switch_document(
        &mut self,
        note_id: NoteId,
        mut document: Document,
    ) -> Result<(), EditError> {
        if self.mode() == Mode::Saving {
            return Err(self.invalid("switch notes"));
        }
        document.reassign_duplicate_ids();
        document.validate()?;
        let events = self.focus.reset();
        self.events.extend(events);
        self.note_id = note_id;
        self.document = document;
        self.dirty = false;
        self.recovery_warning = None;
        self.bump_revision();
        Ok(())
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
        self.bump_revision();
    }

    fn bump_revision(&mut self) {
        self.revision += 1;
    }

    fn invalid(&self, action: &'static str) -> EditError {
        EditError::InvalidTransition {
            action,
            mode: self.mode(),
        }
    }
}
