use crate::editing::{BlockId, BlockType, Document, EditError, EditEvent};

/// Session mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Read-only browsing; nothing is ever focused
    Viewing,
    /// Interactive editing; the document always has at least one block
    Editing,
    /// A save is in flight; editing continues against the live document
    Saving,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Viewing => "viewing",
            Mode::Editing => "editing",
            Mode::Saving => "saving",
        }
    }

    /// Modes in which blocks may be focused and edited
    pub fn accepts_edits(&self) -> bool {
        matches!(self, Mode::Editing | Mode::Saving)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks which block has input focus and which mode the session is in.
///
/// Focus is plain session state here rather than something a widget owns,
/// so any front-end can render it and any command can move it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusManager {
    focused: Option<BlockId>,
    mode: Mode,
}

impl Default for FocusManager {
    fn default() -> Self {
        Self::new()
    }
}

impl FocusManager {
    pub fn new() -> Self {
        Self {
            focused: None,
            mode: Mode::Viewing,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn focused(&self) -> Option<&BlockId> {
        self.focused.as_ref()
    }

    pub fn is_focused(&self, id: &BlockId) -> bool {
        self.focused.as_ref() == Some(id)
    }

    /// Focus `id`. Rejected while viewing, in which case nothing changes.
    pub fn focus(&mut self, doc: &Document, id: &BlockId) -> Result<Option<EditEvent>, EditError> {
        if !self.mode.accepts_edits() {
            return Err(EditError::InvalidTransition {
                action: "focus a block",
                mode: self.mode,
            });
        }
        if doc.position(id).is_none() {
            return Err(EditError::BlockNotFound(id.clone()));
        }
        Ok(self.set_focus(Some(id.clone())))
    }

    /// Move focus one block down; focuses the first block when nothing is
    /// focused and stays put on the last block.
    pub fn focus_next(&mut self, doc: &Document) -> Result<Option<EditEvent>, EditError> {
        let target = match self.focused_index(doc) {
            Some(index) => (index + 1).min(doc.len().saturating_sub(1)),
            None => 0,
        };
        self.focus_index(doc, target, "move focus")
    }

    /// Move focus one block up; focuses the first block when nothing is
    /// focused.
    pub fn focus_previous(&mut self, doc: &Document) -> Result<Option<EditEvent>, EditError> {
        let target = self
            .focused_index(doc)
            .map(|index| index.saturating_sub(1))
            .unwrap_or(0);
        self.focus_index(doc, target, "move focus")
    }

    /// Switch to Editing, synthesizing and focusing a text block when the
    /// document is empty. Focus is otherwise left alone.
    pub(crate) fn enter_editing(&mut self, doc: &mut Document) -> Vec<EditEvent> {
        let mut events = Vec::new();
        events.extend(self.set_mode(Mode::Editing));
        if doc.is_empty() {
            let block = Document::create_block(BlockType::Text, None);
            let id = block.id().clone();
            let index = doc.insert(block, 0);
            events.push(EditEvent::BlockInserted {
                id: id.clone(),
                index,
            });
            events.extend(self.set_focus(Some(id)));
        }
        events
    }

    /// Back to read-only browsing; focus is dropped.
    pub(crate) fn leave_editing(&mut self) -> Vec<EditEvent> {
        let mut events = Vec::new();
        events.extend(self.set_focus(None));
        events.extend(self.set_mode(Mode::Viewing));
        events
    }

    /// Forget everything about the previous document.
    pub(crate) fn reset(&mut self) -> Vec<EditEvent> {
        self.leave_editing()
    }

    pub(crate) fn set_mode(&mut self, mode: Mode) -> Option<EditEvent> {
        if self.mode == mode {
            return None;
        }
        let from = std::mem::replace(&mut self.mode, mode);
        log::debug!("session mode {from} -> {mode}");
        Some(EditEvent::ModeChanged { from, to: mode })
    }

    pub(crate) fn set_focus(&mut self, id: Option<BlockId>) -> Option<EditEvent> {
        if self.focused == id {
            return None;
        }
        let from = std::mem::replace(&mut self.focused, id.clone());
        Some(EditEvent::FocusChanged { from, to: id })
    }

    fn focused_index(&self, doc: &Document) -> Option<usize> {
        self.focused.as_ref().and_then(|id| doc.position(id))
    }

    fn focus_index(
        &mut self,
        doc: &Document,
        index: usize,
        action: &'static str,
    ) -> Result<Option<EditEvent>, EditError> {
        if !self.mode.accepts_edits() {
            return Err(EditError::InvalidTransition {
                action,
                mode: self.mode,
            });
        }
        let Some(block) = doc.get(index) else {
            return Ok(None);
        };
        Ok(self.set_focus(Some(block.id().clone())))
    }
}
