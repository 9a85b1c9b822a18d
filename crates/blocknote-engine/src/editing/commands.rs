use crate::editing::{
    Block, BlockId, BlockKind, BlockPatch, BlockType, Document, EditError, EditEvent,
    FocusManager, HeadingMeta, ImageMeta, LIST_ITEM_SEPARATOR, ListMeta,
};

/// Editing commands, one per gesture the input layer can raise.
///
/// `CommitAndAdvance` and `DeleteIfEmpty` are the two abstract input signals:
/// whatever captures input (a key handler, a soft keyboard, a test) maps its
/// own events onto them and the engine never sees keystrokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    InsertAfter { id: BlockId, block_type: BlockType },
    RemoveBlock { id: BlockId },
    /// "Enter" in a text-like block
    CommitAndAdvance { id: BlockId },
    /// "Backspace at the start" of a block
    DeleteIfEmpty { id: BlockId },
    Reorder { from: usize, to: usize },
    SetContent { id: BlockId, content: String },
    ChangeType { id: BlockId, block_type: BlockType },
    SetHeadingLevel { id: BlockId, level: u8 },
    SetListOrdered { id: BlockId, ordered: bool },
    SetImageSource {
        id: BlockId,
        src: Option<String>,
        width: Option<u32>,
    },
}

impl Cmd {
    /// Block the command addresses, if it addresses one by id
    pub fn target(&self) -> Option<&BlockId> {
        match self {
            Cmd::InsertAfter { id, .. }
            | Cmd::RemoveBlock { id }
            | Cmd::CommitAndAdvance { id }
            | Cmd::DeleteIfEmpty { id }
            | Cmd::SetContent { id, .. }
            | Cmd::ChangeType { id, .. }
            | Cmd::SetHeadingLevel { id, .. }
            | Cmd::SetListOrdered { id, .. }
            | Cmd::SetImageSource { id, .. } => Some(id),
            Cmd::Reorder { .. } => None,
        }
    }

    /// Commands raised straight from the input layer, where a stale id is
    /// an expected race rather than a caller bug.
    pub fn tolerates_stale_target(&self) -> bool {
        matches!(
            self,
            Cmd::InsertAfter { .. }
                | Cmd::RemoveBlock { .. }
                | Cmd::CommitAndAdvance { .. }
                | Cmd::DeleteIfEmpty { .. }
        )
    }
}

/// Gesture-level operations over a document and its focus state.
///
/// The engine borrows both for the duration of one command and records an
/// event for every change it makes. It does not know about modes beyond
/// what the focus manager enforces, nor about dirty tracking; the session
/// owns those.
pub struct BlockEngine<'a> {
    doc: &'a mut Document,
    focus: &'a mut FocusManager,
    events: Vec<EditEvent>,
    created: Option<BlockId>,
}

impl<'a> BlockEngine<'a> {
    pub fn new(doc: &'a mut Document, focus: &'a mut FocusManager) -> Self {
        Self {
            doc,
            focus,
            events: Vec::new(),
            created: None,
        }
    }

    /// Most recent block this engine created, including a block synthesized
    /// to keep the document non-empty
    pub fn created(&self) -> Option<&BlockId> {
        self.created.as_ref()
    }

    /// Events recorded so far, in order
    pub fn into_events(self) -> Vec<EditEvent> {
        self.events
    }

    /// Run one command. Returns the id of the block it created, if any.
    pub fn execute(&mut self, cmd: Cmd) -> Result<Option<BlockId>, EditError> {
        self.created = None;
        match cmd {
            Cmd::InsertAfter { id, block_type } => {
                self.insert_after(&id, block_type)?;
            }
            Cmd::RemoveBlock { id } => {
                self.remove_block(&id)?;
            }
            Cmd::CommitAndAdvance { id } => {
                self.split_on_enter(&id)?;
            }
            Cmd::DeleteIfEmpty { id } => {
                self.merge_on_backspace(&id)?;
            }
            Cmd::Reorder { from, to } => {
                self.reorder(from, to)?;
            }
            Cmd::SetContent { id, content } => self.set_content(&id, content)?,
            Cmd::ChangeType { id, block_type } => self.change_type(&id, block_type)?,
            Cmd::SetHeadingLevel { id, level } => {
                let meta = HeadingMeta::new(level)?;
                self.set_metadata(&id, BlockType::Heading, BlockKind::Heading(meta))?;
            }
            Cmd::SetListOrdered { id, ordered } => {
                let kind = BlockKind::List(ListMeta { ordered });
                self.set_metadata(&id, BlockType::List, kind)?;
            }
            Cmd::SetImageSource { id, src, width } => {
                let kind = BlockKind::Image(ImageMeta { src, width });
                self.set_metadata(&id, BlockType::Image, kind)?;
            }
        }
        Ok(self.created.clone())
    }

    /// Insert a default block of `block_type` right after `id` and focus it.
    pub fn insert_after(
        &mut self,
        id: &BlockId,
        block_type: BlockType,
    ) -> Result<BlockId, EditError> {
        let index = self.locate(id)?;
        Ok(self.insert_focused(Document::create_block(block_type, None), index + 1))
    }

    /// Remove `id`, handing focus on if it was focused.
    ///
    /// Focus goes to the preceding block, else the following one. If the
    /// document would be left empty a fresh text block takes its place and
    /// gets focus, so an editing document never reaches zero blocks.
    pub fn remove_block(&mut self, id: &BlockId) -> Result<Block, EditError> {
        let index = self.locate(id)?;
        let was_focused = self.focus.is_focused(id);
        let removed = self.doc.remove(index)?;
        self.events.push(EditEvent::BlockRemoved {
            id: removed.id().clone(),
            index,
        });

        if self.doc.is_empty() {
            self.insert_focused(Document::create_block(BlockType::Text, None), 0);
        } else if was_focused {
            // The following block has shifted into `index`.
            let successor = index.checked_sub(1).unwrap_or(index);
            let next = self.doc.get(successor).map(|b| b.id().clone());
            self.events.extend(self.focus.set_focus(next));
        }
        Ok(removed)
    }

    /// Commit-and-advance.
    ///
    /// For text-like blocks the trailing unit (last line, or last list item)
    /// decides: when it is empty it is dropped and a new empty text block is
    /// inserted after and focused; otherwise a separator is appended so the
    /// user continues on a new line/item. Images always advance. Returns the
    /// new block's id when one was created.
    pub fn split_on_enter(&mut self, id: &BlockId) -> Result<Option<BlockId>, EditError> {
        let index = self.locate(id)?;
        let block = &self.doc.blocks()[index];

        if block.block_type().is_text_like() {
            let content = block.content();
            let (head, trailing) = match content.rfind(LIST_ITEM_SEPARATOR) {
                Some(pos) => (&content[..pos], &content[pos + 1..]),
                None => ("", content),
            };
            if !trailing.is_empty() {
                let extended = format!("{content}{LIST_ITEM_SEPARATOR}");
                self.update(index, BlockPatch::content(extended))?;
                return Ok(None);
            }
            if head.len() != content.len() {
                let head = head.to_string();
                self.update(index, BlockPatch::content(head))?;
            }
        }

        let new_block = Document::create_block(BlockType::Text, None);
        Ok(Some(self.insert_focused(new_block, index + 1)))
    }

    /// Delete-if-empty: an empty block is removed under `remove_block`'s
    /// focus policy, anything else is left alone. Returns whether the block
    /// was removed.
    pub fn merge_on_backspace(&mut self, id: &BlockId) -> Result<bool, EditError> {
        let index = self.locate(id)?;
        if !self.doc.blocks()[index].is_empty() {
            return Ok(false);
        }
        self.remove_block(id)?;
        Ok(true)
    }

    /// Drag-reorder with `Document::move_block`'s index adjustment.
    /// Returns the block's final index.
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<usize, EditError> {
        let landed = self.doc.move_block(from, to)?;
        if landed != from {
            let id = self.doc.blocks()[landed].id().clone();
            self.events.push(EditEvent::BlockMoved {
                id,
                from,
                to: landed,
            });
        }
        Ok(landed)
    }

    pub fn set_content(&mut self, id: &BlockId, content: String) -> Result<(), EditError> {
        let index = self.locate(id)?;
        if self.doc.blocks()[index].content() == content {
            return Ok(());
        }
        self.update(index, BlockPatch::content(content))
    }

    /// Convert a block to another type. Content is kept; metadata resets to
    /// the new type's defaults.
    pub fn change_type(&mut self, id: &BlockId, block_type: BlockType) -> Result<(), EditError> {
        let index = self.locate(id)?;
        if self.doc.blocks()[index].block_type() == block_type {
            return Ok(());
        }
        self.update(index, BlockPatch::kind(block_type.default_kind()))
    }

    fn set_metadata(
        &mut self,
        id: &BlockId,
        expected: BlockType,
        kind: BlockKind,
    ) -> Result<(), EditError> {
        let index = self.locate(id)?;
        let block = &self.doc.blocks()[index];
        if block.block_type() != expected {
            return Err(EditError::Validation(format!(
                "block {id} is a {} block, not {expected}",
                block.block_type()
            )));
        }
        if block.kind() == &kind {
            return Ok(());
        }
        self.update(index, BlockPatch::kind(kind))
    }

    fn update(&mut self, index: usize, patch: BlockPatch) -> Result<(), EditError> {
        let id = self.doc.update(index, patch)?.id().clone();
        self.events.push(EditEvent::BlockChanged { id });
        Ok(())
    }

    /// Insert `block` and focus it. Focus is only handed out while the
    /// focus manager is in an editing mode.
    fn insert_focused(&mut self, block: Block, at: usize) -> BlockId {
        let index = self.doc.insert(block, at);
        let id = self.doc.blocks()[index].id().clone();
        self.events.push(EditEvent::BlockInserted {
            id: id.clone(),
            index,
        });
        if self.focus.mode().accepts_edits() {
            self.events.extend(self.focus.set_focus(Some(id.clone())));
        }
        self.created = Some(id.clone());
        id
    }

    fn locate(&self, id: &BlockId) -> Result<usize, EditError> {
        self.doc
            .position(id)
            .ok_or_else(|| EditError::BlockNotFound(id.clone()))
    }
}
