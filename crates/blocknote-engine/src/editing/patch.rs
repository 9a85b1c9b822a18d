use crate::editing::{BlockId, Mode};

/// Something that changed in a session, for presentation layers to observe
/// instead of holding mutation callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditEvent {
    BlockInserted { id: BlockId, index: usize },
    BlockRemoved { id: BlockId, index: usize },
    BlockChanged { id: BlockId },
    BlockMoved { id: BlockId, from: usize, to: usize },
    FocusChanged {
        from: Option<BlockId>,
        to: Option<BlockId>,
    },
    ModeChanged { from: Mode, to: Mode },
    /// A command named a block that no longer exists and was ignored
    StaleTarget { id: BlockId },
}

/// Result of applying a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub events: Vec<EditEvent>,
    /// Block created by the command, if any (insert-after, advance)
    pub created: Option<BlockId>,
    /// Focus after the command
    pub focus: Option<BlockId>,
    /// Session revision after the command
    pub revision: u64,
}

impl Patch {
    /// True when the command changed nothing
    pub fn is_noop(&self) -> bool {
        self.events
            .iter()
            .all(|e| matches!(e, EditEvent::StaleTarget { .. }))
    }

    /// True when the command changed the document itself (not just focus)
    pub fn touches_document(&self) -> bool {
        self.events.iter().any(|e| {
            matches!(
                e,
                EditEvent::BlockInserted { .. }
                    | EditEvent::BlockRemoved { .. }
                    | EditEvent::BlockChanged { .. }
                    | EditEvent::BlockMoved { .. }
            )
        })
    }
}
