use crate::editing::{BlockId, BlockKind, EditSession, Mode};

/// Immutable view of a session for rendering
///
/// Front-ends render from snapshots and never touch the live document;
/// changes go back in through commands. `revision` lets a renderer skip
/// work when nothing moved.
///
/// ```rust
/// # use blocknote_engine::editing::{Document, EditSession, BlockKind};
/// # use blocknote_engine::io::NoteId;
/// let mut session = EditSession::new(NoteId::parse("inbox").unwrap(), Document::new());
/// session.enter_edit().unwrap();
/// let snapshot = session.snapshot();
/// for block in &snapshot.blocks {
///     match block.kind {
///         BlockKind::Heading(ref meta) => println!("h{} {}", meta.level, block.content),
///         _ => println!("{}{}", if block.focused { "> " } else { "  " }, block.content),
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Session revision for change detection
    pub revision: u64,
    pub mode: Mode,
    /// Unsaved changes indicator
    pub dirty: bool,
    pub blocks: Vec<RenderBlock>,
}

/// UI-ready block
#[derive(Debug, Clone, PartialEq)]
pub struct RenderBlock {
    /// Stable identifier that survives edits and reorders
    pub id: BlockId,
    /// Block type with its metadata
    pub kind: BlockKind,
    /// Position in the document
    pub index: usize,
    pub content: String,
    /// Whether this block holds input focus
    pub focused: bool,
}

impl Snapshot {
    pub(crate) fn capture(session: &EditSession) -> Self {
        let focused = session.focused();
        let blocks = session
            .document()
            .blocks()
            .iter()
            .enumerate()
            .map(|(index, block)| RenderBlock {
                id: block.id().clone(),
                kind: block.kind().clone(),
                index,
                content: block.content().to_string(),
                focused: focused == Some(block.id()),
            })
            .collect();

        Snapshot {
            revision: session.revision(),
            mode: session.mode(),
            dirty: session.has_unsaved_changes(),
            blocks,
        }
    }

    /// The focused block, if any
    pub fn focused(&self) -> Option<&RenderBlock> {
        self.blocks.iter().find(|b| b.focused)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::{BlockType, Document};
    use crate::io::NoteId;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_snapshot_marks_focused_block() {
        let mut session = EditSession::new(NoteId::parse("s").unwrap(), Document::new());
        session.enter_edit().unwrap();
        let first = session.document().get(0).unwrap().id().clone();
        session.set_content(&first, "one").unwrap();
        let second = session.insert_after(&first, BlockType::Heading).unwrap().unwrap();

        let snapshot = session.snapshot();

        assert_eq!(snapshot.blocks.len(), 2);
        assert_eq!(snapshot.mode, Mode::Editing);
        assert!(snapshot.dirty);
        assert_eq!(snapshot.focused().map(|b| &b.id), Some(&second));
        assert_eq!(snapshot.blocks[0].content, "one");
        assert!(!snapshot.blocks[0].focused);
        assert_eq!(snapshot.blocks[1].index, 1);
    }

    #[test]
    fn test_snapshot_is_detached_from_session() {
        let mut session =
            EditSession::new(NoteId::parse("s").unwrap(), Document::with_default_block());
        session.enter_edit().unwrap();
        let snapshot = session.snapshot();
        let id = session.document().get(0).unwrap().id().clone();

        session.set_content(&id, "changed").unwrap();

        assert_eq!(snapshot.blocks[0].content, "");
        assert!(session.snapshot().revision > snapshot.revision);
    }
}
