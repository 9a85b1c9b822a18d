use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::editing::{Block, BlockId, BlockPatch, BlockType, EditError, plain_text};

/// Interchange format version written by this crate.
pub const DOCUMENT_FORMAT_VERSION: &str = "1";

/// Ordered sequence of blocks making up one note.
///
/// Position is implicit: a block's index in `blocks` is its position, and
/// nothing else records it. The `plain_text` field is a cache refreshed on
/// save, never the source of truth.
///
/// Primitive mutations live here and know nothing about focus or sessions;
/// gesture-level editing (split, merge, refocus) is in `commands`.
///
/// ```rust
/// # use blocknote_engine::editing::{Document, BlockType};
/// let mut doc = Document::new();
/// let block = Document::create_block(BlockType::Heading, Some("Groceries"));
/// doc.insert(block, 0);
/// assert_eq!(doc.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Opaque format tag, kept verbatim from whatever was loaded
    version: String,
    blocks: Vec<Block>,
    #[serde(default)]
    plain_text: String,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document with no blocks
    pub fn new() -> Self {
        Self {
            version: DOCUMENT_FORMAT_VERSION.to_string(),
            blocks: Vec::new(),
            plain_text: String::new(),
        }
    }

    /// Document holding a single empty text block; the fallback for
    /// unreadable stored content.
    pub fn with_default_block() -> Self {
        let mut doc = Self::new();
        doc.blocks.push(Self::create_block(BlockType::Text, None));
        doc
    }

    /// Build a document from existing blocks, rejecting duplicate ids and
    /// out-of-schema metadata.
    pub fn from_blocks(blocks: Vec<Block>) -> Result<Self, EditError> {
        let doc = Self {
            blocks,
            ..Self::new()
        };
        doc.validate()?;
        Ok(doc)
    }

    /// Parse the JSON interchange representation.
    pub fn from_json(json: &str) -> Result<Self, EditError> {
        let doc: Document =
            serde_json::from_str(json).map_err(|e| EditError::Validation(e.to_string()))?;
        doc.validate()?;
        Ok(doc)
    }

    /// Serialize to the JSON interchange representation
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), EditError> {
        let mut seen = HashSet::with_capacity(self.blocks.len());
        for block in &self.blocks {
            block.validate()?;
            if !seen.insert(block.id()) {
                return Err(EditError::Validation(format!(
                    "duplicate block id `{}`",
                    block.id()
                )));
            }
        }
        Ok(())
    }

    /// Allocate a new block with a fresh id and the type's default metadata.
    pub fn create_block(block_type: BlockType, initial_content: Option<&str>) -> Block {
        Block::new(block_type, initial_content.unwrap_or_default())
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Cached search text from the last refresh
    pub fn plain_text(&self) -> &str {
        &self.plain_text
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn position(&self, id: &BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| b.id() == id)
    }

    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id() == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &BlockId> {
        self.blocks.iter().map(Block::id)
    }

    /// Insert `block` at `at_index`, clamped to `[0, len]`. Returns the index
    /// the block actually landed at.
    ///
    /// A block whose id is already in the document (a clone, say) is given a
    /// fresh id on the way in.
    pub fn insert(&mut self, mut block: Block, at_index: usize) -> usize {
        if self.position(block.id()).is_some() {
            log::debug!("block id {} already present, assigning a new one", block.id());
            block.regenerate_id();
        }
        let index = at_index.min(self.blocks.len());
        self.blocks.insert(index, block);
        index
    }

    pub fn remove(&mut self, index: usize) -> Result<Block, EditError> {
        if index >= self.blocks.len() {
            return Err(EditError::IndexOutOfRange {
                index,
                len: self.blocks.len(),
            });
        }
        Ok(self.blocks.remove(index))
    }

    /// Replace content and/or kind at `index`; the id is untouched.
    pub fn update(&mut self, index: usize, patch: BlockPatch) -> Result<&Block, EditError> {
        let len = self.blocks.len();
        let block = self
            .blocks
            .get_mut(index)
            .ok_or(EditError::IndexOutOfRange { index, len })?;
        if let Some(kind) = &patch.kind {
            kind.validate()?;
        }
        block.apply_patch(patch);
        Ok(block)
    }

    /// Move the block at `from_index` so it sits before the block that was
    /// at `to_index`.
    ///
    /// The block is removed first, which shifts everything after `from_index`
    /// left by one, so a `to_index` past `from_index` is decremented before
    /// re-inserting. This gives the usual drag-and-drop behaviour where
    /// dropping on slot `to_index` means "before whatever was there".
    /// Returns the block's final index.
    pub fn move_block(&mut self, from_index: usize, to_index: usize) -> Result<usize, EditError> {
        let block = self.remove(from_index)?;
        let target = if to_index > from_index {
            to_index - 1
        } else {
            to_index
        };
        Ok(self.insert(block, target))
    }

    /// Give every block whose id repeats an earlier one a fresh id. Returns
    /// how many were reassigned.
    pub(crate) fn reassign_duplicate_ids(&mut self) -> usize {
        let mut seen = HashSet::with_capacity(self.blocks.len());
        let mut reassigned = 0;
        for block in &mut self.blocks {
            if !seen.insert(block.id().clone()) {
                block.regenerate_id();
                seen.insert(block.id().clone());
                reassigned += 1;
            }
        }
        reassigned
    }

    /// Recompute the cached plain text
    pub(crate) fn refresh_plain_text(&mut self) {
        self.plain_text = plain_text::extract_plain_text(&self.blocks);
    }

    pub(crate) fn set_plain_text(&mut self, plain_text: String) {
        self.plain_text = plain_text;
    }
}
