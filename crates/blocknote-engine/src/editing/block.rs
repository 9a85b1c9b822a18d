use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::editing::EditError;

/// Separator between list items inside a list block's content.
pub const LIST_ITEM_SEPARATOR: char = '\n';

/// Heading levels a heading block may carry.
pub const HEADING_LEVELS: std::ops::RangeInclusive<u8> = 1..=3;

/// Level given to freshly created heading blocks
pub const DEFAULT_HEADING_LEVEL: u8 = 2;

/// Stable identifier for a block within one document.
///
/// Ids are opaque strings so that documents written by other clients (which
/// may use any id scheme) load unchanged. Fresh ids are UUID v4.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    /// Allocate a fresh, globally unique id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for BlockId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The four kinds of block, without their metadata.
///
/// Used wherever a caller asks for "a block of this type" and the engine
/// supplies the type's default metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Text,
    Heading,
    List,
    Image,
}

impl BlockType {
    pub const ALL: [BlockType; 4] = [
        BlockType::Text,
        BlockType::Heading,
        BlockType::List,
        BlockType::Image,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Text => "text",
            BlockType::Heading => "heading",
            BlockType::List => "list",
            BlockType::Image => "image",
        }
    }

    /// Metadata a new block of this type starts with
    pub fn default_kind(&self) -> BlockKind {
        match self {
            BlockType::Text => BlockKind::Text(TextMeta::default()),
            BlockType::Heading => BlockKind::Heading(HeadingMeta {
                level: DEFAULT_HEADING_LEVEL,
            }),
            BlockType::List => BlockKind::List(ListMeta::default()),
            BlockType::Image => BlockKind::Image(ImageMeta::default()),
        }
    }

    /// Text-like blocks split on commit; images do not.
    pub fn is_text_like(&self) -> bool {
        !matches!(self, BlockType::Image)
    }

    /// The next type in `ALL`, wrapping around. Used by front-ends to cycle
    /// a block's type with a single key.
    pub fn cycle(&self) -> BlockType {
        let index = Self::ALL.iter().position(|t| t == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BlockType {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| EditError::Validation(format!("unknown block type `{s}`")))
    }
}

/// Block type together with its type-specific metadata.
///
/// Serialized adjacently tagged, which is exactly the interchange shape:
/// `"type": "heading", "metadata": { "level": 2 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "metadata", rename_all = "lowercase")]
pub enum BlockKind {
    Text(TextMeta),
    Heading(HeadingMeta),
    List(ListMeta),
    Image(ImageMeta),
}

impl BlockKind {
    pub fn block_type(&self) -> BlockType {
        match self {
            BlockKind::Text(_) => BlockType::Text,
            BlockKind::Heading(_) => BlockType::Heading,
            BlockKind::List(_) => BlockType::List,
            BlockKind::Image(_) => BlockType::Image,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), EditError> {
        match self {
            BlockKind::Heading(meta) => HeadingMeta::new(meta.level).map(|_| ()),
            BlockKind::Text(_) | BlockKind::List(_) | BlockKind::Image(_) => Ok(()),
        }
    }
}

/// Plain text carries no metadata; serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextMeta {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingMeta {
    pub level: u8,
}

impl HeadingMeta {
    pub fn new(level: u8) -> Result<Self, EditError> {
        if HEADING_LEVELS.contains(&level) {
            Ok(Self { level })
        } else {
            Err(EditError::Validation(format!(
                "heading level {level} outside {}..={}",
                HEADING_LEVELS.start(),
                HEADING_LEVELS.end()
            )))
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMeta {
    #[serde(default)]
    pub ordered: bool,
}

/// Reference to externally stored image bytes plus a display hint.
/// The caption is the block's content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMeta {
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

/// A single typed unit of document content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    id: BlockId,
    #[serde(flatten)]
    kind: BlockKind,
    #[serde(default)]
    content: String,
}

impl Block {
    /// Fresh block of `block_type` with that type's default metadata
    pub fn new(block_type: BlockType, content: impl Into<String>) -> Self {
        Self {
            id: BlockId::generate(),
            kind: block_type.default_kind(),
            content: content.into(),
        }
    }

    /// Assemble a block from existing parts (loading, importing, tests)
    pub fn from_parts(id: BlockId, kind: BlockKind, content: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            content: content.into(),
        }
    }

    pub fn id(&self) -> &BlockId {
        &self.id
    }

    pub fn kind(&self) -> &BlockKind {
        &self.kind
    }

    pub fn block_type(&self) -> BlockType {
        self.kind.block_type()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// List items; a list with empty content still has one (empty) item.
    pub fn list_items(&self) -> impl Iterator<Item = &str> {
        self.content.split(LIST_ITEM_SEPARATOR)
    }

    /// Caption of an image block, `None` when blank or not an image
    pub fn caption(&self) -> Option<&str> {
        match self.kind {
            BlockKind::Image(_) if !self.content.trim().is_empty() => Some(&self.content),
            _ => None,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), EditError> {
        if self.id.as_str().is_empty() {
            return Err(EditError::Validation("block with empty id".to_string()));
        }
        self.kind.validate()
    }

    pub(crate) fn regenerate_id(&mut self) {
        self.id = BlockId::generate();
    }

    pub(crate) fn apply_patch(&mut self, patch: BlockPatch) {
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
    }
}

/// Replacement content and/or kind for `Document::update`. The id is never
/// part of a patch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockPatch {
    pub content: Option<String>,
    pub kind: Option<BlockKind>,
}

impl BlockPatch {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            kind: None,
        }
    }

    pub fn kind(kind: BlockKind) -> Self {
        Self {
            content: None,
            kind: Some(kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(BlockType::Text, BlockKind::Text(TextMeta {}))]
    #[case(BlockType::Heading, BlockKind::Heading(HeadingMeta { level: 2 }))]
    #[case(BlockType::List, BlockKind::List(ListMeta { ordered: false }))]
    #[case(BlockType::Image, BlockKind::Image(ImageMeta { src: None, width: None }))]
    fn test_default_kind_per_type(#[case] block_type: BlockType, #[case] expected: BlockKind) {
        let block = Block::new(block_type, "");
        assert_eq!(block.kind(), &expected);
        assert_eq!(block.block_type(), block_type);
    }

    #[test]
    fn test_new_blocks_get_distinct_ids() {
        let a = Block::new(BlockType::Text, "");
        let b = Block::new(BlockType::Text, "");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_empty_list_has_one_empty_item() {
        let block = Block::new(BlockType::List, "");
        assert_eq!(block.list_items().collect::<Vec<_>>(), vec![""]);
    }

    #[test]
    fn test_list_items_split_on_separator() {
        let block = Block::new(BlockType::List, "milk\neggs\n");
        assert_eq!(
            block.list_items().collect::<Vec<_>>(),
            vec!["milk", "eggs", ""]
        );
    }

    #[rstest]
    #[case(0, false)]
    #[case(1, true)]
    #[case(3, true)]
    #[case(4, false)]
    fn test_heading_level_bounds(#[case] level: u8, #[case] valid: bool) {
        assert_eq!(HeadingMeta::new(level).is_ok(), valid);
    }

    #[test]
    fn test_caption_only_for_non_blank_images() {
        let image = Block::new(BlockType::Image, "A cat");
        let blank = Block::new(BlockType::Image, "   ");
        let text = Block::new(BlockType::Text, "A cat");
        assert_eq!(image.caption(), Some("A cat"));
        assert_eq!(blank.caption(), None);
        assert_eq!(text.caption(), None);
    }

    #[test]
    fn test_block_type_parse_and_cycle() {
        assert_eq!("list".parse::<BlockType>().unwrap(), BlockType::List);
        assert!("table".parse::<BlockType>().is_err());
        assert_eq!(BlockType::Image.cycle(), BlockType::Text);
        assert_eq!(BlockType::Text.cycle(), BlockType::Heading);
    }

    #[test]
    fn test_interchange_shape() {
        let block = Block::from_parts(
            BlockId::from("b1"),
            BlockKind::Heading(HeadingMeta { level: 1 }),
            "Title",
        );
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "b1",
                "type": "heading",
                "metadata": { "level": 1 },
                "content": "Title"
            })
        );
    }

    #[test]
    fn test_text_metadata_is_empty_object() {
        let block = Block::from_parts(BlockId::from("t"), BlockKind::Text(TextMeta {}), "x");
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["metadata"], serde_json::json!({}));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let raw = r#"{"id":"x","type":"table","metadata":{},"content":""}"#;
        assert!(serde_json::from_str::<Block>(raw).is_err());
    }

    #[test]
    fn test_patch_preserves_id() {
        let mut block = Block::new(BlockType::Text, "before");
        let id = block.id().clone();
        block.apply_patch(BlockPatch {
            content: Some("after".to_string()),
            kind: Some(BlockType::List.default_kind()),
        });
        assert_eq!(block.id(), &id);
        assert_eq!(block.content(), "after");
        assert_eq!(block.block_type(), BlockType::List);
    }
}
