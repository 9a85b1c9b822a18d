//! Search text derived from a document's blocks.
//!
//! Runs once per save over the saved snapshot, never per keystroke.

use std::borrow::Cow;

use unicode_segmentation::UnicodeSegmentation;

use crate::editing::{Block, BlockKind};

/// Maximum length of the extracted text, in characters.
pub const PLAIN_TEXT_CAP: usize = 10_000;

/// Stand-in for an image without a caption
const IMAGE_PLACEHOLDER: &str = "Image";

/// Extract search text capped at [`PLAIN_TEXT_CAP`] characters.
pub fn extract_plain_text(blocks: &[Block]) -> String {
    extract_plain_text_with_cap(blocks, PLAIN_TEXT_CAP)
}

/// Concatenate block contributions in document order, separated by single
/// spaces, then cut to at most `cap` characters without splitting a
/// grapheme cluster. Blocks contributing nothing are skipped so separators
/// never double up.
pub fn extract_plain_text_with_cap(blocks: &[Block], cap: usize) -> String {
    let mut out = String::new();
    let mut chars = 0;
    for block in blocks {
        let part = contribution(block);
        if part.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
            chars += 1;
        }
        out.push_str(&part);
        chars += part.chars().count();
        // One character past the cap is enough to know truncation happens.
        if chars > cap {
            break;
        }
    }
    let end = truncate_at_grapheme(&out, cap).len();
    if end < out.len() {
        // a cut landing just past a separator must not leave it dangling
        let end = out[..end].trim_end_matches(' ').len();
        out.truncate(end);
    }
    out
}

/// Longest prefix of `text` with at most `cap` characters that ends on a
/// grapheme cluster boundary.
pub fn truncate_at_grapheme(text: &str, cap: usize) -> &str {
    let mut chars = 0;
    for (offset, grapheme) in text.grapheme_indices(true) {
        chars += grapheme.chars().count();
        if chars > cap {
            return &text[..offset];
        }
    }
    text
}

fn contribution(block: &Block) -> Cow<'_, str> {
    match block.kind() {
        BlockKind::Text(_) | BlockKind::Heading(_) => Cow::Borrowed(block.content()),
        BlockKind::List(_) => {
            let items: Vec<&str> = block.list_items().filter(|i| !i.is_empty()).collect();
            Cow::Owned(items.join(" "))
        }
        BlockKind::Image(_) => Cow::Borrowed(block.caption().unwrap_or(IMAGE_PLACEHOLDER)),
    }
}
