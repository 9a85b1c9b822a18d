//! Markdown import and export.
//!
//! Export is lossy only in ids; importing an exported document yields the
//! same block types, metadata and content. Import of arbitrary Markdown maps
//! what it can onto the four block types: deeper headings clamp to level 3,
//! nested lists flatten into their top-level list, code blocks and quotes
//! become text.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};

use crate::editing::{
    Block, BlockId, BlockKind, Document, EditError, HeadingMeta, ImageMeta, LIST_ITEM_SEPARATOR,
    ListMeta, TextMeta,
};

/// Render `doc` as CommonMark, one paragraph per block
pub fn to_markdown(doc: &Document) -> String {
    let rendered: Vec<String> = doc.blocks().iter().filter_map(render_block).collect();
    let mut out = rendered.join("\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn render_block(block: &Block) -> Option<String> {
    match block.kind() {
        BlockKind::Text(_) => (!block.is_empty()).then(|| block.content().to_string()),
        BlockKind::Heading(meta) => Some(format!(
            "{} {}",
            "#".repeat(usize::from(meta.level)),
            block.content()
        )),
        BlockKind::List(meta) => {
            let lines: Vec<String> = block
                .list_items()
                .filter(|item| !item.is_empty())
                .enumerate()
                .map(|(n, item)| {
                    if meta.ordered {
                        format!("{}. {item}", n + 1)
                    } else {
                        format!("- {item}")
                    }
                })
                .collect();
            (!lines.is_empty()).then(|| lines.join("\n"))
        }
        BlockKind::Image(meta) => Some(format!(
            "![{}]({})",
            block.content(),
            meta.src.as_deref().unwrap_or_default()
        )),
    }
}

/// Parse Markdown into a document of freshly identified blocks
pub fn from_markdown(content: &str) -> Result<Document, EditError> {
    let mut importer = MarkdownImporter::default();
    for event in Parser::new(content) {
        importer.process_event(event);
    }
    Document::from_blocks(importer.blocks)
}

/// Event-driven importer.
///
/// Lists: pulldown-cmark emits a nested list inside its parent item, after
/// the parent's own text and before the parent's `End(Item)`. Flushing the
/// pending item text whenever a new item starts keeps parents ahead of their
/// children in the flattened list.
#[derive(Default)]
struct MarkdownImporter {
    blocks: Vec<Block>,
    /// Inline text of the current paragraph or heading
    text: String,
    /// Image seen in the current paragraph: (src, alt)
    image: Option<(String, String)>,
    in_image: bool,
    list_depth: usize,
    list_ordered: bool,
    list_items: Vec<String>,
    item: Option<String>,
    code: Option<String>,
}

impl MarkdownImporter {
    fn process_event(&mut self, event: Event) {
        match event {
            Event::Start(Tag::Paragraph) => {
                if self.list_depth == 0 {
                    self.text.clear();
                    self.image = None;
                }
            }
            Event::End(TagEnd::Paragraph) => {
                if self.list_depth == 0 {
                    self.flush_paragraph();
                }
            }
            Event::Start(Tag::Heading { .. }) => self.text.clear(),
            Event::End(TagEnd::Heading(level)) => {
                let level = (level as u8).min(3);
                let text = std::mem::take(&mut self.text).trim().to_string();
                self.push(BlockKind::Heading(HeadingMeta { level }), text);
            }
            Event::Start(Tag::List(first)) => {
                if self.list_depth == 0 {
                    self.list_ordered = first.is_some();
                    self.list_items.clear();
                }
                self.list_depth += 1;
            }
            Event::End(TagEnd::List(_)) => {
                self.list_depth = self.list_depth.saturating_sub(1);
                if self.list_depth == 0 {
                    let items = std::mem::take(&mut self.list_items);
                    let kind = BlockKind::List(ListMeta {
                        ordered: self.list_ordered,
                    });
                    self.push(kind, items.join(&LIST_ITEM_SEPARATOR.to_string()));
                }
            }
            Event::Start(Tag::Item) => {
                self.flush_item();
                self.item = Some(String::new());
            }
            Event::End(TagEnd::Item) => self.flush_item(),
            Event::Start(Tag::CodeBlock(_)) => self.code = Some(String::new()),
            Event::End(TagEnd::CodeBlock) => {
                if let Some(code) = self.code.take() {
                    let code = code.trim_end_matches('\n').to_string();
                    self.push(BlockKind::Text(TextMeta {}), code);
                }
            }
            Event::Start(Tag::Image { dest_url, .. }) => {
                self.in_image = true;
                if self.list_depth == 0 && self.text.trim().is_empty() {
                    self.image = Some((dest_url.to_string(), String::new()));
                }
            }
            Event::End(TagEnd::Image) => self.in_image = false,
            Event::Text(text) | Event::Code(text) => self.push_text(&text),
            Event::SoftBreak | Event::HardBreak => {
                let separator = if self.item.is_some() { " " } else { "\n" };
                self.push_text(separator);
            }
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(code) = self.code.as_mut() {
            code.push_str(text);
        } else if let Some(item) = self.item.as_mut() {
            item.push_str(text);
        } else if self.in_image
            && let Some((_, alt)) = self.image.as_mut()
        {
            alt.push_str(text);
        } else {
            // Anything besides the image itself makes this a text paragraph
            if let Some((_, alt)) = self.image.take() {
                self.text.push_str(&alt);
            }
            self.text.push_str(text);
        }
    }

    fn flush_paragraph(&mut self) {
        let text = std::mem::take(&mut self.text);
        match self.image.take() {
            Some((src, alt)) if text.trim().is_empty() => {
                let src = (!src.is_empty()).then_some(src);
                self.push(BlockKind::Image(ImageMeta { src, width: None }), alt);
            }
            _ if !text.trim().is_empty() => {
                self.push(BlockKind::Text(TextMeta {}), text.trim().to_string());
            }
            _ => {}
        }
    }

    fn flush_item(&mut self) {
        if let Some(item) = self.item.take() {
            let item = item.trim();
            if !item.is_empty() {
                self.list_items.push(item.to_string());
            }
        }
    }

    fn push(&mut self, kind: BlockKind, content: String) {
        self.blocks
            .push(Block::from_parts(BlockId::generate(), kind, content));
    }
}
