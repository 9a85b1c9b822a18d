// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use blocknote_engine::editing::{Block, BlockType, Document};

/// A note of `sections` repetitions of heading, paragraph, list and image
#[allow(dead_code)]
pub fn generate_document(sections: usize) -> Document {
    let mut blocks = Vec::with_capacity(sections * 4);
    for section in 0..sections {
        blocks.push(Block::new(BlockType::Heading, format!("Section {section}")));
        blocks.push(Block::new(
            BlockType::Text,
            "Some paragraph content with multiple sentences. This helps create realistic document structure for benchmarking.",
        ));
        blocks.push(Block::new(
            BlockType::List,
            "first item\nsecond item\nthird item with more words",
        ));
        blocks.push(Block::new(BlockType::Image, format!("Figure {section}")));
    }
    Document::from_blocks(blocks).expect("generated blocks are valid")
}

/// Text with combining marks, to exercise grapheme-aware truncation
#[allow(dead_code)]
pub fn generate_accented_text(repeats: usize) -> String {
    "cafe\u{0301} na\u{0303}o ".repeat(repeats)
}
