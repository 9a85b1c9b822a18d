/*!
 * # Editing Core Module
 *
 * Block-structured note editing: a document is an ordered list of typed
 * blocks, edited through commands and observed through events and
 * snapshots.
 *
 * ## Architecture Overview
 *
 * ### 1. Document as the single source of truth
 * - A **`Document`** owns an ordered `Vec<Block>`; position is the index
 * - Every block has a stable **`BlockId`** that survives edits and reorders
 * - Block metadata is a tagged union (**`BlockKind`**), so a heading always
 *   carries a level and an image never does
 *
 * ### 2. Command-based editing
 * - All edits are **Commands** (`Cmd` enum) applied by the **`BlockEngine`**
 * - The input layer raises two abstract signals, commit-and-advance and
 *   delete-if-empty; keystrokes never reach the engine
 * - Each command returns a **`Patch`** listing the `EditEvent`s it caused
 *
 * ### 3. Focus as session state
 * - **`FocusManager`** tracks the focused block and the session `Mode`
 * - Focus moves are commands like any other, so every front-end shows the
 *   same focus
 *
 * ### 4. Sessions and saving
 * - **`EditSession`** runs the `Viewing → Editing → Saving` state machine
 * - Mutations stay in memory and mark the session dirty until a save
 * - A save snapshots the document first; edits made while the gateway works
 *   are kept and leave the session dirty
 *
 * ### 5. Read API: immutable snapshots
 * - **`Snapshot`** / **`RenderBlock`** describe what to draw, including focus
 * - UI renders from snapshots and never mutates the document directly
 *
 * ## Usage Pattern
 *
 * ```rust
 * use blocknote_engine::editing::*;
 * use blocknote_engine::io::{MemoryGateway, NoteId};
 *
 * let mut gateway = MemoryGateway::new();
 * let mut session = EditSession::new(NoteId::parse("inbox").unwrap(), Document::new());
 *
 * // 1. Start editing; an empty document gets one focused text block
 * session.enter_edit().unwrap();
 * let first = session.focused().cloned().unwrap();
 *
 * // 2. Apply edits via commands; committing an empty trailing line
 * //    advances to a new block
 * session.set_content(&first, "Hello").unwrap();
 * session.commit_and_advance(&first).unwrap();
 * session.commit_and_advance(&first).unwrap();
 * assert_eq!(session.document().get(0).unwrap().content(), "Hello");
 *
 * // 3. Render from a snapshot
 * let snapshot = session.snapshot();
 * assert_eq!(snapshot.blocks.len(), 2);
 *
 * // 4. Persist
 * session.save(&mut gateway, AfterSave::Editing).unwrap();
 * assert!(!session.has_unsaved_changes());
 * ```
 */

// Module exports
pub mod block;
pub mod commands;
pub mod document;
pub mod error;
pub mod focus;
pub mod patch;
pub mod plain_text;
pub mod session;
pub mod snapshot;

// Public API re-exports
pub use block::{
    Block, BlockId, BlockKind, BlockPatch, BlockType, HeadingMeta, ImageMeta, LIST_ITEM_SEPARATOR,
    ListMeta, TextMeta,
};
pub use commands::{BlockEngine, Cmd};
pub use document::{DOCUMENT_FORMAT_VERSION, Document};
pub use error::EditError;
pub use focus::{FocusManager, Mode};
pub use patch::{EditEvent, Patch};
pub use plain_text::{PLAIN_TEXT_CAP, extract_plain_text};
pub use session::{AfterSave, EditSession, SaveTicket};
pub use snapshot::{RenderBlock, Snapshot};
