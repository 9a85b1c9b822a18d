pub mod editing;
pub mod io;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use editing::{
    AfterSave, Block, BlockId, BlockKind, BlockType, Cmd, Document, EditError, EditEvent,
    EditSession, Mode, Patch, SaveTicket, Snapshot,
};
pub use io::{FileGateway, GatewayError, MemoryGateway, NoteId, PersistenceGateway};
