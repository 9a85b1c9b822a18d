use crate::editing::{BlockId, Mode};
use crate::io::GatewayError;

/// Errors raised by the document model, the block engine and the session.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("block not found: {0}")]
    BlockNotFound(BlockId),
    #[error("no block at index {index} (document has {len} blocks)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("cannot {action} while {mode}")]
    InvalidTransition { action: &'static str, mode: Mode },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Persistence(#[from] GatewayError),
}

impl EditError {
    /// True for the "referenced thing does not exist" family
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EditError::BlockNotFound(_)
                | EditError::IndexOutOfRange { .. }
                | EditError::Persistence(GatewayError::NotFound(_))
        )
    }
}
