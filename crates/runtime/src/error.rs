//! Runtime error type.

use skirmish_core::ExecuteError;

use crate::repository::RepositoryError;

/// Errors surfaced to runtime clients.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("game {0} not found")]
    GameNotFound(String),

    #[error("game {0} already exists")]
    GameExists(String),

    #[error(transparent)]
    Execute(#[from] ExecuteError),

    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("content error: {0}")]
    Content(String),

    #[error("command channel closed")]
    CommandChannelClosed,

    #[error("reply channel closed")]
    ReplyChannelClosed,
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
