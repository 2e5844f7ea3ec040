//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, repositories and record decoding
//! so clients can bubble them up with consistent context.

use cadence_core::{ActionError, CadenceError, ErrorSeverity, PersistError, RegistryError};
use thiserror::Error;
use tokio::sync::oneshot;

pub use crate::repository::RepositoryError;

pub type Result<T, E = RuntimeError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("engine worker command channel closed")]
    CommandChannelClosed,

    #[error("engine worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("engine worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Action(#[from] ActionError),
}

impl CadenceError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::CommandChannelClosed | Self::ReplyChannelClosed(_) | Self::WorkerJoin(_) => {
                ErrorSeverity::Internal
            }
            Self::Repository(RepositoryError::CorruptedData(_)) => ErrorSeverity::Fatal,
            Self::Repository(_) => ErrorSeverity::Recoverable,
            Self::Persist(e) => e.severity(),
            Self::Registry(e) => e.severity(),
            Self::Action(e) => e.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::CommandChannelClosed => "RUNTIME_COMMAND_CHANNEL_CLOSED",
            Self::ReplyChannelClosed(_) => "RUNTIME_REPLY_CHANNEL_CLOSED",
            Self::WorkerJoin(_) => "RUNTIME_WORKER_JOIN",
            Self::Repository(_) => "RUNTIME_REPOSITORY",
            Self::Persist(e) => e.error_code(),
            Self::Registry(e) => e.error_code(),
            Self::Action(e) => e.error_code(),
        }
    }
}
