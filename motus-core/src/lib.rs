pub mod identity;

pub use identity::{MemoryUserStore, Role, User, UserStore};

/// Error surface shared by every storage backend. Repository traits return
/// this instead of a boxed error so callers can tell a uniqueness conflict
/// apart from an unreachable backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage conflict: {0}")]
    Conflict(String),
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        StoreError::Backend(err.to_string())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        StoreError::Conflict(msg.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
