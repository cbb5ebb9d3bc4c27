//! Error types for the prompt studio core.

use thiserror::Error;

/// Result type alias for studio operations.
pub type StudioResult<T> = Result<T, StudioError>;

/// Errors that can occur during studio operations.
///
/// Malformed persisted data is never an error: loads normalize
/// field-by-field and degrade to defaults instead of failing. These
/// variants cover explicit user-driven operations that can legitimately
/// be refused (reloading an empty store, removing the last outfit).
#[derive(Error, Debug)]
pub enum StudioError {
    /// Store key not found during an explicit reload.
    #[error("Nothing saved under key: {0}")]
    MissingKey(String),

    /// Actor not found in the refinery roster.
    #[error("Actor not found: {0}")]
    ActorNotFound(String),

    /// Index out of bounds for list operations.
    #[error("Index {index} out of bounds for list of length {length}")]
    IndexOutOfBounds { index: usize, length: usize },

    /// Removing the last remaining outfit is refused.
    #[error("Actor {0} has only one outfit; it cannot be removed")]
    LastOutfit(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StudioError {
    /// Creates a MissingKey error.
    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::MissingKey(key.into())
    }

    /// Creates an ActorNotFound error.
    pub fn actor_not_found(id: impl Into<String>) -> Self {
        Self::ActorNotFound(id.into())
    }

    /// Creates an IndexOutOfBounds error.
    pub fn index_out_of_bounds(index: usize, length: usize) -> Self {
        Self::IndexOutOfBounds { index, length }
    }

    /// Creates a LastOutfit error.
    pub fn last_outfit(actor_id: impl Into<String>) -> Self {
        Self::LastOutfit(actor_id.into())
    }

    /// Creates a Serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}
