//! User-facing error kinds recorded by the game state.

use thiserror::Error;

/// Failure surfaced to the player. Only one is shown at a time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Catalog, availability or reachability fetch failed.
    #[error("{0}")]
    Load(String),
    /// Random pair or shortest-path computation failed.
    #[error("{0}")]
    Compute(String),
    /// Path validation request failed.
    #[error("{0}")]
    Validation(String),
    /// Operation rejected locally before any request was issued.
    #[error("{0}")]
    Precondition(String),
}

impl GameError {
    pub(crate) fn load(message: impl Into<String>) -> Self {
        Self::Load(message.into())
    }

    pub(crate) fn compute(message: impl Into<String>) -> Self {
        Self::Compute(message.into())
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Short name of the error kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GameError::Load(_) => "load",
            GameError::Compute(_) => "compute",
            GameError::Validation(_) => "validation",
            GameError::Precondition(_) => "precondition",
        }
    }

    /// Message shown in the status line.
    pub fn message(&self) -> &str {
        match self {
            GameError::Load(message)
            | GameError::Compute(message)
            | GameError::Validation(message)
            | GameError::Precondition(message) => message,
        }
    }
}
