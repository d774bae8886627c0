use thiserror::Error;

use crate::domain::ContentError;

pub type ForumResult<T> = Result<T, ForumError>;

/// Failures surfaced to the forum UI.
///
/// None of them end the session; the user re-triggers the action if needed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForumError {
    /// Empty or oversized content. Raised before any request is sent.
    #[error("invalid content: {0}")]
    Validation(String),
    /// The post (or reply) no longer exists, e.g. deleted by someone else.
    #[error("not found: {0}")]
    NotFound(String),
    /// A positional reply reference that is not a valid current position.
    #[error("reply index out of range: {0}")]
    OutOfRange(String),
    /// Ownership mismatch or missing identity.
    #[error("not allowed: {0}")]
    Authorization(String),
    /// Transport failure or a server-side error.
    #[error("network error: {0}")]
    Network(String),
    /// The identity provider has not settled yet.
    #[error("identity is still loading")]
    AuthLoading,
    /// The same operation on the same post is already in flight.
    #[error("{0} is already in progress")]
    Pending(String),
}

impl From<ContentError> for ForumError {
    fn from(e: ContentError) -> Self {
        ForumError::Validation(e.to_string())
    }
}

impl From<reqwest::Error> for ForumError {
    fn from(e: reqwest::Error) -> Self {
        ForumError::Network(e.to_string())
    }
}
