use thiserror::Error;

use crate::services::ServiceError;

#[derive(Debug, Clone, Error)]
/// Errors retrieving similar articles.
pub enum SearchError {
    /// Query was blank.
    #[error("search query is empty")]
    EmptyQuery,

    /// Search succeeded but returned an unusable candidate.
    #[error("search returned a malformed candidate: {reason}")]
    Malformed {
        /// What was wrong with it.
        reason: String,
    },

    /// Search call failed.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl SearchError {
    /// True when the search service answered `401`.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SearchError::Service(e) if e.is_unauthorized())
    }
}
