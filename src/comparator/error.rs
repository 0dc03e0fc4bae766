use thiserror::Error;

use crate::services::ServiceError;

#[derive(Debug, Clone, Error)]
/// Errors comparing the query against candidates.
pub enum AnalysisError {
    /// Fan-out requested over an empty candidate set.
    #[error("no candidates to analyze")]
    NoCandidates,

    /// Comparison succeeded but the verdict is unusable.
    #[error("analysis returned an invalid verdict: {reason}")]
    InvalidVerdict {
        /// What was wrong with it.
        reason: String,
    },

    /// At least one comparison in a fan-out failed.
    #[error("{failed} of {total} comparisons failed; first: {first}")]
    FanOut {
        /// Number of failed comparisons.
        failed: usize,
        /// Number of comparisons attempted.
        total: usize,
        /// Earliest failure in candidate order.
        first: Box<AnalysisError>,
    },

    /// Comparison call failed.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl AnalysisError {
    /// True when the analysis service answered `401`, including inside a fan-out.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            AnalysisError::Service(e) => e.is_unauthorized(),
            AnalysisError::FanOut { first, .. } => first.is_unauthorized(),
            AnalysisError::NoCandidates | AnalysisError::InvalidVerdict { .. } => false,
        }
    }
}
