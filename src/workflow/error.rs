use thiserror::Error;

use super::state::Stage;
use crate::comparator::AnalysisError;
use crate::finder::SearchError;
use crate::normalizer::ExtractionError;

#[derive(Debug, Clone, Error)]
/// Errors returned by workflow transitions.
pub enum WorkflowError {
    /// Turning the submission into a query failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Retrieving similar articles failed.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Comparing against candidates failed.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// The action is not available from the current stage.
    #[error("cannot {action} from the {from} stage")]
    InvalidTransition {
        /// Stage the workflow was in.
        from: Stage,
        /// Requested action.
        action: &'static str,
    },

    /// A newer request or navigation replaced this one; its result was dropped.
    #[error("request superseded by a newer one")]
    Superseded,
}

impl WorkflowError {
    /// True when a collaborator answered `401` and the session should be re-authenticated.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            WorkflowError::Extraction(e) => e.is_unauthorized(),
            WorkflowError::Search(e) => e.is_unauthorized(),
            WorkflowError::Analysis(e) => e.is_unauthorized(),
            WorkflowError::InvalidTransition { .. } | WorkflowError::Superseded => false,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, WorkflowError::Superseded)
    }
}
