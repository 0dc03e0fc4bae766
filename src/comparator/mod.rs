//! Pairwise fact comparison between the query and one candidate.

pub mod error;


pub use error::AnalysisError;

use std::sync::Arc;

use tracing::debug;

use crate::model::{Candidate, Query, Verdict};
use crate::services::FactComparison;

#[derive(Clone)]
pub struct Comparator {
    analysis: Arc<dyn FactComparison>,
}

impl std::fmt::Debug for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Comparator").finish_non_exhaustive()
    }
}

impl Comparator {
    pub fn new(analysis: Arc<dyn FactComparison>) -> Self {
        Self { analysis }
    }

    /// Compares `query` with the candidate's summary (empty when it has none).
    pub async fn compare(
        &self,
        query: &Query,
        candidate: &Candidate,
    ) -> Result<Verdict, AnalysisError> {
        let verdict = self
            .analysis
            .analyze(query.as_str(), candidate.comparison_text())
            .await?;

        verdict
            .validate()
            .map_err(|reason| AnalysisError::InvalidVerdict { reason })?;

        debug!(
            candidate = %candidate.title,
            similarity_score = verdict.similarity_score,
            discrepancies = verdict.discrepancies.len(),
            "candidate compared"
        );
        Ok(verdict)
    }
}
