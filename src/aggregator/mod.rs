//! Verdict aggregation over a [`CandidateSet`].
//!
//! Fan-out mode compares the query against every candidate and keeps the
//! verdict with the highest `similarity_score`. Targeted mode compares against
//! a single user-chosen candidate.
//!
//! The fan-out is all-or-nothing: every comparison must succeed before any
//! verdict is produced.


use futures_util::stream::{self, StreamExt};
use tracing::{debug, info};

use crate::comparator::{AnalysisError, Comparator};
use crate::constants::DEFAULT_FANOUT_LIMIT;
use crate::model::{AggregatedVerdict, Candidate, CandidateSet, Query, Verdict};

#[derive(Debug, Clone)]
pub struct VerdictAggregator {
    comparator: Comparator,
    fanout_limit: usize,
}

impl VerdictAggregator {
    pub fn new(comparator: Comparator) -> Self {
        Self {
            comparator,
            fanout_limit: DEFAULT_FANOUT_LIMIT,
        }
    }

    /// Caps concurrent comparisons. Zero is treated as one.
    pub fn with_fanout_limit(mut self, fanout_limit: usize) -> Self {
        self.fanout_limit = fanout_limit.max(1);
        self
    }

    pub fn fanout_limit(&self) -> usize {
        self.fanout_limit
    }

    /// Compares against every candidate and keeps the best verdict.
    pub async fn analyze_all(
        &self,
        query: &Query,
        candidates: &CandidateSet,
    ) -> Result<AggregatedVerdict, AnalysisError> {
        if candidates.is_empty() {
            return Err(AnalysisError::NoCandidates);
        }

        let total = candidates.len();
        debug!(total, limit = self.fanout_limit, "starting comparison fan-out");

        // `buffered` yields in input order, so index i lines up with candidate i.
        let results: Vec<Result<Verdict, AnalysisError>> = stream::iter(candidates.iter())
            .map(|candidate| self.comparator.compare(query, candidate))
            .buffered(self.fanout_limit)
            .collect()
            .await;

        let mut verdicts = Vec::with_capacity(total);
        let mut failed = 0;
        let mut first = None;
        for result in results {
            match result {
                Ok(verdict) => verdicts.push(verdict),
                Err(e) => {
                    failed += 1;
                    if first.is_none() {
                        first = Some(e);
                    }
                }
            }
        }

        if let Some(first) = first {
            return Err(AnalysisError::FanOut {
                failed,
                total,
                first: Box::new(first),
            });
        }

        let best = reduce_verdicts(verdicts).ok_or(AnalysisError::NoCandidates)?;
        info!(
            total,
            similarity_score = best.similarity_score,
            "fan-out analysis complete"
        );
        Ok(AggregatedVerdict::reduced(best, candidates.clone()))
    }

    /// Compares against one chosen candidate and pins it on the result.
    pub async fn analyze_one(
        &self,
        query: &Query,
        candidate: &Candidate,
        candidates: &CandidateSet,
    ) -> Result<AggregatedVerdict, AnalysisError> {
        let verdict = self.comparator.compare(query, candidate).await?;
        info!(
            candidate = %candidate.title,
            similarity_score = verdict.similarity_score,
            "targeted analysis complete"
        );
        Ok(AggregatedVerdict::targeted(
            verdict,
            candidates.clone(),
            candidate.clone(),
        ))
    }
}

/// Left fold keeping the first verdict with a strictly greater score.
///
/// Ties resolve to the earliest verdict. Returns `None` for an empty input.
pub fn reduce_verdicts<I>(verdicts: I) -> Option<Verdict>
where
    I: IntoIterator<Item = Verdict>,
{
    verdicts.into_iter().fold(None, |best, verdict| match best {
        Some(best) if verdict.similarity_score <= best.similarity_score => Some(best),
        _ => Some(verdict),
    })
}
