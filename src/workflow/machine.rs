use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::error::WorkflowError;
use super::state::{Stage, WorkflowSnapshot, WorkflowState};
use crate::aggregator::VerdictAggregator;
use crate::comparator::Comparator;
use crate::config::Config;
use crate::finder::CandidateFinder;
use crate::model::{Candidate, InputMode, InputSource, Query};
use crate::normalizer::{ExtractionError, InputNormalizer};
use crate::services::Collaborators;

/// Clears `loading` when an attempt ends, including when its future is dropped.
///
/// Only the attempt that set `loading` may clear it; a newer attempt keeps its flag.
struct LoadingGuard<'a> {
    state: &'a Mutex<WorkflowState>,
    generation: u64,
}

impl<'a> LoadingGuard<'a> {
    fn new(state: &'a Mutex<WorkflowState>, generation: u64) -> Self {
        Self { state, generation }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if state.is_current(self.generation) && state.loading {
            debug!(generation = self.generation, "attempt abandoned, clearing loading");
            state.loading = false;
        }
    }
}

/// The `input → search → analysis` state machine for one user session.
///
/// Transitions take `&self`, so a shell may share the workflow behind an `Arc`
/// and fire a new request while an older one is still in flight. The older
/// one then resolves to [`WorkflowError::Superseded`] without publishing.
pub struct Workflow {
    session_id: Uuid,
    normalizer: InputNormalizer,
    finder: CandidateFinder,
    aggregator: VerdictAggregator,
    state: Mutex<WorkflowState>,
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("session_id", &self.session_id)
            .field("stage", &self.state.lock().stage)
            .finish_non_exhaustive()
    }
}

impl Workflow {
    pub fn new(collaborators: Collaborators, config: &Config) -> Self {
        let normalizer =
            InputNormalizer::new(collaborators.ocr).with_max_image_bytes(config.max_image_bytes);

        let mut finder = CandidateFinder::new(collaborators.search);
        if config.entity_refinement {
            finder = finder.with_entity_refinement(collaborators.ner);
        }

        let aggregator = VerdictAggregator::new(Comparator::new(collaborators.analysis))
            .with_fanout_limit(config.fanout_limit);

        let session_id = Uuid::new_v4();
        debug!(%session_id, refine = config.entity_refinement, "workflow created");

        Self {
            session_id,
            normalizer,
            finder,
            aggregator,
            state: Mutex::new(WorkflowState::default()),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn stage(&self) -> Stage {
        self.state.lock().stage
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        self.state.lock().snapshot(self.session_id)
    }

    /// `input → search`: normalizes the submission and retrieves candidates.
    ///
    /// Blank text is rejected before anything else happens; the state is left
    /// exactly as it was.
    #[instrument(skip(self, source), fields(session = %self.session_id, mode = ?source.mode()))]
    pub async fn submit(&self, source: InputSource) -> Result<WorkflowSnapshot, WorkflowError> {
        let generation = {
            let mut state = self.state.lock();
            state.require(&[Stage::Input], "submit")?;
            if let InputSource::Text(text) = &source
                && Query::parse(text).is_none()
            {
                return Err(ExtractionError::EmptyText.into());
            }
            state.begin()
        };
        let guard = LoadingGuard::new(&self.state, generation);

        let outcome = match self.normalizer.normalize(&source).await {
            Ok(query) => match self.finder.find_candidates(query.as_str()).await {
                Ok(candidates) => Ok((query, candidates)),
                Err(e) => Err(WorkflowError::from(e)),
            },
            Err(e) => Err(WorkflowError::from(e)),
        };

        let result = self.settle(generation, outcome, |state, (query, candidates)| {
            info!(candidates = candidates.len(), "submission accepted");
            state.stage = Stage::Search;
            state.input_mode = InputMode::Text;
            state.draft = query.to_string();
            state.query = Some(query);
            state.candidates = Some(candidates);
            state.verdict = None;
        });
        drop(guard);
        result
    }

    /// `search → analysis`: compares against every candidate, keeps the best verdict.
    #[instrument(skip(self), fields(session = %self.session_id))]
    pub async fn analyze_all(&self) -> Result<WorkflowSnapshot, WorkflowError> {
        let (generation, query, candidates) = {
            let mut state = self.state.lock();
            state.require(&[Stage::Search], "analyze all candidates")?;
            let (query, candidates) =
                state
                    .search_context()
                    .ok_or(WorkflowError::InvalidTransition {
                        from: state.stage,
                        action: "analyze all candidates",
                    })?;
            (state.begin(), query, candidates)
        };
        let guard = LoadingGuard::new(&self.state, generation);

        let outcome = self
            .aggregator
            .analyze_all(&query, &candidates)
            .await
            .map_err(WorkflowError::from);

        let result = self.settle(generation, outcome, |state, verdict| {
            info!(
                similarity_score = verdict.verdict.similarity_score,
                "fan-out verdict published"
            );
            state.stage = Stage::Analysis;
            state.verdict = Some(verdict);
        });
        drop(guard);
        result
    }

    /// `search → analysis` (or `analysis → analysis`): compares against one chosen candidate.
    #[instrument(skip(self, candidate), fields(session = %self.session_id, candidate = %candidate.title))]
    pub async fn compare(&self, candidate: Candidate) -> Result<WorkflowSnapshot, WorkflowError> {
        let (generation, query, candidates) = {
            let mut state = self.state.lock();
            state.require(&[Stage::Search, Stage::Analysis], "compare")?;
            let (query, candidates) =
                state
                    .search_context()
                    .ok_or(WorkflowError::InvalidTransition {
                        from: state.stage,
                        action: "compare",
                    })?;
            (state.begin(), query, candidates)
        };
        let guard = LoadingGuard::new(&self.state, generation);

        let outcome = self
            .aggregator
            .analyze_one(&query, &candidate, &candidates)
            .await
            .map_err(WorkflowError::from);

        let result = self.settle(generation, outcome, |state, verdict| {
            info!(
                similarity_score = verdict.verdict.similarity_score,
                "targeted verdict published"
            );
            state.stage = Stage::Analysis;
            state.verdict = Some(verdict);
        });
        drop(guard);
        result
    }

    /// `analysis → search`: drops the verdict and keeps the candidates.
    #[instrument(skip(self), fields(session = %self.session_id))]
    pub fn back(&self) -> Result<WorkflowSnapshot, WorkflowError> {
        let mut state = self.state.lock();
        state.require(&[Stage::Analysis], "go back to search results")?;
        state.invalidate();
        state.verdict = None;
        state.stage = Stage::Search;
        state.clear_error();
        debug!("returned to search results");
        Ok(state.snapshot(self.session_id))
    }

    /// `search → input`: drops the candidates and restores the query as the draft.
    #[instrument(skip(self), fields(session = %self.session_id))]
    pub fn back_to_input(&self) -> Result<WorkflowSnapshot, WorkflowError> {
        let mut state = self.state.lock();
        state.require(&[Stage::Search], "go back to input")?;
        state.invalidate();
        if let Some(query) = state.query.take() {
            state.draft = query.into_string();
        }
        state.candidates = None;
        state.verdict = None;
        state.stage = Stage::Input;
        state.clear_error();
        debug!("returned to input");
        Ok(state.snapshot(self.session_id))
    }

    /// Switches between the text and image tabs on the input screen.
    pub fn set_input_mode(&self, mode: InputMode) -> Result<WorkflowSnapshot, WorkflowError> {
        let mut state = self.state.lock();
        state.require(&[Stage::Input], "switch input mode")?;
        state.input_mode = mode;
        Ok(state.snapshot(self.session_id))
    }

    /// Publishes the outcome of attempt `generation` unless a newer one replaced it.
    ///
    /// Success runs `publish`, then clears `error`; failure records it and keeps
    /// the stage. Both clear `loading` in the same critical section.
    fn settle<T>(
        &self,
        generation: u64,
        outcome: Result<T, WorkflowError>,
        publish: impl FnOnce(&mut WorkflowState, T),
    ) -> Result<WorkflowSnapshot, WorkflowError> {
        let mut state = self.state.lock();
        if !state.is_current(generation) {
            warn!(
                generation,
                current = state.generation,
                "dropping superseded response"
            );
            return Err(WorkflowError::Superseded);
        }

        state.loading = false;
        match outcome {
            Ok(value) => {
                publish(&mut *state, value);
                state.clear_error();
                Ok(state.snapshot(self.session_id))
            }
            Err(e) => {
                warn!(error = %e, stage = %state.stage, unauthorized = e.is_unauthorized(), "transition failed");
                state.fail(&e);
                Err(e)
            }
        }
    }
}
