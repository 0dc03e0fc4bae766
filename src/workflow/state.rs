use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::WorkflowError;
use crate::model::{AggregatedVerdict, CandidateSet, InputMode, Query};

/// Screen the user is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    #[default]
    Input,
    Search,
    Analysis,
}

impl Stage {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Input => "input",
            Stage::Search => "search",
            Stage::Analysis => "analysis",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable session state. Only [`Workflow`](super::Workflow) touches it.
#[derive(Debug, Default)]
pub(crate) struct WorkflowState {
    pub(crate) stage: Stage,
    pub(crate) input_mode: InputMode,
    pub(crate) draft: String,
    pub(crate) query: Option<Query>,
    pub(crate) candidates: Option<CandidateSet>,
    pub(crate) verdict: Option<AggregatedVerdict>,
    pub(crate) error: Option<String>,
    pub(crate) loading: bool,
    pub(crate) unauthorized: bool,
    /// Bumped whenever a new attempt starts or the user navigates away.
    pub(crate) generation: u64,
}

impl WorkflowState {
    pub(crate) fn require(
        &self,
        allowed: &[Stage],
        action: &'static str,
    ) -> Result<(), WorkflowError> {
        if allowed.contains(&self.stage) {
            Ok(())
        } else {
            Err(WorkflowError::InvalidTransition {
                from: self.stage,
                action,
            })
        }
    }

    /// Starts an attempt and returns its generation.
    pub(crate) fn begin(&mut self) -> u64 {
        self.generation += 1;
        self.loading = true;
        self.generation
    }

    /// Drops whatever attempt is in flight.
    pub(crate) fn invalidate(&mut self) {
        self.generation += 1;
        self.loading = false;
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }

    pub(crate) fn clear_error(&mut self) {
        self.error = None;
        self.unauthorized = false;
    }

    /// Records a failed attempt; the stage is left untouched.
    pub(crate) fn fail(&mut self, err: &WorkflowError) {
        self.error = Some(err.to_string());
        self.unauthorized = err.is_unauthorized();
    }

    pub(crate) fn search_context(&self) -> Option<(Query, CandidateSet)> {
        Some((self.query.clone()?, self.candidates.clone()?))
    }

    pub(crate) fn snapshot(&self, session_id: Uuid) -> WorkflowSnapshot {
        WorkflowSnapshot {
            session_id,
            stage: self.stage,
            input_mode: self.input_mode,
            draft: self.draft.clone(),
            query: self.query.clone(),
            candidates: self.candidates.clone(),
            verdict: self.verdict.clone(),
            error: self.error.clone(),
            loading: self.loading,
            unauthorized: self.unauthorized,
        }
    }
}

/// Read-only copy of the workflow state handed to the render layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowSnapshot {
    pub session_id: Uuid,
    pub stage: Stage,
    pub input_mode: InputMode,
    /// Editable query text shown on the input screen.
    pub draft: String,
    pub query: Option<Query>,
    pub candidates: Option<CandidateSet>,
    pub verdict: Option<AggregatedVerdict>,
    pub error: Option<String>,
    pub loading: bool,
    /// The last failure was a `401`; the shell should re-authenticate.
    pub unauthorized: bool,
}
