use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::candidate::{Candidate, CandidateSet};
use crate::constants::SIMILARITY_RANGE;

/// Score at or above which a verdict is reported with high confidence.
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.8;
/// Score at or above which a verdict is reported with medium confidence.
pub const MEDIUM_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// One entity of the submitted news matched against the comparison article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityComparison {
    pub entity_type: String,
    pub input_entity: String,
    #[serde(default)]
    pub comparison_entity: Option<String>,
    pub matches: bool,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Result of comparing the query against a single candidate.
///
/// `fact_check_summary`, `similarity_score` and `discrepancies` are required on
/// the wire; the entity breakdowns are optional display data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub fact_check_summary: String,
    pub similarity_score: f64,
    pub discrepancies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entity_comparisons: Vec<EntityComparison>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extracted_entities: BTreeMap<String, Vec<String>>,
}

impl Verdict {
    pub fn new(summary: impl Into<String>, similarity_score: f64) -> Self {
        Self {
            fact_check_summary: summary.into(),
            similarity_score,
            discrepancies: Vec::new(),
            entity_comparisons: Vec::new(),
            extracted_entities: BTreeMap::new(),
        }
    }

    pub fn with_discrepancies<I, S>(mut self, discrepancies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.discrepancies = discrepancies.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if !SIMILARITY_RANGE.contains(&self.similarity_score) {
            return Err(format!(
                "similarity_score {} outside [0, 1]",
                self.similarity_score
            ));
        }
        Ok(())
    }

    pub fn confidence(&self) -> ConfidenceBand {
        ConfidenceBand::from_score(self.similarity_score)
    }

    pub fn has_discrepancies(&self) -> bool {
        !self.discrepancies.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

impl ConfidenceBand {
    pub fn from_score(score: f64) -> Self {
        if score >= HIGH_CONFIDENCE_THRESHOLD {
            Self::High
        } else if score >= MEDIUM_CONFIDENCE_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceBand::High => "high",
            ConfidenceBand::Medium => "medium",
            ConfidenceBand::Low => "low",
        }
    }
}

impl std::fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The verdict presented to the user, with the candidate pool it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedVerdict {
    #[serde(flatten)]
    pub verdict: Verdict,

    /// Every candidate of the search, in display order.
    pub candidates: CandidateSet,

    /// Set only when the user picked the candidate to compare against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_candidate: Option<Candidate>,
}

impl AggregatedVerdict {
    /// Verdict chosen by fan-out reduction.
    pub fn reduced(verdict: Verdict, candidates: CandidateSet) -> Self {
        Self {
            verdict,
            candidates,
            selected_candidate: None,
        }
    }

    /// Verdict of a targeted comparison against `candidate`.
    pub fn targeted(verdict: Verdict, candidates: CandidateSet, candidate: Candidate) -> Self {
        Self {
            verdict,
            candidates,
            selected_candidate: Some(candidate),
        }
    }

    pub fn is_targeted(&self) -> bool {
        self.selected_candidate.is_some()
    }
}
