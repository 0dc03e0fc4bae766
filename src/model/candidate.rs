use serde::{Deserialize, Serialize};

use crate::constants::SIMILARITY_RANGE;

/// A retrieved article considered similar to the query.
///
/// The search backend omits `link` and sometimes `similarity`, and older
/// deployments send `snippet`/`similarityScore`; deserialization accepts all of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub title: String,

    #[serde(default, alias = "snippet", skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    /// Search-side similarity in `[0, 1]`. Missing values count as `0.0`.
    #[serde(default, alias = "similarityScore")]
    pub similarity: f64,
}

impl Candidate {
    pub fn new(title: impl Into<String>, similarity: f64) -> Self {
        Self {
            title: title.into(),
            summary: None,
            link: None,
            similarity,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Text sent to the comparison service (empty when the backend gave no summary).
    pub fn comparison_text(&self) -> &str {
        self.summary.as_deref().unwrap_or("")
    }

    /// Checks the similarity is a finite value in `[0, 1]`.
    pub fn validate(&self) -> Result<(), String> {
        if !SIMILARITY_RANGE.contains(&self.similarity) {
            return Err(format!(
                "candidate '{}' has similarity {} outside [0, 1]",
                self.title, self.similarity
            ));
        }
        Ok(())
    }
}

/// Candidates ordered by descending search similarity.
///
/// Built once per completed search and replaced wholesale; never re-sorted or
/// edited in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CandidateSet(Vec<Candidate>);

impl CandidateSet {
    /// Sorts `candidates` by similarity, highest first.
    ///
    /// The sort is stable: ties keep the order the collaborator returned them in.
    pub fn ranked(mut candidates: Vec<Candidate>) -> Self {
        candidates.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        Self(candidates)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Candidate] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.0.get(index)
    }

    pub fn best(&self) -> Option<&Candidate> {
        self.0.first()
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
