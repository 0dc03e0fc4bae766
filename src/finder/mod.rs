//! Similar-article retrieval.
//!
//! The finder optionally narrows the query to its named entities, calls the
//! search service and returns a [`CandidateSet`] ranked by similarity.

pub mod error;


pub use error::SearchError;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::model::CandidateSet;
use crate::services::{ArticleSearch, Entity, EntityExtraction};

pub struct CandidateFinder {
    search: Arc<dyn ArticleSearch>,
    ner: Option<Arc<dyn EntityExtraction>>,
}

impl std::fmt::Debug for CandidateFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateFinder")
            .field("entity_refinement", &self.ner.is_some())
            .finish_non_exhaustive()
    }
}

impl CandidateFinder {
    pub fn new(search: Arc<dyn ArticleSearch>) -> Self {
        Self { search, ner: None }
    }

    /// Enables query refinement through entity extraction.
    pub fn with_entity_refinement(mut self, ner: Arc<dyn EntityExtraction>) -> Self {
        self.ner = Some(ner);
        self
    }

    pub fn refines_queries(&self) -> bool {
        self.ner.is_some()
    }

    pub async fn find_candidates(&self, query: &str) -> Result<CandidateSet, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let search_query = match &self.ner {
            Some(ner) => self.refine(ner.as_ref(), query).await?,
            None => query.to_string(),
        };

        let candidates = self.search.search(&search_query).await?;
        for candidate in &candidates {
            candidate
                .validate()
                .map_err(|reason| SearchError::Malformed { reason })?;
        }

        let set = CandidateSet::ranked(candidates);
        debug!(
            query_len = search_query.len(),
            candidates = set.len(),
            "similar articles retrieved"
        );
        Ok(set)
    }

    /// Best effort: an NER failure or empty result falls back to `query`.
    ///
    /// A rejected credential is not a refinement failure and is returned as is.
    async fn refine(
        &self,
        ner: &dyn EntityExtraction,
        query: &str,
    ) -> Result<String, SearchError> {
        match ner.extract_entities(query).await {
            Ok(entities) => match join_entities(&entities) {
                Some(refined) => {
                    debug!(%refined, "query refined to named entities");
                    Ok(refined)
                }
                None => {
                    debug!("no entities found, searching with raw query");
                    Ok(query.to_string())
                }
            },
            Err(e) if e.is_unauthorized() => Err(e.into()),
            Err(e) => {
                warn!(error = %e, "entity extraction failed, searching with raw query");
                Ok(query.to_string())
            }
        }
    }
}

/// Space-joined entity words, first occurrence wins. `None` when nothing usable remains.
pub fn join_entities(entities: &[Entity]) -> Option<String> {
    let mut words: Vec<&str> = Vec::with_capacity(entities.len());
    for entity in entities {
        let word = entity.word.trim();
        if !word.is_empty() && !words.contains(&word) {
            words.push(word);
        }
    }

    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}
