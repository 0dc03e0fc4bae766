//! News Guardian library crate (used by the CLI and integration tests).
//!
//! Orchestrates verification of a news item: normalize the submission into a
//! query, retrieve similar articles, compare the query against them and keep
//! the most similar verdict.
//!
//! # Public API Surface
//!
//! ## Workflow
//! - [`Workflow`], [`WorkflowSnapshot`], [`Stage`], [`WorkflowError`] - Session state machine
//!
//! ## Components
//! - [`InputNormalizer`], [`ExtractionError`] - Text/image submission to [`Query`]
//! - [`CandidateFinder`], [`SearchError`] - Similar-article retrieval
//! - [`Comparator`], [`AnalysisError`] - Pairwise fact comparison
//! - [`VerdictAggregator`] - Fan-out and targeted comparison
//!
//! ## Collaborators
//! - [`HttpServices`] - `reqwest` clients for OCR, NER, search, analysis and status
//! - [`Collaborators`] plus one trait per external service
//!
//! ## Test/Mock Support
//! [`MockServices`] is available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod aggregator;
pub mod comparator;
pub mod config;
pub mod constants;
pub mod finder;
pub mod model;
pub mod normalizer;
pub mod services;
pub mod workflow;

pub use aggregator::{VerdictAggregator, reduce_verdicts};
pub use comparator::{AnalysisError, Comparator};
pub use config::{Config, ConfigError, Endpoints};
pub use finder::{CandidateFinder, SearchError, join_entities};
pub use model::{
    AggregatedVerdict, Candidate, CandidateSet, ConfidenceBand, EntityComparison, ImageUpload,
    InputMode, InputSource, Query, Verdict,
};
pub use normalizer::{ExtractionError, InputNormalizer};
#[cfg(any(test, feature = "mock"))]
pub use services::MockServices;
pub use services::{
    ArticleSearch, Collaborators, Entity, EntityExtraction, ExtractedText, FactComparison,
    HttpServices, ServiceError, ServiceKind, ServiceStatus, StatusProbe, TextExtraction,
};
pub use workflow::{Stage, Workflow, WorkflowError, WorkflowSnapshot};
