//! Data exchanged between the workflow, its components and the render boundary.
//!
//! Two similarity scores live here and they are unrelated: [`Candidate::similarity`]
//! comes from the search service, [`Verdict::similarity_score`] from the comparison
//! service. Nothing in the crate compares one against the other.

pub mod candidate;
pub mod input;
pub mod query;
pub mod verdict;


pub use candidate::{Candidate, CandidateSet};
pub use input::{ImageUpload, InputMode, InputSource};
pub use query::Query;
pub use verdict::{AggregatedVerdict, ConfidenceBand, EntityComparison, Verdict};
