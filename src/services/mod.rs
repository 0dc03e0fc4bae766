//! External collaborators: OCR, entity extraction, article search, fact comparison.
//!
//! Each collaborator sits behind an async trait so the workflow can run against
//! [`HttpServices`] in production and [`MockServices`] in tests.

pub mod error;
pub mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod types;


pub use error::{ServiceError, ServiceKind};
pub use http::HttpServices;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockServices;
pub use types::{Entity, ExtractedText, ServiceStatus};

use std::sync::Arc;

use async_trait::async_trait;

use crate::model::{Candidate, ImageUpload, Verdict};

#[async_trait]
/// Image-to-text extraction.
pub trait TextExtraction: Send + Sync {
    /// Uploads `image` unchanged and returns the recognized text.
    async fn extract_text(&self, image: &ImageUpload) -> Result<ExtractedText, ServiceError>;
}

#[async_trait]
/// Named-entity extraction.
pub trait EntityExtraction: Send + Sync {
    async fn extract_entities(&self, text: &str) -> Result<Vec<Entity>, ServiceError>;
}

#[async_trait]
/// Similar-article search. Result order carries no meaning.
pub trait ArticleSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<Candidate>, ServiceError>;
}

#[async_trait]
/// Pairwise fact comparison of two news texts.
pub trait FactComparison: Send + Sync {
    async fn analyze(&self, input_news: &str, comparison_news: &str)
    -> Result<Verdict, ServiceError>;
}

#[async_trait]
/// Backend liveness probe.
pub trait StatusProbe: Send + Sync {
    async fn status(&self) -> Result<ServiceStatus, ServiceError>;
}

/// The four collaborators the workflow depends on.
#[derive(Clone)]
pub struct Collaborators {
    pub ocr: Arc<dyn TextExtraction>,
    pub ner: Arc<dyn EntityExtraction>,
    pub search: Arc<dyn ArticleSearch>,
    pub analysis: Arc<dyn FactComparison>,
}

impl Collaborators {
    /// Uses one implementation for every collaborator.
    pub fn from_shared<T>(services: Arc<T>) -> Self
    where
        T: TextExtraction + EntityExtraction + ArticleSearch + FactComparison + 'static,
    {
        Self {
            ocr: services.clone(),
            ner: services.clone(),
            search: services.clone(),
            analysis: services,
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
