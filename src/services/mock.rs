//! In-memory collaborators for tests.
//!
//! Responses are configured up front with the `with_*` builders; call counters
//! and recorded inputs let tests assert which network calls would have happened.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{ServiceError, ServiceKind};
use super::types::{Entity, ExtractedText, ServiceStatus};
use super::{ArticleSearch, EntityExtraction, FactComparison, StatusProbe, TextExtraction};
use crate::model::{Candidate, ImageUpload, Verdict};

type Scripted<T> = (Duration, Result<T, ServiceError>);

pub struct MockServices {
    ocr: Mutex<Result<ExtractedText, ServiceError>>,
    entities: Mutex<Result<Vec<Entity>, ServiceError>>,
    search: Mutex<Result<Vec<Candidate>, ServiceError>>,
    search_script: Mutex<VecDeque<Scripted<Vec<Candidate>>>>,
    search_delay: Mutex<Duration>,
    verdicts: Mutex<HashMap<String, Result<Verdict, ServiceError>>>,
    default_verdict: Mutex<Option<Verdict>>,
    analysis_delay: Mutex<Duration>,
    analysis_delays: Mutex<HashMap<String, Duration>>,
    status: Mutex<Result<ServiceStatus, ServiceError>>,

    ocr_calls: AtomicUsize,
    ner_calls: AtomicUsize,
    search_calls: AtomicUsize,
    analysis_calls: AtomicUsize,
    analysis_in_flight: AtomicUsize,
    analysis_peak: AtomicUsize,

    uploads: Mutex<Vec<ImageUpload>>,
    search_queries: Mutex<Vec<String>>,
    analysis_requests: Mutex<Vec<(String, String)>>,
}

impl Default for MockServices {
    fn default() -> Self {
        Self::new()
    }
}

impl MockServices {
    pub fn new() -> Self {
        Self {
            ocr: Mutex::new(Ok(ExtractedText::default())),
            entities: Mutex::new(Ok(Vec::new())),
            search: Mutex::new(Ok(Vec::new())),
            search_script: Mutex::new(VecDeque::new()),
            search_delay: Mutex::new(Duration::ZERO),
            verdicts: Mutex::new(HashMap::new()),
            default_verdict: Mutex::new(None),
            analysis_delay: Mutex::new(Duration::ZERO),
            analysis_delays: Mutex::new(HashMap::new()),
            status: Mutex::new(Ok(ServiceStatus {
                status: "UP".to_string(),
                message: "mock backend".to_string(),
            })),
            ocr_calls: AtomicUsize::new(0),
            ner_calls: AtomicUsize::new(0),
            search_calls: AtomicUsize::new(0),
            analysis_calls: AtomicUsize::new(0),
            analysis_in_flight: AtomicUsize::new(0),
            analysis_peak: AtomicUsize::new(0),
            uploads: Mutex::new(Vec::new()),
            search_queries: Mutex::new(Vec::new()),
            analysis_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_ocr_text(self, text: impl Into<String>) -> Self {
        *self.ocr.lock() = Ok(ExtractedText::new(text));
        self
    }

    pub fn with_ocr_response(self, response: ExtractedText) -> Self {
        *self.ocr.lock() = Ok(response);
        self
    }

    pub fn with_ocr_error(self, error: ServiceError) -> Self {
        *self.ocr.lock() = Err(error);
        self
    }

    pub fn with_entities<I, S>(self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.entities.lock() = Ok(words.into_iter().map(Entity::new).collect());
        self
    }

    pub fn with_entities_error(self, error: ServiceError) -> Self {
        *self.entities.lock() = Err(error);
        self
    }

    pub fn with_candidates(self, candidates: Vec<Candidate>) -> Self {
        self.set_candidates(candidates);
        self
    }

    pub fn with_search_error(self, error: ServiceError) -> Self {
        *self.search.lock() = Err(error);
        self
    }

    pub fn with_search_delay(self, delay: Duration) -> Self {
        *self.search_delay.lock() = delay;
        self
    }

    /// Queues a one-shot search response; queued responses are served before the default.
    pub fn with_scripted_search(
        self,
        delay: Duration,
        result: Result<Vec<Candidate>, ServiceError>,
    ) -> Self {
        self.search_script.lock().push_back((delay, result));
        self
    }

    /// Verdict returned when the comparison text equals `summary`.
    pub fn with_verdict_for(self, summary: impl Into<String>, verdict: Verdict) -> Self {
        self.verdicts.lock().insert(summary.into(), Ok(verdict));
        self
    }

    pub fn with_analysis_error_for(self, summary: impl Into<String>, error: ServiceError) -> Self {
        self.verdicts.lock().insert(summary.into(), Err(error));
        self
    }

    /// Verdict returned for comparison texts without a specific entry.
    pub fn with_default_verdict(self, verdict: Verdict) -> Self {
        *self.default_verdict.lock() = Some(verdict);
        self
    }

    pub fn with_analysis_delay(self, delay: Duration) -> Self {
        *self.analysis_delay.lock() = delay;
        self
    }

    /// Delay for one comparison text, overriding the shared delay.
    pub fn with_analysis_delay_for(self, summary: impl Into<String>, delay: Duration) -> Self {
        self.analysis_delays.lock().insert(summary.into(), delay);
        self
    }

    pub fn with_status(self, status: Result<ServiceStatus, ServiceError>) -> Self {
        *self.status.lock() = status;
        self
    }

    pub fn set_candidates(&self, candidates: Vec<Candidate>) {
        *self.search.lock() = Ok(candidates);
    }

    pub fn ocr_calls(&self) -> usize {
        self.ocr_calls.load(Ordering::SeqCst)
    }

    pub fn ner_calls(&self) -> usize {
        self.ner_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn analysis_calls(&self) -> usize {
        self.analysis_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.ocr_calls() + self.ner_calls() + self.search_calls() + self.analysis_calls()
    }

    /// Highest number of comparison calls observed in flight at once.
    pub fn peak_concurrent_analyses(&self) -> usize {
        self.analysis_peak.load(Ordering::SeqCst)
    }

    pub fn uploads(&self) -> Vec<ImageUpload> {
        self.uploads.lock().clone()
    }

    pub fn search_queries(&self) -> Vec<String> {
        self.search_queries.lock().clone()
    }

    /// `(input_news, comparison_news)` pairs in call order.
    pub fn analysis_requests(&self) -> Vec<(String, String)> {
        self.analysis_requests.lock().clone()
    }
}

/// Generic 500 used when a test did not configure a response.
fn unconfigured(service: ServiceKind) -> ServiceError {
    ServiceError::Status {
        service,
        status: 500,
        message: "no mock response configured".to_string(),
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl TextExtraction for MockServices {
    async fn extract_text(&self, image: &ImageUpload) -> Result<ExtractedText, ServiceError> {
        self.ocr_calls.fetch_add(1, Ordering::SeqCst);
        self.uploads.lock().push(image.clone());
        self.ocr.lock().clone()
    }
}

#[async_trait]
impl EntityExtraction for MockServices {
    async fn extract_entities(&self, _text: &str) -> Result<Vec<Entity>, ServiceError> {
        self.ner_calls.fetch_add(1, Ordering::SeqCst);
        self.entities.lock().clone()
    }
}

#[async_trait]
impl ArticleSearch for MockServices {
    async fn search(&self, query: &str) -> Result<Vec<Candidate>, ServiceError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.search_queries.lock().push(query.to_string());

        let scripted = self.search_script.lock().pop_front();
        let (delay, result) = match scripted {
            Some(entry) => entry,
            None => (*self.search_delay.lock(), self.search.lock().clone()),
        };

        pause(delay).await;
        result
    }
}

#[async_trait]
impl FactComparison for MockServices {
    async fn analyze(
        &self,
        input_news: &str,
        comparison_news: &str,
    ) -> Result<Verdict, ServiceError> {
        self.analysis_calls.fetch_add(1, Ordering::SeqCst);
        self.analysis_requests
            .lock()
            .push((input_news.to_string(), comparison_news.to_string()));

        let in_flight = self.analysis_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.analysis_peak.fetch_max(in_flight, Ordering::SeqCst);

        let delay = self
            .analysis_delays
            .lock()
            .get(comparison_news)
            .copied()
            .unwrap_or_else(|| *self.analysis_delay.lock());
        pause(delay).await;

        self.analysis_in_flight.fetch_sub(1, Ordering::SeqCst);

        let configured = self.verdicts.lock().get(comparison_news).cloned();
        match configured {
            Some(result) => result,
            None => self
                .default_verdict
                .lock()
                .clone()
                .ok_or_else(|| unconfigured(ServiceKind::Analysis)),
        }
    }
}

#[async_trait]
impl StatusProbe for MockServices {
    async fn status(&self) -> Result<ServiceStatus, ServiceError> {
        self.status.lock().clone()
    }
}
