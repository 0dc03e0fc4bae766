//! Cross-cutting, shared constants.
//!
//! Collaborator defaults point at the local development ports of the
//! reference deployment (frontend on `:3000`, backend on `:8080`).

use std::time::Duration;

pub const DEFAULT_OCR_URL: &str = "http://localhost:8090/img/convert";
pub const DEFAULT_NER_URL: &str = "http://localhost:8001/entities";
pub const DEFAULT_SEARCH_URL: &str = "http://localhost:8080/api/similar";
pub const DEFAULT_ANALYSIS_URL: &str = "http://localhost:8000/analyze";
pub const DEFAULT_STATUS_URL: &str = "http://localhost:8080/status";

/// Per-call timeout applied to every outbound collaborator request.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS);

/// Maximum number of comparison requests in flight during a fan-out.
pub const DEFAULT_FANOUT_LIMIT: usize = 16;

/// Upload ceiling enforced before contacting the OCR service (it rejects larger files anyway).
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// Image extensions the OCR service accepts.
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tiff"];

/// Multipart field name the OCR service reads the upload from.
pub const OCR_UPLOAD_FIELD: &str = "file";

pub const SEARCH_QUERY_PARAM: &str = "query";
pub const NER_TEXT_PARAM: &str = "text";

/// Inclusive bounds for every similarity score exchanged with collaborators.
pub const SIMILARITY_RANGE: std::ops::RangeInclusive<f64> = 0.0..=1.0;

/// Shown when OCR returns no text and no message of its own.
pub const NO_TEXT_MESSAGE: &str = "Görüntüden metin çıkarılamadı";
