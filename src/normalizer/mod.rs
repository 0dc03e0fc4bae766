//! Turns a text or image submission into a [`Query`].
//!
//! Text is trimmed locally. Images are checked against the same limits the OCR
//! service enforces, then uploaded unchanged.

pub mod error;


pub use error::ExtractionError;

use std::sync::Arc;

use tracing::debug;

use crate::constants::{ALLOWED_IMAGE_EXTENSIONS, DEFAULT_MAX_IMAGE_BYTES, NO_TEXT_MESSAGE};
use crate::model::{ImageUpload, InputSource, Query};
use crate::services::TextExtraction;

pub struct InputNormalizer {
    ocr: Arc<dyn TextExtraction>,
    max_image_bytes: u64,
}

impl std::fmt::Debug for InputNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputNormalizer")
            .field("max_image_bytes", &self.max_image_bytes)
            .finish_non_exhaustive()
    }
}

impl InputNormalizer {
    pub fn new(ocr: Arc<dyn TextExtraction>) -> Self {
        Self {
            ocr,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }

    pub fn with_max_image_bytes(mut self, max_image_bytes: u64) -> Self {
        self.max_image_bytes = max_image_bytes;
        self
    }

    pub fn max_image_bytes(&self) -> u64 {
        self.max_image_bytes
    }

    pub async fn normalize(&self, source: &InputSource) -> Result<Query, ExtractionError> {
        match source {
            InputSource::Text(text) => Query::parse(text).ok_or(ExtractionError::EmptyText),
            InputSource::Image(image) => self.extract(image).await,
        }
    }

    async fn extract(&self, image: &ImageUpload) -> Result<Query, ExtractionError> {
        self.check_image(image)?;

        let extracted = self.ocr.extract_text(image).await?;
        debug!(
            file_name = %image.file_name,
            text_len = extracted.text.len(),
            "text extracted from image"
        );

        Query::parse(&extracted.text).ok_or_else(|| ExtractionError::NoText {
            message: extracted
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| NO_TEXT_MESSAGE.to_string()),
        })
    }

    /// Rejects images the OCR service would refuse, without uploading them.
    pub fn check_image(&self, image: &ImageUpload) -> Result<(), ExtractionError> {
        if image.is_empty() {
            return Err(ExtractionError::EmptyImage {
                file_name: image.file_name.clone(),
            });
        }

        let size = image.len() as u64;
        if size > self.max_image_bytes {
            return Err(ExtractionError::ImageTooLarge {
                size,
                max: self.max_image_bytes,
            });
        }

        let extension = image.extension().unwrap_or_default();
        if !ALLOWED_IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ExtractionError::UnsupportedImageType { extension });
        }

        Ok(())
    }
}
