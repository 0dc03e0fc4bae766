use thiserror::Error;

use crate::services::ServiceError;

#[derive(Debug, Clone, Error)]
/// Errors turning a submission into a query.
pub enum ExtractionError {
    /// Text submission was empty after trimming.
    #[error("news text is empty")]
    EmptyText,

    /// Image submission had no bytes.
    #[error("image '{file_name}' is empty")]
    EmptyImage {
        /// Uploaded file name.
        file_name: String,
    },

    /// Image exceeds the configured upload limit.
    #[error("image is {size} bytes, larger than the {max} byte limit")]
    ImageTooLarge {
        /// Image size in bytes.
        size: u64,
        /// Configured maximum.
        max: u64,
    },

    /// File extension is not one the OCR service accepts.
    #[error("unsupported image type: '{extension}'")]
    UnsupportedImageType {
        /// Lowercased extension, empty when the name has none.
        extension: String,
    },

    /// OCR succeeded but recognized no usable text.
    #[error("{message}")]
    NoText {
        /// Message reported by the OCR service.
        message: String,
    },

    /// OCR call failed.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl ExtractionError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ExtractionError::Service(e) if e.is_unauthorized())
    }
}
