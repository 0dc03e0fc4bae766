use std::time::Duration;

use thiserror::Error;

/// Identifies which collaborator an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Ocr,
    Ner,
    Search,
    Analysis,
    Status,
}

impl ServiceKind {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Ocr => "ocr",
            ServiceKind::Ner => "ner",
            ServiceKind::Search => "search",
            ServiceKind::Analysis => "analysis",
            ServiceKind::Status => "status",
        }
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
/// Transport-level failures talking to a collaborator.
pub enum ServiceError {
    /// The collaborator answered `401`; the caller's session is no longer valid.
    #[error("{service} service rejected the credentials (401 Unauthorized)")]
    Unauthorized {
        /// Collaborator.
        service: ServiceKind,
    },

    /// Any other non-success status.
    #[error("{service} service returned {status}: {message}")]
    Status {
        /// Collaborator.
        service: ServiceKind,
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body.
        message: String,
    },

    /// No response within the configured per-call timeout.
    #[error("{service} service did not respond within {timeout:?}")]
    Timeout {
        /// Collaborator.
        service: ServiceKind,
        /// Configured timeout.
        timeout: Duration,
    },

    /// Connection or request construction failure.
    #[error("request to {service} service failed: {message}")]
    Request {
        /// Collaborator.
        service: ServiceKind,
        /// Error message.
        message: String,
    },

    /// The body did not have the expected shape.
    #[error("{service} service returned a malformed response: {message}")]
    Decode {
        /// Collaborator.
        service: ServiceKind,
        /// Error message.
        message: String,
    },

    /// The HTTP client itself could not be built; no collaborator was contacted.
    #[error("failed to build HTTP client: {message}")]
    Client {
        /// Error message.
        message: String,
    },
}

impl ServiceError {
    /// Maps a `reqwest` failure, separating timeouts from other transport errors.
    pub fn from_reqwest(service: ServiceKind, timeout: Duration, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ServiceError::Timeout { service, timeout }
        } else if err.is_decode() {
            ServiceError::Decode {
                service,
                message: err.to_string(),
            }
        } else {
            ServiceError::Request {
                service,
                message: err.to_string(),
            }
        }
    }

    /// The collaborator involved, or `None` for client construction failures.
    pub fn service(&self) -> Option<ServiceKind> {
        match self {
            ServiceError::Unauthorized { service }
            | ServiceError::Status { service, .. }
            | ServiceError::Timeout { service, .. }
            | ServiceError::Request { service, .. }
            | ServiceError::Decode { service, .. } => Some(*service),
            ServiceError::Client { .. } => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ServiceError::Unauthorized { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ServiceError::Timeout { .. })
    }

    /// The collaborator's own message, when it sent one.
    pub fn collaborator_message(&self) -> Option<&str> {
        match self {
            ServiceError::Status { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}
