//! `reqwest`-backed collaborator clients.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::{ServiceError, ServiceKind};
use super::types::{AnalysisRequest, EntitiesResponse, Entity, ExtractedText, ServiceStatus};
use super::{ArticleSearch, EntityExtraction, FactComparison, StatusProbe, TextExtraction};
use crate::config::{Config, Endpoints};
use crate::constants::{NER_TEXT_PARAM, OCR_UPLOAD_FIELD, SEARCH_QUERY_PARAM};
use crate::model::{Candidate, ImageUpload, Verdict};

/// HTTP client for every collaborator, sharing one connection pool.
#[derive(Clone)]
pub struct HttpServices {
    http: Client,
    endpoints: Endpoints,
    bearer_token: Option<String>,
    timeout: Duration,
}

impl std::fmt::Debug for HttpServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpServices")
            .field("endpoints", &self.endpoints)
            .field("authenticated", &self.bearer_token.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpServices {
    /// Builds the client with the configured per-call timeout.
    pub fn new(config: &Config) -> Result<Self, ServiceError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ServiceError::Client {
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            endpoints: config.endpoints.clone(),
            bearer_token: config.bearer_token.clone(),
            timeout: config.request_timeout,
        })
    }

    /// Replaces the bearer credential (e.g. after the shell re-authenticates).
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(
        &self,
        service: ServiceKind,
        builder: RequestBuilder,
    ) -> Result<Response, ServiceError> {
        let resp = self
            .authorize(builder)
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(service, self.timeout, e))?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!(%service, "collaborator rejected credentials");
            return Err(ServiceError::Unauthorized { service });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = extract_error_message(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            debug!(%service, status = status.as_u16(), %message, "collaborator returned error status");
            return Err(ServiceError::Status {
                service,
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp)
    }

    async fn decode<T: DeserializeOwned>(
        &self,
        service: ServiceKind,
        resp: Response,
    ) -> Result<T, ServiceError> {
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ServiceError::from_reqwest(service, self.timeout, e))?;

        serde_json::from_slice(&bytes).map_err(|e| ServiceError::Decode {
            service,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl TextExtraction for HttpServices {
    async fn extract_text(&self, image: &ImageUpload) -> Result<ExtractedText, ServiceError> {
        let service = ServiceKind::Ocr;

        let mut part = Part::bytes(image.bytes.clone()).file_name(image.file_name.clone());
        if let Some(content_type) = &image.content_type {
            part = part
                .mime_str(content_type)
                .map_err(|e| ServiceError::Request {
                    service,
                    message: format!("invalid content type '{content_type}': {e}"),
                })?;
        }
        let form = Form::new().part(OCR_UPLOAD_FIELD, part);

        debug!(file_name = %image.file_name, bytes = image.len(), "uploading image for text extraction");
        let builder = self.http.post(&self.endpoints.ocr_url).multipart(form);
        let resp = self.send(service, builder).await?;
        self.decode(service, resp).await
    }
}

#[async_trait]
impl EntityExtraction for HttpServices {
    async fn extract_entities(&self, text: &str) -> Result<Vec<Entity>, ServiceError> {
        let service = ServiceKind::Ner;
        let builder = self
            .http
            .get(&self.endpoints.ner_url)
            .query(&[(NER_TEXT_PARAM, text)]);
        let resp = self.send(service, builder).await?;
        let body: EntitiesResponse = self.decode(service, resp).await?;
        Ok(body.entities)
    }
}

#[async_trait]
impl ArticleSearch for HttpServices {
    async fn search(&self, query: &str) -> Result<Vec<Candidate>, ServiceError> {
        let service = ServiceKind::Search;
        let builder = self
            .http
            .get(&self.endpoints.search_url)
            .query(&[(SEARCH_QUERY_PARAM, query)]);
        let resp = self.send(service, builder).await?;
        self.decode(service, resp).await
    }
}

#[async_trait]
impl FactComparison for HttpServices {
    async fn analyze(
        &self,
        input_news: &str,
        comparison_news: &str,
    ) -> Result<Verdict, ServiceError> {
        let service = ServiceKind::Analysis;
        let body = AnalysisRequest {
            input_news,
            comparison_news,
        };
        let builder = self.http.post(&self.endpoints.analysis_url).json(&body);
        let resp = self.send(service, builder).await?;
        self.decode(service, resp).await
    }
}

#[async_trait]
impl StatusProbe for HttpServices {
    async fn status(&self) -> Result<ServiceStatus, ServiceError> {
        let service = ServiceKind::Status;
        let resp = self
            .send(service, self.http.get(&self.endpoints.status_url))
            .await?;
        self.decode(service, resp).await
    }
}

/// Pulls a human-readable message out of an error body.
///
/// Tries `detail` (FastAPI), then `message`, then `error`, then the raw text.
pub fn extract_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(trimmed)
    {
        for key in ["detail", "message", "error"] {
            match map.get(key) {
                Some(serde_json::Value::String(s)) if !s.trim().is_empty() => {
                    return Some(s.trim().to_string());
                }
                Some(serde_json::Value::Null) | None => {}
                Some(serde_json::Value::String(_)) => {}
                Some(other) => return Some(other.to_string()),
            }
        }
    }

    Some(trimmed.to_string())
}
