//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `GUARDIAN_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::time::Duration;

use reqwest::Url;

use crate::constants::{
    DEFAULT_ANALYSIS_URL, DEFAULT_FANOUT_LIMIT, DEFAULT_MAX_IMAGE_BYTES, DEFAULT_NER_URL,
    DEFAULT_OCR_URL, DEFAULT_REQUEST_TIMEOUT, DEFAULT_SEARCH_URL, DEFAULT_STATUS_URL,
};

/// Collaborator endpoints.
///
/// One workflow serves every deployment; only these URLs differ between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Image-to-text service (multipart upload).
    pub ocr_url: String,
    /// Entity-extraction service.
    pub ner_url: String,
    /// Similar-article search service.
    pub search_url: String,
    /// Pairwise fact-comparison service.
    pub analysis_url: String,
    /// Backend status probe.
    pub status_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            ocr_url: DEFAULT_OCR_URL.to_string(),
            ner_url: DEFAULT_NER_URL.to_string(),
            search_url: DEFAULT_SEARCH_URL.to_string(),
            analysis_url: DEFAULT_ANALYSIS_URL.to_string(),
            status_url: DEFAULT_STATUS_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Points every collaborator at the same base URL using the default paths.
    ///
    /// Handy for tests and single-gateway deployments.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            ocr_url: format!("{base}/img/convert"),
            ner_url: format!("{base}/entities"),
            search_url: format!("{base}/api/similar"),
            analysis_url: format!("{base}/analyze"),
            status_url: format!("{base}/status"),
        }
    }
}

/// Orchestrator configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `GUARDIAN_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Collaborator URLs.
    pub endpoints: Endpoints,

    /// Timeout applied to each outbound call. Default: 15s.
    pub request_timeout: Duration,

    /// Max concurrent comparison calls during fan-out. Default: `16`.
    pub fanout_limit: usize,

    /// Largest image accepted for OCR upload. Default: 10 MiB.
    pub max_image_bytes: u64,

    /// Refine queries through entity extraction before searching. Default: `false`.
    pub entity_refinement: bool,

    /// Bearer credential attached by the surrounding shell, if any.
    pub bearer_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            fanout_limit: DEFAULT_FANOUT_LIMIT,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            entity_refinement: false,
            bearer_token: None,
        }
    }
}

impl Config {
    const ENV_OCR_URL: &'static str = "GUARDIAN_OCR_URL";
    const ENV_NER_URL: &'static str = "GUARDIAN_NER_URL";
    const ENV_SEARCH_URL: &'static str = "GUARDIAN_SEARCH_URL";
    const ENV_ANALYSIS_URL: &'static str = "GUARDIAN_ANALYSIS_URL";
    const ENV_STATUS_URL: &'static str = "GUARDIAN_STATUS_URL";
    const ENV_REQUEST_TIMEOUT_SECS: &'static str = "GUARDIAN_REQUEST_TIMEOUT_SECS";
    const ENV_FANOUT_LIMIT: &'static str = "GUARDIAN_FANOUT_LIMIT";
    const ENV_MAX_IMAGE_BYTES: &'static str = "GUARDIAN_MAX_IMAGE_BYTES";
    const ENV_ENTITY_REFINEMENT: &'static str = "GUARDIAN_ENTITY_REFINEMENT";
    const ENV_BEARER_TOKEN: &'static str = "GUARDIAN_BEARER_TOKEN";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let d = defaults.endpoints;

        let endpoints = Endpoints {
            ocr_url: Self::parse_string_from_env(Self::ENV_OCR_URL, d.ocr_url),
            ner_url: Self::parse_string_from_env(Self::ENV_NER_URL, d.ner_url),
            search_url: Self::parse_string_from_env(Self::ENV_SEARCH_URL, d.search_url),
            analysis_url: Self::parse_string_from_env(Self::ENV_ANALYSIS_URL, d.analysis_url),
            status_url: Self::parse_string_from_env(Self::ENV_STATUS_URL, d.status_url),
        };

        let request_timeout = Self::parse_u64_from_env(
            Self::ENV_REQUEST_TIMEOUT_SECS,
            defaults.request_timeout.as_secs(),
        )
        .map(Duration::from_secs)?;
        let fanout_limit =
            Self::parse_u64_from_env(Self::ENV_FANOUT_LIMIT, defaults.fanout_limit as u64)?
                as usize;
        let max_image_bytes =
            Self::parse_u64_from_env(Self::ENV_MAX_IMAGE_BYTES, defaults.max_image_bytes)?;
        let entity_refinement =
            Self::parse_bool_from_env(Self::ENV_ENTITY_REFINEMENT, defaults.entity_refinement)?;
        let bearer_token = Self::parse_optional_string_from_env(Self::ENV_BEARER_TOKEN);

        Ok(Self {
            endpoints,
            request_timeout,
            fanout_limit,
            max_image_bytes,
            entity_refinement,
            bearer_token,
        })
    }

    /// Validates URLs and numeric invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let e = &self.endpoints;
        for (name, value) in [
            (Self::ENV_OCR_URL, &e.ocr_url),
            (Self::ENV_NER_URL, &e.ner_url),
            (Self::ENV_SEARCH_URL, &e.search_url),
            (Self::ENV_ANALYSIS_URL, &e.analysis_url),
            (Self::ENV_STATUS_URL, &e.status_url),
        ] {
            Self::validate_url(name, value)?;
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::MustBePositive {
                name: Self::ENV_REQUEST_TIMEOUT_SECS,
            });
        }
        if self.fanout_limit == 0 {
            return Err(ConfigError::MustBePositive {
                name: Self::ENV_FANOUT_LIMIT,
            });
        }
        if self.max_image_bytes == 0 {
            return Err(ConfigError::MustBePositive {
                name: Self::ENV_MAX_IMAGE_BYTES,
            });
        }

        Ok(())
    }

    fn validate_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
        let url = Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
            name,
            value: value.to_string(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ConfigError::UnsupportedScheme {
                name,
                scheme: other.to_string(),
            }),
        }
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_u64_from_env(var_name: &'static str, default: u64) -> Result<u64, ConfigError> {
        match env::var(var_name) {
            Ok(value) => match value.trim().parse::<u64>() {
                Ok(parsed) => Ok(parsed),
                Err(e) => Err(ConfigError::NumberParseError {
                    name: var_name,
                    value,
                    source: e,
                }),
            },
            Err(_) => Ok(default),
        }
    }

    fn parse_bool_from_env(var_name: &'static str, default: bool) -> Result<bool, ConfigError> {
        match env::var(var_name) {
            Ok(value) => match value.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(true),
                "false" | "0" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidBool {
                    name: var_name,
                    value,
                }),
            },
            Err(_) => Ok(default),
        }
    }
}
