use serde::{Deserialize, Serialize};

/// OCR output. `message` explains an empty `text` when the service sends one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ExtractedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            message: None,
        }
    }
}

/// A named entity found in the query text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Surface form as it appears in the text.
    pub word: String,
    #[serde(
        default,
        alias = "entity_group",
        alias = "label",
        skip_serializing_if = "Option::is_none"
    )]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Entity {
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            entity_type: None,
            score: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct EntitiesResponse {
    #[serde(default)]
    pub entities: Vec<Entity>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnalysisRequest<'a> {
    pub input_news: &'a str,
    pub comparison_news: &'a str,
}

/// Backend status report (`{"status": "UP", "message": "..."}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl ServiceStatus {
    pub fn is_up(&self) -> bool {
        self.status.eq_ignore_ascii_case("up") || self.status.eq_ignore_ascii_case("ok")
    }
}
