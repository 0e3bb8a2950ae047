use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use time::OffsetDateTime;
use uuid::Uuid;

/// Parameter values keyed by parameter name (`distance`, `direction`, ...)
pub type Parameters = HashMap<String, serde_json::Value>;

/// Caller-supplied fields that may fill gaps the extractor left open
pub type CommandContext = HashMap<String, serde_json::Value>;

/// A single token produced by the morphological tokenizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub surface: String,
    pub base: String,
}

impl Token {
    pub fn new(surface: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            surface: surface.into(),
            base: base.into(),
        }
    }
}

/// Structured interpretation of one operator utterance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedIntent {
    /// Canonical action identifier (`takeoff`, `move`, ...)
    pub action: String,
    /// Canonical parameter values (cm, degrees, enum strings)
    pub parameters: Parameters,
    /// Action-match confidence before evaluation, in [0, 1]
    pub confidence: f32,
    id: Uuid,
    original_command: String,
    parsed_at: OffsetDateTime,
}

impl ParsedIntent {
    pub fn new(
        action: impl Into<String>,
        parameters: Parameters,
        confidence: f32,
        original_command: impl Into<String>,
    ) -> Self {
        Self {
            action: action.into(),
            parameters,
            confidence: confidence.clamp(0.0, 1.0),
            id: Uuid::new_v4(),
            original_command: original_command.into(),
            parsed_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn original_command(&self) -> &str {
        &self.original_command
    }

    pub fn parsed_at(&self) -> OffsetDateTime {
        self.parsed_at
    }

    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    /// Numeric value of a parameter, if present and numeric
    pub fn number(&self, name: &str) -> Option<f64> {
        self.parameters.get(name).and_then(|v| v.as_f64())
    }

    /// String value of a parameter, if present and a string
    pub fn text(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).and_then(|v| v.as_str())
    }
}
