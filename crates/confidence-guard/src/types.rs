use serde::{Deserialize, Serialize};

/// A corrective hint for the operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSuggestion {
    pub suggestion: String,
    pub reason: String,
    pub confidence: f32,
}

impl CommandSuggestion {
    pub fn new(suggestion: impl Into<String>, reason: impl Into<String>, confidence: f32) -> Self {
        Self {
            suggestion: suggestion.into(),
            reason: reason.into(),
            confidence,
        }
    }
}

/// Boolean quality flags of an evaluated intent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityIndicators {
    pub has_all_required_params: bool,
    pub has_conflicting_params: bool,
    pub has_ambiguous_terms: bool,
}

/// Result of evaluating one parsed intent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceEvaluation {
    pub overall_confidence: f32,
    pub action_confidence: f32,
    pub parameter_confidence: f32,
    pub completeness_score: f32,
    pub quality_indicators: QualityIndicators,
    /// Human-readable, deduplicated, in detection order
    pub risk_factors: Vec<String>,
    pub suggestions: Vec<CommandSuggestion>,
}

impl ConfidenceEvaluation {
    /// Whether any risk factor contains `needle`
    pub fn has_risk(&self, needle: &str) -> bool {
        self.risk_factors.iter().any(|r| r.contains(needle))
    }
}
