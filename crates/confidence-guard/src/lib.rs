//! confidence-guard: confidence and risk evaluation for parsed drone commands
//!
//! This crate judges a [`command_parser::ParsedIntent`] before anything is
//! allowed to fly:
//! - [`ConfidenceEvaluator`] scores action, parameters and completeness
//! - [`RuleEngine`] validates parameter values against range expressions
//! - [`is_executable`] gates an evaluation against a threshold
//! - [`CorrectionSuggester`] tells the operator how to fix a command

mod error;
pub use error::{GuardError, Result};

mod types;
pub use types::{CommandSuggestion, ConfidenceEvaluation, QualityIndicators};

pub mod thresholds;
pub use thresholds::{ConfidenceThresholds, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_SAFETY_THRESHOLD};

pub mod rules;
pub use rules::{
    allowed_values, parameter_hint, ParameterRule, RuleEngine, Validity, PARAMETER_RULES,
};

mod gate;
pub use gate::{is_executable, refusals, Refusal};

mod evaluator;
pub use evaluator::ConfidenceEvaluator;

mod suggest;
pub use suggest::CorrectionSuggester;

use serde::{Deserialize, Serialize};

/// Default number of suggestions attached to an evaluation
pub const DEFAULT_MAX_SUGGESTIONS: usize = 5;

/// Evaluator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardConfig {
    /// General execution threshold, in [0, 1]
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
    /// Bar for critical actions (takeoff, land, emergency stop)
    #[serde(default = "default_safety_threshold")]
    pub safety_threshold: f32,
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

fn default_confidence_threshold() -> f32 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

fn default_safety_threshold() -> f32 {
    DEFAULT_SAFETY_THRESHOLD
}

fn default_max_suggestions() -> usize {
    DEFAULT_MAX_SUGGESTIONS
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            safety_threshold: DEFAULT_SAFETY_THRESHOLD,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
        }
    }
}

/// Initialize the confidence guard
pub fn init() {
    tracing::info!(rules = PARAMETER_RULES.len(), "initializing confidence guard");
}

/// Create an evaluator from `config`
pub fn create_default_evaluator(config: &GuardConfig) -> Result<ConfidenceEvaluator> {
    init();
    tracing::info!(
        confidence_threshold = config.confidence_threshold,
        safety_threshold = config.safety_threshold,
        "creating confidence evaluator"
    );
    ConfidenceEvaluator::new(config)
}
