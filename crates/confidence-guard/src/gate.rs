//! Executability gate

use crate::thresholds::DEFAULT_CONFIDENCE_THRESHOLD;
use crate::types::ConfidenceEvaluation;
use serde::{Deserialize, Serialize};

/// Why the gate refused an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Refusal {
    LowConfidence,
    MissingParameters,
    ConflictingParameters,
}

impl std::fmt::Display for Refusal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Refusal::LowConfidence => write!(f, "confidence below threshold"),
            Refusal::MissingParameters => write!(f, "required parameters missing"),
            Refusal::ConflictingParameters => write!(f, "conflicting parameters"),
        }
    }
}

/// Every reason the evaluation fails the gate at `threshold` (empty = executable)
pub fn refusals(evaluation: &ConfidenceEvaluation, threshold: f32) -> Vec<Refusal> {
    let threshold = if threshold.is_nan() {
        DEFAULT_CONFIDENCE_THRESHOLD
    } else {
        threshold.clamp(0.0, 1.0)
    };
    let quality = &evaluation.quality_indicators;

    // NaN confidence compares false and is refused
    let confident = evaluation.overall_confidence >= threshold;

    let mut out = Vec::new();
    if !confident {
        out.push(Refusal::LowConfidence);
    }
    if !quality.has_all_required_params {
        out.push(Refusal::MissingParameters);
    }
    if quality.has_conflicting_params {
        out.push(Refusal::ConflictingParameters);
    }
    out
}

/// True iff confidence clears `threshold`, all required parameters are
/// present and nothing conflicts. Confidence alone never suffices.
pub fn is_executable(evaluation: &ConfidenceEvaluation, threshold: f32) -> bool {
    refusals(evaluation, threshold).is_empty()
}
