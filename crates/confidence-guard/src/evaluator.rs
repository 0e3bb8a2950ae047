//! Confidence evaluator
//!
//! Scores a [`ParsedIntent`] along three dimensions (action, parameters,
//! completeness), raises quality flags, lists risk factors and builds
//! corrective suggestions. Nothing here fails: incomplete, invalid or
//! unknown intents are represented in the evaluation itself.

use crate::error::Result;
use crate::gate;
use crate::rules::{RuleEngine, Validity};
use crate::suggest;
use crate::thresholds::ConfidenceThresholds;
use crate::types::{ConfidenceEvaluation, QualityIndicators};
use crate::GuardConfig;
use command_parser::{find_action, ParameterExtractor, ParsedIntent};
use std::sync::Arc;

/// Action confidence cap for actions missing from the action table
pub const UNKNOWN_ACTION_CONFIDENCE: f32 = 0.3;
/// Credit for a required parameter that is present but invalid
pub const INVALID_PARAMETER_CREDIT: f32 = 0.4;
/// Parameter confidence of an action that requires nothing
pub const NO_REQUIRED_PARAMETER_BASELINE: f32 = 0.8;
/// Added per valid optional parameter when nothing is required
pub const OPTIONAL_PARAMETER_CREDIT: f32 = 0.05;
/// Completeness of an action that requires nothing
pub const NO_REQUIRED_COMPLETENESS: f32 = 0.9;
/// Completeness bonus when the target drone is identified
pub const DRONE_ID_BONUS: f32 = 0.05;

const CONFLICT_FACTOR: f32 = 0.6;
const AMBIGUITY_FACTOR: f32 = 0.85;
const UNKNOWN_ACTION_FACTOR: f32 = 0.5;

/// Vague quantity markers
const VAGUE_TERMS: &[&str] = &[
    "ちょっと",
    "ちょい",
    "なんか",
    "何か",
    "少し",
    "少々",
    "適当",
    "いい感じ",
    "a bit",
    "a little",
    "somewhat",
];

/// Parameters that carry a concrete quantity
const NUMERIC_PARAMETERS: &[&str] = &["distance", "angle", "height"];

/// Evaluates parsed intents against the confidence thresholds
pub struct ConfidenceEvaluator {
    rules: RuleEngine,
    extractor: ParameterExtractor,
    thresholds: Arc<ConfidenceThresholds>,
    max_suggestions: usize,
}

impl ConfidenceEvaluator {
    pub fn new(config: &GuardConfig) -> Result<Self> {
        let thresholds =
            ConfidenceThresholds::new(config.confidence_threshold, config.safety_threshold);
        Self::with_thresholds(Arc::new(thresholds), config.max_suggestions)
    }

    /// Share a thresholds holder with other components
    pub fn with_thresholds(
        thresholds: Arc<ConfidenceThresholds>,
        max_suggestions: usize,
    ) -> Result<Self> {
        Ok(Self {
            rules: RuleEngine::new()?,
            extractor: ParameterExtractor::new()?,
            thresholds,
            max_suggestions,
        })
    }

    pub fn thresholds(&self) -> &Arc<ConfidenceThresholds> {
        &self.thresholds
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.thresholds.confidence_threshold()
    }

    pub fn set_confidence_threshold(&self, value: f32) -> f32 {
        self.thresholds.set_confidence_threshold(value)
    }

    /// Gate an evaluation at the currently configured threshold
    pub fn is_executable(&self, evaluation: &ConfidenceEvaluation) -> bool {
        let threshold = self.thresholds.confidence_threshold();
        let refusals = gate::refusals(evaluation, threshold);
        if !refusals.is_empty() {
            tracing::warn!(?refusals, threshold, "command not executable");
        }
        refusals.is_empty()
    }

    /// Evaluate an intent parsed from `original_text`
    pub fn evaluate(&self, intent: &ParsedIntent, original_text: &str) -> ConfidenceEvaluation {
        let spec = find_action(&intent.action);
        let required: &[&str] = spec.map(|s| s.required_parameters).unwrap_or(&[]);

        // Validate every supplied parameter once, in a stable order
        let mut names: Vec<&String> = intent.parameters.keys().collect();
        names.sort();
        let checks: Vec<(&str, Validity)> = names
            .into_iter()
            .map(|name| {
                let validity = self.rules.check(&intent.action, name, &intent.parameters[name]);
                (name.as_str(), validity)
            })
            .collect();
        let validity_of = |name: &str| checks.iter().find(|(n, _)| *n == name).map(|(_, v)| v);

        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|p| !intent.has_parameter(p))
            .collect();

        // Action
        let mut action_confidence = intent.confidence.clamp(0.0, 1.0);
        if spec.is_none() {
            action_confidence = action_confidence.min(UNKNOWN_ACTION_CONFIDENCE);
        }

        // Parameters
        let parameter_confidence = if required.is_empty() {
            let valid = checks.iter().filter(|(_, v)| v.is_valid()).count();
            (NO_REQUIRED_PARAMETER_BASELINE + OPTIONAL_PARAMETER_CREDIT * valid as f32).min(1.0)
        } else {
            let total: f32 = required
                .iter()
                .map(|p| match validity_of(*p) {
                    Some(Validity::Valid) => 1.0,
                    Some(Validity::Invalid(_)) => INVALID_PARAMETER_CREDIT,
                    None => 0.0,
                })
                .sum();
            total / required.len() as f32
        };

        // Completeness
        let mut completeness_score = if required.is_empty() {
            NO_REQUIRED_COMPLETENESS
        } else {
            (required.len() - missing.len()) as f32 / required.len() as f32
        };
        if intent.has_parameter("drone_id") {
            completeness_score = (completeness_score + DRONE_ID_BONUS).min(1.0);
        }

        // Quality flags
        let vague_term = VAGUE_TERMS.iter().copied().find(|t| original_text.contains(t));
        let has_numeric = NUMERIC_PARAMETERS.iter().any(|p| intent.number(p).is_some());
        let quality_indicators = QualityIndicators {
            has_all_required_params: missing.is_empty(),
            has_conflicting_params: self.extractor.has_conflicting_directions(original_text),
            has_ambiguous_terms: vague_term.is_some() && !has_numeric,
        };

        // Overall
        let mut overall_confidence =
            (action_confidence + parameter_confidence + completeness_score) / 3.0;
        if quality_indicators.has_conflicting_params {
            overall_confidence *= CONFLICT_FACTOR;
        }
        if quality_indicators.has_ambiguous_terms {
            overall_confidence *= AMBIGUITY_FACTOR;
        }
        if spec.is_none() {
            overall_confidence *= UNKNOWN_ACTION_FACTOR;
        }
        let overall_confidence = overall_confidence.clamp(0.0, 1.0);

        // Risk factors
        let threshold = self.thresholds.confidence_threshold();
        let safety_threshold = self.thresholds.safety_threshold();
        let mut risk_factors = Vec::new();
        if spec.is_none() {
            risk_factors.push(format!("未知のアクションです: {}", intent.action));
        }
        if overall_confidence < threshold {
            risk_factors.push(format!(
                "低信頼度: 全体の信頼度 {:.2} が閾値 {:.2} を下回っています",
                overall_confidence, threshold
            ));
        }
        if spec.map(|s| s.is_critical()).unwrap_or(false) && overall_confidence < safety_threshold {
            risk_factors.push(format!(
                "安全に関わる操作 ({}) です: 信頼度 {:.2} が安全基準 {:.2} に達していません",
                intent.action, overall_confidence, safety_threshold
            ));
        }
        if quality_indicators.has_conflicting_params {
            risk_factors.push("矛盾するパラメータが含まれています".to_string());
        }
        if !missing.is_empty() {
            risk_factors.push(format!("必須パラメータが不足しています: {}", missing.join(", ")));
        }
        for (name, validity) in &checks {
            if let Validity::Invalid(reason) = validity {
                risk_factors.push(format!("不正なパラメータ値: {} ({})", name, reason));
            }
        }
        if quality_indicators.has_ambiguous_terms {
            risk_factors.push("曖昧な表現が含まれています".to_string());
        }
        dedup_in_order(&mut risk_factors);

        // Suggestions
        let mut suggestions = Vec::new();
        for parameter in &missing {
            suggestions.push(suggest::missing_parameter(&intent.action, parameter));
        }
        for (name, validity) in &checks {
            if let Validity::Invalid(reason) = validity {
                suggestions.push(suggest::invalid_parameter(&intent.action, name, reason));
            }
        }
        if let (true, Some(term)) = (quality_indicators.has_ambiguous_terms, vague_term) {
            suggestions.push(suggest::vague_term(term));
        }
        if spec.is_none() {
            suggestions.push(suggest::state_action());
        }
        if overall_confidence < threshold {
            suggestions.push(suggest::rephrase());
        }
        let suggestions = suggest::rank(suggestions, self.max_suggestions);

        tracing::debug!(
            id = %intent.id(),
            action = %intent.action,
            overall_confidence,
            action_confidence,
            parameter_confidence,
            completeness_score,
            risks = risk_factors.len(),
            "evaluated intent"
        );

        ConfidenceEvaluation {
            overall_confidence,
            action_confidence,
            parameter_confidence,
            completeness_score,
            quality_indicators,
            risk_factors,
            suggestions,
        }
    }
}

fn dedup_in_order(items: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
}
