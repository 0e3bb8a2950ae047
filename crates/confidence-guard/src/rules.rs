//! Parameter validation rules
//!
//! Numeric ranges are boolean expressions over `value`, compiled once and
//! evaluated per check. Enum parameters are checked against the canonical
//! values the action accepts.

use crate::error::{GuardError, Result};
use command_parser::{find_parameter, ParameterKind};
use evalexpr::{build_operator_tree, ContextWithMutableVariables, HashMapContext, Node, Value};

/// Range rule for a numeric parameter (canonical units)
#[derive(Debug, Clone, Copy)]
pub struct ParameterRule {
    pub parameter: &'static str,
    pub expression: &'static str,
    pub description: &'static str,
}

pub const PARAMETER_RULES: &[ParameterRule] = &[
    ParameterRule {
        parameter: "distance",
        expression: "value > 0.0 && value <= 10000.0",
        description: "0cmより大きく100m以下",
    },
    ParameterRule {
        parameter: "height",
        expression: "value > 0.0 && value <= 5000.0",
        description: "0cmより大きく50m以下",
    },
    ParameterRule {
        parameter: "angle",
        expression: "value > 0.0 && value <= 360.0",
        description: "0度より大きく360度以下",
    },
];

const MOVE_DIRECTIONS: &[&str] = &["forward", "back", "left", "right", "up", "down"];
const ROTATE_DIRECTIONS: &[&str] = &["clockwise", "counterclockwise", "left", "right"];
const ALTITUDE_DIRECTIONS: &[&str] = &["up", "down"];
const QUALITIES: &[&str] = &["low", "medium", "high"];

/// Canonical values an enum parameter may take for an action
pub fn allowed_values(action: &str, parameter: &str) -> Option<&'static [&'static str]> {
    match (action, parameter) {
        ("rotate", "direction") => Some(ROTATE_DIRECTIONS),
        ("altitude", "direction") => Some(ALTITUDE_DIRECTIONS),
        (_, "direction") => Some(MOVE_DIRECTIONS),
        (_, "quality") => Some(QUALITIES),
        _ => None,
    }
}

/// Operator-facing hint naming a parameter with an example value
pub fn parameter_hint(action: &str, parameter: &str) -> String {
    match (action, parameter) {
        ("rotate", "direction") => {
            "direction: clockwise/counterclockwise を指定してください".to_string()
        }
        ("altitude", "direction") => "direction: up/down を指定してください".to_string(),
        (_, "direction") => "direction: forward/back/left/right を指定してください".to_string(),
        (_, "distance") => "distance: 距離を指定してください（例: 2m, 50cm）".to_string(),
        (_, "angle") => "angle: 角度を指定してください（例: 90度）".to_string(),
        (_, "height") => "height: 高さを指定してください（例: 高さ1m）".to_string(),
        (_, "quality") => "quality: low/medium/high を指定してください".to_string(),
        (_, "filename") => "filename: ファイル名を指定してください（例: photo_01.jpg）".to_string(),
        (_, "drone_id") => "drone_id: ドローンIDを指定してください（例: drone-01）".to_string(),
        (_, other) => format!("{}: 値を指定してください", other),
    }
}

/// Outcome of validating one parameter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validity {
    Valid,
    Invalid(String),
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validity::Valid)
    }
}

struct CompiledRule {
    rule: &'static ParameterRule,
    node: Node,
}

/// Validates parameter values against their type and range rules
pub struct RuleEngine {
    rules: Vec<CompiledRule>,
}

impl RuleEngine {
    /// Compile the built-in rule table
    pub fn new() -> Result<Self> {
        let mut rules = Vec::with_capacity(PARAMETER_RULES.len());
        for rule in PARAMETER_RULES {
            rules.push(compile(rule)?);
        }
        Ok(Self { rules })
    }

    /// Validate `value` as parameter `parameter` of `action`
    pub fn check(&self, action: &str, parameter: &str, value: &serde_json::Value) -> Validity {
        if value.is_null() {
            return Validity::Invalid("値が空です".to_string());
        }

        let Some(spec) = find_parameter(parameter) else {
            return Validity::Valid;
        };

        match spec.kind {
            ParameterKind::Number => match value.as_f64() {
                Some(number) => self.check_range(parameter, number),
                None => Validity::Invalid(format!("数値ではありません: {}", value)),
            },
            ParameterKind::Enum => match value.as_str() {
                Some(text) => match allowed_values(action, parameter) {
                    Some(allowed) if !allowed.contains(&text) => {
                        Validity::Invalid(format!("未対応の値です: {}", text))
                    }
                    _ => Validity::Valid,
                },
                None => Validity::Invalid(format!("文字列ではありません: {}", value)),
            },
            ParameterKind::Text => match value {
                serde_json::Value::String(s) if s.trim().is_empty() => {
                    Validity::Invalid("値が空です".to_string())
                }
                serde_json::Value::String(_) | serde_json::Value::Number(_) => Validity::Valid,
                other => Validity::Invalid(format!("文字列ではありません: {}", other)),
            },
        }
    }

    fn check_range(&self, parameter: &str, number: f64) -> Validity {
        let Some(compiled) = self.rules.iter().find(|r| r.rule.parameter == parameter) else {
            return Validity::Valid;
        };

        let mut context = HashMapContext::new();
        if let Err(e) = context.set_value("value".to_string(), Value::Float(number)) {
            tracing::error!("Failed to bind value for rule '{}': {}", parameter, e);
            return Validity::Invalid(e.to_string());
        }

        match compiled.node.eval_boolean_with_context(&context) {
            Ok(true) => Validity::Valid,
            Ok(false) => Validity::Invalid(format!(
                "{} は範囲外です（{}）",
                number, compiled.rule.description
            )),
            Err(e) => {
                tracing::error!("Failed to evaluate rule '{}': {}", parameter, e);
                Validity::Invalid(e.to_string())
            }
        }
    }
}

fn compile(rule: &'static ParameterRule) -> Result<CompiledRule> {
    let to_error = |e: evalexpr::EvalexprError| GuardError::Rule {
        name: rule.parameter.to_string(),
        message: e.to_string(),
    };

    let node = build_operator_tree(rule.expression).map_err(to_error)?;

    // The rule must yield a boolean for a representative value
    let mut probe = HashMapContext::new();
    probe
        .set_value("value".to_string(), Value::Float(1.0))
        .map_err(to_error)?;
    node.eval_boolean_with_context(&probe).map_err(to_error)?;

    Ok(CompiledRule { rule, node })
}
