//! Intent assembly: matched action + extracted parameters + caller context

use crate::error::{ParseError, Result};
use crate::matcher::ActionMatch;
use crate::parameters::merge_context;
use crate::types::{CommandContext, ParsedIntent, Parameters};

/// Combine a matched action with its parameters into a [`ParsedIntent`].
///
/// Parameters outside the action's schema are dropped. Context only fills
/// gaps and never overrides an extracted value. Fails when no action matched.
pub fn assemble(
    matched: Option<ActionMatch>,
    parameters: Parameters,
    context: Option<&CommandContext>,
    original_text: &str,
) -> Result<ParsedIntent> {
    let matched =
        matched.ok_or_else(|| ParseError::UnrecognizedCommand(original_text.to_string()))?;
    let spec = matched.spec;

    let mut parameters = parameters;
    if let Some(context) = context {
        merge_context(&mut parameters, context);
    }
    parameters.retain(|name, _| spec.accepts(name));

    Ok(ParsedIntent::new(
        spec.action,
        parameters,
        matched.confidence,
        original_text,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::find_action;
    use serde_json::json;

    fn matched(action: &str, confidence: f32) -> Option<ActionMatch> {
        Some(ActionMatch {
            spec: find_action(action).unwrap(),
            confidence,
            pattern: "",
        })
    }

    #[test]
    fn test_missing_action_is_an_error() {
        let err = assemble(None, Parameters::new(), None, "こんにちは").unwrap_err();
        assert!(err.is_unparseable());
        assert!(matches!(err, ParseError::UnrecognizedCommand(ref t) if t == "こんにちは"));
    }

    #[test]
    fn test_parameters_outside_schema_are_dropped() {
        let mut params = Parameters::new();
        params.insert("distance".to_string(), json!(200));
        params.insert("direction".to_string(), json!("forward"));
        params.insert("angle".to_string(), json!(90));

        let intent = assemble(matched("move", 0.95), params, None, "前に2m移動").unwrap();
        assert_eq!(intent.action, "move");
        assert_eq!(intent.parameters.len(), 2);
        assert!(!intent.has_parameter("angle"));
        assert!((intent.confidence - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_context_fills_gaps_but_never_overrides() {
        let mut params = Parameters::new();
        params.insert("direction".to_string(), json!("forward"));

        let mut context = CommandContext::new();
        context.insert("direction".to_string(), json!("back"));
        context.insert("distance".to_string(), json!(100));
        context.insert("drone_id".to_string(), json!("drone-02"));
        context.insert("operator".to_string(), json!("alice"));

        let intent = assemble(matched("move", 0.9), params, Some(&context), "前に移動").unwrap();
        assert_eq!(intent.text("direction"), Some("forward"));
        assert_eq!(intent.number("distance"), Some(100.0));
        assert_eq!(intent.text("drone_id"), Some("drone-02"));
        assert!(!intent.has_parameter("operator"));
    }
}
