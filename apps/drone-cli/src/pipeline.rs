//! Text -> intent -> evaluation -> gate -> actuator

use crate::actuator::{DroneActuator, DroneCommand, ExecutionReport};
use anyhow::Result;
use command_parser::{CommandContext, CommandParser, ParsedIntent};
use confidence_guard::{
    refusals, CommandSuggestion, ConfidenceEvaluation, ConfidenceEvaluator, CorrectionSuggester,
    Refusal,
};
use serde::Serialize;
use std::sync::Arc;

/// What happened to one utterance
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// No intent could be built
    Unparseable {
        error: String,
        suggestions: Vec<CommandSuggestion>,
    },
    /// Parsed and evaluated, then held back by the gate
    Refused {
        intent: ParsedIntent,
        evaluation: ConfidenceEvaluation,
        refusals: Vec<Refusal>,
    },
    /// Passed the gate (and ran, when an actuator is attached)
    Approved {
        intent: ParsedIntent,
        evaluation: ConfidenceEvaluation,
        report: Option<ExecutionReport>,
    },
}

impl Outcome {
    pub fn is_approved(&self) -> bool {
        matches!(self, Outcome::Approved { .. })
    }
}

pub struct Pipeline {
    parser: CommandParser,
    evaluator: ConfidenceEvaluator,
    suggester: CorrectionSuggester,
    actuator: Option<Arc<dyn DroneActuator>>,
}

impl Pipeline {
    pub fn new(parser: CommandParser, evaluator: ConfidenceEvaluator) -> Result<Self> {
        Ok(Self {
            parser,
            evaluator,
            suggester: CorrectionSuggester::new()?,
            actuator: None,
        })
    }

    pub fn with_actuator(mut self, actuator: Arc<dyn DroneActuator>) -> Self {
        self.actuator = Some(actuator);
        self
    }

    pub fn parser(&self) -> &CommandParser {
        &self.parser
    }

    pub fn evaluator(&self) -> &ConfidenceEvaluator {
        &self.evaluator
    }

    pub fn suggest(&self, text: &str) -> Vec<CommandSuggestion> {
        self.suggester.suggest_corrections(text)
    }

    /// Parse and evaluate, forwarding to the actuator only when the gate passes
    pub async fn process(&self, text: &str, context: Option<&CommandContext>) -> Result<Outcome> {
        let intent = match self.parser.parse_command(text, context).await {
            Ok(intent) => intent,
            Err(e) if e.is_unparseable() => {
                tracing::warn!(error = %e, "unparseable command");
                return Ok(Outcome::Unparseable {
                    error: e.to_string(),
                    suggestions: self.suggester.suggest_corrections(text),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let evaluation = self.evaluator.evaluate(&intent, text);
        let refused = refusals(&evaluation, self.evaluator.confidence_threshold());
        if !refused.is_empty() {
            tracing::warn!(id = %intent.id(), refusals = ?refused, "command refused");
            return Ok(Outcome::Refused {
                intent,
                evaluation,
                refusals: refused,
            });
        }

        let report = match &self.actuator {
            Some(actuator) => {
                tracing::info!(
                    id = %intent.id(),
                    action = %intent.action,
                    actuator = actuator.name(),
                    "executing"
                );
                Some(actuator.execute(&DroneCommand::from(&intent)).await?)
            }
            None => None,
        };

        Ok(Outcome::Approved {
            intent,
            evaluation,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::SimulatedDrone;
    use confidence_guard::GuardConfig;

    fn pipeline() -> (Pipeline, Arc<SimulatedDrone>) {
        let drone = Arc::new(SimulatedDrone::new());
        let pipeline = Pipeline::new(
            CommandParser::new().unwrap(),
            ConfidenceEvaluator::new(&GuardConfig::default()).unwrap(),
        )
        .unwrap()
        .with_actuator(drone.clone());
        (pipeline, drone)
    }

    #[tokio::test]
    async fn test_approved_commands_reach_the_actuator() {
        let (pipeline, drone) = pipeline();

        let outcome = pipeline.process("離陸してください", None).await.unwrap();
        assert!(outcome.is_approved());
        let outcome = pipeline.process("前に2m移動", None).await.unwrap();
        match outcome {
            Outcome::Approved { report: Some(report), .. } => assert!(report.success),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(drone.state().await.y, 200.0);
    }

    #[tokio::test]
    async fn test_refused_commands_never_reach_the_actuator() {
        let (pipeline, drone) = pipeline();
        pipeline.process("離陸して", None).await.unwrap();

        let outcome = pipeline.process("移動してください", None).await.unwrap();
        match outcome {
            Outcome::Refused { refusals, .. } => {
                assert!(refusals.contains(&Refusal::MissingParameters))
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        let state = drone.state().await;
        assert_eq!((state.x, state.y), (0.0, 0.0));
    }

    #[tokio::test]
    async fn test_unparseable_carries_suggestions() {
        let (pipeline, _) = pipeline();
        match pipeline.process("こんにちは", None).await.unwrap() {
            Outcome::Unparseable { suggestions, .. } => assert!(!suggestions.is_empty()),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_without_actuator() {
        let pipeline = Pipeline::new(
            CommandParser::new().unwrap(),
            ConfidenceEvaluator::new(&GuardConfig::default()).unwrap(),
        )
        .unwrap();
        match pipeline.process("状態を教えて", None).await.unwrap() {
            Outcome::Approved { report, .. } => assert!(report.is_none()),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
