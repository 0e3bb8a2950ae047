//! Correction suggestions for incomplete or unrecognized commands

use crate::error::Result;
use crate::rules::parameter_hint;
use crate::types::CommandSuggestion;
use command_parser::{ActionMatcher, ParameterExtractor};

/// Sort by confidence (highest first, stable) and cap the list length
pub(crate) fn rank(
    mut suggestions: Vec<CommandSuggestion>,
    limit: usize,
) -> Vec<CommandSuggestion> {
    suggestions.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    suggestions.truncate(limit);
    suggestions
}

pub(crate) fn missing_parameter(action: &str, parameter: &str) -> CommandSuggestion {
    CommandSuggestion::new(
        parameter_hint(action, parameter),
        format!("{} には {} が必要です", action, parameter),
        0.9,
    )
}

pub(crate) fn invalid_parameter(action: &str, parameter: &str, reason: &str) -> CommandSuggestion {
    CommandSuggestion::new(
        parameter_hint(action, parameter),
        format!("{} の値が不正です: {}", parameter, reason),
        0.8,
    )
}

pub(crate) fn vague_term(term: &str) -> CommandSuggestion {
    CommandSuggestion::new(
        format!("「{}」ではなく具体的な数値を指定してください（例: 50cm, 30度）", term),
        "曖昧な表現が含まれています",
        0.7,
    )
}

pub(crate) fn rephrase() -> CommandSuggestion {
    CommandSuggestion::new(
        "「前に2m移動」のように、操作と数値を具体的に指示してください",
        "コマンドの信頼度が低いため",
        0.6,
    )
}

pub(crate) fn state_action() -> CommandSuggestion {
    CommandSuggestion::new(
        "実行したい操作を明確に指定してください（例: 離陸、着陸、移動、回転、写真撮影）",
        "認識できる操作が含まれていません",
        0.9,
    )
}

fn specify_drone() -> CommandSuggestion {
    CommandSuggestion::new(
        parameter_hint("", "drone_id"),
        "対象のドローンが指定されていません",
        0.5,
    )
}

/// Suggests corrections straight from raw text, before or without parsing
pub struct CorrectionSuggester {
    matcher: ActionMatcher,
    extractor: ParameterExtractor,
}

impl CorrectionSuggester {
    pub fn new() -> Result<Self> {
        Ok(Self {
            matcher: ActionMatcher::new()?,
            extractor: ParameterExtractor::new()?,
        })
    }

    /// Independent checks; several suggestions may apply at once
    pub fn suggest_corrections(&self, text: &str) -> Vec<CommandSuggestion> {
        let mut suggestions = Vec::new();

        if !self.matcher.matches_any(text) {
            suggestions.push(state_action());
        }
        if self.matcher.matches_action("move", text) && !self.extractor.matches("distance", text) {
            suggestions.push(missing_parameter("move", "distance"));
        }
        if self.matcher.matches_action("rotate", text) && !self.extractor.matches("angle", text) {
            suggestions.push(missing_parameter("rotate", "angle"));
        }
        if !self.extractor.matches("drone_id", text) {
            suggestions.push(specify_drone());
        }

        tracing::debug!(count = suggestions.len(), "correction suggestions");
        rank(suggestions, usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggester() -> CorrectionSuggester {
        CorrectionSuggester::new().unwrap()
    }

    fn mentions(suggestions: &[CommandSuggestion], needle: &str) -> bool {
        suggestions.iter().any(|s| s.suggestion.contains(needle))
    }

    #[test]
    fn test_unrecognized_text() {
        let s = suggester().suggest_corrections("こんにちは");
        assert!(mentions(&s, "操作"));
        assert!(mentions(&s, "drone_id"));
        assert_eq!(s.len(), 2);
        // The missing action ranks first
        assert!(s[0].suggestion.contains("操作"));
    }

    #[test]
    fn test_move_without_distance() {
        let s = suggester().suggest_corrections("drone-01を前に移動");
        assert_eq!(s.len(), 1);
        assert!(s[0].suggestion.starts_with("distance"));
    }

    #[test]
    fn test_rotate_without_angle() {
        let s = suggester().suggest_corrections("ドローン1を右に回転");
        assert_eq!(s.len(), 1);
        assert!(s[0].suggestion.starts_with("angle"));
    }

    #[test]
    fn test_complete_command_needs_nothing() {
        let s = suggester().suggest_corrections("drone-01を前に2m移動");
        assert!(s.is_empty());
    }

    #[test]
    fn test_suggestions_co_occur() {
        let s = suggester().suggest_corrections("移動して回転");
        assert!(mentions(&s, "distance"));
        assert!(mentions(&s, "angle"));
        assert!(mentions(&s, "drone_id"));
    }

    #[test]
    fn test_rank_is_stable_and_capped() {
        let ranked = rank(
            vec![
                CommandSuggestion::new("a", "", 0.5),
                CommandSuggestion::new("b", "", 0.9),
                CommandSuggestion::new("c", "", 0.5),
            ],
            2,
        );
        let order: Vec<_> = ranked.iter().map(|s| s.suggestion.as_str()).collect();
        assert_eq!(order, vec!["b", "a"]);
    }
}
