//! Action matcher - finds the action a command text refers to

use crate::actions::{ActionSpec, ACTIONS};
use crate::error::Result;
use crate::normalize::normalize;
use crate::types::Token;
use regex::Regex;

/// Confidence of any pattern hit
pub const BASE_MATCH_CONFIDENCE: f32 = 0.8;
/// Confidence when the pattern text also occurs verbatim
pub const LITERAL_MATCH_CONFIDENCE: f32 = 0.9;
/// Bonus when a relevant morpheme shows up in the tokenizer output
pub const MORPHEME_BONUS: f32 = 0.05;

/// Best action found for a command
#[derive(Debug, Clone)]
pub struct ActionMatch {
    pub spec: &'static ActionSpec,
    pub confidence: f32,
    /// The pattern that produced the winning confidence
    pub pattern: &'static str,
}

impl ActionMatch {
    pub fn action(&self) -> &'static str {
        self.spec.action
    }
}

struct CompiledAction {
    spec: &'static ActionSpec,
    patterns: Vec<(&'static str, Regex)>,
}

/// Matches command text against the action table
pub struct ActionMatcher {
    actions: Vec<CompiledAction>,
}

impl ActionMatcher {
    /// Compile the action table
    pub fn new() -> Result<Self> {
        let mut actions = Vec::with_capacity(ACTIONS.len());
        for spec in ACTIONS {
            let mut patterns = Vec::with_capacity(spec.patterns.len());
            for pattern in spec.patterns {
                patterns.push((*pattern, compile_pattern(pattern)?));
            }
            actions.push(CompiledAction { spec, patterns });
        }
        Ok(Self { actions })
    }

    /// Find the best-matching action.
    ///
    /// Each pattern is tried against the raw text and against the
    /// space-joined token surfaces. The highest confidence wins; on a tie
    /// the action declared first is kept. Returns `None` when nothing matches.
    pub fn match_action(&self, text: &str, tokens: &[Token]) -> Option<ActionMatch> {
        let text = normalize(text).to_lowercase();
        let joined = tokens
            .iter()
            .map(|t| t.surface.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        let mut best: Option<ActionMatch> = None;

        for action in &self.actions {
            let Some((pattern, mut confidence)) = best_pattern(action, &text, &joined) else {
                continue;
            };

            if has_relevant_morpheme(action.spec, tokens) {
                confidence = (confidence + MORPHEME_BONUS).min(1.0);
            }

            let better = best
                .as_ref()
                .map(|b| confidence > b.confidence)
                .unwrap_or(true);
            if better {
                best = Some(ActionMatch {
                    spec: action.spec,
                    confidence,
                    pattern,
                });
            }
        }

        match &best {
            Some(m) => tracing::debug!(
                action = m.action(),
                confidence = m.confidence,
                pattern = m.pattern,
                "matched action"
            ),
            None => tracing::debug!(%text, "no action matched"),
        }
        best
    }

    /// Whether any pattern of `action` matches the raw text
    pub fn matches_action(&self, action: &str, text: &str) -> bool {
        let text = normalize(text);
        self.actions
            .iter()
            .filter(|a| a.spec.action == action)
            .any(|a| a.patterns.iter().any(|(_, re)| re.is_match(&text)))
    }

    /// Whether any action pattern at all matches the raw text
    pub fn matches_any(&self, text: &str) -> bool {
        let text = normalize(text);
        self.actions
            .iter()
            .any(|a| a.patterns.iter().any(|(_, re)| re.is_match(&text)))
    }
}

/// ASCII patterns are bounded by non-letters so `turn` does not fire inside `return`
fn compile_pattern(pattern: &str) -> Result<Regex> {
    let source = if pattern.is_ascii() {
        format!("(?i)(?:^|[^A-Za-z])(?:{})(?:[^A-Za-z]|$)", pattern)
    } else {
        format!("(?i){}", pattern)
    };
    Ok(Regex::new(&source)?)
}

/// Highest confidence any of the action's patterns reaches, with that pattern
fn best_pattern(action: &CompiledAction, text: &str, joined: &str) -> Option<(&'static str, f32)> {
    let mut best: Option<(&'static str, f32)> = None;
    for (pattern, regex) in &action.patterns {
        if !regex.is_match(text) && !regex.is_match(joined) {
            continue;
        }
        let literal = pattern.to_lowercase();
        let confidence = if text.contains(&literal) || joined.contains(&literal) {
            LITERAL_MATCH_CONFIDENCE
        } else {
            BASE_MATCH_CONFIDENCE
        };
        if best.map(|(_, c)| confidence > c).unwrap_or(true) {
            best = Some((*pattern, confidence));
        }
    }
    best
}

fn has_relevant_morpheme(spec: &ActionSpec, tokens: &[Token]) -> bool {
    tokens.iter().any(|t| {
        spec.morphemes
            .iter()
            .any(|m| t.surface == *m || t.base == *m)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> ActionMatcher {
        ActionMatcher::new().unwrap()
    }

    fn tok(surface: &str, base: &str) -> Token {
        Token::new(surface, base)
    }

    #[test]
    fn test_literal_match_with_morpheme() {
        let tokens = vec![tok("離陸", "離陸"), tok("してください", "してください")];
        let m = matcher().match_action("離陸してください", &tokens).unwrap();
        assert_eq!(m.action(), "takeoff");
        assert!((m.confidence - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_literal_match_without_tokens() {
        let m = matcher().match_action("離陸してください", &[]).unwrap();
        assert_eq!(m.action(), "takeoff");
        assert!((m.confidence - LITERAL_MATCH_CONFIDENCE).abs() < 1e-6);
    }

    #[test]
    fn test_regex_only_match_is_base_confidence() {
        let m = matcher().match_action("前に進んで", &[]).unwrap();
        assert_eq!(m.action(), "move");
        assert!((m.confidence - BASE_MATCH_CONFIDENCE).abs() < 1e-6);
    }

    #[test]
    fn test_morpheme_from_base_form() {
        let tokens = vec![tok("前", "前"), tok("に", "に"), tok("進", "進む"), tok("んで", "んで")];
        let m = matcher().match_action("前に進んで", &tokens).unwrap();
        assert_eq!(m.action(), "move");
        assert!((m.confidence - 0.85).abs() < 1e-6);
    }

    #[test]
    fn test_no_match() {
        assert!(matcher().match_action("こんにちは", &[]).is_none());
    }

    #[test]
    fn test_tie_keeps_first_declared() {
        // "接続を解除" hits both connect and disconnect literally
        let tokens = vec![tok("接続", "接続"), tok("を", "を"), tok("解除", "解除")];
        let m = matcher().match_action("接続を解除", &tokens).unwrap();
        assert_eq!(m.action(), "disconnect");
    }

    #[test]
    fn test_highest_confidence_wins() {
        // altitude hits "高さ", takeoff hits "離陸" plus a morpheme
        let tokens = vec![
            tok("高", "高"),
            tok("さ", "さ"),
            tok("1m", "1m"),
            tok("まで", "まで"),
            tok("離陸", "離陸"),
        ];
        let m = matcher().match_action("高さ1mまで離陸", &tokens).unwrap();
        assert_eq!(m.action(), "takeoff");
    }

    #[test]
    fn test_case_insensitive_english() {
        let m = matcher().match_action("Take off now", &[]).unwrap();
        assert_eq!(m.action(), "takeoff");
    }

    #[test]
    fn test_cutting_the_connection_disconnects() {
        let tokens = vec![
            tok("接続", "接続"),
            tok("を", "を"),
            tok("切", "切る"),
            tok("って", "って"),
        ];
        let m = matcher().match_action("接続を切って", &tokens).unwrap();
        assert_eq!(m.action(), "disconnect");
        assert_eq!(matcher().match_action("接続を切って", &[]).unwrap().action(), "disconnect");
    }

    #[test]
    fn test_stopping_a_rotation_stops() {
        let tokens = vec![
            tok("回転", "回転"),
            tok("を", "を"),
            tok("止", "止まる"),
            tok("めて", "めて"),
        ];
        let m = matcher().match_action("回転を止めて", &tokens).unwrap();
        assert_eq!(m.action(), "emergency_stop");
        assert_eq!(matcher().match_action("回転を止めて", &[]).unwrap().action(), "emergency_stop");
    }

    #[test]
    fn test_stepping_back_is_a_move() {
        let tokens = vec![
            tok("後", "後"),
            tok("ろに", "ろに"),
            tok("下", "下がる"),
            tok("がって", "がって"),
        ];
        let m = matcher().match_action("後ろに下がって", &tokens).unwrap();
        assert_eq!(m.action(), "move");
        // Without the back-step form it stays an altitude change
        let m = matcher().match_action("下がって", &[]).unwrap();
        assert_eq!(m.action(), "altitude");
    }

    #[test]
    fn test_english_patterns_match_whole_words() {
        let m = matcher();
        assert!(m.match_action("please return", &[]).is_none());
        assert!(!m.matches_action("move", "remove it"));
        assert!(!m.matches_action("land", "fly to the island"));
        assert!(m.matches_action("rotate", "turn left"));
        assert!(m.matches_action("takeoff", "takeoffして"));
    }

    #[test]
    fn test_matches_action() {
        let m = matcher();
        assert!(m.matches_action("move", "移動して"));
        assert!(!m.matches_action("rotate", "移動して"));
        assert!(m.matches_any("写真を撮って"));
        assert!(!m.matches_any("よろしく"));
    }
}
