//! Tokenizer seam
//!
//! Morphological analysis is an external concern. The parser only needs
//! `tokenize(text) -> [{surface, base}]`; [`ScriptTokenizer`] is the
//! in-process default and any analyzer can be plugged in through [`Tokenizer`].

use crate::error::{ParseError, Result};
use crate::types::Token;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Morphological tokenizer used by the command parser
#[async_trait]
pub trait Tokenizer: Send + Sync {
    /// Load dictionaries or models. Called once before the first `tokenize`.
    async fn initialize(&self) -> Result<()>;

    /// Whether `initialize` has completed
    fn is_ready(&self) -> bool;

    /// Split text into ordered tokens
    async fn tokenize(&self, text: &str) -> Result<Vec<Token>>;
}

/// Single-kanji verb stems and their dictionary forms
const VERB_STEMS: &[(&str, &str)] = &[
    ("飛", "飛ぶ"),
    ("上", "上がる"),
    ("下", "下がる"),
    ("降", "降りる"),
    ("進", "進む"),
    ("動", "動く"),
    ("行", "行く"),
    ("回", "回る"),
    ("止", "止まる"),
    ("撮", "撮る"),
    ("追", "追う"),
    ("戻", "戻る"),
    ("切", "切る"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Script {
    Kanji,
    Hiragana,
    Katakana,
    Latin,
    Other,
}

impl Script {
    fn of(c: char) -> Self {
        match c {
            '\u{3041}'..='\u{309F}' => Script::Hiragana,
            '\u{30A0}'..='\u{30FF}' | '\u{31F0}'..='\u{31FF}' => Script::Katakana,
            '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' | '\u{3005}' => Script::Kanji,
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => Script::Latin,
            _ => Script::Other,
        }
    }
}

/// Splits text at script boundaries (kanji, hiragana, katakana, ASCII).
///
/// A single kanji followed by kana is treated as a verb stem and given its
/// dictionary form as base, so `飛んで` yields the morpheme `飛ぶ`.
#[derive(Default)]
pub struct ScriptTokenizer {
    stems: OnceLock<HashMap<&'static str, &'static str>>,
}

impl ScriptTokenizer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Tokenizer for ScriptTokenizer {
    async fn initialize(&self) -> Result<()> {
        self.stems.get_or_init(|| {
            tracing::info!(entries = VERB_STEMS.len(), "loading tokenizer stem dictionary");
            VERB_STEMS.iter().copied().collect()
        });
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.stems.get().is_some()
    }

    async fn tokenize(&self, text: &str) -> Result<Vec<Token>> {
        let stems = self
            .stems
            .get()
            .ok_or_else(|| ParseError::Tokenizer("tokenizer used before initialize".into()))?;

        let mut runs: Vec<(Script, String)> = Vec::new();
        for c in text.chars() {
            let script = Script::of(c);
            match runs.last_mut() {
                Some((last, run)) if *last == script => run.push(c),
                _ => runs.push((script, c.to_string())),
            }
        }

        let mut tokens = Vec::with_capacity(runs.len());
        for (i, (script, surface)) in runs.iter().enumerate() {
            let base = match script {
                Script::Other => continue,
                Script::Kanji => {
                    let followed_by_kana = matches!(runs.get(i + 1), Some((Script::Hiragana, _)));
                    if followed_by_kana && surface.chars().count() == 1 {
                        stems
                            .get(surface.as_str())
                            .map(|s| s.to_string())
                            .unwrap_or_else(|| surface.clone())
                    } else {
                        surface.clone()
                    }
                }
                Script::Latin => surface.to_lowercase(),
                Script::Hiragana | Script::Katakana => surface.clone(),
            };
            tokens.push(Token::new(surface.clone(), base));
        }

        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ready() -> ScriptTokenizer {
        let tokenizer = ScriptTokenizer::new();
        tokenizer.initialize().await.unwrap();
        tokenizer
    }

    fn surfaces(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.surface.as_str()).collect()
    }

    #[tokio::test]
    async fn test_requires_initialize() {
        let tokenizer = ScriptTokenizer::new();
        assert!(!tokenizer.is_ready());
        let err = tokenizer.tokenize("離陸").await.unwrap_err();
        assert!(matches!(err, ParseError::Tokenizer(_)));

        tokenizer.initialize().await.unwrap();
        assert!(tokenizer.is_ready());
        // A second initialize is a no-op
        tokenizer.initialize().await.unwrap();
        assert!(tokenizer.is_ready());
    }

    #[tokio::test]
    async fn test_script_boundaries() {
        let tokens = ready().await.tokenize("前に2m移動してください").await.unwrap();
        assert_eq!(surfaces(&tokens), vec!["前", "に", "2m", "移動", "してください"]);
    }

    #[tokio::test]
    async fn test_verb_stem_base_form() {
        let tokens = ready().await.tokenize("飛んで").await.unwrap();
        assert_eq!(tokens[0], Token::new("飛", "飛ぶ"));
    }

    #[tokio::test]
    async fn test_compound_kanji_keeps_surface() {
        let tokens = ready().await.tokenize("緊急停止").await.unwrap();
        assert_eq!(tokens, vec![Token::new("緊急停止", "緊急停止")]);
    }

    #[tokio::test]
    async fn test_latin_and_katakana() {
        let tokens = ready().await.tokenize("Drone-01 ステータス").await.unwrap();
        assert_eq!(tokens[0], Token::new("Drone-01", "drone-01"));
        assert_eq!(tokens[1], Token::new("ステータス", "ステータス"));
    }

    #[tokio::test]
    async fn test_punctuation_dropped() {
        let tokens = ready().await.tokenize("離陸、着陸。").await.unwrap();
        assert_eq!(surfaces(&tokens), vec!["離陸", "着陸"]);
    }
}
