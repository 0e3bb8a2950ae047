//! Command parser: text -> [`ParsedIntent`]

use crate::assembler::assemble;
use crate::error::{ParseError, Result};
use crate::matcher::ActionMatcher;
use crate::normalize::normalize;
use crate::parameters::ParameterExtractor;
use crate::tokenizer::{ScriptTokenizer, Tokenizer};
use crate::types::{CommandContext, ParsedIntent};
use std::sync::Arc;

/// Main command parser
///
/// Holds only read-only tables and a shared tokenizer, so one instance can
/// serve any number of concurrent `parse_command` calls.
pub struct CommandParser {
    matcher: ActionMatcher,
    extractor: ParameterExtractor,
    tokenizer: Arc<dyn Tokenizer>,
}

impl CommandParser {
    /// Create a parser backed by the built-in [`ScriptTokenizer`]
    pub fn new() -> Result<Self> {
        Self::with_tokenizer(Arc::new(ScriptTokenizer::new()))
    }

    /// Create a parser backed by a custom tokenizer
    pub fn with_tokenizer(tokenizer: Arc<dyn Tokenizer>) -> Result<Self> {
        Ok(Self {
            matcher: ActionMatcher::new()?,
            extractor: ParameterExtractor::new()?,
            tokenizer,
        })
    }

    /// Whether the tokenizer has been initialized
    pub fn is_ready(&self) -> bool {
        self.tokenizer.is_ready()
    }

    /// Initialize the tokenizer ahead of the first parse
    pub async fn initialize(&self) -> Result<()> {
        if !self.tokenizer.is_ready() {
            self.tokenizer.initialize().await?;
            tracing::info!("command parser ready");
        }
        Ok(())
    }

    /// Parse a command into a structured intent.
    ///
    /// Fails with an unparseable-command error for empty input or when no
    /// action pattern matches. Missing parameters are not an error here.
    pub async fn parse_command(
        &self,
        text: &str,
        context: Option<&CommandContext>,
    ) -> Result<ParsedIntent> {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return Err(ParseError::EmptyCommand);
        }

        self.initialize().await?;
        let tokens = self.tokenizer.tokenize(&normalized).await?;
        tracing::debug!(?tokens, "tokenized command");

        let matched = self.matcher.match_action(&normalized, &tokens);
        // Context is merged once, by the assembler
        let parameters = self.extractor.extract(&normalized, None);
        let intent = assemble(matched, parameters, context, text)?;

        tracing::debug!(
            id = %intent.id(),
            action = %intent.action,
            confidence = intent.confidence,
            parameters = ?intent.parameters,
            "parsed command"
        );
        Ok(intent)
    }

    pub fn matcher(&self) -> &ActionMatcher {
        &self.matcher
    }

    pub fn extractor(&self) -> &ParameterExtractor {
        &self.extractor
    }
}
