//! command-parser: free-form drone commands to structured intents
//!
//! This crate turns operator sentences such as `前に2m移動してください` into a
//! [`ParsedIntent`]: a canonical action identifier plus typed parameters in
//! canonical units (centimeters, degrees) and an action-match confidence.
//!
//! - [`ActionMatcher`] finds the action from the static [`ACTIONS`] table
//! - [`ParameterExtractor`] pulls distances, angles, directions and the like
//! - [`assemble`] merges both with caller context
//! - [`CommandParser`] wires them behind a [`Tokenizer`]

mod actions;
pub use actions::{find_action, ActionSpec, SafetyClass, ACTIONS};

mod assembler;
pub use assembler::assemble;

mod error;
pub use error::{ParseError, Result};

mod matcher;
pub use matcher::{
    ActionMatch, ActionMatcher, BASE_MATCH_CONFIDENCE, LITERAL_MATCH_CONFIDENCE, MORPHEME_BONUS,
};

mod normalize;
pub use normalize::normalize;

mod parameters;
pub use parameters::{
    find_parameter, merge_context, ParameterExtractor, ParameterKind, ParameterSpec, PARAMETERS,
};

mod parser;
pub use parser::CommandParser;

mod tokenizer;
pub use tokenizer::{ScriptTokenizer, Tokenizer};

mod types;
pub use types::{CommandContext, ParsedIntent, Parameters, Token};

/// Initialize the command parser system
pub fn init() {
    tracing::info!(
        actions = ACTIONS.len(),
        parameters = PARAMETERS.len(),
        "initializing command parser"
    );
}

/// Create a command parser with the built-in tokenizer
pub fn create_parser() -> Result<CommandParser> {
    init();
    CommandParser::new()
}
