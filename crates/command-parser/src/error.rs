use thiserror::Error;

pub type Result<T, E = ParseError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unparseable command: empty input")]
    EmptyCommand,
    #[error("unparseable command: no action recognized in '{0}'")]
    UnrecognizedCommand(String),
    #[error("tokenizer error: {0}")]
    Tokenizer(String),
    #[error("invalid pattern table: {0}")]
    Pattern(#[from] regex::Error),
}

impl ParseError {
    /// True when the utterance itself could not be turned into an intent.
    pub fn is_unparseable(&self) -> bool {
        matches!(
            self,
            ParseError::EmptyCommand | ParseError::UnrecognizedCommand(_)
        )
    }
}
