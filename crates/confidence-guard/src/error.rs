use thiserror::Error;

pub type Result<T, E = GuardError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("invalid validation rule '{name}': {message}")]
    Rule { name: String, message: String },
    #[error(transparent)]
    Parser(#[from] command_parser::ParseError),
}
