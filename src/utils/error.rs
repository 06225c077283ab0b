//! Error handling for the Teeny Tiny toolchain

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// A fatal compilation or execution error.
///
/// Every run aborts at the first error; there is no recovery or
/// multi-error reporting. Diagnostic variants carry the source line of
/// the offending token.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ==================== Lexical Errors ====================

    #[error("Illegal character in string")]
    IllegalStringChar { line: usize },

    #[error("Unclosed string literal")]
    UnterminatedString { line: usize },

    #[error("Illegal character in number")]
    IllegalNumberChar { line: usize },

    #[error("Unknown token {text:?}")]
    UnknownToken { text: String, line: usize },

    #[error("Expected !=, got !{got}")]
    LoneBang { got: char, line: usize },

    // ==================== Syntactic Errors ====================

    #[error("Expected {expected}, got {got}")]
    UnexpectedToken {
        expected: String,
        got: String,
        line: usize,
    },

    #[error("Expected comparison operator at {text}")]
    ExpectedComparisonOperator { text: String, line: usize },

    #[error("Unexpected token at {text}")]
    UnexpectedPrimary { text: String, line: usize },

    #[error("Invalid statement at {text}")]
    InvalidStatement { text: String, line: usize },

    // ==================== Semantic Errors ====================

    #[error("Referencing variable before assignment: {name:?}")]
    UndeclaredVariable { name: String, line: usize },

    #[error("Label {name} already exists")]
    DuplicateLabel { name: String, line: usize },

    #[error("Attempting to GOTO undeclared label {name:?}")]
    UndeclaredLabel { name: String, line: usize },

    // ==================== Runtime I/O ====================

    #[error("IO error: {0}")]
    Io(String),
}

impl Error {
    /// Get the source line associated with this error
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::IllegalStringChar { line } => Some(*line),
            Self::UnterminatedString { line } => Some(*line),
            Self::IllegalNumberChar { line } => Some(*line),
            Self::UnknownToken { line, .. } => Some(*line),
            Self::LoneBang { line, .. } => Some(*line),
            Self::UnexpectedToken { line, .. } => Some(*line),
            Self::ExpectedComparisonOperator { line, .. } => Some(*line),
            Self::UnexpectedPrimary { line, .. } => Some(*line),
            Self::InvalidStatement { line, .. } => Some(*line),
            Self::UndeclaredVariable { line, .. } => Some(*line),
            Self::DuplicateLabel { line, .. } => Some(*line),
            Self::UndeclaredLabel { line, .. } => Some(*line),
            Self::Io(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
