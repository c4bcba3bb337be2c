// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Unterminated {quote} quote in command: {command}")]
    UnterminatedQuote { quote: char, command: String },

    #[error("Queue {name} must admit at least one task")]
    InvalidCapacity { name: String },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
