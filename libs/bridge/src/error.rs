//! Error types for bridge line parsing.

use thiserror::Error;

/// Errors that can occur when parsing bridge configuration text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The line matches none of the supported transport grammars.
    #[error("bridge line could not be parsed: {0:?}")]
    Unrecognized(String),
}
