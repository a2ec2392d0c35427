//! Crate-level error type.

use thiserror::Error;

use crate::equation::FormatError;
use crate::lexer::LexError;
use crate::parser::ParseError;

pub type Result<T> = std::result::Result<T, Error>;

/// Any failure of [`parse_equation`](crate::parse_equation) or
/// [`parse_expression`](crate::parse_expression). The first error aborts the
/// parse; no partial tree is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Nesting deeper than {limit} levels at position {position}")]
    DepthExceeded { limit: usize, position: usize },
}

impl Error {
    /// Byte offset the error points at, when it has one.
    pub fn position(&self) -> Option<usize> {
        match self {
            Error::Lex(e) => Some(e.position),
            Error::Format(e) => e.position(),
            Error::Parse(e) => Some(e.position),
            Error::DepthExceeded { position, .. } => Some(*position),
        }
    }

    /// Moves every position by `offset` bytes, for errors raised on a slice
    /// of a larger text.
    pub(crate) fn shifted(self, offset: usize) -> Self {
        match self {
            Error::Lex(mut e) => {
                e.position += offset;
                Error::Lex(e)
            }
            Error::Parse(mut e) => {
                e.position += offset;
                if let Some(found) = e.found.as_mut() {
                    found.position += offset;
                }
                Error::Parse(e)
            }
            Error::DepthExceeded { limit, position } => Error::DepthExceeded {
                limit,
                position: position + offset,
            },
            other => other,
        }
    }
}
