//! Equation entry points: split `LHS = RHS`, parse the right-hand side.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    ast::Node,
    error::{Error, Result},
    options::ParseOptions,
    parser::Parser,
};

/// Problem with the assignment separator of an equation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// No `=` outside comparison operators and string literals
    MissingSeparator,

    /// Nothing before the separator
    EmptyOutput { separator: usize },

    /// Empty right-hand side
    EmptyExpression { separator: usize },

    /// A second bare `=` makes the split ambiguous
    MultipleSeparators { first: usize, second: usize },
}

impl FormatError {
    pub fn position(&self) -> Option<usize> {
        match self {
            FormatError::MissingSeparator => None,
            FormatError::EmptyOutput { separator } | FormatError::EmptyExpression { separator } => {
                Some(*separator)
            }
            FormatError::MultipleSeparators { second, .. } => Some(*second),
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::MissingSeparator => {
                write!(f, "Missing '=' between output and expression")
            }
            FormatError::EmptyOutput { separator } => {
                write!(f, "Empty output before '=' at position {}", separator)
            }
            FormatError::EmptyExpression { separator } => {
                write!(f, "Empty expression after '=' at position {}", separator)
            }
            FormatError::MultipleSeparators { first, second } => write!(
                f,
                "Ambiguous equation: '=' at positions {} and {}",
                first, second
            ),
        }
    }
}

impl std::error::Error for FormatError {}

/// The two sides of an equation, trimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split<'a> {
    pub lhs: &'a str,
    pub rhs: &'a str,
    /// Byte offset of `rhs` in the equation text
    pub rhs_offset: usize,
}

/// A parsed equation: the output name and the expression assigned to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equation {
    /// Left-hand side text, used verbatim
    pub output: String,
    pub expression: Node,
}

impl Equation {
    pub fn string_literals(&self) -> Vec<&str> {
        self.expression.string_literals()
    }

    pub fn variable_names(&self) -> Vec<&str> {
        self.expression.variable_names()
    }
}

/// Splits `text` on its assignment `=`.
///
/// The separator is the first `=` that is not part of `==`, `!=`, `<=` or
/// `>=` and not inside a string literal, so comparisons on the right-hand
/// side never move the split point. A trailing `;` is dropped from the
/// right-hand side.
///
/// ```
/// use flateq::split_equation;
///
/// let split = split_equation("y = if a == 1 then 2 else 3").unwrap();
/// assert_eq!(split.lhs, "y");
/// assert_eq!(split.rhs, "if a == 1 then 2 else 3");
/// ```
pub fn split_equation(text: &str) -> std::result::Result<Split<'_>, FormatError> {
    let separator = find_separator(text, 0).ok_or(FormatError::MissingSeparator)?;
    if let Some(second) = find_separator(text, separator + 1) {
        return Err(FormatError::MultipleSeparators {
            first: separator,
            second,
        });
    }

    let lhs = text[..separator].trim();
    if lhs.is_empty() {
        return Err(FormatError::EmptyOutput { separator });
    }

    let after = &text[separator + 1..];
    let rhs_offset = separator + 1 + (after.len() - after.trim_start().len());
    let rhs = after.trim();
    let rhs = rhs.strip_suffix(';').map_or(rhs, str::trim_end);
    if rhs.is_empty() {
        return Err(FormatError::EmptyExpression { separator });
    }

    Ok(Split {
        lhs,
        rhs,
        rhs_offset,
    })
}

/// Byte offset of the next assignment `=` at or after `from`.
fn find_separator(text: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = from;

    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                // Skip the literal; an unterminated one runs to the end.
                i = bytes[i + 1..]
                    .iter()
                    .position(|&b| b == b'"')
                    .map_or(bytes.len(), |p| i + p + 2);
                continue;
            }
            b'=' | b'!' | b'<' | b'>' if bytes.get(i + 1) == Some(&b'=') => {
                i += 2;
                continue;
            }
            b'=' => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Parses a bare expression.
///
/// ```
/// use flateq::{parse_expression, ast::{BinOp, Node}};
///
/// let node = parse_expression("8-3-2").unwrap();
/// assert_eq!(
///     node,
///     Node::binary(
///         BinOp::Subtract,
///         Node::binary(BinOp::Subtract, Node::int(8), Node::int(3)),
///         Node::int(2),
///     )
/// );
/// ```
pub fn parse_expression(text: &str) -> Result<Node> {
    parse_expression_with(text, &ParseOptions::default())
}

pub fn parse_expression_with(text: &str, options: &ParseOptions) -> Result<Node> {
    let parser = Parser::from_source(text)?.with_options(options);
    trace!(tokens = parser.token_count(), "tokenized expression");
    parser.parse()
}

/// Parses `LHS = RHS` into an [`Equation`].
///
/// Error positions refer to `text`, not to the right-hand side alone.
pub fn parse_equation(text: &str) -> Result<Equation> {
    parse_equation_with(text, &ParseOptions::default())
}

pub fn parse_equation_with(text: &str, options: &ParseOptions) -> Result<Equation> {
    let result = split_equation(text)
        .map_err(Error::from)
        .and_then(|split| {
            let expression = parse_expression_with(split.rhs, options)
                .map_err(|e| e.shifted(split.rhs_offset))?;
            Ok(Equation {
                output: split.lhs.to_string(),
                expression,
            })
        });

    match &result {
        Ok(equation) => debug!(output = %equation.output, "parsed equation"),
        Err(e) => debug!(error = %e, "failed to parse equation"),
    }
    result
}
