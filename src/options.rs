//! Parser configuration.

use serde::{Deserialize, Serialize};

/// Nesting limit used when no options are given.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Options for a single parse.
///
/// Deserializes with missing fields filled from [`Default`], so a host
/// application can embed it in its own configuration file:
///
/// ```
/// use flateq::ParseOptions;
///
/// let options: ParseOptions = serde_json::from_str(r#"{"max_depth": 32}"#).unwrap();
/// assert_eq!(options.max_depth, 32);
///
/// let options: ParseOptions = serde_json::from_str("{}").unwrap();
/// assert_eq!(options, ParseOptions::default());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Deepest allowed nesting. Bounds both the parser's recursion (each
    /// parenthesis, unary sign, call argument or condition adds a level)
    /// and the [height](crate::Node::height) of the returned tree, where
    /// every operator of a long sum or every link of `f()()` adds one.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
