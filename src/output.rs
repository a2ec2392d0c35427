//! Structured output for parsed equations.
//!
//! The AST serializes through serde into nested maps and sequences; this
//! module fixes the JSON rendering that downstream code generators consume.
//!
//! # Features
//!
//! - **Compact output** via [`to_json()`]
//! - **Pretty output** via [`to_json_pretty()`] - 2-space indentation
//! - **Reading back** via [`from_json()`] / [`from_value()`], for trees of any
//!   height the parser allows
//! - **Deterministic** - field order is fixed by the type definitions and
//!   optional fields are present only when the parser filled them
//!
//! # Examples
//!
//! ```
//! use flateq::{parse_equation, output::to_json};
//!
//! let equation = parse_equation("x = 1+2").unwrap();
//! assert_eq!(
//!     to_json(&equation).unwrap(),
//!     r#"{"output":"x","expression":{"type":"binary_op","operator":"+","left":{"type":"number","value":1},"right":{"type":"number","value":2}}}"#
//! );
//! ```

use serde::{Deserialize, Serialize, de::DeserializeOwned, de::Error as _};
use serde_json::Value;

use crate::options::ParseOptions;

/// Converts a node or equation into a `serde_json::Value` tree.
pub fn to_value<T: Serialize + ?Sized>(item: &T) -> serde_json::Result<Value> {
    serde_json::to_value(item)
}

/// Compact JSON, no extra whitespace.
pub fn to_json<T: Serialize + ?Sized>(item: &T) -> serde_json::Result<String> {
    serde_json::to_string(item)
}

/// Human-readable JSON with 2-space indentation.
pub fn to_json_pretty<T: Serialize + ?Sized>(item: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(item)
}

/// Reads a node or equation back from JSON text.
///
/// ```
/// use flateq::{parse_expression, ast::Node, output::{from_json, to_json}};
///
/// let node = parse_expression("f(x, a[1].b[2])").unwrap();
/// let back: Node = from_json(&to_json(&node).unwrap()).unwrap();
/// assert_eq!(back, node);
/// ```
pub fn from_json<T: DeserializeOwned>(text: &str) -> serde_json::Result<T> {
    from_json_with(text, &ParseOptions::default())
}

/// Reads JSON written for trees parsed under `options`.
///
/// Any tree within `options.max_depth` reads back, however far its JSON
/// nests. Text nested deeper than such a tree could be is rejected before
/// deserializing.
pub fn from_json_with<T: DeserializeOwned>(
    text: &str,
    options: &ParseOptions,
) -> serde_json::Result<T> {
    let limit = nesting_limit(options);
    if nesting(text) > limit {
        return Err(serde_json::Error::custom(format!(
            "JSON nested deeper than {limit} levels"
        )));
    }

    let mut deserializer = serde_json::Deserializer::from_str(text);
    deserializer.disable_recursion_limit();
    let item = T::deserialize(&mut deserializer)?;
    deserializer.end()?;
    Ok(item)
}

/// One object per tree level plus one array per argument or index list,
/// and the equation wrapper on top.
fn nesting_limit(options: &ParseOptions) -> usize {
    2 * options.max_depth + 1
}

/// Deepest `{`/`[` nesting in `text`, string contents ignored.
fn nesting(text: &str) -> usize {
    let (mut depth, mut deepest) = (0usize, 0usize);
    let (mut in_string, mut escaped) = (false, false);

    for byte in text.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    deepest
}

pub fn from_value<T: DeserializeOwned>(value: Value) -> serde_json::Result<T> {
    serde_json::from_value(value)
}
