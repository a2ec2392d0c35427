//! # Equation AST
//!
//! Data model produced by the parser for the right-hand side of a flattened
//! model equation.
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes (literals, variables, operations, calls)
//! - **[operators]** - Arithmetic, sign, comparison and logical operators
//!
//! ## Example
//!
//! ```text
//! body.cylinder.e_aux1[1] = if n[1]*n[1] > 0.000001 then 0 else abs(n[3])
//! ```
//!
//! The output `body.cylinder.e_aux1[1]` is kept as text; the right-hand side
//! becomes an [`Node::IfElse`] whose condition is a [`Node::Compare`].
//!
//! ## Structured Form
//!
//! Every node serializes (via serde) to a map with a `type` discriminator:
//!
//! ```text
//! {"type": "binary_op", "operator": "+",
//!  "left": {"type": "number", "value": 1},
//!  "right": {"type": "variable", "name": "x", "indices": [{"type": "number", "value": 2}]}}
//! ```
pub mod expressions;
pub mod operators;
pub mod tokens;

pub use expressions::{Node, Number, Variable};
pub use operators::{BinOp, CmpOp, LogicOp, Sign};
pub use tokens::{Token, TokenKind};
