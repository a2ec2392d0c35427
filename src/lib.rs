//! Parser for flattened model equations.
//!
//! Turns text such as
//!
//! ```text
//! body.cylinder.rxvisobj[2] = body.frame_a.R.T[1,2] * body.cylinder.n_z_aux[3] + sin(tr.y[1,1])
//! ```
//!
//! into an [`Equation`]: the output name plus an [`ast::Node`] tree for the
//! right-hand side, ready to be serialized for a code generator.
//!
//! ```
//! use flateq::{parse_equation, ast::{BinOp, Node}};
//!
//! let equation = parse_equation("x = 1+2").unwrap();
//! assert_eq!(equation.output, "x");
//! assert_eq!(equation.expression, Node::binary(BinOp::Add, Node::int(1), Node::int(2)));
//! ```
pub mod ast;
pub mod equation;
pub mod error;
pub mod lexer;
pub mod options;
pub mod output;
pub mod parser;

pub use ast::{BinOp, CmpOp, LogicOp, Node, Number, Sign, Token, TokenKind, Variable};
pub use equation::{
    Equation, FormatError, Split, parse_equation, parse_equation_with, parse_expression,
    parse_expression_with, split_equation,
};
pub use error::{Error, Result};
pub use lexer::{LexError, Lexer, tokenize};
pub use options::{DEFAULT_MAX_DEPTH, ParseOptions};
pub use output::{to_json, to_json_pretty};
pub use parser::{Expected, ParseError, Parser};
