use std::fmt;

use serde::{Deserialize, Serialize};

/// Lexical category of a [`Token`].
///
/// Operators and comparison operators share one kind each; the token text
/// tells them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// Integer or floating-point literal
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 0.000001
    /// 1.5e-3
    /// ```
    Number,

    /// Arithmetic operator: `+`, `-`, `*` or `/`
    Operator,

    /// Left parenthesis for grouping or function calls
    LParen,

    /// Right parenthesis
    RParen,

    /// Left bracket for index access
    LBracket,

    /// Right bracket
    RBracket,

    /// Comma separating arguments or indices
    Comma,

    /// `if` keyword
    KeywordIf,

    /// `then` keyword
    KeywordThen,

    /// `else` keyword
    KeywordElse,

    /// Comparison operator: `>=`, `<=`, `==`, `!=`, `>` or `<`
    Compare,

    /// Logical AND (word, not symbol)
    And,

    /// Logical OR (word, not symbol)
    Or,

    /// Logical NOT. Recognized by the lexer, not accepted by the grammar.
    Not,

    /// Variable or function name, dots included
    ///
    /// # Examples
    /// ```text
    /// sin
    /// body.frame_a.R.T
    /// mwAux.474
    /// ```
    Identifier,

    /// Double-quoted string, quotes included
    StringLiteral,

    /// Dot between an index group and a member name (`a[1].b`)
    Dot,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Number => "number",
            TokenKind::Operator => "operator",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Comma => "','",
            TokenKind::KeywordIf => "'if'",
            TokenKind::KeywordThen => "'then'",
            TokenKind::KeywordElse => "'else'",
            TokenKind::Compare => "comparison operator",
            TokenKind::And => "'and'",
            TokenKind::Or => "'or'",
            TokenKind::Not => "'not'",
            TokenKind::Identifier => "identifier",
            TokenKind::StringLiteral => "string literal",
            TokenKind::Dot => "'.'",
        };
        f.write_str(name)
    }
}

/// A lexeme together with its kind and byte offset in the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            position,
        }
    }

    /// Byte offset just past the end of the token.
    pub fn end(&self) -> usize {
        self.position + self.text.len()
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}
