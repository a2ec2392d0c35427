use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{Token, TokenKind};

/// Unrecognized character in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// Byte offset of the character
    pub position: usize,
    pub character: char,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unexpected character '{}' at position {}",
            self.character, self.position
        )
    }
}

impl std::error::Error for LexError {}

#[derive(Debug, Clone, Copy)]
enum Rule {
    Emit(TokenKind),
    /// Keyword or word operator; yields to an identifier when a `.` follows,
    /// so `then.x` stays one dotted name
    Word(TokenKind),
    Skip,
}

/// Matchers in priority order. The first one that matches at the cursor
/// wins, so the order is part of the grammar:
/// numbers before identifiers, keywords and word operators before
/// identifiers, two-character comparisons before `>` and `<`.
static RULES: LazyLock<Vec<(Rule, Regex)>> = LazyLock::new(|| {
    [
        (Rule::Emit(TokenKind::Number), r"[0-9]+\.?[0-9]*(?:[eE][+-]?[0-9]+)?"),
        (Rule::Emit(TokenKind::Operator), r"[+\-*/]"),
        (Rule::Emit(TokenKind::LParen), r"\("),
        (Rule::Emit(TokenKind::RParen), r"\)"),
        (Rule::Emit(TokenKind::LBracket), r"\["),
        (Rule::Emit(TokenKind::RBracket), r"\]"),
        (Rule::Emit(TokenKind::Comma), r","),
        (Rule::Word(TokenKind::KeywordIf), r"if\b"),
        (Rule::Word(TokenKind::KeywordThen), r"then\b"),
        (Rule::Word(TokenKind::KeywordElse), r"else\b"),
        (Rule::Skip, r"\s+"),
        (Rule::Emit(TokenKind::Compare), r">=|<=|==|!=|>|<"),
        (Rule::Word(TokenKind::And), r"and\b"),
        (Rule::Word(TokenKind::Or), r"or\b"),
        (Rule::Word(TokenKind::Not), r"not\b"),
        (Rule::Emit(TokenKind::Identifier), r"[A-Za-z_][A-Za-z0-9_.]*"),
        (Rule::Emit(TokenKind::StringLiteral), r#""[^"]*""#),
        (Rule::Emit(TokenKind::Dot), r"\."),
    ]
    .into_iter()
    .map(|(rule, pattern)| {
        let anchored = Regex::new(&format!("^(?:{pattern})")).expect("lexer patterns are valid");
        (rule, anchored)
    })
    .collect()
});

/// Splits equation text into tokens, one at a time.
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, position: 0 }
    }

    /// Byte offset of the cursor.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the next token, `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        while self.position < self.input.len() {
            let rest = &self.input[self.position..];
            let Some((rule, len)) = RULES.iter().find_map(|(rule, regex)| {
                let len = regex.find(rest)?.end();
                let dotted = matches!(rule, Rule::Word(_)) && rest[len..].starts_with('.');
                (!dotted).then_some((*rule, len))
            }) else {
                return Err(self.unexpected_char());
            };

            let start = self.position;
            self.position += len;
            if let Rule::Emit(kind) | Rule::Word(kind) = rule {
                return Ok(Some(Token::new(kind, &rest[..len], start)));
            }
        }
        Ok(None)
    }

    /// Consumes the whole input.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn unexpected_char(&self) -> LexError {
        LexError {
            position: self.position,
            character: self.input[self.position..].chars().next().unwrap_or('\0'),
        }
    }
}

/// Tokenizes `text` in one go.
pub fn tokenize(text: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(text).tokenize()
}

#[test]
fn test_keywords_need_word_boundary() {
    let tokens = tokenize("if iffy then thenext else elsewhere").unwrap();
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::KeywordIf,
            TokenKind::Identifier,
            TokenKind::KeywordThen,
            TokenKind::Identifier,
            TokenKind::KeywordElse,
            TokenKind::Identifier,
        ]
    );
}

#[test]
fn test_positions_are_byte_offsets() {
    let tokens = tokenize("a +  12").unwrap();
    let positions: Vec<usize> = tokens.iter().map(|t| t.position).collect();
    assert_eq!(positions, vec![0, 2, 5]);
    assert_eq!(tokens[2].end(), 7);
}
