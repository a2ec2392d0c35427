use std::fmt;

use crate::{
    ast::{BinOp, CmpOp, LogicOp, Node, Number, Sign, Token, TokenKind, Variable},
    error::{Error, Result},
    lexer,
    options::ParseOptions,
};

/// What the parser was looking for when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    Token(TokenKind),
    /// Start of an operand: number, string, name, `(`, sign or `if`
    Expression,
    /// A comparison operator completing a condition
    Comparison,
    EndOfInput,
    /// A numeric literal representable as a finite `f64`
    FiniteNumber,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Token(kind) => write!(f, "{kind}"),
            Expected::Expression => f.write_str("expression"),
            Expected::Comparison => f.write_str("comparison operator"),
            Expected::EndOfInput => f.write_str("end of input"),
            Expected::FiniteNumber => f.write_str("finite number"),
        }
    }
}

/// Mismatch between the expected and the next token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub expected: Expected,
    /// `None` when the input ended early
    pub found: Option<Token>,
    /// Byte offset of `found`, or of the end of input
    pub position: usize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.found {
            Some(token) => write!(
                f,
                "Expected {}, got '{}' at position {}",
                self.expected, token.text, self.position
            ),
            None => write!(
                f,
                "Expected {}, got end of input at position {}",
                self.expected, self.position
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// A parsed node with the height of its tree.
struct Built {
    node: Node,
    height: usize,
}

impl Built {
    fn leaf(node: Node) -> Self {
        Built { node, height: 1 }
    }
}

/// Result of reading a condition operand: a condition, or an arithmetic
/// expression that no comparison followed.
enum Grouped {
    Condition(Built),
    Expression(Built),
}

/// Recursive descent parser over a token sequence.
///
/// A parser is single-use: [`Parser::parse`] consumes it. Every token is
/// read once, so parsing time is linear in the token count.
pub struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    /// Position reported for errors at end of input
    end: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let end = tokens.last().map_or(0, Token::end);
        Parser {
            tokens,
            cursor: 0,
            end,
            depth: 0,
            max_depth: ParseOptions::default().max_depth,
        }
    }

    /// Tokenizes `source` and prepares a parser over it.
    pub fn from_source(source: &str) -> Result<Self> {
        let mut parser = Parser::new(lexer::tokenize(source)?);
        parser.end = source.len();
        Ok(parser)
    }

    pub fn with_options(mut self, options: &ParseOptions) -> Self {
        self.max_depth = options.max_depth;
        self
    }

    /// Number of tokens the parser works on.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Parses the whole token sequence as one expression.
    pub fn parse(mut self) -> Result<Node> {
        let built = self.parse_expression()?;
        if self.peek().is_some() {
            return Err(self.unexpected(Expected::EndOfInput));
        }
        Ok(built.node)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|token| token.kind)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn advance(&mut self) {
        if self.cursor < self.tokens.len() {
            self.cursor += 1;
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        match self.peek() {
            Some(token) if token.kind == kind => {
                let token = token.clone();
                self.cursor += 1;
                Ok(token)
            }
            _ => Err(self.unexpected(Expected::Token(kind))),
        }
    }

    fn position(&self) -> usize {
        self.peek().map_or(self.end, |token| token.position)
    }

    fn unexpected(&self, expected: Expected) -> Error {
        ParseError {
            expected,
            found: self.peek().cloned(),
            position: self.position(),
        }
        .into()
    }

    fn depth_exceeded(&self) -> Error {
        Error::DepthExceeded {
            limit: self.max_depth,
            position: self.position(),
        }
    }

    /// Guards recursion.
    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(self.depth_exceeded());
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Guards the height of the tree being built. Left folds and postfix
    /// chains grow the tree without recursing, so `enter` alone does not
    /// bound it.
    fn grow(&self, height: usize) -> Result<usize> {
        if height > self.max_depth {
            return Err(self.depth_exceeded());
        }
        Ok(height)
    }

    fn peek_binop(&self, additive: bool) -> Option<BinOp> {
        let token = self.peek().filter(|token| token.is(TokenKind::Operator))?;
        BinOp::from_symbol(&token.text).filter(|op| op.is_additive() == additive)
    }

    fn peek_compare(&self) -> Option<CmpOp> {
        let token = self.peek().filter(|token| token.is(TokenKind::Compare))?;
        CmpOp::from_symbol(&token.text)
    }

    fn peek_logic(&self) -> Option<LogicOp> {
        match self.peek_kind()? {
            TokenKind::And => Some(LogicOp::And),
            TokenKind::Or => Some(LogicOp::Or),
            _ => None,
        }
    }

    fn binary(&self, op: BinOp, left: Built, right: Built) -> Result<Built> {
        let height = self.grow(left.height.max(right.height) + 1)?;
        Ok(Built {
            node: Node::binary(op, left.node, right.node),
            height,
        })
    }

    /// expression := term (("+"|"-") term)*
    fn parse_expression(&mut self) -> Result<Built> {
        let first = self.parse_term()?;
        self.parse_expression_from(first)
    }

    fn parse_expression_from(&mut self, mut left: Built) -> Result<Built> {
        while let Some(op) = self.peek_binop(true) {
            self.advance();
            let right = self.parse_term()?;
            left = self.binary(op, left, right)?;
        }
        Ok(left)
    }

    /// term := factor (("*"|"/") factor)*
    fn parse_term(&mut self) -> Result<Built> {
        let first = self.parse_factor()?;
        self.parse_term_from(first)
    }

    fn parse_term_from(&mut self, mut left: Built) -> Result<Built> {
        while let Some(op) = self.peek_binop(false) {
            self.advance();
            let right = self.parse_factor()?;
            left = self.binary(op, left, right)?;
        }
        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Built> {
        self.enter()?;
        let built = self.parse_factor_inner();
        self.leave();
        built
    }

    fn parse_factor_inner(&mut self) -> Result<Built> {
        let Some(token) = self.peek() else {
            return Err(self.unexpected(Expected::Expression));
        };

        let kind = token.kind;
        match kind {
            TokenKind::Operator => {
                let Some(sign) = Sign::from_symbol(&token.text) else {
                    return Err(self.unexpected(Expected::Expression));
                };
                self.advance();
                let operand = self.parse_factor()?; // Right-recursive: `--x`
                let height = self.grow(operand.height + 1)?;
                Ok(Built {
                    node: Node::unary(sign, operand.node),
                    height,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                self.parse_postfix(inner)
            }
            TokenKind::Number => {
                let Some(value) = parse_number(&token.text) else {
                    return Err(self.unexpected(Expected::FiniteNumber));
                };
                self.advance();
                Ok(Built::leaf(Node::NumberLiteral { value }))
            }
            TokenKind::StringLiteral => {
                let value = token.text.clone();
                self.advance();
                Ok(Built::leaf(Node::StringLiteral { value }))
            }
            TokenKind::KeywordIf => self.parse_if_else(),
            TokenKind::Identifier => {
                let name = token.text.clone();
                self.advance();
                self.parse_postfix(Built::leaf(Node::var(name)))
            }
            _ => Err(self.unexpected(Expected::Expression)),
        }
    }

    /// Applies calls and index groups left to right.
    fn parse_postfix(&mut self, mut built: Built) -> Result<Built> {
        loop {
            if self.check(TokenKind::LParen) {
                self.advance();
                let (args, args_height) = if self.check(TokenKind::RParen) {
                    (Vec::new(), 0)
                } else {
                    self.parse_expression_list()?
                };
                self.expect(TokenKind::RParen)?;
                let height = self.grow(built.height.max(args_height) + 1)?;
                built = Built {
                    node: Node::call(built.node, args),
                    height,
                };
            } else if self.check(TokenKind::LBracket) {
                self.advance();
                let (indices, indices_height) = self.parse_expression_list()?;
                self.expect(TokenKind::RBracket)?;
                let (subnodes, members_height) = self.parse_member_chain()?;
                let height =
                    self.grow(built.height.max(indices_height).max(members_height) + 1)?;
                built = Built {
                    node: built.node.indexed(indices, subnodes),
                    height,
                };
            } else {
                return Ok(built);
            }
        }
    }

    /// `.name` or `.name[args]` continuations after a closed index group,
    /// with the height of the tallest member.
    fn parse_member_chain(&mut self) -> Result<(Vec<Variable>, usize)> {
        let mut members = Vec::new();
        let mut height = 0;

        while self.check(TokenKind::Dot) {
            self.advance();
            let name = self.expect(TokenKind::Identifier)?.text;
            let mut member = Variable::named(name);
            let mut member_height = 1;

            if self.check(TokenKind::LBracket) {
                self.advance();
                let (args, args_height) = self.parse_expression_list()?;
                self.expect(TokenKind::RBracket)?;
                member = member.with_object_args(args);
                member_height += args_height;
            }
            height = height.max(member_height);
            members.push(member);
        }
        Ok((members, height))
    }

    /// One or more comma-separated expressions, with the tallest height.
    fn parse_expression_list(&mut self) -> Result<(Vec<Node>, usize)> {
        let mut items = Vec::new();
        let mut height = 0;

        loop {
            let item = self.parse_expression()?;
            height = height.max(item.height);
            items.push(item.node);

            if !self.check(TokenKind::Comma) {
                return Ok((items, height));
            }
            self.advance();
        }
    }

    fn parse_if_else(&mut self) -> Result<Built> {
        self.expect(TokenKind::KeywordIf)?;
        let condition = self.parse_condition()?;
        self.expect(TokenKind::KeywordThen)?;
        let then_branch = self.parse_expression()?;
        self.expect(TokenKind::KeywordElse)?;
        let else_branch = self.parse_expression()?;

        let tallest = condition
            .height
            .max(then_branch.height)
            .max(else_branch.height);
        let height = self.grow(tallest + 1)?;
        Ok(Built {
            node: Node::if_else(condition.node, then_branch.node, else_branch.node),
            height,
        })
    }

    fn parse_condition(&mut self) -> Result<Built> {
        let grouped = self.parse_grouped()?;
        self.require_condition(grouped)
    }

    fn require_condition(&self, grouped: Grouped) -> Result<Built> {
        match grouped {
            Grouped::Condition(built) => Ok(built),
            Grouped::Expression(_) => Err(self.unexpected(Expected::Comparison)),
        }
    }

    fn parse_grouped(&mut self) -> Result<Grouped> {
        self.enter()?;
        let grouped = self.parse_grouped_inner();
        self.leave();
        grouped
    }

    /// condition := operand (("and"|"or") operand)*
    ///
    /// A lone operand without a comparison comes back as an expression, so
    /// the caller can tell `((a+b))` from `((a>b))`.
    fn parse_grouped_inner(&mut self) -> Result<Grouped> {
        let first = self.parse_condition_operand()?;
        if self.peek_logic().is_none() {
            return Ok(first);
        }

        let mut left = self.require_condition(first)?;
        while let Some(op) = self.peek_logic() {
            self.advance();
            let operand = self.parse_condition_operand()?;
            let right = self.require_condition(operand)?;
            let height = self.grow(left.height.max(right.height) + 1)?;
            left = Built {
                node: Node::logical(op, left.node, right.node),
                height,
            };
        }
        Ok(Grouped::Condition(left))
    }

    /// operand := "(" condition ")" | comparison
    ///
    /// A leading `(` may open either a condition group or the left side of
    /// a comparison, as in `(a+b) > c`. What the parenthesis holds decides:
    /// a condition closes the operand, an expression continues as the left
    /// side of a comparison.
    fn parse_condition_operand(&mut self) -> Result<Grouped> {
        let left = if self.check(TokenKind::LParen) {
            self.advance();
            let inner = self.parse_grouped()?;
            self.expect(TokenKind::RParen)?;

            match inner {
                Grouped::Condition(condition) => return Ok(Grouped::Condition(condition)),
                Grouped::Expression(inner) => {
                    let factor = self.parse_postfix(inner)?;
                    let term = self.parse_term_from(factor)?;
                    self.parse_expression_from(term)?
                }
            }
        } else {
            self.parse_expression()?
        };
        self.parse_comparison(left)
    }

    /// comparison := expression COMPARE expression
    fn parse_comparison(&mut self, left: Built) -> Result<Grouped> {
        let Some(op) = self.peek_compare() else {
            return Ok(Grouped::Expression(left));
        };
        self.advance();
        let right = self.parse_expression()?;

        let height = self.grow(left.height.max(right.height) + 1)?;
        Ok(Grouped::Condition(Built {
            node: Node::compare(op, left.node, right.node),
            height,
        }))
    }
}

/// Integers that overflow `i64` are kept as floats; non-finite values are
/// rejected.
fn parse_number(text: &str) -> Option<Number> {
    if !text.contains(['.', 'e', 'E']) {
        if let Ok(n) = text.parse::<i64>() {
            return Some(Number::Int(n));
        }
    }
    text.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(Number::Float)
}
