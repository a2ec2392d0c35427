// tests/parser_tests.rs

use flateq::ast::{BinOp, CmpOp, LogicOp, Node, Sign, Variable};
use flateq::{
    Error, Expected, LexError, ParseError, ParseOptions, Parser, TokenKind, parse_expression,
    parse_expression_with, tokenize,
};
use pretty_assertions::assert_eq;

fn parse(input: &str) -> Node {
    parse_expression(input).unwrap_or_else(|e| panic!("failed to parse {input:?}: {e}"))
}

fn parse_err(input: &str) -> ParseError {
    match parse_expression(input) {
        Err(Error::Parse(e)) => e,
        other => panic!("expected a parse error for {input:?}, got {other:?}"),
    }
}

fn var(name: &str) -> Node {
    Node::var(name)
}

fn indexed(name: &str, indices: Vec<Node>) -> Node {
    Node::Variable(Variable::named(name).with_indices(indices))
}

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn test_multiplication_binds_tighter() {
    assert_eq!(
        parse("1+2*3"),
        Node::binary(
            BinOp::Add,
            Node::int(1),
            Node::binary(BinOp::Multiply, Node::int(2), Node::int(3)),
        )
    );
}

#[test]
fn test_subtraction_is_left_associative() {
    assert_eq!(
        parse("8-3-2"),
        Node::binary(
            BinOp::Subtract,
            Node::binary(BinOp::Subtract, Node::int(8), Node::int(3)),
            Node::int(2),
        )
    );
}

#[test]
fn test_division_is_left_associative() {
    assert_eq!(
        parse("2*3/4"),
        Node::binary(
            BinOp::Divide,
            Node::binary(BinOp::Multiply, Node::int(2), Node::int(3)),
            Node::int(4),
        )
    );
}

#[test]
fn test_parentheses() {
    assert_eq!(
        parse("(1 + 2) * 3"),
        Node::binary(
            BinOp::Multiply,
            Node::binary(BinOp::Add, Node::int(1), Node::int(2)),
            Node::int(3),
        )
    );
}

#[test]
fn test_unary_minus_binds_tighter_than_binary() {
    assert_eq!(
        parse("-2*3"),
        Node::binary(
            BinOp::Multiply,
            Node::unary(Sign::Minus, Node::int(2)),
            Node::int(3),
        )
    );
}

#[test]
fn test_chained_unary() {
    assert_eq!(
        parse("--x"),
        Node::unary(Sign::Minus, Node::unary(Sign::Minus, var("x")))
    );
    assert_eq!(
        parse("a - +b"),
        Node::binary(BinOp::Subtract, var("a"), Node::unary(Sign::Plus, var("b")))
    );
}

#[test]
fn test_parenthesized_negative_literal() {
    assert_eq!(
        parse("((-0.03048374573278)*mwAux.429)"),
        Node::binary(
            BinOp::Multiply,
            Node::unary(Sign::Minus, Node::float(0.03048374573278)),
            var("mwAux.429"),
        )
    );
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_integer_and_float_literals() {
    assert_eq!(parse("10"), Node::int(10));
    assert_eq!(parse("0.5"), Node::float(0.5));
    assert_eq!(parse("1e3"), Node::float(1000.0));
    assert_eq!(parse("2."), Node::float(2.0));
}

#[test]
fn test_integer_overflow_falls_back_to_float() {
    assert_eq!(parse("99999999999999999999"), Node::float(1e20));
}

#[test]
fn test_infinite_literal_is_rejected() {
    let err = parse_err("1e999");
    assert_eq!(err.expected, Expected::FiniteNumber);
    assert_eq!(err.position, 0);
}

#[test]
fn test_string_literal() {
    assert_eq!(parse(r#""cylinder""#), Node::string(r#""cylinder""#));
}

// ============================================================================
// Variables, Calls and Indices
// ============================================================================

#[test]
fn test_dotted_variable() {
    assert_eq!(parse("body.frame_a.R.T"), var("body.frame_a.R.T"));
}

#[test]
fn test_multi_dimensional_index() {
    assert_eq!(parse("a[1,2]"), indexed("a", vec![Node::int(1), Node::int(2)]));
}

#[test]
fn test_function_call() {
    assert_eq!(
        parse("f(x, y+1)"),
        Node::call(
            var("f"),
            vec![var("x"), Node::binary(BinOp::Add, var("y"), Node::int(1))],
        )
    );
}

#[test]
fn test_call_without_arguments() {
    assert_eq!(parse("time()"), Node::call(var("time"), vec![]));
}

#[test]
fn test_postfix_applies_left_to_right() {
    assert_eq!(
        parse("f(x)[1]"),
        Node::Index {
            target: Box::new(Node::call(var("f"), vec![var("x")])),
            indices: vec![Node::int(1)],
            subnodes: vec![],
        }
    );
}

#[test]
fn test_second_index_group_wraps_variable() {
    assert_eq!(
        parse("A[1][2]"),
        Node::Index {
            target: Box::new(indexed("A", vec![Node::int(1)])),
            indices: vec![Node::int(2)],
            subnodes: vec![],
        }
    );
}

#[test]
fn test_index_after_parenthesized_variable() {
    assert_eq!(parse("(v)[2]"), indexed("v", vec![Node::int(2)]));
}

#[test]
fn test_member_chain_after_index() {
    assert_eq!(
        parse("a[i].b[j]"),
        Node::Variable(
            Variable::named("a")
                .with_indices(vec![var("i")])
                .with_subnodes(vec![Variable::named("b").with_object_args(vec![var("j")])])
        )
    );
}

#[test]
fn test_long_member_chain() {
    let node = parse("world.x_label.cylinders[1].lengthDirection[1].a[3,4,5].b[4,5,6].c[6,7].d[6]");
    let Node::Variable(variable) = node else {
        panic!("expected a variable");
    };
    assert_eq!(variable.name, "world.x_label.cylinders");
    assert_eq!(variable.indices, Some(vec![Node::int(1)]));
    let names: Vec<&str> = variable.subnodes.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["lengthDirection", "a", "b", "c", "d"]);
    assert_eq!(
        variable.subnodes[1].object_args,
        Some(vec![Node::int(3), Node::int(4), Node::int(5)])
    );
}

#[test]
fn test_member_without_brackets_is_kept() {
    assert_eq!(
        parse("a[1].b"),
        Node::Variable(
            Variable::named("a")
                .with_indices(vec![Node::int(1)])
                .with_subnodes(vec![Variable::named("b")])
        )
    );
}

#[test]
fn test_call_on_member_chain() {
    assert_eq!(
        parse("a[1].b(2)"),
        Node::call(
            Node::Variable(
                Variable::named("a")
                    .with_indices(vec![Node::int(1)])
                    .with_subnodes(vec![Variable::named("b")])
            ),
            vec![Node::int(2)],
        )
    );
}

// ============================================================================
// Conditionals
// ============================================================================

#[test]
fn test_if_else() {
    assert_eq!(
        parse("if a>1 then 2 else 3"),
        Node::if_else(
            Node::compare(CmpOp::GreaterThan, var("a"), Node::int(1)),
            Node::int(2),
            Node::int(3),
        )
    );
}

#[test]
fn test_else_if_chain() {
    assert_eq!(
        parse("if x>0 then 0 else if abs(y)>1 then 0 else 1"),
        Node::if_else(
            Node::compare(CmpOp::GreaterThan, var("x"), Node::int(0)),
            Node::int(0),
            Node::if_else(
                Node::compare(
                    CmpOp::GreaterThan,
                    Node::call(var("abs"), vec![var("y")]),
                    Node::int(1),
                ),
                Node::int(0),
                Node::int(1),
            ),
        )
    );
}

#[test]
fn test_else_branch_takes_whole_expression() {
    assert_eq!(
        parse("if a==b then 1 else 2 + 3"),
        Node::if_else(
            Node::compare(CmpOp::Equal, var("a"), var("b")),
            Node::int(1),
            Node::binary(BinOp::Add, Node::int(2), Node::int(3)),
        )
    );
}

#[test]
fn test_logical_operators_fold_left() {
    let node = parse("if a>1 and b<2 or c!=3 then 1 else 0");
    let Node::IfElse { condition, .. } = node else {
        panic!("expected if/else");
    };
    assert_eq!(
        *condition,
        Node::logical(
            LogicOp::Or,
            Node::logical(
                LogicOp::And,
                Node::compare(CmpOp::GreaterThan, var("a"), Node::int(1)),
                Node::compare(CmpOp::LessThan, var("b"), Node::int(2)),
            ),
            Node::compare(CmpOp::NotEqual, var("c"), Node::int(3)),
        )
    );
}

#[test]
fn test_parenthesized_condition_group() {
    let node = parse("if c<d and (e<5 or e>6) then 1 else 0");
    let Node::IfElse { condition, .. } = node else {
        panic!("expected if/else");
    };
    assert_eq!(
        *condition,
        Node::logical(
            LogicOp::And,
            Node::compare(CmpOp::LessThan, var("c"), var("d")),
            Node::logical(
                LogicOp::Or,
                Node::compare(CmpOp::LessThan, var("e"), Node::int(5)),
                Node::compare(CmpOp::GreaterThan, var("e"), Node::int(6)),
            ),
        )
    );
}

#[test]
fn test_whole_condition_in_parentheses() {
    assert_eq!(
        parse("if (a>=1) then 1 else 0"),
        Node::if_else(
            Node::compare(CmpOp::GreaterEqual, var("a"), Node::int(1)),
            Node::int(1),
            Node::int(0),
        )
    );
    assert_eq!(parse("if ((a>=1)) then 1 else 0"), parse("if a>=1 then 1 else 0"));
}

#[test]
fn test_parenthesized_arithmetic_in_comparison() {
    assert_eq!(
        parse("if (a+b)>c then 1 else 0"),
        Node::if_else(
            Node::compare(
                CmpOp::GreaterThan,
                Node::binary(BinOp::Add, var("a"), var("b")),
                var("c"),
            ),
            Node::int(1),
            Node::int(0),
        )
    );
}

#[test]
fn test_conditional_as_operand() {
    assert_eq!(
        parse("2 * (if a<=0 then 0 else a)"),
        Node::binary(
            BinOp::Multiply,
            Node::int(2),
            Node::if_else(
                Node::compare(CmpOp::LessEqual, var("a"), Node::int(0)),
                Node::int(0),
                var("a"),
            ),
        )
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_dangling_operator() {
    let err = parse_err("1 + ");
    assert_eq!(err.expected, Expected::Expression);
    assert_eq!(err.found, None);
    assert_eq!(err.position, 4);
}

#[test]
fn test_missing_else_is_an_error() {
    let err = parse_err("if a>1 then 2");
    assert_eq!(err.expected, Expected::Token(TokenKind::KeywordElse));
    assert_eq!(err.found, None);
}

#[test]
fn test_condition_needs_comparison() {
    let err = parse_err("if a then 1 else 2");
    assert_eq!(err.expected, Expected::Comparison);
    assert_eq!(err.found.map(|t| t.text), Some("then".to_string()));
    assert_eq!(err.position, 5);
}

#[test]
fn test_group_operand_without_comparison() {
    let err = parse_err("if (a>1 and b) then 1 else 0");
    assert_eq!(err.expected, Expected::Comparison);
    assert_eq!(err.position, 13);
}

#[test]
fn test_empty_index_group() {
    let err = parse_err("a[]");
    assert_eq!(err.expected, Expected::Expression);
    assert_eq!(err.position, 2);
}

#[test]
fn test_trailing_comma_in_call() {
    let err = parse_err("f(1,)");
    assert_eq!(err.expected, Expected::Expression);
    assert_eq!(err.found.map(|t| t.kind), Some(TokenKind::RParen));
}

#[test]
fn test_unclosed_parenthesis() {
    let err = parse_err("(1+2");
    assert_eq!(err.expected, Expected::Token(TokenKind::RParen));
    assert_eq!(err.found, None);
}

#[test]
fn test_leftover_tokens() {
    let err = parse_err("1 2");
    assert_eq!(err.expected, Expected::EndOfInput);
    assert_eq!(err.position, 2);
    assert_eq!(err.to_string(), "Expected end of input, got '2' at position 2");
}

#[test]
fn test_not_is_not_an_operand() {
    let err = parse_err("not a");
    assert_eq!(err.expected, Expected::Expression);
    assert_eq!(err.found.map(|t| t.kind), Some(TokenKind::Not));
}

#[test]
fn test_member_name_required_after_dot() {
    let err = parse_err("a[1].");
    assert_eq!(err.expected, Expected::Token(TokenKind::Identifier));
    assert_eq!(err.found, None);
}

#[test]
fn test_comparison_outside_condition() {
    let err = parse_err("a > b");
    assert_eq!(err.expected, Expected::EndOfInput);
}

#[test]
fn test_empty_input() {
    let err = parse_err("");
    assert_eq!(err.expected, Expected::Expression);
    assert_eq!(err.position, 0);
}

#[test]
fn test_lex_error_is_reported() {
    assert_eq!(
        parse_expression("a $ b"),
        Err(Error::Lex(LexError {
            position: 2,
            character: '$'
        }))
    );
}

// ============================================================================
// Nesting Limit
// ============================================================================

fn nested_parens(depth: usize) -> String {
    format!("{}1{}", "(".repeat(depth), ")".repeat(depth))
}

#[test]
fn test_nesting_within_default_limit() {
    assert_eq!(parse(&nested_parens(100)), Node::int(1));
}

#[test]
fn test_nesting_beyond_default_limit() {
    let err = parse_expression(&nested_parens(500)).unwrap_err();
    assert!(matches!(err, Error::DepthExceeded { limit: 128, .. }), "got {err:?}");
}

#[test]
fn test_custom_depth_limit() {
    let options = ParseOptions::new().with_max_depth(5);
    assert!(parse_expression_with(&nested_parens(4), &options).is_ok());
    assert_eq!(
        parse_expression_with(&nested_parens(5), &options),
        Err(Error::DepthExceeded {
            limit: 5,
            position: 5
        })
    );
}

#[test]
fn test_unary_chain_is_bounded() {
    let input = format!("{}1", "-".repeat(10_000));
    let err = parse_expression(&input).unwrap_err();
    assert!(matches!(err, Error::DepthExceeded { .. }));
}

#[test]
fn test_condition_nesting_is_bounded() {
    let input = format!(
        "if {}a>1{} then 1 else 0",
        "(".repeat(300),
        ")".repeat(300)
    );
    let err = parse_expression(&input).unwrap_err();
    assert!(matches!(err, Error::DepthExceeded { .. }), "got {err:?}");
}

#[test]
fn test_long_sum_is_bounded() {
    let input = vec!["x"; 300_000].join("+");
    assert_eq!(
        parse_expression(&input),
        Err(Error::DepthExceeded {
            limit: 128,
            position: 257
        })
    );
}

#[test]
fn test_sum_at_the_limit() {
    let node = parse(&vec!["x"; 128].join("+"));
    assert_eq!(node.height(), 128);
    assert!(parse_expression(&vec!["x"; 129].join("+")).is_err());
}

#[test]
fn test_postfix_chains_are_bounded() {
    for input in [
        format!("f{}", "()".repeat(10_000)),
        format!("a{}", "[1]".repeat(10_000)),
        format!("f(x){}", "[1]".repeat(10_000)),
    ] {
        let err = parse_expression(&input).unwrap_err();
        assert!(matches!(err, Error::DepthExceeded { limit: 128, .. }), "got {err:?}");
    }
}

#[test]
fn test_product_chain_is_bounded() {
    let input = vec!["2"; 10_000].join(" * ");
    assert!(matches!(
        parse_expression(&input),
        Err(Error::DepthExceeded { .. })
    ));
}

// ============================================================================
// Nested Conditions
// ============================================================================

/// `if (if (… a > 0 …) > 0 then 1 else 2) > 0 then 1 else 2`
fn nested_conditions(levels: usize) -> String {
    let mut text = "if a > 0 then 1 else 2".to_string();
    for _ in 1..levels {
        text = format!("if ({text}) > 0 then 1 else 2");
    }
    text
}

#[test]
fn test_nested_conditions_parse_in_linear_time() {
    let options = ParseOptions::new().with_max_depth(256);
    let input = nested_conditions(60);

    let started = std::time::Instant::now();
    let node = parse_expression_with(&input, &options).unwrap();
    let elapsed = started.elapsed();

    assert_eq!(node.height(), 121);
    assert!(elapsed.as_secs() < 2, "took {elapsed:?}");
}

#[test]
fn test_nested_condition_shape() {
    assert_eq!(
        parse(&nested_conditions(2)),
        Node::if_else(
            Node::compare(
                CmpOp::GreaterThan,
                Node::if_else(
                    Node::compare(CmpOp::GreaterThan, var("a"), Node::int(0)),
                    Node::int(1),
                    Node::int(2),
                ),
                Node::int(0),
            ),
            Node::int(1),
            Node::int(2),
        )
    );
}

#[test]
fn test_parenthesized_operand_continues_as_arithmetic() {
    assert_eq!(
        parse("if ((a+b)*2 > c) then 1 else 0"),
        Node::if_else(
            Node::compare(
                CmpOp::GreaterThan,
                Node::binary(
                    BinOp::Multiply,
                    Node::binary(BinOp::Add, var("a"), var("b")),
                    Node::int(2),
                ),
                var("c"),
            ),
            Node::int(1),
            Node::int(0),
        )
    );
}

#[test]
fn test_logical_operator_after_plain_operand() {
    let err = parse_err("if (a and b>1) then 1 else 0");
    assert_eq!(err.expected, Expected::Comparison);
    assert_eq!(err.found.map(|t| t.kind), Some(TokenKind::And));
}

// ============================================================================
// Parser Instances
// ============================================================================

#[test]
fn test_parser_over_token_stream() {
    let tokens = tokenize("x*y").unwrap();
    let parser = Parser::new(tokens);
    assert_eq!(parser.token_count(), 3);
    assert_eq!(
        parser.parse().unwrap(),
        Node::binary(BinOp::Multiply, var("x"), var("y"))
    );
}

#[test]
fn test_parse_is_deterministic() {
    let input = "if a[1]>0.5 and f(b) < 2 then sin(x[1,2].y[3]) else -z";
    assert_eq!(parse(input), parse(input));
}
