use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ast::{BinOp, CmpOp, LogicOp, Sign};

/// Numeric literal value. Integers stay integers; anything written with a
/// decimal point or exponent is a float.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(n) => n,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(n) => write!(f, "{n}"),
            // Debug keeps the decimal point (`1.0`), so the text lexes back as a float.
            Number::Float(n) => write!(f, "{n:?}"),
        }
    }
}

/// A variable reference with its optional index group and member chain.
///
/// # Examples
/// ```text
/// body.frame_a.R.T          // name only
/// A[1,2]                    // indices
/// cyl[1].dir[2].a[3,4]      // indices, then two subnodes with args
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indices: Option<Vec<Node>>,

    /// Bracket group following a member name in a dotted chain.
    #[serde(rename = "args", default, skip_serializing_if = "Option::is_none")]
    pub object_args: Option<Vec<Node>>,

    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        with = "tagged_members"
    )]
    pub subnodes: Vec<Variable>,
}

impl Variable {
    pub fn named(name: impl Into<String>) -> Self {
        Variable {
            name: name.into(),
            indices: None,
            object_args: None,
            subnodes: Vec::new(),
        }
    }

    pub fn with_indices(mut self, indices: Vec<Node>) -> Self {
        self.indices = Some(indices);
        self
    }

    pub fn with_object_args(mut self, args: Vec<Node>) -> Self {
        self.object_args = Some(args);
        self
    }

    pub fn with_subnodes(mut self, subnodes: Vec<Variable>) -> Self {
        self.subnodes = subnodes;
        self
    }

    /// True when nothing but the name was parsed.
    pub fn is_bare(&self) -> bool {
        self.indices.is_none() && self.object_args.is_none() && self.subnodes.is_empty()
    }

    fn walk_children<'a, F: FnMut(&'a Node)>(&'a self, visit: &mut F) {
        for node in self.indices.iter().chain(&self.object_args).flatten() {
            node.walk(visit);
        }
        for member in &self.subnodes {
            member.walk_children(visit);
        }
    }

    fn height(&self) -> usize {
        let groups = self
            .indices
            .iter()
            .chain(&self.object_args)
            .flatten()
            .map(Node::height);
        let members = self.subnodes.iter().map(Variable::height);
        1 + groups.chain(members).max().unwrap_or(0)
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        push_unique(out, &self.name);
        self.collect_nested_variables(out);
    }

    fn collect_nested_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        for node in self.indices.iter().chain(&self.object_args).flatten() {
            node.collect_variables(out);
        }
        for member in &self.subnodes {
            member.collect_nested_variables(out);
        }
    }
}

/// Abstract syntax tree node for the right-hand side of an equation.
///
/// Serializes with a `type` discriminator and exactly the fields of the
/// variant, e.g. `{"type": "binary_op", "operator": "+", "left": …, "right": …}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    /// Integer or float literal
    #[serde(rename = "number")]
    NumberLiteral { value: Number },

    /// String literal, surrounding quotes kept
    ///
    /// # Example
    /// ```text
    /// "cylinder"
    /// ```
    #[serde(rename = "string")]
    StringLiteral { value: String },

    /// Variable reference
    Variable(Variable),

    /// Prefix `+` or `-`
    UnaryOp { operator: Sign, operand: Box<Node> },

    /// Arithmetic operation
    BinaryOp {
        operator: BinOp,
        left: Box<Node>,
        right: Box<Node>,
    },

    /// Comparison, only found inside conditions
    Compare {
        operator: CmpOp,
        left: Box<Node>,
        right: Box<Node>,
    },

    /// `and` / `or` combination of conditions
    LogicalOp {
        operator: LogicOp,
        left: Box<Node>,
        right: Box<Node>,
    },

    /// Function call
    ///
    /// # Examples
    /// ```text
    /// sin(tr.y[1,1])
    /// Frames.Quaternions.from_T(R.T, mwAux.28)
    /// ```
    FuncCall { callee: Box<Node>, args: Vec<Node> },

    /// Index access on something other than a bare variable
    ///
    /// # Examples
    /// ```text
    /// f(x)[1]
    /// A[1][2]
    /// ```
    Index {
        target: Box<Node>,
        indices: Vec<Node>,
        #[serde(
            default,
            skip_serializing_if = "Vec::is_empty",
            with = "tagged_members"
        )]
        subnodes: Vec<Variable>,
    },

    /// Conditional expression; the `else` branch is mandatory
    IfElse {
        condition: Box<Node>,
        then_branch: Box<Node>,
        else_branch: Box<Node>,
    },
}

impl Node {
    pub fn int(value: i64) -> Self {
        Node::NumberLiteral {
            value: Number::Int(value),
        }
    }

    pub fn float(value: f64) -> Self {
        Node::NumberLiteral {
            value: Number::Float(value),
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Node::StringLiteral {
            value: value.into(),
        }
    }

    pub fn var(name: impl Into<String>) -> Self {
        Node::Variable(Variable::named(name))
    }

    pub fn unary(operator: Sign, operand: Node) -> Self {
        Node::UnaryOp {
            operator,
            operand: Box::new(operand),
        }
    }

    pub fn binary(operator: BinOp, left: Node, right: Node) -> Self {
        Node::BinaryOp {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn compare(operator: CmpOp, left: Node, right: Node) -> Self {
        Node::Compare {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn logical(operator: LogicOp, left: Node, right: Node) -> Self {
        Node::LogicalOp {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn call(callee: Node, args: Vec<Node>) -> Self {
        Node::FuncCall {
            callee: Box::new(callee),
            args,
        }
    }

    pub fn if_else(condition: Node, then_branch: Node, else_branch: Node) -> Self {
        Node::IfElse {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }

    /// Applies an index group (and the member chain that followed it).
    ///
    /// A bare variable absorbs the group into its own `indices`; anything
    /// else is wrapped in [`Node::Index`].
    pub fn indexed(self, indices: Vec<Node>, subnodes: Vec<Variable>) -> Self {
        match self {
            Node::Variable(var) if var.is_bare() => {
                Node::Variable(var.with_indices(indices).with_subnodes(subnodes))
            }
            target => Node::Index {
                target: Box::new(target),
                indices,
                subnodes,
            },
        }
    }

    /// Visits this node and every descendant in pre-order, left to right.
    /// Member chains are visited through their argument expressions.
    pub fn walk<'a, F: FnMut(&'a Node)>(&'a self, visit: &mut F) {
        visit(self);
        match self {
            Node::NumberLiteral { .. } | Node::StringLiteral { .. } => {}
            Node::Variable(var) => var.walk_children(visit),
            Node::UnaryOp { operand, .. } => operand.walk(visit),
            Node::BinaryOp { left, right, .. }
            | Node::Compare { left, right, .. }
            | Node::LogicalOp { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            Node::FuncCall { callee, args } => {
                callee.walk(visit);
                for arg in args {
                    arg.walk(visit);
                }
            }
            Node::Index {
                target,
                indices,
                subnodes,
            } => {
                target.walk(visit);
                for index in indices {
                    index.walk(visit);
                }
                for member in subnodes {
                    member.walk_children(visit);
                }
            }
            Node::IfElse {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.walk(visit);
                then_branch.walk(visit);
                else_branch.walk(visit);
            }
        }
    }

    /// Number of levels on the longest path down from this node. A member
    /// of a chain counts as a level of its own.
    ///
    /// Parsed trees never exceed [`ParseOptions::max_depth`](crate::ParseOptions).
    pub fn height(&self) -> usize {
        let children = match self {
            Node::NumberLiteral { .. } | Node::StringLiteral { .. } => 0,
            Node::Variable(var) => return var.height(),
            Node::UnaryOp { operand, .. } => operand.height(),
            Node::BinaryOp { left, right, .. }
            | Node::Compare { left, right, .. }
            | Node::LogicalOp { left, right, .. } => left.height().max(right.height()),
            Node::FuncCall { callee, args } => args
                .iter()
                .map(Node::height)
                .fold(callee.height(), usize::max),
            Node::Index {
                target,
                indices,
                subnodes,
            } => indices
                .iter()
                .map(Node::height)
                .chain(subnodes.iter().map(Variable::height))
                .fold(target.height(), usize::max),
            Node::IfElse {
                condition,
                then_branch,
                else_branch,
            } => condition
                .height()
                .max(then_branch.height())
                .max(else_branch.height()),
        };
        children + 1
    }

    /// String literals in source order, quotes included.
    pub fn string_literals(&self) -> Vec<&str> {
        let mut literals = Vec::new();
        self.walk(&mut |node| {
            if let Node::StringLiteral { value } = node {
                literals.push(value.as_str());
            }
        });
        literals
    }

    /// Distinct names of referenced variables, in order of first appearance.
    ///
    /// A bare variable used as a callee names a function, not a value, and
    /// is left out.
    pub fn variable_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Node::NumberLiteral { .. } | Node::StringLiteral { .. } => {}
            Node::Variable(var) => var.collect_variables(out),
            Node::UnaryOp { operand, .. } => operand.collect_variables(out),
            Node::BinaryOp { left, right, .. }
            | Node::Compare { left, right, .. }
            | Node::LogicalOp { left, right, .. } => {
                left.collect_variables(out);
                right.collect_variables(out);
            }
            Node::FuncCall { callee, args } => {
                match callee.as_ref() {
                    Node::Variable(var) if var.is_bare() => {}
                    other => other.collect_variables(out),
                }
                for arg in args {
                    arg.collect_variables(out);
                }
            }
            Node::Index {
                target,
                indices,
                subnodes,
            } => {
                target.collect_variables(out);
                for index in indices {
                    index.collect_variables(out);
                }
                for member in subnodes {
                    member.collect_nested_variables(out);
                }
            }
            Node::IfElse {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.collect_variables(out);
                then_branch.collect_variables(out);
                else_branch.collect_variables(out);
            }
        }
    }

    /// Writes the node so that it can stand in front of a postfix `(` or `[`.
    ///
    /// Before `[`, a trailing member chain must be closed off too, or the
    /// bracket group would read back as the last member's arguments.
    fn fmt_postfix_target(&self, f: &mut fmt::Formatter<'_>, indexing: bool) -> fmt::Result {
        let wrap = match self {
            Node::NumberLiteral { .. } | Node::StringLiteral { .. } | Node::UnaryOp { .. } => true,
            Node::Variable(var) => {
                indexing && (!var.subnodes.is_empty() || var.object_args.is_some())
            }
            Node::Index { subnodes, .. } => indexing && !subnodes.is_empty(),
            _ => false,
        };
        if wrap {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

fn push_unique<'a>(out: &mut Vec<&'a str>, name: &'a str) {
    if !out.contains(&name) {
        out.push(name);
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, nodes: &[Node]) -> fmt::Result {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{node}")?;
    }
    Ok(())
}

fn write_members(f: &mut fmt::Formatter<'_>, members: &[Variable]) -> fmt::Result {
    for member in members {
        write!(f, ".{member}")?;
    }
    Ok(())
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for group in self.indices.iter().chain(&self.object_args) {
            f.write_str("[")?;
            write_list(f, group)?;
            f.write_str("]")?;
        }
        write_members(f, &self.subnodes)
    }
}

/// Renders canonical expression text. Every binary, comparison, logical and
/// conditional node is parenthesized, so parsing the output gives back the
/// same tree.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::NumberLiteral { value } => write!(f, "{value}"),
            Node::StringLiteral { value } => f.write_str(value),
            Node::Variable(var) => write!(f, "{var}"),
            Node::UnaryOp { operator, operand } => write!(f, "{operator}{operand}"),
            Node::BinaryOp {
                operator,
                left,
                right,
            } => write!(f, "({left} {operator} {right})"),
            Node::Compare {
                operator,
                left,
                right,
            } => write!(f, "({left} {operator} {right})"),
            Node::LogicalOp {
                operator,
                left,
                right,
            } => write!(f, "({left} {operator} {right})"),
            Node::FuncCall { callee, args } => {
                callee.fmt_postfix_target(f, false)?;
                f.write_str("(")?;
                write_list(f, args)?;
                f.write_str(")")
            }
            Node::Index {
                target,
                indices,
                subnodes,
            } => {
                target.fmt_postfix_target(f, true)?;
                f.write_str("[")?;
                write_list(f, indices)?;
                f.write_str("]")?;
                write_members(f, subnodes)
            }
            Node::IfElse {
                condition,
                then_branch,
                else_branch,
            } => write!(f, "(if {condition} then {then_branch} else {else_branch})"),
        }
    }
}

/// Serializes member chains as a list of `{"type": "variable", …}` maps so
/// that every node in the structured form carries a discriminator.
mod tagged_members {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Variable;

    #[derive(Serialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    enum TaggedRef<'a> {
        Variable(&'a Variable),
    }

    #[derive(Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    enum Tagged {
        Variable(Variable),
    }

    pub fn serialize<S: Serializer>(members: &[Variable], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(members.iter().map(TaggedRef::Variable))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Variable>, D::Error> {
        let members = Vec::<Tagged>::deserialize(deserializer)?;
        Ok(members
            .into_iter()
            .map(|Tagged::Variable(member)| member)
            .collect())
    }
}
