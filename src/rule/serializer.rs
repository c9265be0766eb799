//! Rendering an AST back to rule text

use std::fmt;

use crate::rule::ast::Node;

/// Render a node as fully parenthesized rule text.
///
/// The output re-parses to an equivalent tree; it need not match the original text.
pub fn to_rule_string(node: &Node) -> String {
    node.to_string()
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Operand { condition } => f.write_str(condition),
            Node::Operator { op, left, right } => write!(f, "({left} {op} {right})"),
        }
    }
}
