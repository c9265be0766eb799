//! Combining several rules into one AST

use crate::error::{ParseError, Result, RuleEngineError};
use crate::rule::ast::{LogicalOp, Node, MAX_DEPTH};
use crate::rule::parser::parse;

/// Parse every rule and join them with AND, first rule leftmost.
///
/// A single rule comes back as its own AST.
pub fn combine<S: AsRef<str>>(rules: &[S]) -> Result<Node> {
    let nodes = rules
        .iter()
        .map(|rule| parse(rule.as_ref()))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    combine_nodes(nodes)
}

/// Left-fold already parsed roots into a single AND tree.
///
/// Each extra rule adds a level, so folding too many fails with `TooDeep`.
pub fn combine_nodes<I>(nodes: I) -> Result<Node>
where
    I: IntoIterator<Item = Node>,
{
    let mut nodes = nodes.into_iter();
    let first = nodes.next().ok_or(RuleEngineError::EmptyInput)?;
    let mut depth = first.depth();
    nodes.try_fold(first, |acc, node| {
        depth = depth.max(node.depth()) + 1;
        if depth > MAX_DEPTH {
            return Err(ParseError::TooDeep { max: MAX_DEPTH }.into());
        }
        Ok(Node::operator(LogicalOp::And, acc, node))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_folds_left() {
        let ast = combine(&["a > 1", "b < 2", "c = 3"]).unwrap();
        assert_eq!(
            ast,
            Node::operator(
                LogicalOp::And,
                Node::operator(LogicalOp::And, Node::operand("a > 1"), Node::operand("b < 2")),
                Node::operand("c = 3"),
            )
        );
    }

    #[test]
    fn test_combine_single_rule_is_unchanged() {
        let ast = combine(&["a > 1 OR b > 2"]).unwrap();
        assert_eq!(ast, parse("a > 1 OR b > 2").unwrap());
    }

    #[test]
    fn test_combine_keeps_complex_roots_intact() {
        let ast = combine(&["a > 1 OR b > 2", "c = 3"]).unwrap();
        match ast {
            Node::Operator { op, left, .. } => {
                assert_eq!(op, LogicalOp::And);
                assert!(matches!(*left, Node::Operator { op: LogicalOp::Or, .. }));
            }
            _ => panic!("Expected AND at the root"),
        }
    }

    #[test]
    fn test_combine_empty() {
        let rules: [&str; 0] = [];
        assert!(matches!(combine(&rules), Err(RuleEngineError::EmptyInput)));
    }

    #[test]
    fn test_combine_propagates_parse_error() {
        let err = combine(&["a > 1", "(b < 2"]).unwrap_err();
        assert!(matches!(
            err,
            RuleEngineError::Parse(ParseError::UnbalancedParentheses)
        ));
    }

    #[test]
    fn test_combine_too_many_rules() {
        let rules = vec!["a > 1"; MAX_DEPTH + 1];
        assert!(matches!(
            combine(rules.as_slice()),
            Err(RuleEngineError::Parse(ParseError::TooDeep { max: MAX_DEPTH }))
        ));

        let rules = vec!["a > 1"; MAX_DEPTH];
        assert_eq!(combine(rules.as_slice()).unwrap().depth(), MAX_DEPTH);
    }
}
