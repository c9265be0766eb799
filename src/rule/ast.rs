//! Abstract Syntax Tree for rule expressions

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::EvaluationError;

/// Recognized comparison symbols, longest first so prefixes never shadow.
pub const COMPARATOR_SYMBOLS: [&str; 6] = [">=", "<=", "!=", ">", "<", "="];

/// Node type tag for operator nodes in the persisted format
pub const OPERATOR_TYPE: &str = "operator";
/// Node type tag for operand nodes in the persisted format
pub const OPERAND_TYPE: &str = "operand";

/// Deepest tree the parser, combinator and decoder will build.
///
/// Evaluation, rendering and encoding recurse once per level.
pub const MAX_DEPTH: usize = 256;

/// AST node for rule expressions
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "NodeRecord")]
pub enum Node {
    /// Logical combination of two subtrees
    Operator {
        op: LogicalOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// Single comparison like "age > 30"
    Operand { condition: String },
}

impl Node {
    pub fn operator(op: LogicalOp, left: Node, right: Node) -> Self {
        Node::Operator {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn operand(condition: impl Into<String>) -> Self {
        Node::Operand {
            condition: condition.into(),
        }
    }

    /// Number of operand leaves in the tree
    pub fn operand_count(&self) -> usize {
        match self {
            Node::Operand { .. } => 1,
            Node::Operator { left, right, .. } => left.operand_count() + right.operand_count(),
        }
    }

    /// Levels from the root to the deepest leaf; a lone operand is 1
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 1)];
        while let Some((node, depth)) = pending.pop() {
            deepest = deepest.max(depth);
            if let Node::Operator { left, right, .. } = node {
                pending.push((left, depth + 1));
                pending.push((right, depth + 1));
            }
        }
        deepest
    }

    /// Convert to the persisted JSON form
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        match self {
            Node::Operator { op, left, right } => {
                object.insert("type".to_string(), Value::from(OPERATOR_TYPE));
                object.insert("value".to_string(), Value::from(op.as_str()));
                object.insert("left".to_string(), left.to_json());
                object.insert("right".to_string(), right.to_json());
            }
            Node::Operand { condition } => {
                object.insert("type".to_string(), Value::from(OPERAND_TYPE));
                object.insert("value".to_string(), Value::from(condition.as_str()));
            }
        }
        Value::Object(object)
    }

    /// Decode a persisted JSON AST.
    ///
    /// Shape errors (non-object, non-string value) are deserialization errors; an unknown
    /// node type, unknown operator symbol, missing child or excessive nesting is an
    /// evaluation error.
    pub fn from_json(value: &Value) -> crate::error::Result<Node> {
        if nesting(value) > MAX_DEPTH {
            return Err(EvaluationError::TooDeep { max: MAX_DEPTH }.into());
        }
        let record = NodeRecord::deserialize(value)?;
        Ok(Node::try_from(record)?)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        NodeRecord::from(self).serialize(serializer)
    }
}

/// Boolean operators joining two subtrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "AND" => Some(LogicalOp::And),
            "OR" => Some(LogicalOp::Or),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    /// Greater than (>)
    Greater,
    /// Less than (<)
    Less,
    /// Greater than or equal (>=)
    GreaterEqual,
    /// Less than or equal (<=)
    LessEqual,
    /// Equal (=)
    Equal,
    /// Not equal (!=)
    NotEqual,
}

impl Comparator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            ">" => Some(Comparator::Greater),
            "<" => Some(Comparator::Less),
            ">=" => Some(Comparator::GreaterEqual),
            "<=" => Some(Comparator::LessEqual),
            "=" => Some(Comparator::Equal),
            "!=" => Some(Comparator::NotEqual),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Comparator::Greater => ">",
            Comparator::Less => "<",
            Comparator::GreaterEqual => ">=",
            Comparator::LessEqual => "<=",
            Comparator::Equal => "=",
            Comparator::NotEqual => "!=",
        }
    }

    /// Whether the comparator needs an ordering between operands
    pub fn is_ordering(self) -> bool {
        !matches!(self, Comparator::Equal | Comparator::NotEqual)
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Object/array nesting of a JSON value, counted without recursion
fn nesting(value: &Value) -> usize {
    let mut deepest = 0;
    let mut pending = vec![(value, 1)];
    while let Some((value, depth)) = pending.pop() {
        match value {
            Value::Object(map) => pending.extend(map.values().map(|child| (child, depth + 1))),
            Value::Array(items) => pending.extend(items.iter().map(|child| (child, depth + 1))),
            _ => continue,
        }
        deepest = deepest.max(depth);
    }
    deepest
}

/// Persisted node layout: `{"type", "value", "left", "right"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<Box<NodeRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<Box<NodeRecord>>,
}

impl From<&Node> for NodeRecord {
    fn from(node: &Node) -> Self {
        match node {
            Node::Operator { op, left, right } => NodeRecord {
                kind: OPERATOR_TYPE.to_string(),
                value: Some(op.as_str().to_string()),
                left: Some(Box::new(NodeRecord::from(left.as_ref()))),
                right: Some(Box::new(NodeRecord::from(right.as_ref()))),
            },
            Node::Operand { condition } => NodeRecord {
                kind: OPERAND_TYPE.to_string(),
                value: Some(condition.clone()),
                left: None,
                right: None,
            },
        }
    }
}

impl TryFrom<NodeRecord> for Node {
    type Error = EvaluationError;

    fn try_from(record: NodeRecord) -> Result<Self, Self::Error> {
        let missing = |kind: &str, part| EvaluationError::MalformedNode {
            kind: kind.to_string(),
            part,
        };

        match record.kind.as_str() {
            OPERATOR_TYPE => {
                let symbol = record.value.ok_or_else(|| missing(OPERATOR_TYPE, "value"))?;
                let op = LogicalOp::from_symbol(&symbol)
                    .ok_or(EvaluationError::UnsupportedOperator(symbol))?;
                let left = record.left.ok_or_else(|| missing(OPERATOR_TYPE, "left"))?;
                let right = record.right.ok_or_else(|| missing(OPERATOR_TYPE, "right"))?;
                Ok(Node::operator(
                    op,
                    Node::try_from(*left)?,
                    Node::try_from(*right)?,
                ))
            }
            OPERAND_TYPE => {
                let condition = record.value.ok_or_else(|| missing(OPERAND_TYPE, "value"))?;
                Ok(Node::Operand { condition })
            }
            other => Err(EvaluationError::UnsupportedNodeType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuleEngineError;
    use serde_json::json;

    fn sample() -> Node {
        Node::operator(
            LogicalOp::Or,
            Node::operand("a > 1"),
            Node::operand("b = 'x'"),
        )
    }

    #[test]
    fn test_persisted_layout() {
        let value = sample().to_json();
        assert_eq!(
            value,
            json!({
                "type": "operator",
                "value": "OR",
                "left": {"type": "operand", "value": "a > 1"},
                "right": {"type": "operand", "value": "b = 'x'"}
            })
        );
    }

    #[test]
    fn test_persisted_key_order() {
        let text = serde_json::to_string(&Node::operand("a > 1")).unwrap();
        assert_eq!(text, r#"{"type":"operand","value":"a > 1"}"#);

        let text = serde_json::to_string(&sample()).unwrap();
        assert!(text.starts_with(r#"{"type":"operator","value":"OR","left":"#));
    }

    #[test]
    fn test_from_json_restores_tree() {
        let node = Node::from_json(&sample().to_json()).unwrap();
        assert_eq!(node, sample());

        let node: Node = serde_json::from_value(sample().to_json()).unwrap();
        assert_eq!(node, sample());
    }

    #[test]
    fn test_unknown_node_type() {
        let err = Node::from_json(&json!({"type": "function", "value": "f"})).unwrap_err();
        assert!(matches!(
            err,
            RuleEngineError::Evaluation(EvaluationError::UnsupportedNodeType(ref t))
                if t == "function"
        ));
    }

    #[test]
    fn test_unknown_operator_symbol() {
        let err = Node::from_json(&json!({
            "type": "operator",
            "value": "XOR",
            "left": {"type": "operand", "value": "a > 1"},
            "right": {"type": "operand", "value": "b > 1"}
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            RuleEngineError::Evaluation(EvaluationError::UnsupportedOperator(_))
        ));
    }

    #[test]
    fn test_operator_missing_child() {
        let err = Node::from_json(&json!({
            "type": "operator",
            "value": "AND",
            "left": {"type": "operand", "value": "a > 1"}
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            RuleEngineError::Evaluation(EvaluationError::MalformedNode { part: "right", .. })
        ));
    }

    #[test]
    fn test_non_object_is_deserialization_error() {
        let err = Node::from_json(&json!("a > 1")).unwrap_err();
        assert!(matches!(err, RuleEngineError::Deserialization(_)));
    }

    #[test]
    fn test_comparator_symbols() {
        for symbol in COMPARATOR_SYMBOLS {
            let comparator = Comparator::from_symbol(symbol).unwrap();
            assert_eq!(comparator.as_str(), symbol);
        }
        assert_eq!(Comparator::from_symbol("=="), None);
        assert!(Comparator::Greater.is_ordering());
        assert!(!Comparator::NotEqual.is_ordering());
    }

    #[test]
    fn test_operand_count() {
        assert_eq!(sample().operand_count(), 2);
    }

    #[test]
    fn test_depth() {
        assert_eq!(Node::operand("a > 1").depth(), 1);
        assert_eq!(sample().depth(), 2);
        let nested = Node::operator(LogicalOp::And, sample(), Node::operand("c < 3"));
        assert_eq!(nested.depth(), 3);
    }

    #[test]
    fn test_from_json_rejects_deep_nesting() {
        let mut value = json!({"type": "operand", "value": "a > 1"});
        for _ in 0..MAX_DEPTH {
            value = json!({
                "type": "operator",
                "value": "AND",
                "left": value,
                "right": {"type": "operand", "value": "b > 1"}
            });
        }
        let err = Node::from_json(&value).unwrap_err();
        assert!(matches!(
            err,
            RuleEngineError::Evaluation(EvaluationError::TooDeep { max: MAX_DEPTH })
        ));
    }

    #[test]
    fn test_from_json_accepts_depth_limit() {
        let mut node = Node::operand("a > 1");
        for _ in 1..MAX_DEPTH {
            node = Node::operator(LogicalOp::Or, node, Node::operand("b > 1"));
        }
        assert_eq!(node.depth(), MAX_DEPTH);
        assert_eq!(Node::from_json(&node.to_json()).unwrap(), node);
    }
}
