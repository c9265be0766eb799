//! Error types for the rule engine

use pyo3::exceptions::{PyKeyError, PyValueError};
use pyo3::PyErr;
use thiserror::Error;

/// Failures raised while turning rule text into an AST
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Empty expression")]
    Empty,

    #[error("Rule text exceeds maximum length of {max} characters ({actual})")]
    TooLong { max: usize, actual: usize },

    #[error("Unbalanced parentheses")]
    UnbalancedParentheses,

    #[error("Incomplete comparison starting at '{0}'")]
    IncompleteComparison(String),

    #[error("Unknown comparator '{comparator}' after field '{field}'")]
    UnknownComparator { field: String, comparator: String },

    #[error("Missing value after '{field} {comparator}'")]
    MissingValue { field: String, comparator: String },

    #[error("Operator {0} is missing an operand")]
    MissingOperand(String),

    #[error("Malformed expression: {0} subtrees left after parsing")]
    Malformed(usize),

    #[error("Expression nests deeper than {max} levels")]
    TooDeep { max: usize },
}

/// Failures raised while walking an AST against a record
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("Field {0} not found in data")]
    FieldNotFound(String),

    #[error("Unsupported comparator: {0}")]
    UnsupportedComparator(String),

    #[error("Unsupported node type: {0}")]
    UnsupportedNodeType(String),

    #[error("Unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("Malformed condition: '{0}'")]
    MalformedCondition(String),

    #[error("Malformed {kind} node: missing {part}")]
    MalformedNode { kind: String, part: &'static str },

    #[error("Stored AST nests deeper than {max} levels")]
    TooDeep { max: usize },

    #[error("Cannot compare {actual} with {expected} using '{comparator}' on field {field}")]
    IncompatibleTypes {
        field: String,
        comparator: String,
        actual: &'static str,
        expected: &'static str,
    },
}

/// Main error type for the rule engine
#[derive(Error, Debug)]
pub enum RuleEngineError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("No rules provided")]
    EmptyInput,

    #[error("Rule not found: {0}")]
    RuleNotFound(u64),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for RuleEngineError {
    fn from(err: serde_json::Error) -> Self {
        RuleEngineError::Deserialization(err.to_string())
    }
}

impl From<RuleEngineError> for PyErr {
    fn from(err: RuleEngineError) -> PyErr {
        match err {
            RuleEngineError::RuleNotFound(_) => PyKeyError::new_err(err.to_string()),
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

/// Result type alias for the rule engine
pub type Result<T> = std::result::Result<T, RuleEngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_not_found_names_field() {
        let err = RuleEngineError::from(EvaluationError::FieldNotFound("age".to_string()));
        assert_eq!(err.to_string(), "Evaluation error: Field age not found in data");
    }

    #[test]
    fn test_json_error_becomes_deserialization() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = RuleEngineError::from(json_err);
        assert!(matches!(err, RuleEngineError::Deserialization(_)));
    }
}
