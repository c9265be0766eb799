//! Rule string parser
//!
//! Shift/reduce over two stacks. AND and OR share one precedence level and
//! associate to the left, so `a > 1 OR b > 1 AND c > 1` groups as
//! `(a > 1 OR b > 1) AND c > 1`. Stored rules depend on this grouping.

use smallvec::SmallVec;

use crate::error::ParseError;
use crate::rule::ast::{Comparator, LogicalOp, Node, MAX_DEPTH};
use crate::rule::tokenizer::{tokenize, Token};

/// Entry of the operator stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    OpenParen,
    Op(LogicalOp),
}

/// Subtree on the operand stack with its depth
type Subtree = (Node, usize);

/// Parse a rule string into an AST
pub fn parse(text: &str) -> Result<Node, ParseError> {
    let tokens = tokenize(text);
    parse_tokens(&tokens)
}

fn parse_tokens(tokens: &[Token<'_>]) -> Result<Node, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut operands: Vec<Subtree> = Vec::new();
    let mut operators: SmallVec<[Pending; 8]> = SmallVec::new();

    let mut i = 0;
    while i < tokens.len() {
        match tokens[i] {
            Token::OpenParen => operators.push(Pending::OpenParen),
            Token::CloseParen => loop {
                match operators.pop() {
                    Some(Pending::Op(op)) => reduce(&mut operands, op)?,
                    Some(Pending::OpenParen) => break,
                    None => return Err(ParseError::UnbalancedParentheses),
                }
            },
            Token::And | Token::Or => {
                while let Some(&Pending::Op(op)) = operators.last() {
                    operators.pop();
                    reduce(&mut operands, op)?;
                }
                let op = if tokens[i] == Token::And {
                    LogicalOp::And
                } else {
                    LogicalOp::Or
                };
                operators.push(Pending::Op(op));
            }
            Token::Word(field) => {
                operands.push((parse_comparison(field, &tokens[i + 1..])?, 1));
                i += 2;
            }
        }
        i += 1;
    }

    while let Some(pending) = operators.pop() {
        match pending {
            Pending::Op(op) => reduce(&mut operands, op)?,
            Pending::OpenParen => return Err(ParseError::UnbalancedParentheses),
        }
    }

    match operands.len() {
        1 => operands
            .pop()
            .map(|(node, _)| node)
            .ok_or(ParseError::Malformed(0)),
        n => Err(ParseError::Malformed(n)),
    }
}

/// Build an operand from `field` and the two tokens that follow it
fn parse_comparison(field: &str, rest: &[Token<'_>]) -> Result<Node, ParseError> {
    let comparator = match rest.first() {
        Some(token) => token,
        None => return Err(ParseError::IncompleteComparison(field.to_string())),
    };

    let comparator = match comparator {
        Token::Word(symbol) if Comparator::from_symbol(symbol).is_some() => *symbol,
        other => {
            return Err(ParseError::UnknownComparator {
                field: field.to_string(),
                comparator: other.to_string(),
            })
        }
    };

    match rest.get(1) {
        Some(Token::Word(value)) => Ok(Node::operand(format!("{field} {comparator} {value}"))),
        _ => Err(ParseError::MissingValue {
            field: field.to_string(),
            comparator: comparator.to_string(),
        }),
    }
}

/// Pop right then left subtree and join them under `op`
fn reduce(operands: &mut Vec<Subtree>, op: LogicalOp) -> Result<(), ParseError> {
    let right = operands.pop();
    let left = operands.pop();
    match (left, right) {
        (Some((left, left_depth)), Some((right, right_depth))) => {
            let depth = left_depth.max(right_depth) + 1;
            if depth > MAX_DEPTH {
                return Err(ParseError::TooDeep { max: MAX_DEPTH });
            }
            operands.push((Node::operator(op, left, right), depth));
            Ok(())
        }
        _ => Err(ParseError::MissingOperand(op.to_string())),
    }
}
