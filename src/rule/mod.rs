//! Rule expression parsing, evaluation, combination and rendering
//!
//! Rules are strings like "age > 30 AND (status = 'active' OR vip = 1)".
//! Comparisons are always `<field> <comparator> <value>` separated by spaces.

mod ast;
pub mod cache;
mod combinator;
mod evaluator;
pub mod parser;
mod serializer;
pub mod tokenizer;


pub use ast::*;
pub use cache::*;
pub use combinator::*;
pub use evaluator::*;
pub use parser::*;
pub use serializer::*;
pub use tokenizer::*;
