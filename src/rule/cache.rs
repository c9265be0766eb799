//! Rule parsing cache - keyed by rule text with fast hashing

use ahash::AHashMap;
use parking_lot::RwLock;

use crate::error::ParseError;
use crate::rule::ast::Node;
use crate::rule::parser;

/// Bounded text → AST cache. Cleared wholesale when full.
pub struct ParseCache {
    entries: RwLock<AHashMap<String, Node>>,
    capacity: usize,
}

impl ParseCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(AHashMap::with_capacity(capacity)),
            capacity,
        }
    }

    /// Get or parse a rule string. Failed parses are not cached.
    #[inline]
    pub fn get_or_parse(&self, text: &str) -> Result<Node, ParseError> {
        // Fast path: read lock only
        {
            let entries = self.entries.read();
            if let Some(ast) = entries.get(text) {
                return Ok(ast.clone());
            }
        }

        let ast = parser::parse(text)?;

        if self.capacity > 0 {
            let mut entries = self.entries.write();
            if entries.len() >= self.capacity {
                tracing::debug!(capacity = self.capacity, "parse cache full, clearing");
                entries.clear();
            }
            entries.insert(text.to_string(), ast.clone());
        }

        Ok(ast)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
