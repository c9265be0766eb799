//! Rule engine facade
//!
//! Ties the parser, evaluator and combinator to a `RuleStore` and a `ParseCache`.
//! This is the layer the Python bindings talk to.

use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::config::EngineConfig;
use crate::error::{Result, RuleEngineError};
use crate::rule::{self, Node, ParseCache, Record};
use crate::store::{Rule, RuleStore};

/// Decode a persisted AST and evaluate it against a record
pub fn evaluate_json<R: Record + ?Sized>(ast_json: &Value, record: &R) -> Result<bool> {
    let ast = Node::from_json(ast_json)?;
    Ok(rule::evaluate(&ast, record)?)
}

pub struct RuleEngine {
    config: EngineConfig,
    store: RuleStore,
    cache: ParseCache,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl RuleEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            cache: ParseCache::new(config.cache_capacity),
            store: RuleStore::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &RuleStore {
        &self.store
    }

    /// Parse through the cache after checking the length limit
    pub fn parse(&self, text: &str) -> Result<Node> {
        self.config.check_length(text)?;
        Ok(self.cache.get_or_parse(text)?)
    }

    /// Parse every rule text and join the roots with AND
    pub fn combine<S: AsRef<str>>(&self, texts: &[S]) -> Result<Node> {
        let nodes = texts
            .iter()
            .map(|text| self.parse(text.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        rule::combine_nodes(nodes)
    }

    /// Parse and store a new rule
    #[instrument(skip(self, rule_string))]
    pub fn create_rule(&self, name: &str, rule_string: &str) -> Result<u64> {
        let ast = self.parse(rule_string)?;
        Ok(self.store.insert(name, rule_string, &ast))
    }

    pub fn get_rule(&self, id: u64) -> Result<Rule> {
        self.store
            .get(id)
            .ok_or(RuleEngineError::RuleNotFound(id))
    }

    pub fn list_rules(&self) -> Vec<Rule> {
        self.store.list()
    }

    pub fn delete_rule(&self, id: u64) -> Result<()> {
        self.store.delete(id).map(|_| ())
    }

    /// Evaluate a stored rule's AST against a record
    pub fn evaluate_rule<R: Record + ?Sized>(&self, id: u64, record: &R) -> Result<bool> {
        let rule = self.get_rule(id)?;
        evaluate_json(&rule.ast_json, record)
    }

    /// Evaluate rule text directly, without storing it
    pub fn evaluate_text<R: Record + ?Sized>(&self, text: &str, record: &R) -> Result<bool> {
        let ast = self.parse(text)?;
        Ok(rule::evaluate(&ast, record)?)
    }

    /// Rendered text of the stored rules joined with AND, in the order given
    pub fn preview_combined(&self, ids: &[u64]) -> Result<String> {
        Ok(self.combine_stored(ids)?.to_string())
    }

    /// Combine stored rules and save the result as a new rule.
    ///
    /// The rendered text must itself fit `max_rule_length`, so the stored rule
    /// can be combined again later.
    #[instrument(skip(self))]
    pub fn combine_rules(&self, ids: &[u64], name: &str) -> Result<u64> {
        let combined = self.combine_stored(ids)?;
        let text = combined.to_string();
        if let Err(err) = self.config.check_length(&text) {
            warn!(sources = ids.len(), %err, "combined rule too long to store");
            return Err(err.into());
        }
        let id = self.store.insert(name, &text, &combined);
        info!(rule_id = id, sources = ids.len(), "combined rule stored");
        Ok(id)
    }

    fn combine_stored(&self, ids: &[u64]) -> Result<Node> {
        let rules = self.store.get_many(ids)?;
        let texts: Vec<&str> = rules.iter().map(|r| r.rule_string.as_str()).collect();
        self.combine(texts.as_slice())
    }
}
