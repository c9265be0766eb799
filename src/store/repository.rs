//! Rule repository

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::{info, instrument, warn};

use crate::error::{Result, RuleEngineError};
use crate::rule::Node;
use crate::store::model::Rule;

/// Thread-safe rule storage with sequential ids starting at 1
pub struct RuleStore {
    rules: RwLock<BTreeMap<u64, Rule>>,
    next_id: AtomicU64,
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleStore {
    pub fn new() -> Self {
        Self {
            rules: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Store a parsed rule and return its id
    #[instrument(skip(self, rule_string, ast))]
    pub fn insert(&self, name: &str, rule_string: &str, ast: &Node) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let rule = Rule::new(id, name, rule_string, ast);
        self.rules.write().insert(id, rule);
        info!(rule_id = id, "rule stored");
        id
    }

    pub fn get(&self, id: u64) -> Option<Rule> {
        self.rules.read().get(&id).cloned()
    }

    /// Fetch several rules in the requested order; fails on the first missing id
    pub fn get_many(&self, ids: &[u64]) -> Result<Vec<Rule>> {
        let rules = self.rules.read();
        ids.iter()
            .map(|id| {
                rules.get(id).cloned().ok_or_else(|| {
                    warn!(rule_id = *id, "rule not found");
                    RuleEngineError::RuleNotFound(*id)
                })
            })
            .collect()
    }

    /// All rules ordered by id
    pub fn list(&self) -> Vec<Rule> {
        self.rules.read().values().cloned().collect()
    }

    #[instrument(skip(self))]
    pub fn delete(&self, id: u64) -> Result<Rule> {
        match self.rules.write().remove(&id) {
            Some(rule) => {
                info!(rule_id = id, "rule deleted");
                Ok(rule)
            }
            None => {
                warn!(rule_id = id, "delete of missing rule");
                Err(RuleEngineError::RuleNotFound(id))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }
}
