//! Stored rule record

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::rule::Node;

/// Timestamp layout used for `created_at` / `updated_at`
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// A named rule with its original text and persisted AST
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub id: u64,
    pub name: String,
    pub rule_string: String,
    pub ast_json: serde_json::Value,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Rule {
    pub fn new(
        id: u64,
        name: impl Into<String>,
        rule_string: impl Into<String>,
        ast: &Node,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            rule_string: rule_string.into(),
            ast_json: ast.to_json(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Decode the persisted AST
    pub fn ast(&self) -> crate::error::Result<Node> {
        Node::from_json(&self.ast_json)
    }
}

fn serialize_timestamp<S: Serializer>(
    ts: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&ts.format(TIMESTAMP_FORMAT))
}
