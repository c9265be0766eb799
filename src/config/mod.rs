//! Engine configuration
//!
//! Every field is optional; missing keys fall back to the defaults below.
//! Accepted from JSON text or, through the Python bindings, from a dict.

use serde::{Deserialize, Serialize};

use crate::error::{ParseError, Result, RuleEngineError};

/// Default number of parsed rules kept in the parse cache
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Default upper bound on rule text length, in characters
pub const DEFAULT_MAX_RULE_LENGTH: usize = 4096;

/// Runtime settings for a `RuleEngine`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Parse cache size; 0 disables caching
    pub cache_capacity: usize,
    /// Longest accepted rule text
    pub max_rule_length: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_rule_length: DEFAULT_MAX_RULE_LENGTH,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON object such as `{"cache_capacity": 256}`
    pub fn from_json(text: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(text)
            .map_err(|e| RuleEngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject rule text longer than `max_rule_length` characters
    pub fn check_length(&self, text: &str) -> std::result::Result<(), ParseError> {
        let length = text.chars().count();
        if length > self.max_rule_length {
            return Err(ParseError::TooLong {
                max: self.max_rule_length,
                actual: length,
            });
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_rule_length == 0 {
            return Err(RuleEngineError::Config(
                "max_rule_length must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_empty_object() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_json(r#"{"cache_capacity": 8}"#).unwrap();
        assert_eq!(config.cache_capacity, 8);
        assert_eq!(config.max_rule_length, DEFAULT_MAX_RULE_LENGTH);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = EngineConfig::from_json(r#"{"cache_size": 8}"#).unwrap_err();
        assert!(matches!(err, RuleEngineError::Config(_)));
    }

    #[test]
    fn test_zero_max_length_rejected() {
        let err = EngineConfig::from_json(r#"{"max_rule_length": 0}"#).unwrap_err();
        assert!(matches!(err, RuleEngineError::Config(_)));
    }

    #[test]
    fn test_check_length_counts_characters() {
        let config = EngineConfig {
            max_rule_length: 5,
            ..EngineConfig::default()
        };
        assert!(config.check_length("é > 1").is_ok());
        assert_eq!(
            config.check_length("ab > 1"),
            Err(ParseError::TooLong { max: 5, actual: 6 })
        );
    }
}
