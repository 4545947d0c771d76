//! Store configuration.

use serde::{Deserialize, Serialize};

use crate::StoreError;

/// Settings for a [`Store`](crate::store::Store).
///
/// Every field has a default, so a JSON document only needs to name the
/// fields it overrides:
///
/// ```
/// use mindex::config::StoreConfig;
///
/// let config = StoreConfig::from_json(r#"{ "name": "inventory" }"#).unwrap();
/// assert_eq!(config.name, "inventory");
/// assert_eq!(config.max_relation_depth, StoreConfig::default().max_relation_depth);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Label attached to this store's log events and diagnostics.
    pub name: String,
    /// Longest chain of relation derivations allowed (a forward table
    /// feeding a reverse table counts as one). Must be at least 1.
    pub max_relation_depth: usize,
}

impl Default for StoreConfig {
    /// Named `"store"`, chains of up to 8 derivations.
    fn default() -> Self {
        Self {
            name: "store".to_owned(),
            max_relation_depth: 8,
        }
    }
}

impl StoreConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| StoreError::InvalidConfig {
                details: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Check field ranges.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.max_relation_depth == 0 {
            return Err(StoreError::InvalidConfig {
                details: "max_relation_depth must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}
