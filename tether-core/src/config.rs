//! Store configuration.

use serde::Deserialize;

use crate::error::ConfigError;

/// Runtime knobs for a [`Store`](crate::store::Store).
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Name used in log lines and error messages.
    pub label: String,

    /// Panic on misuse (reentrant dispatch from a reducer) instead of
    /// logging it and returning an error.
    pub strict: bool,

    /// Upper bound on deferred dispatches drained by one outer dispatch.
    pub max_cascade: usize,

    /// Channel capacity of the dispatch queue.
    pub queue_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            label: "store".to_string(),
            strict: cfg!(debug_assertions),
            max_cascade: 1024,
            queue_capacity: 256,
        }
    }
}

impl StoreConfig {
    /// Parse and validate a config from JSON.
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_cascade == 0 {
            return Err(ConfigError::Invalid { field: "max_cascade" });
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid { field: "queue_capacity" });
        }
        Ok(())
    }

    /// Builder-style label override.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Builder-style strictness override.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}
