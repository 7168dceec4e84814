//! Map Step Configuration
//!
//! Declarative settings applied while a map is built. Priority overrides
//! listed here are applied before any mechanic's `init*` hook runs.

use std::path::Path;
use serde::{Serialize, Deserialize};

/// One `(phase, hook, priority)` override.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityOverride {
    /// Phase tag: a hook prefix (`"stepMove"`) or phase name (`"Move"`)
    pub phase: String,
    /// Hook name, e.g. `"stepMoveWalk"`
    pub hook: String,
    /// Priority; lower runs first
    pub priority: i32,
}

impl PriorityOverride {
    /// Create an override.
    pub fn new(phase: impl Into<String>, hook: impl Into<String>, priority: i32) -> Self {
        Self {
            phase: phase.into(),
            hook: hook.into(),
            priority,
        }
    }
}

/// Configuration for building a step map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepMapConfig {
    /// Overrides applied before init hooks run
    pub priority_overrides: Vec<PriorityOverride>,
    /// Log the hook inventory at VERBOSE once the map is built
    pub log_inventory: bool,
}

impl Default for StepMapConfig {
    fn default() -> Self {
        Self {
            priority_overrides: Vec::new(),
            log_inventory: true,
        }
    }
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid configuration JSON.
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl StepMapConfig {
    /// Parse configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Add an override.
    pub fn with_override(mut self, phase: &str, hook: &str, priority: i32) -> Self {
        self.priority_overrides.push(PriorityOverride::new(phase, hook, priority));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StepMapConfig::default();
        assert!(config.priority_overrides.is_empty());
        assert!(config.log_inventory);
    }

    #[test]
    fn test_parse_overrides() {
        let json = r#"{
            "priority_overrides": [
                { "phase": "stepMove", "hook": "stepMoveWalk", "priority": 10 },
                { "phase": "Trigger", "hook": "triggerHeal", "priority": 5 }
            ]
        }"#;
        let config = StepMapConfig::from_json_str(json).unwrap();

        assert_eq!(config.priority_overrides.len(), 2);
        assert_eq!(config.priority_overrides[1], PriorityOverride::new("Trigger", "triggerHeal", 5));
        // Missing fields fall back to defaults
        assert!(config.log_inventory);
    }

    #[test]
    fn test_parse_error() {
        let result = StepMapConfig::from_json_str("{ \"log_inventory\": \"yes\" }");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = StepMapConfig::from_file("/nonexistent/tilestep.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
