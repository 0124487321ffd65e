//! Client configuration.

use crate::api::DEFAULT_NAMESPACE;
use crate::input::KeyBindings;
use crate::transform::DEFAULT_REFERENCE_LENGTH_UM;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default JSON-RPC endpoint, relative to the page.
pub const DEFAULT_ENDPOINT: &str = "/jsonrpc";

/// Default request timeout in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Settings for one notepage client. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// JSON-RPC endpoint URL.
    pub endpoint: String,
    /// Method namespace, e.g. `dozer` for `dozer.create_note`.
    pub namespace: String,
    /// Per-request timeout; `None` waits forever.
    pub request_timeout_ms: Option<u64>,
    /// Physical size of the calibration reference element.
    pub reference_length_um: i64,
    pub key_bindings: KeyBindings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            request_timeout_ms: Some(DEFAULT_REQUEST_TIMEOUT_MS),
            reference_length_um: DEFAULT_REFERENCE_LENGTH_UM,
            key_bindings: KeyBindings::default(),
        }
    }
}

impl ClientConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint must not be empty".into()));
        }
        if self.namespace.trim().is_empty() {
            return Err(ConfigError::Invalid("namespace must not be empty".into()));
        }
        if self.reference_length_um <= 0 {
            return Err(ConfigError::Invalid(format!(
                "reference_length_um must be positive, got {}",
                self.reference_length_um
            )));
        }
        if let Some(chord) = self.key_bindings.conflicts() {
            return Err(ConfigError::Invalid(format!(
                "{:?} is bound to both commit and cancel",
                chord.key
            )));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Key, KeyChord, Modifiers};

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint, "/jsonrpc");
        assert_eq!(config.namespace, "dozer");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = ClientConfig::from_json(r#"{"endpoint": "http://localhost:8080/jsonrpc", "request_timeout_ms": null}"#)
            .unwrap();
        assert_eq!(config.endpoint, "http://localhost:8080/jsonrpc");
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.reference_length_um, 100_000);
    }

    #[test]
    fn test_round_trip() {
        let config = ClientConfig { namespace: "notes".into(), ..ClientConfig::default() };
        let parsed = ClientConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validation() {
        assert!(matches!(ClientConfig::from_json("{\"namespace\": \"\"}"), Err(ConfigError::Invalid(_))));
        assert!(matches!(ClientConfig::from_json("{\"reference_length_um\": 0}"), Err(ConfigError::Invalid(_))));
        assert!(matches!(ClientConfig::from_json("not json"), Err(ConfigError::Parse(_))));

        let mut config = ClientConfig::default();
        config.key_bindings.cancel.push(KeyChord::new(Key::Enter, Modifiers::alt()));
        assert!(config.validate().is_err());

        let mut config = ClientConfig::default();
        config.key_bindings.commit.push(KeyChord::new(Key::Escape, Modifiers::alt()));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
