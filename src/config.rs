use serde::Deserialize;

use crate::error::ProbeError;
use crate::overlay::DEFAULT_POLL_INTERVAL_MS;

const DEFAULT_WAIT_TIMEOUT_MS: u32 = 5000;
const DEFAULT_WAIT_INTERVAL_MS: u32 = 100;

/// Tunables a driver may pass as JSON when it creates a `Probe`.
/// Missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ProbeConfig {
    /// Period of the overlay tracker.
    pub poll_interval_ms: u32,
    /// How long `waitElement` keeps polling before reporting not-found.
    pub wait_timeout_ms: u32,
    pub wait_interval_ms: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            wait_interval_ms: DEFAULT_WAIT_INTERVAL_MS,
        }
    }
}

impl ProbeConfig {
    pub fn from_json(json: &str) -> Result<ProbeConfig, ProbeError> {
        let config: ProbeConfig = serde_json::from_str(json)
            .map_err(|e| ProbeError::SerializationError { message: format!("Invalid probe config. Details: {}", e) })?;
        if config.poll_interval_ms == 0 || config.wait_interval_ms == 0 {
            return Err(ProbeError::SerializationError {
                message: "Invalid probe config. Details: intervals must be positive".to_string(),
            });
        }
        Ok(config)
    }
}
