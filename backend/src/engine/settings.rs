//! Episode and client configuration
//!
//! Both structs deserialize from partial JSON; missing fields take their
//! defaults.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bridge::duration_from_seconds;

use super::error::EngineError;

/// Simulation step used when no fixed delta is configured
pub const DEFAULT_DELTA_SECONDS: f64 = 0.05;

/// Per-episode simulation settings
///
/// # Example
/// ```
/// use libsim::engine::WorldSettings;
///
/// let settings = WorldSettings::from_json(r#"{"synchronous_mode": true}"#).unwrap();
/// assert!(settings.synchronous_mode);
/// assert_eq!(settings.dispatcher_capacity, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    pub synchronous_mode: bool,
    pub no_rendering_mode: bool,
    pub fixed_delta_seconds: Option<f64>,
    /// Events queued for the callback dispatcher before producers block
    pub dispatcher_capacity: usize,
}

impl Default for WorldSettings {
    fn default() -> Self {
        WorldSettings {
            synchronous_mode: false,
            no_rendering_mode: false,
            fixed_delta_seconds: None,
            dispatcher_capacity: 64,
        }
    }
}

impl WorldSettings {
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let settings: WorldSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if let Some(delta) = self.fixed_delta_seconds {
            if !(delta > 0.0) {
                return Err(EngineError::InvalidArgument(format!(
                    "fixed_delta_seconds must be positive, got {}",
                    delta
                )));
            }
        }
        if self.dispatcher_capacity == 0 {
            return Err(EngineError::InvalidArgument(
                "dispatcher_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Simulated seconds per tick
    pub fn delta_seconds(&self) -> f64 {
        self.fixed_delta_seconds.unwrap_or(DEFAULT_DELTA_SECONDS)
    }
}

impl fmt::Display for WorldSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WorldSettings(synchronous_mode={}, no_rendering_mode={}, fixed_delta_seconds={})",
            self.synchronous_mode,
            self.no_rendering_mode,
            match self.fixed_delta_seconds {
                Some(delta) => delta.to_string(),
                None => "None".to_string(),
            }
        )
    }
}

/// Connection settings of a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Network timeout in seconds
    pub timeout_seconds: f64,
    /// Worker threads the client may use for streaming
    pub worker_threads: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            host: "localhost".to_string(),
            port: 2000,
            timeout_seconds: 5.0,
            worker_threads: 0,
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        ClientConfig {
            host: host.into(),
            port,
            ..ClientConfig::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn timeout(&self) -> Duration {
        duration_from_seconds(self.timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::from_json("{}").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_zero_delta_rejected() {
        let err = WorldSettings::from_json(r#"{"fixed_delta_seconds": 0.0}"#).unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument(_)));
    }

    #[test]
    fn test_malformed_json_is_conversion_error() {
        let err = WorldSettings::from_json("{").unwrap_err();
        assert!(matches!(err, EngineError::Conversion(_)));
    }
}
