//! Native core failures

use std::time::Duration;

use thiserror::Error;

use super::actor::ActorId;

/// Errors reported by the native simulation core
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("time-out of {}ms while waiting for the simulator", .0.as_millis())]
    Timeout(Duration),

    #[error("actor {0} not found")]
    ActorNotFound(ActorId),

    #[error("spawn failed: {0}")]
    SpawnFailed(String),

    #[error("blueprint '{0}' not found")]
    BlueprintNotFound(String),

    #[error("actor {0} is not a sensor")]
    NotASensor(ActorId),

    #[error("sensor {0} is already listening")]
    AlreadyListening(ActorId),

    #[error("map '{0}' not found")]
    MapNotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("conversion failed: {0}")]
    Conversion(String),
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Conversion(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_in_millis() {
        let err = EngineError::Timeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "time-out of 1500ms while waiting for the simulator");
    }
}
