//! Immutable world state at one frame

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::actor::ActorId;
use super::error::EngineError;
use super::geom::Transform;

/// State of one actor in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSnapshot {
    pub id: ActorId,
    pub type_id: String,
    pub transform: Transform,
}

impl fmt::Display for ActorSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorSnapshot(id={}, type_id={})", self.id, self.type_id)
    }
}

/// World state produced by a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub episode_id: Uuid,
    pub frame: u64,
    pub elapsed_seconds: f64,
    pub delta_seconds: f64,
    pub actors: Vec<ActorSnapshot>,
}

impl WorldSnapshot {
    pub fn find(&self, id: ActorId) -> Option<&ActorSnapshot> {
        self.actors.iter().find(|actor| actor.id == id)
    }

    pub fn has_actor(&self, id: ActorId) -> bool {
        self.find(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Serialize for debugging
    pub fn to_json(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl fmt::Display for WorldSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WorldSnapshot(frame={}, timestamp={:.6}, actors={})",
            self.frame,
            self.elapsed_seconds,
            self.actors.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_json_round_trips() {
        let snapshot = WorldSnapshot {
            episode_id: Uuid::new_v4(),
            frame: 3,
            elapsed_seconds: 0.15,
            delta_seconds: 0.05,
            actors: vec![ActorSnapshot {
                id: ActorId(7),
                type_id: "vehicle.audi.tt".to_string(),
                transform: Transform::default(),
            }],
        };
        let json = snapshot.to_json().unwrap();
        let parsed: WorldSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
        assert!(parsed.has_actor(ActorId(7)));
        assert!(parsed.find(ActorId(8)).is_none());
    }
}
