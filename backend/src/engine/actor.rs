//! Actor handles
//!
//! An [`Actor`] is a cheap handle: the actor's state lives in its episode
//! and every accessor goes through the episode lock. Handles outlive the
//! actor; once it is destroyed (or its episode closed) operations fail with
//! `ActorNotFound`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::bridge::DisplayList;

use super::control::{VehicleControl, WalkerControl};
use super::episode::Episode;
use super::error::EngineError;
use super::geom::{Location, Transform};
use super::sensor::Sensor;

/// Identifier of an actor within its episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a spawned actor
#[derive(Clone)]
pub struct Actor {
    episode: Arc<Episode>,
    id: ActorId,
    type_id: String,
}

impl Actor {
    pub(crate) fn new(episode: Arc<Episode>, id: ActorId, type_id: String) -> Self {
        Actor {
            episode,
            id,
            type_id,
        }
    }

    pub(crate) fn episode(&self) -> &Arc<Episode> {
        &self.episode
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    pub fn is_alive(&self) -> bool {
        self.episode.lock().actors.contains_key(&self.id)
    }

    pub fn is_sensor(&self) -> bool {
        self.type_id.starts_with("sensor.")
    }

    /// Blueprint attributes the actor was spawned with
    pub fn attributes(&self) -> Result<BTreeMap<String, String>, EngineError> {
        let state = self.episode.lock();
        Ok(state.record(self.id)?.blueprint.attributes().clone())
    }

    pub fn parent(&self) -> Result<Option<Actor>, EngineError> {
        let state = self.episode.lock();
        let parent = state.record(self.id)?.parent;
        Ok(parent.and_then(|id| {
            state
                .record(id)
                .ok()
                .map(|record| Actor::new(Arc::clone(&self.episode), id, record.type_id().to_string()))
        }))
    }

    /// Transform in world coordinates
    pub fn get_transform(&self) -> Result<Transform, EngineError> {
        self.episode.lock().world_transform(self.id)
    }

    pub fn get_location(&self) -> Result<Location, EngineError> {
        Ok(self.get_transform()?.location)
    }

    /// Move the actor; attached actors take a transform relative to their
    /// parent
    pub fn set_transform(&self, transform: Transform) -> Result<(), EngineError> {
        self.episode.lock().record_mut(self.id)?.transform = transform;
        Ok(())
    }

    pub fn set_location(&self, location: Location) -> Result<(), EngineError> {
        self.episode.lock().record_mut(self.id)?.transform.location = location;
        Ok(())
    }

    /// Apply vehicle input, clamped to the valid ranges
    pub fn apply_control(&self, control: VehicleControl) -> Result<(), EngineError> {
        let mut state = self.episode.lock();
        let record = state.record_mut(self.id)?;
        if !record.type_id().starts_with("vehicle.") {
            return Err(EngineError::InvalidArgument(format!(
                "actor {} ({}) is not a vehicle",
                self.id,
                record.type_id()
            )));
        }
        record.vehicle_control = control.clamped();
        Ok(())
    }

    pub fn get_control(&self) -> Result<VehicleControl, EngineError> {
        Ok(self.episode.lock().record(self.id)?.vehicle_control)
    }

    pub fn apply_walker_control(&self, control: WalkerControl) -> Result<(), EngineError> {
        let mut state = self.episode.lock();
        let record = state.record_mut(self.id)?;
        if !record.type_id().starts_with("walker.") {
            return Err(EngineError::InvalidArgument(format!(
                "actor {} ({}) is not a walker",
                self.id,
                record.type_id()
            )));
        }
        record.walker_control = control;
        Ok(())
    }

    pub fn get_walker_control(&self) -> Result<WalkerControl, EngineError> {
        Ok(self.episode.lock().record(self.id)?.walker_control)
    }

    /// Hand the vehicle to (or take it from) the traffic manager on `port`
    pub fn set_autopilot(&self, enabled: bool, port: u16) -> Result<(), EngineError> {
        {
            let mut state = self.episode.lock();
            let record = state.record_mut(self.id)?;
            if !record.type_id().starts_with("vehicle.") {
                return Err(EngineError::InvalidArgument(format!(
                    "actor {} ({}) is not a vehicle",
                    self.id,
                    record.type_id()
                )));
            }
            record.autopilot = enabled;
        }
        let manager = self.episode.traffic().get(port);
        if enabled {
            manager.register_vehicles(&[self.id]);
        } else {
            manager.unregister_vehicles(&[self.id]);
        }
        Ok(())
    }

    pub fn is_autopilot(&self) -> Result<bool, EngineError> {
        Ok(self.episode.lock().record(self.id)?.autopilot)
    }

    /// Destroy the actor; `false` if it was already gone
    pub fn destroy(&self) -> bool {
        match self.episode.remove_actor(self.id) {
            Some(record) => {
                log::debug!("destroyed actor {} ({})", self.id, self.type_id);
                drop(record);
                true
            }
            None => false,
        }
    }

    /// View this actor as a sensor
    pub fn into_sensor(self) -> Result<Sensor, EngineError> {
        if self.is_sensor() {
            Ok(Sensor::new(self))
        } else {
            Err(EngineError::NotASensor(self.id))
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Actor(id={}, type={})", self.id, self.type_id)
    }
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl PartialEq for Actor {
    fn eq(&self, other: &Actor) -> bool {
        self.id == other.id && Arc::ptr_eq(&self.episode, &other.episode)
    }
}

/// Actors of one episode at the time of the query
#[derive(Clone, Default)]
pub struct ActorList {
    actors: Vec<Actor>,
}

impl ActorList {
    pub(crate) fn new(actors: Vec<Actor>) -> Self {
        ActorList { actors }
    }

    /// Actors whose type id matches a `*`/`?` wildcard pattern
    pub fn filter(&self, pattern: &str) -> ActorList {
        ActorList::new(
            self.actors
                .iter()
                .filter(|actor| super::blueprint::wildcard_match(pattern, actor.type_id()))
                .cloned()
                .collect(),
        )
    }

    pub fn find(&self, id: ActorId) -> Option<Actor> {
        self.actors.iter().find(|actor| actor.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.actors.iter()
    }

    pub fn into_vec(self) -> Vec<Actor> {
        self.actors
    }
}

impl fmt::Display for ActorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", DisplayList(&self.actors))
    }
}

impl fmt::Debug for ActorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
