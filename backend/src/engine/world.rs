//! World handle
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use libsim::engine::{Client, Transform};
//!
//! let client = Client::new("localhost", 2100).unwrap();
//! let world = client.get_world();
//! let blueprint = world.get_blueprint_library().find("vehicle.audi.tt").unwrap();
//! let spawn = world.get_map().get_spawn_points()[0];
//! let vehicle = world.spawn_actor(&blueprint, spawn, None).unwrap();
//!
//! world.tick(Duration::from_secs(2)).unwrap();
//! assert!(world.get_snapshot().has_actor(vehicle.id()));
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::bridge::Invocable;

use super::actor::{Actor, ActorId, ActorList};
use super::blueprint::{ActorBlueprint, BlueprintLibrary};
use super::control::{VehicleControl, WalkerControl};
use super::episode::{ActorRecord, Episode};
use super::error::EngineError;
use super::geom::Transform;
use super::light_manager::LightManager;
use super::map::Map;
use super::settings::WorldSettings;
use super::snapshot::WorldSnapshot;
use super::weather::WeatherParameters;

/// Handle to the episode a client is connected to
#[derive(Clone)]
pub struct World {
    episode: Arc<Episode>,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World").field("id", &self.id()).finish_non_exhaustive()
    }
}

impl World {
    pub(crate) fn new(episode: Arc<Episode>) -> Self {
        World { episode }
    }

    /// Episode identifier
    pub fn id(&self) -> Uuid {
        self.episode.id()
    }

    pub fn get_map(&self) -> Map {
        self.episode.map().clone()
    }

    pub fn get_blueprint_library(&self) -> BlueprintLibrary {
        self.episode.blueprints().clone()
    }

    pub fn get_lightmanager(&self) -> LightManager {
        LightManager::new(Arc::clone(&self.episode))
    }

    /// Spawn an actor, optionally attached to `attach_to`
    ///
    /// # Errors
    ///
    /// - `BlueprintNotFound` for blueprints not in the library
    /// - `ActorNotFound` when the parent is gone
    /// - `SpawnFailed` when the spot is taken or the episode has ended
    pub fn spawn_actor(
        &self,
        blueprint: &ActorBlueprint,
        transform: Transform,
        attach_to: Option<&Actor>,
    ) -> Result<Actor, EngineError> {
        if self.episode.is_closed() {
            return Err(EngineError::SpawnFailed(format!(
                "episode {} is no longer running",
                self.episode.id()
            )));
        }
        if self.episode.blueprints().find(blueprint.id()).is_none() {
            return Err(EngineError::BlueprintNotFound(blueprint.id().to_string()));
        }

        let mut state = self.episode.lock();
        let parent = match attach_to {
            Some(parent) => {
                state.record(parent.id())?;
                Some(parent.id())
            }
            None => None,
        };
        if parent.is_none() && !blueprint.is_sensor() {
            if let Some(other) = state.obstacle_near(&transform.location, None) {
                return Err(EngineError::SpawnFailed(format!(
                    "collision at spawn position with actor {}",
                    other
                )));
            }
        }

        let id = state.insert(ActorRecord {
            blueprint: blueprint.clone(),
            transform,
            parent,
            vehicle_control: VehicleControl::default(),
            walker_control: WalkerControl::default(),
            autopilot: false,
            listener: None,
        });
        log::debug!("spawned actor {} ({})", id, blueprint.id());
        Ok(Actor::new(Arc::clone(&self.episode), id, blueprint.id().to_string()))
    }

    /// Like [`spawn_actor`](World::spawn_actor), `None` instead of an error
    pub fn try_spawn_actor(
        &self,
        blueprint: &ActorBlueprint,
        transform: Transform,
        attach_to: Option<&Actor>,
    ) -> Option<Actor> {
        self.spawn_actor(blueprint, transform, attach_to).ok()
    }

    pub fn get_actors(&self) -> ActorList {
        let state = self.episode.lock();
        ActorList::new(
            state
                .actors
                .iter()
                .map(|(&id, record)| {
                    Actor::new(Arc::clone(&self.episode), id, record.type_id().to_string())
                })
                .collect(),
        )
    }

    /// Actors with the given ids; unknown ids are skipped
    pub fn get_actors_by_id(&self, ids: &[ActorId]) -> ActorList {
        let state = self.episode.lock();
        ActorList::new(
            ids.iter()
                .filter_map(|&id| {
                    let record = state.actors.get(&id)?;
                    Some(Actor::new(Arc::clone(&self.episode), id, record.type_id().to_string()))
                })
                .collect(),
        )
    }

    pub fn get_actor(&self, id: ActorId) -> Option<Actor> {
        let state = self.episode.lock();
        let record = state.actors.get(&id)?;
        Some(Actor::new(Arc::clone(&self.episode), id, record.type_id().to_string()))
    }

    /// Advance the simulation one frame
    ///
    /// Blocks until every callback of the new frame was delivered.
    ///
    /// # Errors
    ///
    /// `Timeout` when delivery does not finish within `timeout`.
    pub fn tick(&self, timeout: Duration) -> Result<u64, EngineError> {
        self.episode.tick(timeout)
    }

    /// Block until the next frame and return its snapshot
    ///
    /// # Errors
    ///
    /// `Timeout` when no frame arrives within `timeout`.
    pub fn wait_for_tick(&self, timeout: Duration) -> Result<WorldSnapshot, EngineError> {
        self.episode.wait_for_tick(timeout)
    }

    pub fn get_snapshot(&self) -> WorldSnapshot {
        self.episode.snapshot()
    }

    pub fn get_weather(&self) -> WeatherParameters {
        self.episode.lock().weather
    }

    pub fn set_weather(&self, weather: WeatherParameters) {
        self.episode.lock().weather = weather;
    }

    pub fn get_settings(&self) -> WorldSettings {
        self.episode.lock().settings.clone()
    }

    /// Apply new settings and return the current frame
    ///
    /// `dispatcher_capacity` takes effect from the next episode.
    pub fn apply_settings(&self, settings: WorldSettings) -> Result<u64, EngineError> {
        settings.validate()?;
        let mut state = self.episode.lock();
        state.settings = settings;
        Ok(state.frame)
    }

    /// Call `callback` with the snapshot of every new frame
    ///
    /// Returns the id to pass to [`remove_on_tick`](World::remove_on_tick).
    pub fn on_tick(&self, callback: Arc<dyn Invocable<WorldSnapshot>>) -> u64 {
        self.episode.lock().add_tick_callback(callback)
    }

    /// Remove a tick callback; `false` for unknown ids
    pub fn remove_on_tick(&self, id: u64) -> bool {
        let callback = self.episode.lock().tick_callbacks.remove(&id);
        callback.is_some()
    }
}

impl fmt::Display for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "World(id={})", self.episode.id())
    }
}

impl PartialEq for World {
    fn eq(&self, other: &World) -> bool {
        Arc::ptr_eq(&self.episode, &other.episode)
    }
}
