//! Shared state of one loaded world
//!
//! Every handle (`World`, `Actor`, `Sensor`, `LightManager`) holds an
//! `Arc<Episode>`. State lives behind one mutex; tick notifications use the
//! paired condvar.
//!
//! # Critical Invariants
//!
//! 1. Callbacks are never invoked or dropped while the state mutex is held
//! 2. Frames only advance through `tick`
//! 3. A closed episode has no actors and rejects spawns

use std::collections::BTreeMap;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use uuid::Uuid;

use super::actor::ActorId;
use super::blueprint::{ActorBlueprint, BlueprintLibrary};
use super::control::{VehicleControl, WalkerControl};
use super::dispatcher::{Dispatcher, SensorCallback, TickCallback};
use super::error::EngineError;
use super::geom::{Location, Rotation, Transform, Vector3D};
use super::light_manager::{Light, LightGroup, LightRecord};
use super::map::Map;
use super::sensor_data::{
    CollisionEvent, GnssMeasurement, Image, ImuMeasurement, SensorData, SensorPayload,
};
use super::settings::WorldSettings;
use super::snapshot::{ActorSnapshot, WorldSnapshot};
use super::traffic_manager::TrafficManagers;
use super::weather::WeatherParameters;

/// Two non-sensor actors closer than this collide
const COLLISION_RADIUS: f32 = 2.0;

/// Spacing of street lights along roads
const STREET_LIGHT_SPACING: f32 = 50.0;

/// One spawned actor
pub(crate) struct ActorRecord {
    pub blueprint: ActorBlueprint,
    /// Relative to the parent when attached
    pub transform: Transform,
    pub parent: Option<ActorId>,
    pub vehicle_control: VehicleControl,
    pub walker_control: WalkerControl,
    pub autopilot: bool,
    pub listener: Option<SensorCallback>,
}

impl ActorRecord {
    pub fn type_id(&self) -> &str {
        self.blueprint.id()
    }

    pub fn is_sensor(&self) -> bool {
        self.blueprint.is_sensor()
    }
}

pub(crate) struct EpisodeState {
    pub frame: u64,
    pub elapsed: f64,
    pub weather: WeatherParameters,
    pub settings: WorldSettings,
    pub actors: BTreeMap<ActorId, ActorRecord>,
    pub tick_callbacks: BTreeMap<u64, TickCallback>,
    pub lights: Vec<LightRecord>,
    next_actor_id: u32,
    next_callback_id: u64,
}

impl EpisodeState {
    pub fn record(&self, id: ActorId) -> Result<&ActorRecord, EngineError> {
        self.actors.get(&id).ok_or(EngineError::ActorNotFound(id))
    }

    pub fn record_mut(&mut self, id: ActorId) -> Result<&mut ActorRecord, EngineError> {
        self.actors.get_mut(&id).ok_or(EngineError::ActorNotFound(id))
    }

    /// Transform in world coordinates, resolving attachment chains
    pub fn world_transform(&self, id: ActorId) -> Result<Transform, EngineError> {
        let record = self.record(id)?;
        match record.parent {
            None => Ok(record.transform),
            Some(parent) => {
                let parent = self.world_transform(parent)?;
                let local = record.transform;
                Ok(Transform::new(
                    parent.transform_point(local.location.as_vector()),
                    Rotation::new(
                        parent.rotation.pitch + local.rotation.pitch,
                        parent.rotation.yaw + local.rotation.yaw,
                        parent.rotation.roll + local.rotation.roll,
                    ),
                ))
            }
        }
    }

    pub fn insert(&mut self, record: ActorRecord) -> ActorId {
        self.next_actor_id += 1;
        let id = ActorId(self.next_actor_id);
        self.actors.insert(id, record);
        id
    }

    pub fn add_tick_callback(&mut self, callback: TickCallback) -> u64 {
        self.next_callback_id += 1;
        self.tick_callbacks.insert(self.next_callback_id, callback);
        self.next_callback_id
    }

    /// Non-sensor actor within the collision radius of `location`
    pub fn obstacle_near(&self, location: &Location, ignore: Option<ActorId>) -> Option<ActorId> {
        self.actors.iter().find_map(|(&id, record)| {
            if record.is_sensor() || Some(id) == ignore {
                return None;
            }
            let position = self.world_transform(id).ok()?.location;
            (position.distance(location) < COLLISION_RADIUS).then_some(id)
        })
    }

    pub fn snapshot(&self, episode_id: Uuid) -> WorldSnapshot {
        WorldSnapshot {
            episode_id,
            frame: self.frame,
            elapsed_seconds: self.elapsed,
            delta_seconds: self.settings.delta_seconds(),
            actors: self
                .actors
                .iter()
                .filter_map(|(&id, record)| {
                    Some(ActorSnapshot {
                        id,
                        type_id: record.type_id().to_string(),
                        transform: self.world_transform(id).ok()?,
                    })
                })
                .collect(),
        }
    }

    /// Measurements of every listening sensor for the current frame
    fn measurements(&self) -> Vec<(SensorCallback, SensorData)> {
        let mut measurements = Vec::new();
        for (&id, record) in &self.actors {
            let Some(listener) = &record.listener else {
                continue;
            };
            let Ok(transform) = self.world_transform(id) else {
                continue;
            };
            if let Some(payload) = self.measure(record, &transform) {
                let data = SensorData {
                    frame: self.frame,
                    timestamp: self.elapsed,
                    transform,
                    payload,
                };
                measurements.push((Arc::clone(listener), data));
            }
        }
        measurements
    }

    fn measure(&self, record: &ActorRecord, transform: &Transform) -> Option<SensorPayload> {
        let attribute = |name: &str, default: f32| {
            record
                .blueprint
                .get_attribute(name)
                .and_then(|value| value.parse::<f32>().ok())
                .unwrap_or(default)
        };
        match record.type_id() {
            "sensor.camera.rgb" => Some(SensorPayload::Image(Image {
                width: attribute("image_size_x", 800.0) as u32,
                height: attribute("image_size_y", 600.0) as u32,
                fov: attribute("fov", 90.0),
            })),
            "sensor.other.gnss" => Some(SensorPayload::Gnss(GnssMeasurement::at(&transform.location))),
            "sensor.other.imu" => Some(SensorPayload::Imu(ImuMeasurement::at_rest(transform))),
            "sensor.other.collision" => {
                let parent = record.parent?;
                let position = self.world_transform(parent).ok()?.location;
                let other = self.obstacle_near(&position, Some(parent))?;
                let other_position = self.world_transform(other).ok()?.location;
                let normal = (position.as_vector() - other_position.as_vector()).normalized();
                Some(SensorPayload::Collision(CollisionEvent {
                    other_actor: other,
                    normal_impulse: normal * 1000.0,
                }))
            }
            _ => None,
        }
    }
}

pub(crate) struct Episode {
    id: Uuid,
    map: Map,
    blueprints: BlueprintLibrary,
    state: Mutex<EpisodeState>,
    ticked: Condvar,
    dispatcher: Dispatcher,
    traffic: Arc<TrafficManagers>,
    closed: AtomicBool,
}

impl Episode {
    /// Load `map_name` as a new episode
    pub fn start(
        map_name: &str,
        settings: WorldSettings,
        traffic: Arc<TrafficManagers>,
    ) -> Result<Arc<Episode>, EngineError> {
        let map = Map::load(map_name)?;
        settings.validate()?;
        let id = Uuid::new_v4();
        let dispatcher = Dispatcher::spawn(
            format!("dispatcher-{}", map_name),
            settings.dispatcher_capacity,
        )?;
        let lights = street_lights(&map)?;
        log::debug!("episode {} started on {}", id, map_name);

        Ok(Arc::new(Episode {
            id,
            map,
            blueprints: BlueprintLibrary::standard(),
            state: Mutex::new(EpisodeState {
                frame: 0,
                elapsed: 0.0,
                weather: WeatherParameters::default(),
                settings,
                actors: BTreeMap::new(),
                tick_callbacks: BTreeMap::new(),
                lights,
                next_actor_id: 0,
                next_callback_id: 0,
            }),
            ticked: Condvar::new(),
            dispatcher,
            traffic,
            closed: AtomicBool::new(false),
        }))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn blueprints(&self) -> &BlueprintLibrary {
        &self.blueprints
    }

    pub fn traffic(&self) -> &TrafficManagers {
        &self.traffic
    }

    pub fn lock(&self) -> MutexGuard<'_, EpisodeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Advance one frame and deliver its events
    ///
    /// Returns once the dispatcher delivered every event of the new frame.
    pub fn tick(&self, timeout: Duration) -> Result<u64, EngineError> {
        let (snapshot, measurements, callbacks) = {
            let mut state = self.lock();
            state.frame += 1;
            state.elapsed += state.settings.delta_seconds();
            let snapshot = state.snapshot(self.id);
            let measurements = state.measurements();
            let callbacks: Vec<TickCallback> = state.tick_callbacks.values().cloned().collect();
            (snapshot, measurements, callbacks)
        };
        self.ticked.notify_all();

        let frame = snapshot.frame;
        let batch = self.dispatcher.begin_frame(frame, timeout);
        for (callback, data) in measurements {
            batch.sensor(callback, data)?;
        }
        for callback in callbacks {
            batch.tick(callback, snapshot.clone())?;
        }
        batch.finish()?;
        Ok(frame)
    }

    /// Block until the next frame
    pub fn wait_for_tick(&self, timeout: Duration) -> Result<WorldSnapshot, EngineError> {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        let start = state.frame;
        while state.frame == start {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(EngineError::Timeout(timeout));
            }
            state = self
                .ticked
                .wait_timeout(state, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        Ok(state.snapshot(self.id))
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        self.lock().snapshot(self.id)
    }

    /// Remove an actor; its record is returned so it can be dropped after
    /// the state lock is gone
    pub fn remove_actor(&self, id: ActorId) -> Option<ActorRecord> {
        let record = self.lock().actors.remove(&id);
        if record.is_some() {
            self.traffic.forget(id);
        }
        record
    }

    /// End the episode: every actor is destroyed and callbacks released
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let (actors, callbacks) = {
            let mut state = self.lock();
            (mem::take(&mut state.actors), mem::take(&mut state.tick_callbacks))
        };
        for id in actors.keys() {
            self.traffic.forget(*id);
        }
        log::debug!(
            "episode {} closed, {} actor(s) destroyed",
            self.id,
            actors.len()
        );
        drop(actors);
        drop(callbacks);
    }
}

fn street_lights(map: &Map) -> Result<Vec<LightRecord>, EngineError> {
    let lights = map
        .generate_waypoints(STREET_LIGHT_SPACING)?
        .into_iter()
        .enumerate()
        .map(|(i, waypoint)| {
            let location = waypoint.transform.location + Vector3D::new(0.0, waypoint.lane_width + 1.5, 6.0);
            LightRecord::new(Light {
                id: i as u32 + 1,
                location,
                group: LightGroup::Street,
            })
        })
        .collect();
    Ok(lights)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode() -> Arc<Episode> {
        Episode::start("Town01", WorldSettings::default(), Arc::default()).unwrap()
    }

    #[test]
    fn test_tick_advances_frame_and_time() {
        let episode = episode();
        assert_eq!(episode.tick(Duration::from_secs(1)).unwrap(), 1);
        assert_eq!(episode.tick(Duration::from_secs(1)).unwrap(), 2);
        let snapshot = episode.snapshot();
        assert_eq!(snapshot.frame, 2);
        assert!((snapshot.elapsed_seconds - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_wait_for_tick_times_out_without_ticks() {
        let episode = episode();
        let err = episode.wait_for_tick(Duration::from_millis(20)).unwrap_err();
        assert_eq!(err, EngineError::Timeout(Duration::from_millis(20)));
    }

    #[test]
    fn test_street_lights_start_off() {
        let episode = episode();
        let state = episode.lock();
        assert!(!state.lights.is_empty());
        assert!(state.lights.iter().all(|record| !record.on));
    }
}
