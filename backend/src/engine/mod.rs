//! Native simulation core
//!
//! The collaborator the bindings expose: a small in-process simulator with
//! clients, episodes, actors, sensors and the managers around them. Physics
//! is not simulated; actors move only when told.
//!
//! # Architecture
//!
//! - **client**: connection, map loading, batches, traffic managers
//! - **world**: episode handle, spawning, ticks and tick callbacks
//! - **actor** / **sensor**: handles into episode state
//! - **dispatcher**: worker thread delivering sensor data and snapshots
//! - value types: geom, control, blueprint, snapshot, weather, settings,
//!   map, sensor_data, commands
//! - optional subsystems: rss, osm2odr
//!
//! # Threading
//!
//! All handles are `Send + Sync`. Blocking operations (`tick`,
//! `wait_for_tick`, `load_world`, `apply_batch_sync`) never hold an engine
//! lock while waiting, and callbacks are invoked from the dispatcher thread
//! with no engine lock held.

pub mod actor;
pub mod blueprint;
pub mod client;
pub mod commands;
pub mod control;
mod dispatcher;
mod episode;
pub mod error;
pub mod geom;
pub mod light_manager;
pub mod map;
#[cfg(feature = "osm2odr")]
pub mod osm2odr;
#[cfg(feature = "rss")]
pub mod rss;
pub mod sensor;
pub mod sensor_data;
pub mod settings;
pub mod snapshot;
pub mod traffic_manager;
pub mod weather;
pub mod world;

pub use actor::{Actor, ActorId, ActorList};
pub use blueprint::{ActorBlueprint, BlueprintLibrary};
pub use client::Client;
pub use commands::{Command, CommandResponse};
pub use control::{VehicleControl, WalkerControl};
pub use error::EngineError;
pub use geom::{Location, Rotation, Transform, Vector3D};
pub use light_manager::{Light, LightGroup, LightManager};
pub use map::{Map, Waypoint, AVAILABLE_MAPS};
#[cfg(feature = "osm2odr")]
pub use osm2odr::OsmToOdrSettings;
#[cfg(feature = "rss")]
pub use rss::RssRestrictor;
pub use sensor::Sensor;
pub use sensor_data::{
    CollisionEvent, GnssMeasurement, Image, ImuMeasurement, SensorData, SensorPayload,
};
pub use settings::{ClientConfig, WorldSettings};
pub use snapshot::{ActorSnapshot, WorldSnapshot};
pub use traffic_manager::{TrafficManager, DEFAULT_TM_PORT};
pub use weather::WeatherParameters;
pub use world::World;
