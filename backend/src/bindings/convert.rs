//! Scripting classes of the engine types and their special conversions

use uuid::Uuid;

use crate::engine::{
    Actor, ActorBlueprint, ActorId, ActorList, ActorSnapshot, BlueprintLibrary, Client,
    CollisionEvent, Command, CommandResponse, GnssMeasurement, Image, ImuMeasurement, Light,
    LightGroup, LightManager, Location, Map, Rotation, Sensor, SensorData, SensorPayload,
    TrafficManager, Transform, Vector3D, VehicleControl, WalkerControl, Waypoint,
    WeatherParameters, World, WorldSettings, WorldSnapshot,
};
use crate::native_class;
use crate::script::{FromValue, IntoValue, ScriptError, Value};

native_class!(Vector3D, "Vector3D");
native_class!(Location, "Location");
native_class!(Rotation, "Rotation");
native_class!(Transform, "Transform");
native_class!(VehicleControl, "VehicleControl");
native_class!(WalkerControl, "WalkerControl");
native_class!(WeatherParameters, "WeatherParameters");
native_class!(ActorBlueprint, "ActorBlueprint");
native_class!(BlueprintLibrary, "BlueprintLibrary");
native_class!(Actor, "Actor");
native_class!(ActorList, "ActorList");
native_class!(Sensor, "Sensor");
native_class!(SensorData, "SensorData");
native_class!(Image, "Image");
native_class!(CollisionEvent, "CollisionEvent");
native_class!(GnssMeasurement, "GnssMeasurement");
native_class!(ImuMeasurement, "IMUMeasurement");
native_class!(ActorSnapshot, "ActorSnapshot");
native_class!(WorldSnapshot, "WorldSnapshot");
native_class!(WorldSettings, "WorldSettings");
native_class!(World, "World");
native_class!(Map, "Map");
native_class!(Waypoint, "Waypoint");
native_class!(Client, "Client");
native_class!(Command, "Command");
native_class!(CommandResponse, "CommandResponse");
native_class!(TrafficManager, "TrafficManager");
native_class!(LightManager, "LightManager");
native_class!(Light, "Light");
#[cfg(feature = "rss")]
native_class!(crate::engine::RssRestrictor, "RssRestrictor");
#[cfg(feature = "osm2odr")]
native_class!(crate::engine::OsmToOdrSettings, "Osm2OdrSettings");

impl IntoValue for ActorId {
    fn into_value(self) -> Value {
        Value::Int(i64::from(self.0))
    }
}

impl FromValue for ActorId {
    fn from_value(value: &Value) -> Result<Self, ScriptError> {
        u32::from_value(value).map(ActorId)
    }
}

impl IntoValue for Uuid {
    fn into_value(self) -> Value {
        Value::Str(self.to_string())
    }
}

impl IntoValue for LightGroup {
    fn into_value(self) -> Value {
        Value::Str(self.to_string())
    }
}

impl FromValue for LightGroup {
    fn from_value(value: &Value) -> Result<Self, ScriptError> {
        Ok(String::from_value(value)?.parse::<LightGroup>()?)
    }
}

impl IntoValue for SensorPayload {
    fn into_value(self) -> Value {
        match self {
            SensorPayload::Image(image) => image.into_value(),
            SensorPayload::Collision(event) => event.into_value(),
            SensorPayload::Gnss(gnss) => gnss.into_value(),
            SensorPayload::Imu(imu) => imu.into_value(),
        }
    }
}

/// Any actor argument: plain actors and sensors alike
#[derive(Clone)]
pub struct ActorArg(pub Actor);

impl FromValue for ActorArg {
    fn from_value(value: &Value) -> Result<Self, ScriptError> {
        let object = value.native()?;
        match object.class_name() {
            "Sensor" => Ok(ActorArg(object.get::<Sensor>()?.actor().clone())),
            _ => object.get::<Actor>().map(ActorArg),
        }
    }
}

/// Scripting value of a spawned or looked-up actor: sensors surface as
/// `Sensor` so they can be listened to
pub(crate) fn actor_value(actor: Actor) -> Value {
    match actor.clone().into_sensor() {
        Ok(sensor) => sensor.into_value(),
        Err(_) => actor.into_value(),
    }
}

/// Ids of actor arguments
pub(crate) fn actor_ids(actors: &[ActorArg]) -> Vec<ActorId> {
    actors.iter().map(|actor| actor.0.id()).collect()
}

/// Seconds argument of a blocking call, or the default
pub(crate) fn timeout_or(seconds: Option<f64>, default_seconds: f64) -> std::time::Duration {
    crate::bridge::duration_from_seconds(seconds.unwrap_or(default_seconds))
}
