//! Measurements delivered to sensor listeners

use std::fmt;

use serde::{Deserialize, Serialize};

use super::actor::ActorId;
use super::geom::{Location, Transform, Vector3D};

/// Equatorial radius used to turn meters into degrees
const EARTH_RADIUS_METERS: f64 = 6_378_137.0;

/// One measurement of one sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorData {
    pub frame: u64,
    /// Simulated seconds since the episode started
    pub timestamp: f64,
    /// Sensor transform at measurement time
    pub transform: Transform,
    pub payload: SensorPayload,
}

/// Sensor-specific measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SensorPayload {
    Image(Image),
    Collision(CollisionEvent),
    Gnss(GnssMeasurement),
    Imu(ImuMeasurement),
}

impl SensorPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            SensorPayload::Image(_) => "Image",
            SensorPayload::Collision(_) => "CollisionEvent",
            SensorPayload::Gnss(_) => "GnssMeasurement",
            SensorPayload::Imu(_) => "IMUMeasurement",
        }
    }
}

/// Camera frame metadata; pixel data is not modeled
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub fov: f32,
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Image(width={}, height={}, fov={:.6})", self.width, self.height, self.fov)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub other_actor: ActorId,
    pub normal_impulse: Vector3D,
}

impl fmt::Display for CollisionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CollisionEvent(other_actor={}, normal_impulse={})",
            self.other_actor, self.normal_impulse
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GnssMeasurement {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl GnssMeasurement {
    /// Geolocation of a world position, map origin at latitude/longitude 0
    pub fn at(location: &Location) -> Self {
        let degrees_per_meter = (1.0 / EARTH_RADIUS_METERS).to_degrees();
        GnssMeasurement {
            latitude: -f64::from(location.y) * degrees_per_meter,
            longitude: f64::from(location.x) * degrees_per_meter,
            altitude: f64::from(location.z),
        }
    }
}

impl fmt::Display for GnssMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GnssMeasurement(lat={:.6}, lon={:.6}, alt={:.6})",
            self.latitude, self.longitude, self.altitude
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImuMeasurement {
    pub accelerometer: Vector3D,
    pub gyroscope: Vector3D,
    /// Heading in radians, 0 is north
    pub compass: f32,
}

impl ImuMeasurement {
    /// Reading of a sensor at rest with the given orientation
    pub fn at_rest(transform: &Transform) -> Self {
        ImuMeasurement {
            accelerometer: Vector3D::new(0.0, 0.0, 9.81),
            gyroscope: Vector3D::default(),
            compass: (transform.rotation.yaw + 90.0).rem_euclid(360.0).to_radians(),
        }
    }
}

impl fmt::Display for ImuMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IMUMeasurement(accelerometer={}, gyroscope={}, compass={:.6})",
            self.accelerometer, self.gyroscope, self.compass
        )
    }
}

impl fmt::Display for SensorData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SensorData(frame={}, timestamp={:.6}, kind={})",
            self.frame,
            self.timestamp,
            self.payload.kind()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gnss_origin() {
        let gnss = GnssMeasurement::at(&Location::new(0.0, 0.0, 2.0));
        assert_eq!((gnss.latitude, gnss.longitude, gnss.altitude), (0.0, 0.0, 2.0));
    }

    #[test]
    fn test_gnss_east_is_positive_longitude() {
        let gnss = GnssMeasurement::at(&Location::new(1000.0, 0.0, 0.0));
        assert!(gnss.longitude > 0.0);
        assert!(gnss.latitude == 0.0);
    }
}
