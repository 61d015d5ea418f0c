//! Geometry value types
//!
//! Units follow the simulator: meters for positions, degrees for angles.

use std::fmt;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A 3D vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3D {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3D {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Vector3D { x, y, z }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn dot(&self, other: &Vector3D) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Unit vector in the same direction, zero stays zero
    pub fn normalized(&self) -> Vector3D {
        let length = self.length();
        if length == 0.0 {
            *self
        } else {
            *self * (1.0 / length)
        }
    }
}

impl Add for Vector3D {
    type Output = Vector3D;

    fn add(self, rhs: Vector3D) -> Vector3D {
        Vector3D::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vector3D {
    type Output = Vector3D;

    fn sub(self, rhs: Vector3D) -> Vector3D {
        Vector3D::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vector3D {
    type Output = Vector3D;

    fn mul(self, rhs: f32) -> Vector3D {
        Vector3D::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl fmt::Display for Vector3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vector3D(x={:.6}, y={:.6}, z={:.6})", self.x, self.y, self.z)
    }
}

/// A position in the world
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Location {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Location { x, y, z }
    }

    /// Euclidean distance in meters
    ///
    /// # Example
    /// ```
    /// use libsim::engine::Location;
    ///
    /// let a = Location::new(0.0, 0.0, 0.0);
    /// assert_eq!(a.distance(&Location::new(3.0, 4.0, 0.0)), 5.0);
    /// ```
    pub fn distance(&self, other: &Location) -> f32 {
        (self.as_vector() - other.as_vector()).length()
    }

    pub fn as_vector(&self) -> Vector3D {
        Vector3D::new(self.x, self.y, self.z)
    }
}

impl From<Vector3D> for Location {
    fn from(v: Vector3D) -> Self {
        Location::new(v.x, v.y, v.z)
    }
}

impl Add<Vector3D> for Location {
    type Output = Location;

    fn add(self, rhs: Vector3D) -> Location {
        Location::from(self.as_vector() + rhs)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Location(x={:.6}, y={:.6}, z={:.6})", self.x, self.y, self.z)
    }
}

/// Orientation in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotation {
    pub const fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Rotation { pitch, yaw, roll }
    }

    /// Unit vector pointing forward
    pub fn forward_vector(&self) -> Vector3D {
        let (pitch, yaw) = (self.pitch.to_radians(), self.yaw.to_radians());
        Vector3D::new(pitch.cos() * yaw.cos(), pitch.cos() * yaw.sin(), pitch.sin())
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Rotation(pitch={:.6}, yaw={:.6}, roll={:.6})",
            self.pitch, self.yaw, self.roll
        )
    }
}

/// Location plus rotation
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub location: Location,
    pub rotation: Rotation,
}

impl Transform {
    pub const fn new(location: Location, rotation: Rotation) -> Self {
        Transform { location, rotation }
    }

    /// Transform a point from local to world coordinates (yaw only)
    pub fn transform_point(&self, point: Vector3D) -> Location {
        let yaw = self.rotation.yaw.to_radians();
        let (sin, cos) = yaw.sin_cos();
        let rotated = Vector3D::new(
            point.x * cos - point.y * sin,
            point.x * sin + point.y * cos,
            point.z,
        );
        self.location + rotated
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Transform({}, {})", self.location, self.rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_display() {
        let location = Location::new(1.0, -2.5, 0.0);
        assert_eq!(
            location.to_string(),
            "Location(x=1.000000, y=-2.500000, z=0.000000)"
        );
    }

    #[test]
    fn test_forward_vector_of_yaw_90() {
        let forward = Rotation::new(0.0, 90.0, 0.0).forward_vector();
        assert!(forward.x.abs() < 1e-6);
        assert!((forward.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_transform_point_rotates_then_translates() {
        let transform = Transform::new(Location::new(10.0, 0.0, 0.0), Rotation::new(0.0, 90.0, 0.0));
        let point = transform.transform_point(Vector3D::new(1.0, 0.0, 0.0));
        assert!((point.x - 10.0).abs() < 1e-5);
        assert!((point.y - 1.0).abs() < 1e-5);
    }
}
