//! Actor control inputs

use std::fmt;

use serde::{Deserialize, Serialize};

use super::geom::Vector3D;

/// Vehicle pedal and steering input
///
/// `throttle` and `brake` are in `[0, 1]`, `steer` in `[-1, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleControl {
    pub throttle: f32,
    pub steer: f32,
    pub brake: f32,
    pub hand_brake: bool,
    pub reverse: bool,
    pub manual_gear_shift: bool,
    pub gear: i32,
}

impl Default for VehicleControl {
    fn default() -> Self {
        VehicleControl {
            throttle: 0.0,
            steer: 0.0,
            brake: 0.0,
            hand_brake: false,
            reverse: false,
            manual_gear_shift: false,
            gear: 0,
        }
    }
}

impl VehicleControl {
    pub fn new(throttle: f32, steer: f32, brake: f32) -> Self {
        VehicleControl {
            throttle,
            steer,
            brake,
            ..VehicleControl::default()
        }
    }

    /// Clamp every axis into its valid range
    ///
    /// # Example
    /// ```
    /// use libsim::engine::VehicleControl;
    ///
    /// let control = VehicleControl::new(1.5, -3.0, -0.2).clamped();
    /// assert_eq!((control.throttle, control.steer, control.brake), (1.0, -1.0, 0.0));
    /// ```
    pub fn clamped(self) -> Self {
        VehicleControl {
            throttle: self.throttle.clamp(0.0, 1.0),
            steer: self.steer.clamp(-1.0, 1.0),
            brake: self.brake.clamp(0.0, 1.0),
            ..self
        }
    }
}

impl fmt::Display for VehicleControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VehicleControl(throttle={:.6}, steer={:.6}, brake={:.6}, hand_brake={}, reverse={}, manual_gear_shift={}, gear={})",
            self.throttle,
            self.steer,
            self.brake,
            py_bool(self.hand_brake),
            py_bool(self.reverse),
            py_bool(self.manual_gear_shift),
            self.gear
        )
    }
}

/// Pedestrian movement input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkerControl {
    pub direction: Vector3D,
    /// Meters per second
    pub speed: f32,
    pub jump: bool,
}

impl Default for WalkerControl {
    fn default() -> Self {
        WalkerControl {
            direction: Vector3D::new(1.0, 0.0, 0.0),
            speed: 0.0,
            jump: false,
        }
    }
}

impl WalkerControl {
    pub fn new(direction: Vector3D, speed: f32) -> Self {
        WalkerControl {
            direction,
            speed: speed.max(0.0),
            jump: false,
        }
    }
}

impl fmt::Display for WalkerControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WalkerControl(direction={}, speed={:.6}, jump={})",
            self.direction,
            self.speed,
            py_bool(self.jump)
        )
    }
}

fn py_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}
