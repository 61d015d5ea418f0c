//! Responsibility-sensitive safety restrictor
//!
//! Limits a vehicle control so the vehicle can still stop before the
//! leading vehicle. A kinematic stand-in for the full safety model.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::control::VehicleControl;
use super::error::EngineError;

/// Restrictor parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RssRestrictor {
    /// Braking the vehicle is guaranteed to achieve, m/s²
    pub max_brake_deceleration: f32,
    /// Delay before braking starts, seconds
    pub response_time: f32,
    /// Gap that must always remain, meters
    pub min_safe_distance: f32,
}

impl Default for RssRestrictor {
    fn default() -> Self {
        RssRestrictor {
            max_brake_deceleration: 4.0,
            response_time: 1.0,
            min_safe_distance: 2.0,
        }
    }
}

impl RssRestrictor {
    /// Distance needed to stop from `speed` m/s
    pub fn safe_distance(&self, speed: f32) -> f32 {
        let speed = speed.max(0.0);
        self.min_safe_distance
            + speed * self.response_time
            + speed * speed / (2.0 * self.max_brake_deceleration)
    }

    /// Restrict `control` given the gap to the leading vehicle
    ///
    /// Inside the safe distance throttle is cut and braking applied in
    /// proportion to the shortfall.
    ///
    /// # Example
    /// ```
    /// use libsim::engine::{RssRestrictor, VehicleControl};
    ///
    /// let rss = RssRestrictor::default();
    /// let wanted = VehicleControl::new(1.0, 0.0, 0.0);
    /// assert_eq!(rss.restrict(wanted, 100.0, 10.0).unwrap(), wanted);
    ///
    /// let restricted = rss.restrict(wanted, 5.0, 10.0).unwrap();
    /// assert_eq!(restricted.throttle, 0.0);
    /// assert!(restricted.brake > 0.0);
    /// ```
    pub fn restrict(
        &self,
        control: VehicleControl,
        distance: f32,
        speed: f32,
    ) -> Result<VehicleControl, EngineError> {
        if !(self.max_brake_deceleration > 0.0) {
            return Err(EngineError::InvalidArgument(
                "max_brake_deceleration must be positive".to_string(),
            ));
        }
        let required = self.safe_distance(speed);
        if distance >= required {
            return Ok(control);
        }
        let shortfall = ((required - distance.max(0.0)) / required).clamp(0.0, 1.0);
        Ok(VehicleControl {
            throttle: 0.0,
            brake: control.brake.max(shortfall),
            ..control
        })
    }
}

impl fmt::Display for RssRestrictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RssRestrictor(max_brake_deceleration={:.6}, response_time={:.6}, min_safe_distance={:.6})",
            self.max_brake_deceleration, self.response_time, self.min_safe_distance
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standing_still_needs_minimum_gap() {
        let rss = RssRestrictor::default();
        assert_eq!(rss.safe_distance(0.0), 2.0);
        let restricted = rss.restrict(VehicleControl::new(0.5, 0.0, 0.0), 0.0, 0.0).unwrap();
        assert_eq!(restricted.brake, 1.0);
    }

    #[test]
    fn test_zero_deceleration_rejected() {
        let rss = RssRestrictor {
            max_brake_deceleration: 0.0,
            ..RssRestrictor::default()
        };
        assert!(rss.restrict(VehicleControl::default(), 1.0, 1.0).is_err());
    }
}
