//! Traffic manager registry
//!
//! Keeps the per-port set of autopilot vehicles and their driving
//! parameters. Driving policy itself is not simulated.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::actor::ActorId;
use super::error::EngineError;

/// Port the default traffic manager listens on
pub const DEFAULT_TM_PORT: u16 = 8000;

#[derive(Debug)]
struct TrafficState {
    vehicles: BTreeSet<ActorId>,
    /// Meters kept to the leading vehicle
    global_distance: f32,
    /// Percentage below the speed limit, negative to exceed it
    global_speed_difference: f32,
    speed_difference: BTreeMap<ActorId, f32>,
}

/// Handle to the traffic manager on one port
///
/// Handles for the same port share their state.
#[derive(Debug, Clone)]
pub struct TrafficManager {
    port: u16,
    state: Arc<Mutex<TrafficState>>,
}

impl TrafficManager {
    fn new(port: u16) -> Self {
        TrafficManager {
            port,
            state: Arc::new(Mutex::new(TrafficState {
                vehicles: BTreeSet::new(),
                global_distance: 2.0,
                global_speed_difference: 30.0,
                speed_difference: BTreeMap::new(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, TrafficState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn register_vehicles(&self, vehicles: &[ActorId]) {
        self.state().vehicles.extend(vehicles.iter().copied());
    }

    pub fn unregister_vehicles(&self, vehicles: &[ActorId]) {
        let mut state = self.state();
        for id in vehicles {
            state.vehicles.remove(id);
            state.speed_difference.remove(id);
        }
    }

    pub fn is_registered(&self, vehicle: ActorId) -> bool {
        self.state().vehicles.contains(&vehicle)
    }

    /// Registered vehicles in id order
    pub fn registered_vehicles(&self) -> Vec<ActorId> {
        self.state().vehicles.iter().copied().collect()
    }

    pub fn set_global_distance_to_leading_vehicle(&self, distance: f32) -> Result<(), EngineError> {
        if distance < 0.0 {
            return Err(EngineError::InvalidArgument(format!(
                "distance to leading vehicle must not be negative, got {}",
                distance
            )));
        }
        self.state().global_distance = distance;
        Ok(())
    }

    pub fn global_distance_to_leading_vehicle(&self) -> f32 {
        self.state().global_distance
    }

    pub fn global_percentage_speed_difference(&self, percentage: f32) {
        self.state().global_speed_difference = percentage;
    }

    /// Per-vehicle speed difference; the vehicle must be registered
    pub fn vehicle_percentage_speed_difference(
        &self,
        vehicle: ActorId,
        percentage: f32,
    ) -> Result<(), EngineError> {
        let mut state = self.state();
        if !state.vehicles.contains(&vehicle) {
            return Err(EngineError::ActorNotFound(vehicle));
        }
        state.speed_difference.insert(vehicle, percentage);
        Ok(())
    }

    /// Effective speed difference of a vehicle
    pub fn speed_difference(&self, vehicle: ActorId) -> f32 {
        let state = self.state();
        state
            .speed_difference
            .get(&vehicle)
            .copied()
            .unwrap_or(state.global_speed_difference)
    }
}

impl fmt::Display for TrafficManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TrafficManager(port={})", self.port)
    }
}

/// All traffic managers of one simulator, by port
#[derive(Debug, Default)]
pub(crate) struct TrafficManagers {
    managers: Mutex<BTreeMap<u16, TrafficManager>>,
}

impl TrafficManagers {
    pub fn get(&self, port: u16) -> TrafficManager {
        let mut managers = self.managers.lock().unwrap_or_else(PoisonError::into_inner);
        managers
            .entry(port)
            .or_insert_with(|| {
                log::debug!("traffic manager started on port {}", port);
                TrafficManager::new(port)
            })
            .clone()
    }

    /// Forget a destroyed vehicle everywhere
    pub fn forget(&self, vehicle: ActorId) {
        let managers = self.managers.lock().unwrap_or_else(PoisonError::into_inner);
        for manager in managers.values() {
            manager.unregister_vehicles(&[vehicle]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_port_shares_state() {
        let managers = TrafficManagers::default();
        managers.get(8000).register_vehicles(&[ActorId(1)]);
        assert!(managers.get(8000).is_registered(ActorId(1)));
        assert!(!managers.get(8001).is_registered(ActorId(1)));
    }

    #[test]
    fn test_speed_difference_falls_back_to_global() {
        let tm = TrafficManager::new(8000);
        tm.register_vehicles(&[ActorId(1), ActorId(2)]);
        tm.vehicle_percentage_speed_difference(ActorId(1), -20.0).unwrap();
        assert_eq!(tm.speed_difference(ActorId(1)), -20.0);
        assert_eq!(tm.speed_difference(ActorId(2)), 30.0);
        assert!(tm.vehicle_percentage_speed_difference(ActorId(9), 0.0).is_err());
    }
}
