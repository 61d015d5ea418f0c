//! PyO3 wrappers for the traffic and light managers

use pyo3::prelude::*;

use crate::engine::{ActorId, Light, LightGroup, LightManager, TrafficManager};

use super::actor::ActorKey;
use super::convert::engine_err;
use super::geom::PyLocation;

fn actor_ids(vehicles: Vec<ActorKey>) -> Vec<ActorId> {
    vehicles.into_iter().map(|ActorKey(id)| id).collect()
}

/// Python wrapper for [`TrafficManager`]
#[pyclass(name = "TrafficManager")]
pub struct PyTrafficManager {
    pub inner: TrafficManager,
}

#[pymethods]
impl PyTrafficManager {
    fn get_port(&self) -> u16 {
        self.inner.get_port()
    }

    fn register_vehicles(&self, vehicles: Vec<ActorKey>) {
        self.inner.register_vehicles(&actor_ids(vehicles));
    }

    fn unregister_vehicles(&self, vehicles: Vec<ActorKey>) {
        self.inner.unregister_vehicles(&actor_ids(vehicles));
    }

    fn is_registered(&self, vehicle: ActorKey) -> bool {
        self.inner.is_registered(vehicle.0)
    }

    fn registered_vehicles(&self) -> Vec<u32> {
        self.inner
            .registered_vehicles()
            .into_iter()
            .map(|id| id.0)
            .collect()
    }

    fn set_global_distance_to_leading_vehicle(&self, distance: f32) -> PyResult<()> {
        self.inner
            .set_global_distance_to_leading_vehicle(distance)
            .map_err(engine_err)
    }

    fn get_global_distance_to_leading_vehicle(&self) -> f32 {
        self.inner.global_distance_to_leading_vehicle()
    }

    fn global_percentage_speed_difference(&self, percentage: f32) {
        self.inner.global_percentage_speed_difference(percentage);
    }

    fn vehicle_percentage_speed_difference(&self, vehicle: ActorKey, percentage: f32) -> PyResult<()> {
        self.inner
            .vehicle_percentage_speed_difference(vehicle.0, percentage)
            .map_err(engine_err)
    }

    fn get_speed_difference(&self, vehicle: ActorKey) -> f32 {
        self.inner.speed_difference(vehicle.0)
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

/// Python wrapper for [`Light`]
#[pyclass(name = "Light")]
#[derive(Clone)]
pub struct PyLight {
    pub inner: Light,
}

#[pymethods]
impl PyLight {
    #[getter]
    fn id(&self) -> u32 {
        self.inner.id
    }

    #[getter]
    fn location(&self) -> PyLocation {
        PyLocation {
            inner: self.inner.location,
        }
    }

    /// Group name: "Street", "Building", "Vehicle" or "Other"
    #[getter]
    fn group(&self) -> String {
        self.inner.group.to_string()
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

fn native_lights(lights: Vec<PyLight>) -> Vec<Light> {
    lights.into_iter().map(|light| light.inner).collect()
}

/// Python wrapper for [`LightManager`]
#[pyclass(name = "LightManager")]
pub struct PyLightManager {
    pub inner: LightManager,
}

#[pymethods]
impl PyLightManager {
    #[pyo3(signature = (group=None))]
    fn get_all_lights(&self, group: Option<&str>) -> PyResult<Vec<PyLight>> {
        let group = group
            .map(str::parse::<LightGroup>)
            .transpose()
            .map_err(engine_err)?;
        Ok(self
            .inner
            .get_all_lights(group)
            .into_iter()
            .map(|inner| PyLight { inner })
            .collect())
    }

    fn turn_on(&self, lights: Vec<PyLight>) {
        self.inner.turn_on(&native_lights(lights));
    }

    fn turn_off(&self, lights: Vec<PyLight>) {
        self.inner.turn_off(&native_lights(lights));
    }

    fn is_active(&self, lights: Vec<PyLight>) -> Vec<bool> {
        self.inner.is_active(&native_lights(lights))
    }

    fn set_intensity(&self, lights: Vec<PyLight>, intensity: f32) -> PyResult<()> {
        self.inner
            .set_intensity(&native_lights(lights), intensity)
            .map_err(engine_err)
    }

    fn get_intensity(&self, lights: Vec<PyLight>) -> Vec<f32> {
        self.inner.get_intensity(&native_lights(lights))
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}
