//! PyO3 wrappers for the world, its settings and snapshots, and the map
//!
//! Blocking calls release the GIL through [`LockGate`] so Python threads,
//! including sensor and tick callbacks, keep running meanwhile.

use std::sync::Arc;

use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::bridge::duration_from_seconds;
use crate::engine::{ActorId, Map, Waypoint, World, WorldSettings, WorldSnapshot};
use crate::gil::LockGate;

use super::actor::{actor_to_py, ActorRef, PyActorBlueprint, PyBlueprintLibrary};
use super::callback::PyCallback;
use super::convert::{engine_err, extract_list, parse_world_settings};
use super::geom::{PyLocation, PyTransform, PyWeatherParameters};
use super::managers::PyLightManager;

/// Default timeout of `tick` and `wait_for_tick`, seconds
const DEFAULT_TICK_TIMEOUT: f64 = 10.0;

/// Python wrapper for [`WorldSnapshot`]
#[pyclass(name = "WorldSnapshot")]
pub struct PyWorldSnapshot {
    pub inner: WorldSnapshot,
}

#[pymethods]
impl PyWorldSnapshot {
    #[getter]
    fn frame(&self) -> u64 {
        self.inner.frame
    }

    #[getter]
    fn elapsed_seconds(&self) -> f64 {
        self.inner.elapsed_seconds
    }

    #[getter]
    fn delta_seconds(&self) -> f64 {
        self.inner.delta_seconds
    }

    #[getter]
    fn episode_id(&self) -> String {
        self.inner.episode_id.to_string()
    }

    fn has_actor(&self, actor_id: u32) -> bool {
        self.inner.has_actor(ActorId(actor_id))
    }

    fn to_json(&self) -> PyResult<String> {
        self.inner.to_json().map_err(engine_err)
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

impl IntoPy<PyObject> for WorldSnapshot {
    fn into_py(self, py: Python<'_>) -> PyObject {
        PyWorldSnapshot { inner: self }.into_py(py)
    }
}

/// Python wrapper for [`World`]
#[pyclass(name = "World")]
#[derive(Clone)]
pub struct PyWorld {
    pub inner: World,
}

#[pymethods]
impl PyWorld {
    #[getter]
    fn id(&self) -> String {
        self.inner.id().to_string()
    }

    fn get_blueprint_library(&self) -> PyBlueprintLibrary {
        PyBlueprintLibrary {
            inner: self.inner.get_blueprint_library(),
        }
    }

    /// Spawn an actor, attached to the `attach_to` actor when given
    #[pyo3(signature = (blueprint, transform, attach_to=None))]
    fn spawn_actor(
        &self,
        py: Python<'_>,
        blueprint: PyActorBlueprint,
        transform: PyTransform,
        attach_to: Option<ActorRef>,
    ) -> PyResult<PyObject> {
        let parent = attach_to.map(|ActorRef(actor)| actor);
        let actor = self
            .inner
            .spawn_actor(&blueprint.inner, transform.inner, parent.as_ref())
            .map_err(engine_err)?;
        Ok(actor_to_py(py, actor))
    }

    /// Like `spawn_actor`, `None` instead of an error
    #[pyo3(signature = (blueprint, transform, attach_to=None))]
    fn try_spawn_actor(
        &self,
        py: Python<'_>,
        blueprint: PyActorBlueprint,
        transform: PyTransform,
        attach_to: Option<ActorRef>,
    ) -> Option<PyObject> {
        let parent = attach_to.map(|ActorRef(actor)| actor);
        self.inner
            .try_spawn_actor(&blueprint.inner, transform.inner, parent.as_ref())
            .map(|actor| actor_to_py(py, actor))
    }

    fn get_actor(&self, py: Python<'_>, actor_id: u32) -> Option<PyObject> {
        self.inner
            .get_actor(ActorId(actor_id))
            .map(|actor| actor_to_py(py, actor))
    }

    /// All actors, or only those whose ids are listed
    #[pyo3(signature = (actor_ids=None))]
    fn get_actors(
        &self,
        py: Python<'_>,
        actor_ids: Option<&Bound<'_, PyAny>>,
    ) -> PyResult<Vec<PyObject>> {
        let actors = match actor_ids {
            Some(ids) => {
                let ids: Vec<ActorId> = extract_list::<u32>(ids)?.into_iter().map(ActorId).collect();
                self.inner.get_actors_by_id(&ids)
            }
            None => self.inner.get_actors(),
        };
        Ok(actors
            .into_vec()
            .into_iter()
            .map(|actor| actor_to_py(py, actor))
            .collect())
    }

    /// Advance one frame and wait until its events were delivered
    #[pyo3(signature = (seconds=DEFAULT_TICK_TIMEOUT))]
    fn tick(&self, py: Python<'_>, seconds: f64) -> PyResult<u64> {
        let world = self.inner.clone();
        py.release_during(move || world.tick(duration_from_seconds(seconds)))
            .map_err(engine_err)
    }

    #[pyo3(signature = (seconds=DEFAULT_TICK_TIMEOUT))]
    fn wait_for_tick(&self, py: Python<'_>, seconds: f64) -> PyResult<PyWorldSnapshot> {
        let world = self.inner.clone();
        let inner = py
            .release_during(move || world.wait_for_tick(duration_from_seconds(seconds)))
            .map_err(engine_err)?;
        Ok(PyWorldSnapshot { inner })
    }

    fn get_snapshot(&self, py: Python<'_>) -> PyWorldSnapshot {
        let world = self.inner.clone();
        PyWorldSnapshot {
            inner: py.release_during(move || world.get_snapshot()),
        }
    }

    fn get_map(&self) -> PyMap {
        PyMap {
            inner: self.inner.get_map(),
        }
    }

    fn get_lightmanager(&self) -> PyLightManager {
        PyLightManager {
            inner: self.inner.get_lightmanager(),
        }
    }

    fn get_weather(&self) -> PyWeatherParameters {
        self.inner.get_weather().into()
    }

    fn set_weather(&self, weather: PyWeatherParameters) {
        self.inner.set_weather(weather.into());
    }

    fn get_settings(&self) -> PyWorldSettings {
        self.inner.get_settings().into()
    }

    /// Apply a `WorldSettings` or a settings dict; returns the current frame
    fn apply_settings(&self, py: Python<'_>, settings: &Bound<'_, PyAny>) -> PyResult<u64> {
        let settings = match settings.downcast::<PyWorldSettings>() {
            Ok(settings) => WorldSettings::from(settings.borrow().clone()),
            Err(_) => parse_world_settings(settings.downcast::<PyDict>()?)?,
        };
        let world = self.inner.clone();
        py.release_during(move || world.apply_settings(settings))
            .map_err(engine_err)
    }

    fn on_tick(&self, callback: &Bound<'_, PyAny>) -> PyResult<u64> {
        let callback = PyCallback::<WorldSnapshot>::new(callback)?;
        Ok(self.inner.on_tick(Arc::new(callback)))
    }

    fn remove_on_tick(&self, callback_id: u64) -> bool {
        self.inner.remove_on_tick(callback_id)
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

/// Python mirror of [`WorldSettings`], every field read-write
#[pyclass(name = "WorldSettings", get_all, set_all)]
#[derive(Clone)]
pub struct PyWorldSettings {
    pub synchronous_mode: bool,
    pub no_rendering_mode: bool,
    pub fixed_delta_seconds: Option<f64>,
    pub dispatcher_capacity: usize,
}

#[pymethods]
impl PyWorldSettings {
    #[new]
    #[pyo3(signature = (synchronous_mode=false, no_rendering_mode=false, fixed_delta_seconds=None))]
    fn new(
        synchronous_mode: bool,
        no_rendering_mode: bool,
        fixed_delta_seconds: Option<f64>,
    ) -> PyResult<Self> {
        let settings = WorldSettings {
            synchronous_mode,
            no_rendering_mode,
            fixed_delta_seconds,
            ..WorldSettings::default()
        };
        settings.validate().map_err(engine_err)?;
        Ok(settings.into())
    }

    fn __eq__(&self, other: &PyWorldSettings) -> bool {
        WorldSettings::from(self.clone()) == WorldSettings::from(other.clone())
    }

    fn __repr__(&self) -> String {
        WorldSettings::from(self.clone()).to_string()
    }
}

impl From<WorldSettings> for PyWorldSettings {
    fn from(settings: WorldSettings) -> Self {
        PyWorldSettings {
            synchronous_mode: settings.synchronous_mode,
            no_rendering_mode: settings.no_rendering_mode,
            fixed_delta_seconds: settings.fixed_delta_seconds,
            dispatcher_capacity: settings.dispatcher_capacity,
        }
    }
}

impl From<PyWorldSettings> for WorldSettings {
    fn from(settings: PyWorldSettings) -> Self {
        WorldSettings {
            synchronous_mode: settings.synchronous_mode,
            no_rendering_mode: settings.no_rendering_mode,
            fixed_delta_seconds: settings.fixed_delta_seconds,
            dispatcher_capacity: settings.dispatcher_capacity,
        }
    }
}

/// Python wrapper for [`Waypoint`]
#[pyclass(name = "Waypoint")]
#[derive(Clone)]
pub struct PyWaypoint {
    pub inner: Waypoint,
}

#[pymethods]
impl PyWaypoint {
    #[getter]
    fn road_id(&self) -> u32 {
        self.inner.road_id
    }

    #[getter]
    fn lane_id(&self) -> i32 {
        self.inner.lane_id
    }

    #[getter]
    fn s(&self) -> f32 {
        self.inner.s
    }

    #[getter]
    fn lane_width(&self) -> f32 {
        self.inner.lane_width
    }

    #[getter]
    fn transform(&self) -> PyTransform {
        PyTransform {
            inner: self.inner.transform,
        }
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

/// Python wrapper for [`Map`]
#[pyclass(name = "Map")]
pub struct PyMap {
    pub inner: Map,
}

#[pymethods]
impl PyMap {
    #[new]
    fn new(name: &str) -> PyResult<Self> {
        let inner = Map::load(name).map_err(engine_err)?;
        Ok(PyMap { inner })
    }

    #[getter]
    fn name(&self) -> String {
        self.inner.name().to_string()
    }

    fn get_spawn_points(&self) -> Vec<PyTransform> {
        self.inner
            .get_spawn_points()
            .into_iter()
            .map(|inner| PyTransform { inner })
            .collect()
    }

    /// Nearest waypoint on a road, `None` when off-road
    fn get_waypoint(&self, location: PyLocation) -> Option<PyWaypoint> {
        self.inner
            .get_waypoint(&location.inner)
            .map(|inner| PyWaypoint { inner })
    }

    fn generate_waypoints(&self, distance: f32) -> PyResult<Vec<PyWaypoint>> {
        let waypoints = self.inner.generate_waypoints(distance).map_err(engine_err)?;
        Ok(waypoints.into_iter().map(|inner| PyWaypoint { inner }).collect())
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}
