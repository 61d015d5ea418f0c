//! PyO3 wrappers for blueprints, actors, sensors and their measurements

use std::sync::Arc;

use pyo3::exceptions::{PyIndexError, PyTypeError};
use pyo3::prelude::*;

use crate::engine::{
    Actor, ActorBlueprint, ActorId, BlueprintLibrary, SensorData, SensorPayload, Sensor,
    DEFAULT_TM_PORT,
};

use super::callback::PyCallback;
use super::convert::engine_err;
use super::geom::{PyLocation, PyTransform, PyVehicleControl, PyWalkerControl};

/// Python wrapper for [`ActorBlueprint`]
#[pyclass(name = "ActorBlueprint")]
#[derive(Clone)]
pub struct PyActorBlueprint {
    pub inner: ActorBlueprint,
}

#[pymethods]
impl PyActorBlueprint {
    #[getter]
    fn id(&self) -> String {
        self.inner.id().to_string()
    }

    #[getter]
    fn tags(&self) -> Vec<String> {
        self.inner.tags().to_vec()
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.inner.has_attribute(name)
    }

    fn get_attribute(&self, name: &str) -> Option<String> {
        self.inner.get_attribute(name).map(str::to_string)
    }

    fn set_attribute(&mut self, name: &str, value: &str) -> PyResult<()> {
        self.inner.set_attribute(name, value).map_err(engine_err)
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

/// Python wrapper for [`BlueprintLibrary`]
#[pyclass(name = "BlueprintLibrary")]
pub struct PyBlueprintLibrary {
    pub inner: BlueprintLibrary,
}

#[pymethods]
impl PyBlueprintLibrary {
    fn filter(&self, pattern: &str) -> PyBlueprintLibrary {
        PyBlueprintLibrary {
            inner: self.inner.filter(pattern),
        }
    }

    fn find(&self, id: &str) -> PyResult<PyActorBlueprint> {
        self.inner
            .find(id)
            .map(|inner| PyActorBlueprint { inner })
            .ok_or_else(|| PyIndexError::new_err(format!("no blueprint with id '{}'", id)))
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __getitem__(&self, index: usize) -> PyResult<PyActorBlueprint> {
        self.inner
            .get(index)
            .cloned()
            .map(|inner| PyActorBlueprint { inner })
            .ok_or_else(|| PyIndexError::new_err("index out of range"))
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

/// Python wrapper for [`Actor`]
#[pyclass(name = "Actor")]
#[derive(Clone)]
pub struct PyActor {
    pub inner: Actor,
}

#[pymethods]
impl PyActor {
    #[getter]
    fn id(&self) -> u32 {
        self.inner.id().0
    }

    #[getter]
    fn type_id(&self) -> String {
        self.inner.type_id().to_string()
    }

    #[getter]
    fn is_alive(&self) -> bool {
        self.inner.is_alive()
    }

    fn get_transform(&self) -> PyResult<PyTransform> {
        let inner = self.inner.get_transform().map_err(engine_err)?;
        Ok(PyTransform { inner })
    }

    fn get_location(&self) -> PyResult<PyLocation> {
        let inner = self.inner.get_location().map_err(engine_err)?;
        Ok(PyLocation { inner })
    }

    fn set_transform(&self, transform: PyTransform) -> PyResult<()> {
        self.inner.set_transform(transform.inner).map_err(engine_err)
    }

    fn set_location(&self, location: PyLocation) -> PyResult<()> {
        self.inner.set_location(location.inner).map_err(engine_err)
    }

    fn get_parent(&self, py: Python<'_>) -> PyResult<Option<PyObject>> {
        let parent = self.inner.parent().map_err(engine_err)?;
        Ok(parent.map(|actor| actor_to_py(py, actor)))
    }

    fn apply_control(&self, control: PyVehicleControl) -> PyResult<()> {
        self.inner.apply_control(control.inner).map_err(engine_err)
    }

    fn get_control(&self) -> PyResult<PyVehicleControl> {
        let inner = self.inner.get_control().map_err(engine_err)?;
        Ok(PyVehicleControl { inner })
    }

    fn apply_walker_control(&self, control: PyWalkerControl) -> PyResult<()> {
        self.inner.apply_walker_control(control.inner).map_err(engine_err)
    }

    /// Hand the vehicle to the traffic manager on `port`, or take it back
    #[pyo3(signature = (enabled=true, port=None))]
    fn set_autopilot(&self, enabled: bool, port: Option<u16>) -> PyResult<()> {
        self.inner
            .set_autopilot(enabled, port.unwrap_or(DEFAULT_TM_PORT))
            .map_err(engine_err)
    }

    fn is_autopilot(&self) -> PyResult<bool> {
        self.inner.is_autopilot().map_err(engine_err)
    }

    fn destroy(&self) -> bool {
        self.inner.destroy()
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

/// Python wrapper for [`Sensor`]
#[pyclass(name = "Sensor")]
#[derive(Clone)]
pub struct PySensor {
    pub inner: Sensor,
}

#[pymethods]
impl PySensor {
    #[getter]
    fn id(&self) -> u32 {
        self.inner.id().0
    }

    #[getter]
    fn type_id(&self) -> String {
        self.inner.type_id().to_string()
    }

    #[getter]
    fn is_alive(&self) -> bool {
        self.inner.is_alive()
    }

    fn get_transform(&self) -> PyResult<PyTransform> {
        let inner = self.inner.get_transform().map_err(engine_err)?;
        Ok(PyTransform { inner })
    }

    /// Stream measurements to `callback`, called on the dispatcher thread
    ///
    /// # Errors
    ///
    /// Raises TypeError if `callback` is not callable, RuntimeError if the
    /// sensor already has a listener.
    fn listen(&self, callback: &Bound<'_, PyAny>) -> PyResult<()> {
        let callback = PyCallback::<SensorData>::new(callback)?;
        self.inner.listen(Arc::new(callback)).map_err(engine_err)
    }

    fn stop(&self) -> PyResult<()> {
        self.inner.stop().map_err(engine_err)
    }

    fn is_listening(&self) -> bool {
        self.inner.is_listening()
    }

    fn destroy(&self) -> bool {
        self.inner.destroy()
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

/// An `Actor` or `Sensor` argument
pub struct ActorRef(pub Actor);

impl<'py> FromPyObject<'py> for ActorRef {
    fn extract_bound(ob: &Bound<'py, PyAny>) -> PyResult<Self> {
        if let Ok(actor) = ob.downcast::<PyActor>() {
            return Ok(ActorRef(actor.borrow().inner.clone()));
        }
        if let Ok(sensor) = ob.downcast::<PySensor>() {
            return Ok(ActorRef(sensor.borrow().inner.actor().clone()));
        }
        Err(PyTypeError::new_err(format!(
            "expected Actor, found {}",
            ob.get_type().name()?
        )))
    }
}

/// An actor given either as an object or by id
pub struct ActorKey(pub ActorId);

impl<'py> FromPyObject<'py> for ActorKey {
    fn extract_bound(ob: &Bound<'py, PyAny>) -> PyResult<Self> {
        if let Ok(id) = ob.extract::<u32>() {
            return Ok(ActorKey(ActorId(id)));
        }
        let ActorRef(actor) = ob.extract()?;
        Ok(ActorKey(actor.id()))
    }
}

/// Python object of an actor: sensors surface as `Sensor`
pub fn actor_to_py(py: Python<'_>, actor: Actor) -> PyObject {
    match actor.clone().into_sensor() {
        Ok(sensor) => PySensor { inner: sensor }.into_py(py),
        Err(_) => PyActor { inner: actor }.into_py(py),
    }
}

/// Python wrapper for [`SensorData`]
#[pyclass(name = "SensorData")]
pub struct PySensorData {
    pub inner: SensorData,
}

#[pymethods]
impl PySensorData {
    #[getter]
    fn frame(&self) -> u64 {
        self.inner.frame
    }

    #[getter]
    fn timestamp(&self) -> f64 {
        self.inner.timestamp
    }

    #[getter]
    fn transform(&self) -> PyTransform {
        PyTransform {
            inner: self.inner.transform,
        }
    }

    #[getter]
    fn kind(&self) -> &'static str {
        self.inner.payload.kind()
    }

    /// Payload fields as a JSON string
    fn payload_json(&self) -> PyResult<String> {
        let payload: &SensorPayload = &self.inner.payload;
        serde_json::to_string(payload).map_err(|err| engine_err(err.into()))
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

impl IntoPy<PyObject> for SensorData {
    fn into_py(self, py: Python<'_>) -> PyObject {
        PySensorData { inner: self }.into_py(py)
    }
}
