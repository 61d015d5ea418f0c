//! PyO3 wrapper for the client

use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::bridge::duration_from_seconds;
use crate::engine::{Client, DEFAULT_TM_PORT};
use crate::gil::LockGate;

use super::commands::{into_commands, PyCommand, PyCommandResponse};
use super::convert::{engine_err, parse_client_config};
use super::managers::PyTrafficManager;
use super::world::PyWorld;

/// Python wrapper for [`Client`]
///
/// # Example (from Python)
///
/// ```python
/// import libsim
///
/// client = libsim.Client("localhost", 2000)
/// client.set_timeout(2.0)
/// world = client.load_world("Town02")
/// frame = world.tick()
/// ```
#[pyclass(name = "Client")]
pub struct PyClient {
    inner: Client,
}

#[pymethods]
impl PyClient {
    #[new]
    #[pyo3(signature = (host, port=2000))]
    fn new(host: String, port: u16) -> PyResult<Self> {
        let inner = Client::new(host, port).map_err(engine_err)?;
        Ok(PyClient { inner })
    }

    /// Create a client from a configuration dict
    ///
    /// Keys: `host` (required), `port`, `timeout_seconds`, `worker_threads`.
    #[staticmethod]
    fn from_config(config: &Bound<'_, PyDict>) -> PyResult<Self> {
        let config = parse_client_config(config)?;
        let inner = Client::from_config(config).map_err(engine_err)?;
        Ok(PyClient { inner })
    }

    fn set_timeout(&mut self, seconds: f64) {
        self.inner.set_timeout(duration_from_seconds(seconds));
    }

    fn get_timeout(&self) -> f64 {
        self.inner.get_timeout().as_secs_f64()
    }

    fn get_world(&self, py: Python<'_>) -> PyWorld {
        let client = self.inner.clone();
        PyWorld {
            inner: py.release_during(move || client.get_world()),
        }
    }

    /// Load a map as a new episode; actors of the old one are destroyed
    fn load_world(&self, py: Python<'_>, map_name: String) -> PyResult<PyWorld> {
        let client = self.inner.clone();
        let inner = py
            .release_during(move || client.load_world(&map_name))
            .map_err(engine_err)?;
        Ok(PyWorld { inner })
    }

    /// Reload the current map as a new episode
    fn reload_world(&self, py: Python<'_>) -> PyResult<PyWorld> {
        let client = self.inner.clone();
        let inner = py
            .release_during(move || client.reload_world())
            .map_err(engine_err)?;
        Ok(PyWorld { inner })
    }

    #[pyo3(signature = (port=None))]
    fn get_trafficmanager(&self, port: Option<u16>) -> PyTrafficManager {
        PyTrafficManager {
            inner: self.inner.get_trafficmanager(port.unwrap_or(DEFAULT_TM_PORT)),
        }
    }

    /// Apply commands; failures are logged, not returned
    fn apply_batch(&self, py: Python<'_>, commands: Vec<PyCommand>) {
        let client = self.inner.clone();
        let commands = into_commands(commands);
        py.release_during(move || client.apply_batch(commands));
    }

    /// Apply commands, optionally tick, and return one response per command
    #[pyo3(signature = (commands, do_tick=false))]
    fn apply_batch_sync(
        &self,
        py: Python<'_>,
        commands: Vec<PyCommand>,
        do_tick: bool,
    ) -> PyResult<Vec<PyCommandResponse>> {
        let client = self.inner.clone();
        let commands = into_commands(commands);
        let responses = py
            .release_during(move || client.apply_batch_sync(commands, do_tick))
            .map_err(engine_err)?;
        Ok(responses.into_iter().map(PyCommandResponse::from).collect())
    }

    fn get_available_maps(&self) -> Vec<String> {
        self.inner.get_available_maps()
    }

    fn get_client_version(&self) -> String {
        self.inner.get_client_version()
    }

    fn get_server_version(&self) -> String {
        self.inner.get_server_version()
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}
