//! PyO3 wrappers for batched commands
//!
//! Commands are built with module-level constructors mirroring the command
//! names (`SpawnActor`, `DestroyActor`, ...) and applied through
//! `Client.apply_batch` or `Client.apply_batch_sync`.

use pyo3::prelude::*;

use crate::engine::{Command, CommandResponse, DEFAULT_TM_PORT};

use super::actor::{ActorKey, PyActorBlueprint};
use super::geom::{PyTransform, PyVehicleControl};

/// Python wrapper for [`Command`]
#[pyclass(name = "Command")]
#[derive(Clone)]
pub struct PyCommand {
    pub inner: Command,
}

#[pymethods]
impl PyCommand {
    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

/// Python wrapper for [`CommandResponse`]
#[pyclass(name = "CommandResponse")]
pub struct PyCommandResponse {
    pub inner: CommandResponse,
}

#[pymethods]
impl PyCommandResponse {
    /// Id of the affected actor, `None` on failure
    #[getter]
    fn actor_id(&self) -> Option<u32> {
        self.inner.actor_id.map(|id| id.0)
    }

    #[getter]
    fn error(&self) -> Option<String> {
        self.inner.error.clone()
    }

    fn has_error(&self) -> bool {
        self.inner.has_error()
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

impl From<CommandResponse> for PyCommandResponse {
    fn from(inner: CommandResponse) -> Self {
        PyCommandResponse { inner }
    }
}

#[pyfunction]
#[pyo3(name = "SpawnActor", signature = (blueprint, transform, parent=None))]
pub fn spawn_actor(
    blueprint: PyActorBlueprint,
    transform: PyTransform,
    parent: Option<ActorKey>,
) -> PyCommand {
    PyCommand {
        inner: Command::SpawnActor {
            blueprint: blueprint.inner,
            transform: transform.inner,
            parent: parent.map(|ActorKey(id)| id),
        },
    }
}

#[pyfunction]
#[pyo3(name = "DestroyActor")]
pub fn destroy_actor(actor: ActorKey) -> PyCommand {
    PyCommand {
        inner: Command::DestroyActor(actor.0),
    }
}

#[pyfunction]
#[pyo3(name = "ApplyVehicleControl")]
pub fn apply_vehicle_control(actor: ActorKey, control: PyVehicleControl) -> PyCommand {
    PyCommand {
        inner: Command::ApplyVehicleControl(actor.0, control.inner),
    }
}

#[pyfunction]
#[pyo3(name = "ApplyTransform")]
pub fn apply_transform(actor: ActorKey, transform: PyTransform) -> PyCommand {
    PyCommand {
        inner: Command::ApplyTransform(actor.0, transform.inner),
    }
}

#[pyfunction]
#[pyo3(name = "SetAutopilot", signature = (actor, enabled, port=None))]
pub fn set_autopilot(actor: ActorKey, enabled: bool, port: Option<u16>) -> PyCommand {
    PyCommand {
        inner: Command::SetAutopilot(actor.0, enabled, port.unwrap_or(DEFAULT_TM_PORT)),
    }
}

/// Unwrap Python commands for the native batch
pub fn into_commands(commands: Vec<PyCommand>) -> Vec<Command> {
    commands.into_iter().map(|command| command.inner).collect()
}
