//! Error translation and settings parsing at the Python boundary

use pyo3::create_exception;
use pyo3::exceptions::{PyRuntimeError, PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use crate::engine::{ClientConfig, EngineError, WorldSettings};

create_exception!(libsim, TimeoutException, PyRuntimeError);

/// Translate a native failure into a Python exception
pub fn engine_err(err: EngineError) -> PyErr {
    match err {
        EngineError::Timeout(_) => TimeoutException::new_err(err.to_string()),
        EngineError::InvalidArgument(_) | EngineError::Conversion(_) => {
            PyValueError::new_err(err.to_string())
        }
        _ => PyRuntimeError::new_err(err.to_string()),
    }
}

/// Extract a list argument element by element
///
/// # Errors
///
/// `TypeError` naming the offending index when an element does not convert.
pub fn extract_list<'py, T>(list: &Bound<'py, PyAny>) -> PyResult<Vec<T>>
where
    T: FromPyObject<'py>,
{
    let list = list.downcast::<PyList>().map_err(|_| {
        PyTypeError::new_err(format!(
            "expected list, found {}",
            list.get_type().name().map(|n| n.to_string()).unwrap_or_default()
        ))
    })?;
    list.iter()
        .enumerate()
        .map(|(i, item)| {
            item.extract::<T>()
                .map_err(|err| PyTypeError::new_err(format!("list item {}: {}", i, err)))
        })
        .collect()
}

// ========================================================================
// PyDict Extraction Helpers
// ========================================================================

/// Extract a required field from a Python dict
///
/// # Errors
///
/// `ValueError` when the field is missing; the conversion error otherwise.
fn extract_required<'py, T>(dict: &Bound<'py, PyDict>, key: &str) -> PyResult<T>
where
    T: FromPyObject<'py>,
{
    dict.get_item(key)?
        .ok_or_else(|| PyValueError::new_err(format!("Missing required field '{}'", key)))?
        .extract()
}

/// Extract a field, falling back to `default` when missing
fn extract_with_default<'py, T>(dict: &Bound<'py, PyDict>, key: &str, default: T) -> PyResult<T>
where
    T: FromPyObject<'py>,
{
    match dict.get_item(key)? {
        Some(value) => value.extract(),
        None => Ok(default),
    }
}

/// Convert a Python dict to [`ClientConfig`]
///
/// `host` is required; everything else has a default.
pub fn parse_client_config(dict: &Bound<'_, PyDict>) -> PyResult<ClientConfig> {
    let defaults = ClientConfig::default();
    let config = ClientConfig {
        host: extract_required(dict, "host")?,
        port: extract_with_default(dict, "port", defaults.port)?,
        timeout_seconds: extract_with_default(dict, "timeout_seconds", defaults.timeout_seconds)?,
        worker_threads: extract_with_default(dict, "worker_threads", defaults.worker_threads)?,
    };
    if config.timeout_seconds < 0.0 {
        return Err(PyValueError::new_err("timeout_seconds must not be negative"));
    }
    Ok(config)
}

/// Convert a Python dict to [`WorldSettings`]
pub fn parse_world_settings(dict: &Bound<'_, PyDict>) -> PyResult<WorldSettings> {
    let defaults = WorldSettings::default();
    let settings = WorldSettings {
        synchronous_mode: extract_with_default(dict, "synchronous_mode", defaults.synchronous_mode)?,
        no_rendering_mode: extract_with_default(
            dict,
            "no_rendering_mode",
            defaults.no_rendering_mode,
        )?,
        fixed_delta_seconds: extract_with_default(
            dict,
            "fixed_delta_seconds",
            defaults.fixed_delta_seconds,
        )?,
        dispatcher_capacity: extract_with_default(
            dict,
            "dispatcher_capacity",
            defaults.dispatcher_capacity,
        )?,
    };
    settings.validate().map_err(engine_err)?;
    Ok(settings)
}
