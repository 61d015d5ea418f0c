//! Python bindings (feature `pyo3`)
//!
//! The same bridge as [`crate::bindings`], targeting CPython: the GIL is the
//! ownership token, [`gil::PythonGil`] and `Python<'_>` are its gates.

pub mod actor;
pub mod callback;
pub mod client;
pub mod commands;
pub mod convert;
#[cfg(any(feature = "rss", feature = "osm2odr"))]
pub mod extras;
pub mod geom;
pub mod gil;
pub mod managers;
pub mod world;

use pyo3::prelude::*;

use crate::bindings::MODULE_NAME;
use crate::engine::WeatherParameters;

/// Add every class, exception and function to `m`
///
/// Subsystems are registered in the same order as the native module's
/// exports; the optional ones only when their feature is enabled.
pub fn register_all(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("__path__", MODULE_NAME)?;
    register_geom(m)?;
    register_control(m)?;
    register_blueprint(m)?;
    register_actor(m)?;
    register_sensor(m)?;
    register_world(m)?;
    register_map(m)?;
    register_client(m)?;
    register_exceptions(m)?;
    register_commands(m)?;
    register_managers(m)?;
    #[cfg(feature = "rss")]
    m.add_class::<extras::PyRssRestrictor>()?;
    #[cfg(feature = "osm2odr")]
    {
        m.add_class::<extras::PyOsm2OdrSettings>()?;
        m.add_function(wrap_pyfunction!(extras::osm_to_xodr, m)?)?;
    }
    log::debug!("{} python module initialized", MODULE_NAME);
    Ok(())
}

fn register_geom(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<geom::PyVector3D>()?;
    m.add_class::<geom::PyLocation>()?;
    m.add_class::<geom::PyRotation>()?;
    m.add_class::<geom::PyTransform>()
}

fn register_control(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<geom::PyVehicleControl>()?;
    m.add_class::<geom::PyWalkerControl>()
}

fn register_exceptions(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add(
        "TimeoutException",
        m.py().get_type_bound::<convert::TimeoutException>(),
    )
}

fn register_blueprint(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<actor::PyActorBlueprint>()?;
    m.add_class::<actor::PyBlueprintLibrary>()
}

fn register_actor(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<actor::PyActor>()
}

fn register_sensor(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<actor::PySensor>()?;
    m.add_class::<actor::PySensorData>()
}

fn register_map(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<world::PyMap>()?;
    m.add_class::<world::PyWaypoint>()
}

fn register_world(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<geom::PyWeatherParameters>()?;
    m.add("WEATHER_PRESETS", WeatherParameters::PRESETS.to_vec())?;
    m.add_function(wrap_pyfunction!(geom::weather_preset, m)?)?;
    m.add_class::<world::PyWorldSettings>()?;
    m.add_class::<world::PyWorldSnapshot>()?;
    m.add_class::<world::PyWorld>()
}

fn register_commands(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<commands::PyCommand>()?;
    m.add_class::<commands::PyCommandResponse>()?;
    m.add_function(wrap_pyfunction!(commands::spawn_actor, m)?)?;
    m.add_function(wrap_pyfunction!(commands::destroy_actor, m)?)?;
    m.add_function(wrap_pyfunction!(commands::apply_vehicle_control, m)?)?;
    m.add_function(wrap_pyfunction!(commands::apply_transform, m)?)?;
    m.add_function(wrap_pyfunction!(commands::set_autopilot, m)?)
}

fn register_managers(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<managers::PyTrafficManager>()?;
    m.add_class::<managers::PyLight>()?;
    m.add_class::<managers::PyLightManager>()
}

fn register_client(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<client::PyClient>()
}
