//! PyO3 wrappers for the optional subsystems (features `rss`, `osm2odr`)

use pyo3::prelude::*;

#[cfg(feature = "osm2odr")]
use crate::engine::osm2odr;
#[cfg(feature = "osm2odr")]
use crate::engine::OsmToOdrSettings;
#[cfg(feature = "rss")]
use crate::engine::RssRestrictor;
#[cfg(feature = "osm2odr")]
use crate::gil::LockGate;

use super::convert::engine_err;
#[cfg(feature = "rss")]
use super::geom::PyVehicleControl;

/// Python mirror of [`RssRestrictor`]
#[cfg(feature = "rss")]
#[pyclass(name = "RssRestrictor", get_all, set_all)]
#[derive(Clone, Copy)]
pub struct PyRssRestrictor {
    pub max_brake_deceleration: f32,
    pub response_time: f32,
    pub min_safe_distance: f32,
}

#[cfg(feature = "rss")]
#[pymethods]
impl PyRssRestrictor {
    #[new]
    #[pyo3(signature = (max_brake_deceleration=None, response_time=None, min_safe_distance=None))]
    fn new(
        max_brake_deceleration: Option<f32>,
        response_time: Option<f32>,
        min_safe_distance: Option<f32>,
    ) -> Self {
        let defaults = RssRestrictor::default();
        PyRssRestrictor {
            max_brake_deceleration: max_brake_deceleration
                .unwrap_or(defaults.max_brake_deceleration),
            response_time: response_time.unwrap_or(defaults.response_time),
            min_safe_distance: min_safe_distance.unwrap_or(defaults.min_safe_distance),
        }
    }

    fn safe_distance(&self, speed: f32) -> f32 {
        RssRestrictor::from(*self).safe_distance(speed)
    }

    /// Restrict `control` given the gap to the leading vehicle and own speed
    fn restrict_vehicle_control(
        &self,
        control: PyVehicleControl,
        distance: f32,
        speed: f32,
    ) -> PyResult<PyVehicleControl> {
        let inner = RssRestrictor::from(*self)
            .restrict(control.inner, distance, speed)
            .map_err(engine_err)?;
        Ok(PyVehicleControl { inner })
    }

    fn __repr__(&self) -> String {
        RssRestrictor::from(*self).to_string()
    }
}

#[cfg(feature = "rss")]
impl From<PyRssRestrictor> for RssRestrictor {
    fn from(rss: PyRssRestrictor) -> Self {
        RssRestrictor {
            max_brake_deceleration: rss.max_brake_deceleration,
            response_time: rss.response_time,
            min_safe_distance: rss.min_safe_distance,
        }
    }
}

/// Python mirror of [`OsmToOdrSettings`]
#[cfg(feature = "osm2odr")]
#[pyclass(name = "Osm2OdrSettings", get_all, set_all)]
#[derive(Clone)]
pub struct PyOsm2OdrSettings {
    pub use_offsets: bool,
    pub offset_x: f64,
    pub offset_y: f64,
    pub default_lane_width: f64,
    pub elevation_layer_height: f64,
    pub generate_traffic_lights: bool,
}

#[cfg(feature = "osm2odr")]
#[pymethods]
impl PyOsm2OdrSettings {
    /// Defaults, overridden by the keys of an optional JSON object
    #[new]
    #[pyo3(signature = (json=None))]
    fn new(json: Option<&str>) -> PyResult<Self> {
        let settings = match json {
            Some(json) => OsmToOdrSettings::from_json(json).map_err(engine_err)?,
            None => OsmToOdrSettings::default(),
        };
        Ok(settings.into())
    }

    fn __repr__(&self) -> String {
        OsmToOdrSettings::from(self.clone()).to_string()
    }
}

#[cfg(feature = "osm2odr")]
impl From<OsmToOdrSettings> for PyOsm2OdrSettings {
    fn from(s: OsmToOdrSettings) -> Self {
        PyOsm2OdrSettings {
            use_offsets: s.use_offsets,
            offset_x: s.offset_x,
            offset_y: s.offset_y,
            default_lane_width: s.default_lane_width,
            elevation_layer_height: s.elevation_layer_height,
            generate_traffic_lights: s.generate_traffic_lights,
        }
    }
}

#[cfg(feature = "osm2odr")]
impl From<PyOsm2OdrSettings> for OsmToOdrSettings {
    fn from(s: PyOsm2OdrSettings) -> Self {
        OsmToOdrSettings {
            use_offsets: s.use_offsets,
            offset_x: s.offset_x,
            offset_y: s.offset_y,
            default_lane_width: s.default_lane_width,
            elevation_layer_height: s.elevation_layer_height,
            generate_traffic_lights: s.generate_traffic_lights,
        }
    }
}

/// Convert OSM XML to OpenDRIVE with the GIL released
#[cfg(feature = "osm2odr")]
#[pyfunction]
#[pyo3(signature = (osm, settings=None))]
pub fn osm_to_xodr(
    py: Python<'_>,
    osm: String,
    settings: Option<PyOsm2OdrSettings>,
) -> PyResult<String> {
    let settings = settings.map(OsmToOdrSettings::from).unwrap_or_default();
    py.release_during(move || osm2odr::convert(&osm, &settings))
        .map_err(engine_err)
}
