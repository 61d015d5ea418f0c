//! PyO3 wrappers for geometry, control and weather values

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::engine::{
    Location, Rotation, Transform, Vector3D, VehicleControl, WalkerControl, WeatherParameters,
};

/// Python wrapper for [`Vector3D`]
#[pyclass(name = "Vector3D")]
#[derive(Clone)]
pub struct PyVector3D {
    pub inner: Vector3D,
}

#[pymethods]
impl PyVector3D {
    #[new]
    #[pyo3(signature = (x=0.0, y=0.0, z=0.0))]
    fn new(x: f32, y: f32, z: f32) -> Self {
        PyVector3D {
            inner: Vector3D::new(x, y, z),
        }
    }

    #[getter]
    fn x(&self) -> f32 {
        self.inner.x
    }

    #[getter]
    fn y(&self) -> f32 {
        self.inner.y
    }

    #[getter]
    fn z(&self) -> f32 {
        self.inner.z
    }

    fn length(&self) -> f32 {
        self.inner.length()
    }

    fn dot(&self, other: &PyVector3D) -> f32 {
        self.inner.dot(&other.inner)
    }

    fn make_unit_vector(&self) -> PyVector3D {
        PyVector3D {
            inner: self.inner.normalized(),
        }
    }

    fn __add__(&self, other: &PyVector3D) -> PyVector3D {
        PyVector3D {
            inner: self.inner + other.inner,
        }
    }

    fn __sub__(&self, other: &PyVector3D) -> PyVector3D {
        PyVector3D {
            inner: self.inner - other.inner,
        }
    }

    fn __mul__(&self, k: f32) -> PyVector3D {
        PyVector3D {
            inner: self.inner * k,
        }
    }

    fn __eq__(&self, other: &PyVector3D) -> bool {
        self.inner == other.inner
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

/// Python wrapper for [`Location`]
#[pyclass(name = "Location")]
#[derive(Clone)]
pub struct PyLocation {
    pub inner: Location,
}

#[pymethods]
impl PyLocation {
    #[new]
    #[pyo3(signature = (x=0.0, y=0.0, z=0.0))]
    fn new(x: f32, y: f32, z: f32) -> Self {
        PyLocation {
            inner: Location::new(x, y, z),
        }
    }

    #[getter]
    fn x(&self) -> f32 {
        self.inner.x
    }

    #[getter]
    fn y(&self) -> f32 {
        self.inner.y
    }

    #[getter]
    fn z(&self) -> f32 {
        self.inner.z
    }

    fn distance(&self, other: &PyLocation) -> f32 {
        self.inner.distance(&other.inner)
    }

    fn __eq__(&self, other: &PyLocation) -> bool {
        self.inner == other.inner
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

/// Python wrapper for [`Rotation`]
#[pyclass(name = "Rotation")]
#[derive(Clone)]
pub struct PyRotation {
    pub inner: Rotation,
}

#[pymethods]
impl PyRotation {
    #[new]
    #[pyo3(signature = (pitch=0.0, yaw=0.0, roll=0.0))]
    fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        PyRotation {
            inner: Rotation::new(pitch, yaw, roll),
        }
    }

    #[getter]
    fn pitch(&self) -> f32 {
        self.inner.pitch
    }

    #[getter]
    fn yaw(&self) -> f32 {
        self.inner.yaw
    }

    #[getter]
    fn roll(&self) -> f32 {
        self.inner.roll
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

/// Python wrapper for [`Transform`]
#[pyclass(name = "Transform")]
#[derive(Clone)]
pub struct PyTransform {
    pub inner: Transform,
}

#[pymethods]
impl PyTransform {
    #[new]
    #[pyo3(signature = (location=None, rotation=None))]
    fn new(location: Option<PyLocation>, rotation: Option<PyRotation>) -> Self {
        PyTransform {
            inner: Transform::new(
                location.map(|l| l.inner).unwrap_or_default(),
                rotation.map(|r| r.inner).unwrap_or_default(),
            ),
        }
    }

    #[getter]
    fn location(&self) -> PyLocation {
        PyLocation {
            inner: self.inner.location,
        }
    }

    #[getter]
    fn rotation(&self) -> PyRotation {
        PyRotation {
            inner: self.inner.rotation,
        }
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

/// Python wrapper for [`VehicleControl`]
#[pyclass(name = "VehicleControl")]
#[derive(Clone)]
pub struct PyVehicleControl {
    pub inner: VehicleControl,
}

#[pymethods]
impl PyVehicleControl {
    #[new]
    #[pyo3(signature = (throttle=0.0, steer=0.0, brake=0.0, hand_brake=false, reverse=false))]
    fn new(throttle: f32, steer: f32, brake: f32, hand_brake: bool, reverse: bool) -> Self {
        PyVehicleControl {
            inner: VehicleControl {
                throttle,
                steer,
                brake,
                hand_brake,
                reverse,
                ..VehicleControl::default()
            },
        }
    }

    #[getter]
    fn throttle(&self) -> f32 {
        self.inner.throttle
    }

    #[getter]
    fn steer(&self) -> f32 {
        self.inner.steer
    }

    #[getter]
    fn brake(&self) -> f32 {
        self.inner.brake
    }

    #[getter]
    fn hand_brake(&self) -> bool {
        self.inner.hand_brake
    }

    #[getter]
    fn reverse(&self) -> bool {
        self.inner.reverse
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

/// Python wrapper for [`WalkerControl`]
#[pyclass(name = "WalkerControl")]
#[derive(Clone)]
pub struct PyWalkerControl {
    pub inner: WalkerControl,
}

#[pymethods]
impl PyWalkerControl {
    #[new]
    #[pyo3(signature = (direction=None, speed=0.0, jump=false))]
    fn new(direction: Option<PyVector3D>, speed: f32, jump: bool) -> Self {
        let direction = direction.map_or(WalkerControl::default().direction, |d| d.inner);
        PyWalkerControl {
            inner: WalkerControl {
                jump,
                ..WalkerControl::new(direction, speed)
            },
        }
    }

    #[getter]
    fn direction(&self) -> PyVector3D {
        PyVector3D {
            inner: self.inner.direction,
        }
    }

    #[getter]
    fn speed(&self) -> f32 {
        self.inner.speed
    }

    #[getter]
    fn jump(&self) -> bool {
        self.inner.jump
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

/// Python mirror of [`WeatherParameters`], every field read-write
#[pyclass(name = "WeatherParameters", get_all, set_all)]
#[derive(Clone, Copy)]
pub struct PyWeatherParameters {
    pub cloudiness: f32,
    pub precipitation: f32,
    pub precipitation_deposits: f32,
    pub wind_intensity: f32,
    pub sun_azimuth_angle: f32,
    pub sun_altitude_angle: f32,
    pub fog_density: f32,
    pub fog_distance: f32,
    pub wetness: f32,
}

#[pymethods]
impl PyWeatherParameters {
    /// Missing arguments keep the `ClearNoon` value
    #[new]
    #[pyo3(signature = (
        cloudiness=None,
        precipitation=None,
        precipitation_deposits=None,
        wind_intensity=None,
        sun_azimuth_angle=None,
        sun_altitude_angle=None,
        fog_density=None,
        fog_distance=None,
        wetness=None,
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        cloudiness: Option<f32>,
        precipitation: Option<f32>,
        precipitation_deposits: Option<f32>,
        wind_intensity: Option<f32>,
        sun_azimuth_angle: Option<f32>,
        sun_altitude_angle: Option<f32>,
        fog_density: Option<f32>,
        fog_distance: Option<f32>,
        wetness: Option<f32>,
    ) -> Self {
        let d = WeatherParameters::default();
        PyWeatherParameters {
            cloudiness: cloudiness.unwrap_or(d.cloudiness),
            precipitation: precipitation.unwrap_or(d.precipitation),
            precipitation_deposits: precipitation_deposits.unwrap_or(d.precipitation_deposits),
            wind_intensity: wind_intensity.unwrap_or(d.wind_intensity),
            sun_azimuth_angle: sun_azimuth_angle.unwrap_or(d.sun_azimuth_angle),
            sun_altitude_angle: sun_altitude_angle.unwrap_or(d.sun_altitude_angle),
            fog_density: fog_density.unwrap_or(d.fog_density),
            fog_distance: fog_distance.unwrap_or(d.fog_distance),
            wetness: wetness.unwrap_or(d.wetness),
        }
    }

    fn __eq__(&self, other: &PyWeatherParameters) -> bool {
        WeatherParameters::from(*self) == WeatherParameters::from(*other)
    }

    fn __repr__(&self) -> String {
        WeatherParameters::from(*self).to_string()
    }
}

impl From<WeatherParameters> for PyWeatherParameters {
    fn from(w: WeatherParameters) -> Self {
        PyWeatherParameters {
            cloudiness: w.cloudiness,
            precipitation: w.precipitation,
            precipitation_deposits: w.precipitation_deposits,
            wind_intensity: w.wind_intensity,
            sun_azimuth_angle: w.sun_azimuth_angle,
            sun_altitude_angle: w.sun_altitude_angle,
            fog_density: w.fog_density,
            fog_distance: w.fog_distance,
            wetness: w.wetness,
        }
    }
}

impl From<PyWeatherParameters> for WeatherParameters {
    fn from(w: PyWeatherParameters) -> Self {
        WeatherParameters {
            cloudiness: w.cloudiness,
            precipitation: w.precipitation,
            precipitation_deposits: w.precipitation_deposits,
            wind_intensity: w.wind_intensity,
            sun_azimuth_angle: w.sun_azimuth_angle,
            sun_altitude_angle: w.sun_altitude_angle,
            fog_density: w.fog_density,
            fog_distance: w.fog_distance,
            wetness: w.wetness,
        }
    }
}

/// Named weather preset
///
/// # Errors
///
/// `ValueError` for names not in `WEATHER_PRESETS`.
#[pyfunction]
pub fn weather_preset(name: &str) -> PyResult<PyWeatherParameters> {
    WeatherParameters::preset(name)
        .map(PyWeatherParameters::from)
        .ok_or_else(|| PyValueError::new_err(format!("unknown weather preset '{}'", name)))
}
