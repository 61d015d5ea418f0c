//! Tests for the Python module
//!
//! Scripts run in an embedded interpreter against a freshly built `libsim`
//! module. Each test connects to its own port.
#![cfg(feature = "pyo3")]

use std::time::Duration;

use pyo3::exceptions::{PyRuntimeError, PyTypeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyModule};

use libsim::engine::{ActorId, EngineError};
use libsim::ffi::callback::PyCallback;
use libsim::ffi::convert::{engine_err, parse_client_config, TimeoutException};

/// Run `code` with `libsim` bound as a global
fn run(code: &str) -> PyResult<()> {
    pyo3::prepare_freethreaded_python();
    Python::with_gil(|py| {
        let module = PyModule::new_bound(py, "libsim")?;
        libsim::ffi::register_all(&module)?;
        let globals = PyDict::new_bound(py);
        globals.set_item("libsim", module)?;
        py.run_bound(code, Some(&globals), None)
    })
}

#[test]
fn test_module_exports_classes() {
    run(r#"
for name in ("Vector3D", "Location", "Rotation", "Transform", "VehicleControl",
             "WalkerControl", "ActorBlueprint", "BlueprintLibrary", "Actor", "Sensor",
             "SensorData", "WorldSnapshot", "WeatherParameters", "WorldSettings", "World",
             "Map", "Waypoint", "Client", "Command", "CommandResponse", "SpawnActor",
             "DestroyActor", "ApplyVehicleControl", "ApplyTransform", "SetAutopilot",
             "TrafficManager", "Light", "LightManager", "weather_preset", "WEATHER_PRESETS"):
    assert hasattr(libsim, name), name
assert issubclass(libsim.TimeoutException, RuntimeError)
assert "HardRainNoon" in libsim.WEATHER_PRESETS
"#)
    .unwrap();
}

#[test]
fn test_geometry_from_python() {
    run(r#"
a = libsim.Location(3.0, 4.0)
assert a.distance(libsim.Location()) == 5.0
t = libsim.Transform(a)
assert t.location == a
assert t.rotation.yaw == 0.0
try:
    libsim.Location("x")
except TypeError:
    pass
else:
    raise AssertionError("expected TypeError")
"#)
    .unwrap();
}

#[test]
fn test_tick_runs_python_callback() {
    run(r#"
world = libsim.Client("localhost", 4501).get_world()
frames = []
world.on_tick(lambda snapshot: frames.append(snapshot.frame))
assert world.tick() == 1
assert frames == [1]
"#)
    .unwrap();
}

#[test]
fn test_wait_for_tick_times_out() {
    run(r#"
world = libsim.Client("localhost", 4502).get_world()
try:
    world.wait_for_tick(0.02)
except libsim.TimeoutException:
    pass
else:
    raise AssertionError("expected TimeoutException")
"#)
    .unwrap();
}

#[test]
fn test_spawn_and_listen() {
    run(r#"
world = libsim.Client("localhost", 4503).get_world()
library = world.get_blueprint_library()
car = world.spawn_actor(library.find("vehicle.audi.tt"), libsim.Transform(libsim.Location(10.0, 0.0, 0.5)))
gnss = world.spawn_actor(library.find("sensor.other.gnss"), libsim.Transform(), car)
assert isinstance(gnss, libsim.Sensor)
try:
    world.spawn_actor(library.find("sensor.other.gnss"), libsim.Transform(), "car")
except TypeError:
    pass
else:
    raise AssertionError("expected TypeError")
received = []
gnss.listen(lambda data: received.append(data.frame))
world.tick()
assert received == [1]
try:
    library.find("vehicle.missing")
except IndexError:
    pass
else:
    raise AssertionError("expected IndexError")
"#)
    .unwrap();
}

#[test]
fn test_raising_callback_does_not_stop_dispatch() {
    run(r#"
world = libsim.Client("localhost", 4505).get_world()
def broken(snapshot):
    raise ValueError("broken callback")
frames = []
world.on_tick(broken)
world.on_tick(lambda snapshot: frames.append(snapshot.frame))
assert world.tick() == 1
assert world.tick() == 2
assert frames == [1, 2]
"#)
    .unwrap();
}

#[test]
fn test_wait_for_tick_releases_the_gil() {
    // The ticking thread needs the GIL while the main thread is blocked.
    run(r#"
import threading, time
world = libsim.Client("localhost", 4506).get_world()
def tick_later():
    time.sleep(0.05)
    world.tick()
ticker = threading.Thread(target=tick_later)
ticker.start()
snapshot = world.wait_for_tick(5.0)
ticker.join()
assert snapshot.frame == 1
"#)
    .unwrap();
}

#[test]
fn test_world_settings_and_weather() {
    run(r#"
world = libsim.Client("localhost", 4507).get_world()
settings = world.get_settings()
assert not settings.synchronous_mode
settings.synchronous_mode = True
settings.fixed_delta_seconds = 0.05
world.apply_settings(settings)
assert world.get_settings().synchronous_mode
assert world.get_settings().fixed_delta_seconds == 0.05
world.apply_settings({"no_rendering_mode": True})
assert world.get_settings().no_rendering_mode
try:
    libsim.WorldSettings(fixed_delta_seconds=-1.0)
except ValueError:
    pass
else:
    raise AssertionError("expected ValueError")

rain = libsim.weather_preset("HardRainNoon")
assert rain.precipitation == 100.0
world.set_weather(rain)
assert world.get_weather() == rain
try:
    libsim.weather_preset("Snow")
except ValueError:
    pass
else:
    raise AssertionError("expected ValueError")
"#)
    .unwrap();
}

#[test]
fn test_map_from_python() {
    run(r#"
world = libsim.Client("localhost", 4508).get_world()
town = world.get_map()
spawn_points = town.get_spawn_points()
assert spawn_points
assert all(point.location.z == 0.5 for point in spawn_points)
assert all(w.s % 50.0 == 0.0 for w in town.generate_waypoints(50.0))
assert libsim.Map(town.name).name == town.name
try:
    libsim.Map("Atlantis")
except RuntimeError:
    pass
else:
    raise AssertionError("expected RuntimeError")
"#)
    .unwrap();
}

#[test]
fn test_batch_and_traffic_manager() {
    run(r#"
client = libsim.Client("localhost", 4509)
world = client.get_world()
car = world.get_blueprint_library().find("vehicle.audi.tt")
responses = client.apply_batch_sync(
    [libsim.SpawnActor(car, libsim.Transform(libsim.Location(0.0, 0.0, 0.5))),
     libsim.DestroyActor(9999)],
    True)
assert not responses[0].has_error()
assert responses[1].has_error()
assert world.get_snapshot().frame == 1

vehicle = world.get_actor(responses[0].actor_id)
tm = client.get_trafficmanager(8020)
assert tm.get_port() == 8020
tm.register_vehicles([vehicle])
assert tm.is_registered(vehicle)
assert tm.registered_vehicles() == [vehicle.id]
tm.vehicle_percentage_speed_difference(vehicle, 20.0)
assert tm.get_speed_difference(vehicle) == 20.0

client.apply_batch([libsim.DestroyActor(vehicle)])
assert not vehicle.is_alive
"#)
    .unwrap();
}

#[test]
fn test_street_lights_from_python() {
    run(r#"
lights = libsim.Client("localhost", 4510).get_world().get_lightmanager()
street = lights.get_all_lights("Street")
assert street and all(light.group == "Street" for light in street)
first = street[:2]
lights.turn_on(first)
assert lights.is_active(first) == [True, True]
lights.set_intensity(first, 250.0)
assert lights.get_intensity(first) == [250.0, 250.0]
try:
    lights.get_all_lights("Sky")
except ValueError:
    pass
else:
    raise AssertionError("expected ValueError")
"#)
    .unwrap();
}

#[cfg(feature = "rss")]
#[test]
fn test_rss_restrictor_from_python() {
    run(r#"
rss = libsim.RssRestrictor()
wanted = libsim.VehicleControl(throttle=1.0)
assert rss.restrict_vehicle_control(wanted, 100.0, 10.0).throttle == 1.0
restricted = rss.restrict_vehicle_control(wanted, 5.0, 10.0)
assert restricted.throttle == 0.0 and restricted.brake > 0.0
rss.max_brake_deceleration = 0.0
try:
    rss.restrict_vehicle_control(wanted, 5.0, 10.0)
except ValueError:
    pass
else:
    raise AssertionError("expected ValueError")
"#)
    .unwrap();
}

#[cfg(feature = "osm2odr")]
#[test]
fn test_osm_to_xodr_from_python() {
    run(r#"
osm = """<osm version="0.6">
  <node id="1" lat="0.0" lon="0.0"/>
  <node id="2" lat="0.0" lon="0.001"/>
  <way id="10"><nd ref="1"/><nd ref="2"/></way>
</osm>"""
settings = libsim.Osm2OdrSettings('{"default_lane_width": 3.0}')
assert settings.default_lane_width == 3.0
odr = libsim.osm_to_xodr(osm, settings)
assert odr.count("<road ") == 1
assert '<width a="3.000"/>' in odr
"#)
    .unwrap();
}

#[test]
fn test_non_callable_callback_is_rejected() {
    pyo3::prepare_freethreaded_python();
    Python::with_gil(|py| {
        let value = 5_i32.into_py(py).into_bound(py);
        let err = PyCallback::<u64>::new(&value).err().unwrap();
        assert!(err.is_instance_of::<PyTypeError>(py));
        assert!(err.to_string().contains("must be callable"));
    });
}

#[test]
fn test_engine_errors_map_to_python_exceptions() {
    pyo3::prepare_freethreaded_python();
    Python::with_gil(|py| {
        let timeout = engine_err(EngineError::Timeout(Duration::from_millis(20)));
        assert!(timeout.is_instance_of::<TimeoutException>(py));
        assert!(timeout.is_instance_of::<PyRuntimeError>(py));

        let invalid = engine_err(EngineError::InvalidArgument("bad".to_string()));
        assert!(invalid.is_instance_of::<PyValueError>(py));

        let missing = engine_err(EngineError::ActorNotFound(ActorId(7)));
        assert!(missing.is_instance_of::<PyRuntimeError>(py));
        assert!(!missing.is_instance_of::<TimeoutException>(py));
    });
}

#[test]
fn test_client_config_requires_host() {
    pyo3::prepare_freethreaded_python();
    Python::with_gil(|py| {
        let dict = PyDict::new_bound(py);
        dict.set_item("port", 4504).unwrap();
        let err = parse_client_config(&dict).unwrap_err();
        assert!(err.is_instance_of::<PyValueError>(py));

        dict.set_item("host", "localhost").unwrap();
        let config = parse_client_config(&dict).unwrap();
        assert_eq!((config.host.as_str(), config.port), ("localhost", 4504));
    });
}
