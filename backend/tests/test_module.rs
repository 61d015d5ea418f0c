//! Tests for the Module Aggregator and the exported `libsim` module
//!
//! Scripts only see the module, so these tests drive everything through
//! `Module::call` and `Module::call_method`, the way a script would.

use std::sync::{Arc, Mutex};

use libsim::bindings::{
    export_geom, load_module, load_with, Export, MODULE_NAME, TIMEOUT_EXCEPTION,
};
use libsim::engine::{Location, SensorData, SensorPayload};
use libsim::script::{Callable, FromValue, Held, Interpreter, Module, ScriptError, Value};

fn str(s: &str) -> Value {
    Value::Str(s.to_string())
}

/// Client connected to its own in-process simulator
fn connect(module: &Module, held: Held<'_>, port: i64) -> Value {
    module
        .call(held, "Client", vec![str("localhost"), Value::Int(port)])
        .unwrap()
}

#[test]
fn test_module_has_path_and_every_subsystem() {
    let interp = Interpreter::new();
    let module = interp.with_ownership(|held| load_module(held)).unwrap();

    assert_eq!(module.name(), MODULE_NAME);
    assert_eq!(module.getattr("__path__").unwrap(), &str("libsim"));
    for class in [
        "Location",
        "Transform",
        "VehicleControl",
        "WeatherParameters",
        "ActorBlueprint",
        "BlueprintLibrary",
        "Actor",
        "Sensor",
        "SensorData",
        "WorldSnapshot",
        "World",
        "Map",
        "Client",
        "Command",
        "TrafficManager",
        "LightManager",
    ] {
        assert!(module.class(class).is_ok(), "missing class {}", class);
    }
    assert!(module.has_exception(TIMEOUT_EXCEPTION));
    assert_eq!(module.getattr(TIMEOUT_EXCEPTION).unwrap(), &str("libsim.TimeoutException"));
}

#[cfg(all(feature = "rss", feature = "osm2odr"))]
#[test]
fn test_optional_subsystems_registered() {
    let interp = Interpreter::new();
    let module = interp.with_ownership(|held| load_module(held)).unwrap();
    assert!(module.class("RssRestrictor").is_ok());
    assert!(module.class("Osm2OdrSettings").is_ok());
    assert!(module.getattr("osm_to_xodr").is_ok());
}

#[test]
fn test_failing_subsystem_aborts_initialization() {
    fn failing(module: &mut Module) -> Result<(), ScriptError> {
        module.add_exception(TIMEOUT_EXCEPTION)?;
        module.add_exception(TIMEOUT_EXCEPTION)
    }
    let exports = [("geom", export_geom as Export), ("exception", failing as Export)];
    let err = load_with(&exports).unwrap_err();
    assert!(err.message().contains("already registered"));
}

#[test]
fn test_geometry_from_script() {
    let interp = Interpreter::new();
    let module = interp.with_ownership(|held| load_module(held)).unwrap();

    interp.with_ownership(|held| {
        let a = module.call(held, "Location", vec![Value::Float(3.0), Value::Float(4.0)]).unwrap();
        let b = module.call(held, "Location", vec![]).unwrap();
        let distance = module.call_method(held, &a, "distance", vec![b.clone()]).unwrap();
        assert_eq!(f64::from_value(&distance).unwrap(), 5.0);

        module.call_method(held, &b, "set_x", vec![Value::Float(1.5)]).unwrap();
        assert_eq!(Location::from_value(&b).unwrap(), Location::new(1.5, 0.0, 0.0));

        let err = module.call(held, "Location", vec![str("north")]).unwrap_err();
        assert!(err.is_invalid_argument());
    });
}

#[test]
fn test_weather_presets() {
    let interp = Interpreter::new();
    let module = interp.with_ownership(|held| load_module(held)).unwrap();

    interp.with_ownership(|held| {
        let rain = module.call(held, "weather_preset", vec![str("HardRainNoon")]).unwrap();
        let precipitation = module.call_method(held, &rain, "precipitation", vec![]).unwrap();
        assert!(f64::from_value(&precipitation).unwrap() > 50.0);

        let err = module.call(held, "weather_preset", vec![str("Snowstorm")]).unwrap_err();
        assert_eq!(err.kind(), "ValueError");
    });
}

#[test]
fn test_blueprint_lookup_from_script() {
    let interp = Interpreter::new();
    let module = interp.with_ownership(|held| load_module(held)).unwrap();

    interp.with_ownership(|held| {
        let client = connect(&module, held, 4301);
        let world = module.call_method(held, &client, "get_world", vec![]).unwrap();
        let library = module.call_method(held, &world, "get_blueprint_library", vec![]).unwrap();

        let vehicles = module.call_method(held, &library, "filter", vec![str("vehicle.*")]).unwrap();
        assert_eq!(module.call_method(held, &vehicles, "__len__", vec![]).unwrap(), Value::Int(3));

        let err = module
            .call_method(held, &library, "find", vec![str("vehicle.unknown")])
            .unwrap_err();
        assert_eq!(err.kind(), "IndexError");
    });
}

#[test]
fn test_wait_for_tick_timeout_raises_timeout_exception() {
    let interp = Interpreter::new();
    let module = interp.with_ownership(|held| load_module(held)).unwrap();

    let err = interp
        .with_ownership(|held| {
            let client = connect(&module, held, 4302);
            let world = module.call_method(held, &client, "get_world", vec![])?;
            module.call_method(held, &world, "wait_for_tick", vec![Value::Float(0.02)])
        })
        .unwrap_err();
    assert_eq!(err.kind(), TIMEOUT_EXCEPTION);
}

#[test]
fn test_sensor_listen_end_to_end() {
    let interp = Interpreter::new();
    let module = interp.with_ownership(|held| load_module(held)).unwrap();
    let received = Arc::new(Mutex::new(Vec::new()));

    interp.with_ownership(|held| {
        let client = connect(&module, held, 4303);
        let world = module.call_method(held, &client, "get_world", vec![]).unwrap();
        let library = module.call_method(held, &world, "get_blueprint_library", vec![]).unwrap();
        let blueprint = module.call_method(held, &library, "find", vec![str("sensor.other.gnss")]).unwrap();
        let transform = module.call(held, "Transform", vec![]).unwrap();
        let sensor = module
            .call_method(held, &world, "spawn_actor", vec![blueprint, transform])
            .unwrap();
        assert_eq!(sensor.type_name(), "Sensor");

        // Rejected synchronously, nothing installed
        let err = module.call_method(held, &sensor, "listen", vec![Value::Int(1)]).unwrap_err();
        assert_eq!(err.message(), "callback argument must be callable!");
        assert_eq!(module.call_method(held, &sensor, "is_listening", vec![]).unwrap(), Value::Bool(false));

        let sink = Arc::clone(&received);
        let callback = Callable::new(held, "on_measurement", move |_, args| {
            sink.lock().unwrap().push(SensorData::from_value(&args[0])?);
            Ok(Value::None)
        });
        module
            .call_method(held, &sensor, "listen", vec![Value::Function(callback)])
            .unwrap();

        // Blocks until delivered; the callback needs the token meanwhile
        let frame = module.call_method(held, &world, "tick", vec![Value::Float(5.0)]).unwrap();
        assert_eq!(frame, Value::Int(1));
    });

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].frame, 1);
    assert!(matches!(received[0].payload, SensorPayload::Gnss(_)));
    assert!(interp.diagnostics().is_empty());
}

#[test]
fn test_batch_commands_from_script() {
    let interp = Interpreter::new();
    let module = interp.with_ownership(|held| load_module(held)).unwrap();

    interp.with_ownership(|held| {
        let client = connect(&module, held, 4304);
        let world = module.call_method(held, &client, "get_world", vec![]).unwrap();
        let library = module.call_method(held, &world, "get_blueprint_library", vec![]).unwrap();
        let blueprint = module.call_method(held, &library, "find", vec![str("vehicle.audi.tt")]).unwrap();
        let transform = module
            .call(
                held,
                "Transform",
                vec![module.call(held, "Location", vec![Value::Float(50.0), Value::Float(0.0), Value::Float(0.5)]).unwrap()],
            )
            .unwrap();

        let spawn = module.call(held, "SpawnActor", vec![blueprint, transform]).unwrap();
        let destroy_missing = module.call(held, "DestroyActor", vec![Value::Int(999)]).unwrap();
        let responses = module
            .call_method(
                held,
                &client,
                "apply_batch_sync",
                vec![Value::List(vec![spawn, destroy_missing]), Value::Bool(true)],
            )
            .unwrap();

        let responses = responses.as_list().unwrap().to_vec();
        assert_eq!(responses.len(), 2);
        let ok = module.call_method(held, &responses[0], "has_error", vec![]).unwrap();
        let failed = module.call_method(held, &responses[1], "has_error", vec![]).unwrap();
        assert_eq!(ok, Value::Bool(false));
        assert_eq!(failed, Value::Bool(true));

        let actors = module.call_method(held, &world, "get_actors", vec![]).unwrap();
        assert_eq!(module.call_method(held, &actors, "__len__", vec![]).unwrap(), Value::Int(1));
    });
}
