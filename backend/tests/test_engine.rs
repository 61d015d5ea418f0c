//! Tests for the native simulation core
//!
//! Each test connects to its own port so simulators are never shared
//! between tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use libsim::engine::{
    ActorId, Client, ClientConfig, Command, EngineError, LightGroup, Location, Rotation,
    SensorData, SensorPayload, Transform, VehicleControl, WeatherParameters, WorldSettings,
    DEFAULT_TM_PORT,
};

const TIMEOUT: Duration = Duration::from_secs(5);

fn at(x: f32, y: f32) -> Transform {
    Transform::new(Location::new(x, y, 0.5), Rotation::default())
}

#[test]
fn test_spawn_find_and_destroy() {
    let client = Client::new("localhost", 4401).unwrap();
    let world = client.get_world();
    let library = world.get_blueprint_library();

    let car = world
        .spawn_actor(&library.find("vehicle.audi.tt").unwrap(), at(0.0, 0.0), None)
        .unwrap();
    assert!(car.is_alive());
    assert_eq!(car.type_id(), "vehicle.audi.tt");
    assert_eq!(world.get_actor(car.id()).map(|a| a.id()), Some(car.id()));
    assert_eq!(world.get_actors().filter("vehicle.*").len(), 1);

    assert!(car.destroy());
    assert!(!car.destroy());
    assert!(!car.is_alive());
    assert!(world.get_actor(car.id()).is_none());
    assert_eq!(car.get_transform().unwrap_err(), EngineError::ActorNotFound(car.id()));
}

#[test]
fn test_spawn_on_occupied_spot_fails() {
    let client = Client::new("localhost", 4402).unwrap();
    let world = client.get_world();
    let blueprint = world.get_blueprint_library().find("vehicle.tesla.model3").unwrap();

    world.spawn_actor(&blueprint, at(25.0, 0.0), None).unwrap();
    let err = world.spawn_actor(&blueprint, at(25.5, 0.0), None).unwrap_err();
    assert!(matches!(err, EngineError::SpawnFailed(_)));
    assert!(world.try_spawn_actor(&blueprint, at(25.5, 0.0), None).is_none());
}

#[test]
fn test_unknown_blueprint_is_rejected() {
    let client = Client::new("localhost", 4403).unwrap();
    let world = client.get_world();
    let blueprint = libsim::engine::ActorBlueprint::new("vehicle.prototype.x", &[]);
    let err = world.spawn_actor(&blueprint, at(0.0, 0.0), None).unwrap_err();
    assert_eq!(err, EngineError::BlueprintNotFound("vehicle.prototype.x".to_string()));
}

#[test]
fn test_attached_actor_follows_parent() {
    let client = Client::new("localhost", 4404).unwrap();
    let world = client.get_world();
    let library = world.get_blueprint_library();

    let car = world
        .spawn_actor(&library.find("vehicle.audi.tt").unwrap(), at(10.0, 0.0), None)
        .unwrap();
    let offset = Transform::new(Location::new(0.0, 0.0, 2.0), Rotation::default());
    let imu = world
        .spawn_actor(&library.find("sensor.other.imu").unwrap(), offset, Some(&car))
        .unwrap();
    assert_eq!(imu.parent().unwrap().map(|p| p.id()), Some(car.id()));

    car.set_location(Location::new(40.0, 0.0, 0.5)).unwrap();
    let location = imu.get_location().unwrap();
    assert_eq!((location.x, location.z), (40.0, 2.5));
}

#[test]
fn test_vehicle_control_round_trip() {
    let client = Client::new("localhost", 4405).unwrap();
    let world = client.get_world();
    let library = world.get_blueprint_library();
    let car = world
        .spawn_actor(&library.find("vehicle.audi.tt").unwrap(), at(60.0, 0.0), None)
        .unwrap();

    let control = VehicleControl::new(0.7, -0.2, 0.0);
    car.apply_control(control).unwrap();
    assert_eq!(car.get_control().unwrap(), control);

    let walker = world
        .spawn_actor(&library.find("walker.pedestrian.0001").unwrap(), at(60.0, 30.0), None)
        .unwrap();
    assert!(walker.apply_control(control).is_err());
}

#[test]
fn test_sensor_single_listener() {
    let client = Client::new("localhost", 4406).unwrap();
    let world = client.get_world();
    let library = world.get_blueprint_library();

    let car = world
        .spawn_actor(&library.find("vehicle.audi.tt").unwrap(), at(80.0, 0.0), None)
        .unwrap();
    assert_eq!(car.clone().into_sensor().unwrap_err(), EngineError::NotASensor(car.id()));

    let gnss = world
        .spawn_actor(&library.find("sensor.other.gnss").unwrap(), Transform::default(), Some(&car))
        .unwrap()
        .into_sensor()
        .unwrap();
    gnss.listen(Arc::new(|_: SensorData| {})).unwrap();
    let err = gnss.listen(Arc::new(|_: SensorData| {})).unwrap_err();
    assert_eq!(err, EngineError::AlreadyListening(gnss.id()));

    gnss.stop().unwrap();
    assert!(!gnss.is_listening());
    gnss.listen(Arc::new(|_: SensorData| {})).unwrap();
}

#[test]
fn test_collision_sensor_reports_obstacle() {
    let client = Client::new("localhost", 4407).unwrap();
    let world = client.get_world();
    let library = world.get_blueprint_library();

    let car = world
        .spawn_actor(&library.find("vehicle.audi.tt").unwrap(), at(100.0, 0.0), None)
        .unwrap();
    let barrier = world
        .spawn_actor(&library.find("static.prop.streetbarrier").unwrap(), at(110.0, 0.0), None)
        .unwrap();
    let collision = world
        .spawn_actor(&library.find("sensor.other.collision").unwrap(), Transform::default(), Some(&car))
        .unwrap()
        .into_sensor()
        .unwrap();

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    collision
        .listen(Arc::new(move |data: SensorData| {
            if let SensorPayload::Collision(event) = data.payload {
                sink.lock().unwrap().push(event.other_actor);
            }
        }))
        .unwrap();

    world.tick(TIMEOUT).unwrap();
    assert!(events.lock().unwrap().is_empty());

    car.set_location(Location::new(109.0, 0.0, 0.5)).unwrap();
    world.tick(TIMEOUT).unwrap();
    assert_eq!(*events.lock().unwrap(), vec![barrier.id()]);
}

#[test]
fn test_tick_delivers_more_events_than_queue_capacity() {
    let client = Client::new("localhost", 4417).unwrap();
    let world = client.get_world();
    let gnss = world.get_blueprint_library().find("sensor.other.gnss").unwrap();
    let capacity = world.get_settings().dispatcher_capacity;

    let received = Arc::new(AtomicUsize::new(0));
    for _ in 0..capacity + 36 {
        let counter = Arc::clone(&received);
        world
            .spawn_actor(&gnss, Transform::default(), None)
            .unwrap()
            .into_sensor()
            .unwrap()
            .listen(Arc::new(move |_: SensorData| {
                counter.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
    }

    assert_eq!(world.tick(TIMEOUT).unwrap(), 1);
    assert_eq!(received.load(Ordering::SeqCst), capacity + 36);
}

#[test]
fn test_wait_for_tick_sees_tick_from_other_thread() {
    let client = Client::new("localhost", 4408).unwrap();
    let world = client.get_world();

    let waiter = {
        let world = world.clone();
        thread::spawn(move || world.wait_for_tick(TIMEOUT))
    };
    let mut frame = 0;
    while !waiter.is_finished() {
        thread::sleep(Duration::from_millis(5));
        frame = world.tick(TIMEOUT).unwrap();
    }
    let snapshot = waiter.join().unwrap().unwrap();
    assert!(snapshot.frame >= 1 && snapshot.frame <= frame);
}

#[test]
fn test_snapshot_lists_actors() {
    let client = Client::new("localhost", 4409).unwrap();
    let world = client.get_world();
    let blueprint = world.get_blueprint_library().find("vehicle.tesla.model3").unwrap();
    let car = world.spawn_actor(&blueprint, at(150.0, 0.0), None).unwrap();

    world.tick(TIMEOUT).unwrap();
    let snapshot = world.get_snapshot();
    assert_eq!(snapshot.frame, 1);
    assert_eq!(snapshot.episode_id, world.id());
    assert!(snapshot.has_actor(car.id()));
    assert!(snapshot.find(ActorId(9999)).is_none());

    let json = snapshot.to_json().unwrap();
    assert!(json.contains("vehicle.tesla.model3"));
}

#[test]
fn test_load_world_starts_new_episode() {
    let client = Client::new("localhost", 4410).unwrap();
    let old_world = client.get_world();
    let blueprint = old_world.get_blueprint_library().find("vehicle.audi.tt").unwrap();
    let car = old_world.spawn_actor(&blueprint, at(0.0, 0.0), None).unwrap();

    let world = client.load_world("Town03").unwrap();
    assert_ne!(world.id(), old_world.id());
    assert_eq!(world.get_map().name(), "Town03");
    assert_eq!(client.get_world().id(), world.id());

    assert!(!car.is_alive());
    assert_eq!(car.get_location().unwrap_err(), EngineError::ActorNotFound(car.id()));
    assert!(matches!(
        old_world.spawn_actor(&blueprint, at(0.0, 0.0), None),
        Err(EngineError::SpawnFailed(_))
    ));

    assert!(matches!(client.load_world("Atlantis"), Err(EngineError::MapNotFound(_))));
    assert_eq!(client.get_world().id(), world.id());
}

#[test]
fn test_settings_and_weather() {
    let client = Client::new("localhost", 4411).unwrap();
    let world = client.get_world();

    let settings = WorldSettings {
        synchronous_mode: true,
        fixed_delta_seconds: Some(0.1),
        ..WorldSettings::default()
    };
    world.apply_settings(settings.clone()).unwrap();
    assert_eq!(world.get_settings(), settings);
    world.tick(TIMEOUT).unwrap();
    assert!((world.get_snapshot().elapsed_seconds - 0.1).abs() < 1e-9);

    let invalid = WorldSettings {
        fixed_delta_seconds: Some(0.0),
        ..WorldSettings::default()
    };
    assert!(matches!(world.apply_settings(invalid), Err(EngineError::InvalidArgument(_))));

    world.set_weather(WeatherParameters::WET_NOON);
    assert_eq!(world.get_weather(), WeatherParameters::WET_NOON);
}

#[test]
fn test_batch_sync_reports_each_command() {
    let client = Client::new("localhost", 4412).unwrap();
    let world = client.get_world();
    let blueprint = world.get_blueprint_library().find("vehicle.audi.tt").unwrap();

    let responses = client
        .apply_batch_sync(
            vec![
                Command::SpawnActor {
                    blueprint: blueprint.clone(),
                    transform: at(0.0, 30.0),
                    parent: None,
                },
                Command::SpawnActor {
                    blueprint,
                    transform: at(0.0, 30.0),
                    parent: None,
                },
                Command::DestroyActor(ActorId(12345)),
            ],
            true,
        )
        .unwrap();

    assert_eq!(responses.len(), 3);
    assert!(!responses[0].has_error());
    assert!(responses[1].has_error());
    assert!(responses[2].has_error());
    assert_eq!(world.get_snapshot().frame, 1);

    let spawned = responses[0].actor_id.unwrap();
    client.apply_batch(vec![Command::SetAutopilot(spawned, true, DEFAULT_TM_PORT)]);
    assert!(world.get_actor(spawned).unwrap().is_autopilot().unwrap());
    assert!(client.get_trafficmanager(DEFAULT_TM_PORT).is_registered(spawned));
}

#[test]
fn test_traffic_manager_settings() {
    let client = Client::new("localhost", 4413).unwrap();
    let world = client.get_world();
    let car = world
        .spawn_actor(&world.get_blueprint_library().find("vehicle.audi.tt").unwrap(), at(0.0, 60.0), None)
        .unwrap();

    let tm = client.get_trafficmanager(8010);
    assert_eq!(tm.get_port(), 8010);
    assert_eq!(
        tm.vehicle_percentage_speed_difference(car.id(), 10.0).unwrap_err(),
        EngineError::ActorNotFound(car.id())
    );

    car.set_autopilot(true, 8010).unwrap();
    tm.vehicle_percentage_speed_difference(car.id(), -20.0).unwrap();
    assert_eq!(tm.speed_difference(car.id()), -20.0);
    assert!(tm.set_global_distance_to_leading_vehicle(-1.0).is_err());

    assert!(car.destroy());
    assert!(!tm.is_registered(car.id()));
}

#[test]
fn test_street_lights() {
    let client = Client::new("localhost", 4414).unwrap();
    let lights = client.get_world().get_lightmanager();

    let street = lights.get_all_lights(Some(LightGroup::Street));
    assert!(!street.is_empty());
    assert!(lights.get_all_lights(Some(LightGroup::Building)).is_empty());

    let first = &street[..2];
    lights.turn_on(first);
    assert_eq!(lights.is_active(first), vec![true, true]);
    lights.set_intensity(first, 250.0).unwrap();
    assert_eq!(lights.get_intensity(first), vec![250.0, 250.0]);
    assert!(lights.set_intensity(first, -1.0).is_err());
    lights.turn_off(first);
    assert_eq!(lights.is_active(first), vec![false, false]);
}

#[test]
fn test_map_waypoints() {
    let client = Client::new("localhost", 4415).unwrap();
    let map = client.get_world().get_map();

    let spawn_points = map.get_spawn_points();
    assert!(!spawn_points.is_empty());
    assert!(spawn_points.iter().all(|t| t.location.z == 0.5));

    let waypoints = map.generate_waypoints(50.0).unwrap();
    assert!(waypoints.iter().all(|w| w.s % 50.0 == 0.0));
    assert!(map.generate_waypoints(0.0).is_err());
}

#[test]
fn test_client_config_from_json() {
    let config = ClientConfig::from_json(r#"{"host": "sim.local", "port": 4416}"#).unwrap();
    assert_eq!(config.host, "sim.local");
    assert_eq!(config.port, 4416);
    assert_eq!(config.timeout(), Duration::from_secs(5));
    assert!(ClientConfig::from_json("{").is_err());

    let mut client = Client::from_config(config).unwrap();
    client.set_timeout(Duration::from_millis(250));
    assert_eq!(client.get_timeout(), Duration::from_millis(250));
}
