//! World, snapshot and map classes
//!
//! Every `World` call that waits on the simulator is registered
//! `without_lock`, so other script threads (and callbacks on the
//! dispatcher thread) keep running while it blocks.

use std::sync::Arc;

use crate::bridge::{call, make_callback, AdapterExt};
use crate::engine::{
    ActorBlueprint, ActorId, ActorList, ActorSnapshot, Location, Map, Transform, Waypoint,
    WeatherParameters, World, WorldSettings, WorldSnapshot,
};
use crate::script::{Class, FromArgs, FromValue, IntoValue, Module, ScriptError, Value};

use super::convert::{actor_value, timeout_or, ActorArg};

/// Default timeout of `tick` and `wait_for_tick`, seconds
const DEFAULT_TICK_TIMEOUT: f64 = 10.0;

pub fn export_snapshot(module: &mut Module) -> Result<(), ScriptError> {
    module.add_class(
        getters!(Class::of::<ActorSnapshot>(), ActorSnapshot { id, transform })
            .def("type_id", call(|actor: &ActorSnapshot| actor.type_id.clone()))
            .def("get_transform", call(|actor: &ActorSnapshot| actor.transform))
            .def_repr()
            .build(),
    )?;

    module.add_class(
        getters!(Class::of::<WorldSnapshot>(), WorldSnapshot {
            episode_id,
            frame,
            elapsed_seconds,
            delta_seconds,
        })
        .def("find", call(|s: &WorldSnapshot, id: ActorId| s.find(id).cloned()))
        .def("has_actor", call(|s: &WorldSnapshot, id: ActorId| s.has_actor(id)))
        .def("actors", call(|s: &WorldSnapshot| s.actors.clone()))
        .def("__len__", call(WorldSnapshot::len))
        .def("to_json", call(WorldSnapshot::to_json))
        .def_repr()
        .build(),
    )?;
    Ok(())
}

pub fn export_world(module: &mut Module) -> Result<(), ScriptError> {
    let settings = Class::of::<WorldSettings>().init(
        |(synchronous_mode, no_rendering_mode, fixed_delta_seconds): (
            Option<bool>,
            Option<bool>,
            Option<f64>,
        )| {
            let settings = WorldSettings {
                synchronous_mode: synchronous_mode.unwrap_or(false),
                no_rendering_mode: no_rendering_mode.unwrap_or(false),
                fixed_delta_seconds,
                ..WorldSettings::default()
            };
            settings.validate().map(|()| settings)
        },
    );
    module.add_class(
        fields!(settings, WorldSettings {
            synchronous_mode: bool,
            no_rendering_mode: bool,
            fixed_delta_seconds: Option<f64>,
        })
        .def_repr()
        .build(),
    )?;

    module.add_class(
        Class::of::<ActorList>()
            .def("filter", call(|list: &ActorList, pattern: String| list.filter(&pattern)))
            .def("find", call(|list: &ActorList, id: ActorId| list.find(id).map(actor_value)))
            .def("__len__", call(ActorList::len))
            .def(
                "__getitem__",
                call(|list: &ActorList, index: usize| {
                    list.iter()
                        .nth(index)
                        .cloned()
                        .map(actor_value)
                        .ok_or_else(|| ScriptError::IndexError("index out of range".to_string()))
                }),
            )
            .def(
                "to_list",
                call(|list: &ActorList| list.iter().cloned().map(actor_value).collect::<Vec<_>>()),
            )
            .def_repr()
            .build(),
    )?;

    let world = Class::of::<World>()
        .def("id", call(World::id))
        .def("get_map", call(World::get_map))
        .def("get_blueprint_library", call(World::get_blueprint_library))
        .def("get_lightmanager", call(World::get_lightmanager))
        .def(
            "spawn_actor",
            call(
                |w: &World, blueprint: ActorBlueprint, transform: Transform, parent: Option<ActorArg>| {
                    w.spawn_actor(&blueprint, transform, parent.as_ref().map(|p| &p.0))
                        .map(actor_value)
                },
            ),
        )
        .def(
            "try_spawn_actor",
            call(
                |w: &World, blueprint: ActorBlueprint, transform: Transform, parent: Option<ActorArg>| {
                    w.try_spawn_actor(&blueprint, transform, parent.as_ref().map(|p| &p.0))
                        .map(actor_value)
                },
            ),
        )
        .def(
            "get_actors",
            call(|w: &World, ids: Option<Vec<ActorId>>| match ids {
                Some(ids) => w.get_actors_by_id(&ids),
                None => w.get_actors(),
            }),
        )
        .def("get_actor", call(|w: &World, id: ActorId| w.get_actor(id).map(actor_value)))
        .def(
            "tick",
            call(|w: &World, seconds: Option<f64>| w.tick(timeout_or(seconds, DEFAULT_TICK_TIMEOUT)))
                .without_lock(),
        )
        .def(
            "wait_for_tick",
            call(|w: &World, seconds: Option<f64>| {
                w.wait_for_tick(timeout_or(seconds, DEFAULT_TICK_TIMEOUT))
            })
            .without_lock(),
        )
        .def("get_snapshot", call(World::get_snapshot).without_lock())
        .def("get_weather", call(World::get_weather))
        .def(
            "set_weather",
            call(|w: &World, weather: WeatherParameters| w.set_weather(weather)),
        )
        .def("get_settings", call(World::get_settings))
        .def(
            "apply_settings",
            call(|w: &World, settings: WorldSettings| w.apply_settings(settings)).without_lock(),
        )
        .def_raw("on_tick", |held, receiver, args| {
            let (callback,): (Value,) = FromArgs::from_args(&args)?;
            let callback = make_callback::<WorldSnapshot>(held, &callback)?;
            let world = World::from_value(receiver)?;
            Ok(world.on_tick(Arc::new(callback)).into_value())
        })
        .def("remove_on_tick", call(|w: &World, id: u64| w.remove_on_tick(id)))
        .def_repr()
        .build();
    module.add_class(world)
}

pub fn export_map(module: &mut Module) -> Result<(), ScriptError> {
    module.add_class(
        getters!(Class::of::<Waypoint>(), Waypoint { road_id, lane_id, s, transform, lane_width })
            .def_repr()
            .build(),
    )?;

    module.add_class(
        Class::of::<Map>()
            .init(|(name,): (String,)| Map::load(&name))
            .def("name", call(|map: &Map| map.name().to_string()))
            .def("get_spawn_points", call(Map::get_spawn_points))
            .def(
                "get_waypoint",
                call(|map: &Map, location: Location| map.get_waypoint(&location)),
            )
            .def(
                "generate_waypoints",
                call(|map: &Map, distance: f32| map.generate_waypoints(distance)),
            )
            .def_repr()
            .build(),
    )?;
    Ok(())
}
