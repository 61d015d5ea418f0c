//! Client, batch commands and the traffic and light managers

use crate::bridge::{call, call_mut, duration_from_seconds, AdapterExt};
use crate::engine::{
    ActorBlueprint, ActorId, Client, Command, CommandResponse, Light, LightGroup, LightManager,
    TrafficManager, Transform, VehicleControl, DEFAULT_TM_PORT,
};
use crate::script::{Class, Module, ScriptError};

use super::convert::{actor_ids, ActorArg};
use super::{function, TIMEOUT_EXCEPTION};

/// Port a client connects to when none is given
const DEFAULT_PORT: u16 = 2000;

pub fn export_client(module: &mut Module) -> Result<(), ScriptError> {
    let client = Class::of::<Client>()
        .init(|(host, port): (String, Option<u16>)| Client::new(host, port.unwrap_or(DEFAULT_PORT)))
        .def(
            "set_timeout",
            call_mut(|c: &mut Client, seconds: f64| c.set_timeout(duration_from_seconds(seconds))),
        )
        .def("get_timeout", call(|c: &Client| c.get_timeout().as_secs_f64()))
        .def("get_world", call(Client::get_world).without_lock())
        .def(
            "load_world",
            call(|c: &Client, map_name: String| c.load_world(&map_name)).without_lock(),
        )
        .def("reload_world", call(Client::reload_world).without_lock())
        .def("get_available_maps", call(Client::get_available_maps))
        .def("apply_batch", call(|c: &Client, commands: Vec<Command>| c.apply_batch(commands)))
        .def(
            "apply_batch_sync",
            call(|c: &Client, commands: Vec<Command>, do_tick: Option<bool>| {
                c.apply_batch_sync(commands, do_tick.unwrap_or(false))
            })
            .without_lock(),
        )
        .def(
            "get_trafficmanager",
            call(|c: &Client, port: Option<u16>| {
                c.get_trafficmanager(port.unwrap_or(DEFAULT_TM_PORT))
            }),
        )
        .def("get_client_version", call(Client::get_client_version))
        .def("get_server_version", call(Client::get_server_version))
        .def_repr()
        .build();
    module.add_class(client)
}

pub fn export_exception(module: &mut Module) -> Result<(), ScriptError> {
    module.add_exception(TIMEOUT_EXCEPTION)
}

pub fn export_commands(module: &mut Module) -> Result<(), ScriptError> {
    module.add_class(Class::of::<Command>().def_repr().build())?;
    module.add_class(
        Class::of::<CommandResponse>()
            .def("actor_id", call(|r: &CommandResponse| r.actor_id))
            .def("error", call(|r: &CommandResponse| r.error.clone()))
            .def("has_error", call(CommandResponse::has_error))
            .def_repr()
            .build(),
    )?;

    module.add_function(function(
        "SpawnActor",
        |(blueprint, transform, parent): (ActorBlueprint, Transform, Option<ActorId>)| {
            Command::SpawnActor {
                blueprint,
                transform,
                parent,
            }
        },
    ))?;
    module.add_function(function("DestroyActor", |(actor,): (ActorId,)| {
        Command::DestroyActor(actor)
    }))?;
    module.add_function(function(
        "ApplyVehicleControl",
        |(actor, control): (ActorId, VehicleControl)| Command::ApplyVehicleControl(actor, control),
    ))?;
    module.add_function(function(
        "ApplyTransform",
        |(actor, transform): (ActorId, Transform)| Command::ApplyTransform(actor, transform),
    ))?;
    module.add_function(function(
        "SetAutopilot",
        |(actor, enabled, port): (ActorId, bool, Option<u16>)| {
            Command::SetAutopilot(actor, enabled, port.unwrap_or(DEFAULT_TM_PORT))
        },
    ))?;
    Ok(())
}

pub fn export_trafficmanager(module: &mut Module) -> Result<(), ScriptError> {
    let traffic_manager = Class::of::<TrafficManager>()
        .def("get_port", call(TrafficManager::get_port))
        .def(
            "register_vehicles",
            call(|tm: &TrafficManager, actors: Vec<ActorArg>| {
                tm.register_vehicles(&actor_ids(&actors))
            }),
        )
        .def(
            "unregister_vehicles",
            call(|tm: &TrafficManager, actors: Vec<ActorArg>| {
                tm.unregister_vehicles(&actor_ids(&actors))
            }),
        )
        .def(
            "is_registered",
            call(|tm: &TrafficManager, actor: ActorArg| tm.is_registered(actor.0.id())),
        )
        .def("registered_vehicles", call(TrafficManager::registered_vehicles))
        .def(
            "set_global_distance_to_leading_vehicle",
            call(|tm: &TrafficManager, distance: f32| {
                tm.set_global_distance_to_leading_vehicle(distance)
            }),
        )
        .def(
            "get_global_distance_to_leading_vehicle",
            call(TrafficManager::global_distance_to_leading_vehicle),
        )
        .def(
            "global_percentage_speed_difference",
            call(|tm: &TrafficManager, percentage: f32| {
                tm.global_percentage_speed_difference(percentage)
            }),
        )
        .def(
            "vehicle_percentage_speed_difference",
            call(|tm: &TrafficManager, actor: ActorArg, percentage: f32| {
                tm.vehicle_percentage_speed_difference(actor.0.id(), percentage)
            }),
        )
        .def(
            "get_speed_difference",
            call(|tm: &TrafficManager, actor: ActorArg| tm.speed_difference(actor.0.id())),
        )
        .def_repr()
        .build();
    module.add_class(traffic_manager)
}

pub fn export_lightmanager(module: &mut Module) -> Result<(), ScriptError> {
    module.add_class(
        getters!(Class::of::<Light>(), Light { id, location, group })
            .def_repr()
            .build(),
    )?;

    let light_manager = Class::of::<LightManager>()
        .def(
            "get_all_lights",
            call(|lm: &LightManager, group: Option<LightGroup>| lm.get_all_lights(group)),
        )
        .def("turn_on", call(|lm: &LightManager, lights: Vec<Light>| lm.turn_on(&lights)))
        .def("turn_off", call(|lm: &LightManager, lights: Vec<Light>| lm.turn_off(&lights)))
        .def("is_active", call(|lm: &LightManager, lights: Vec<Light>| lm.is_active(&lights)))
        .def(
            "set_intensity",
            call(|lm: &LightManager, lights: Vec<Light>, intensity: f32| {
                lm.set_intensity(&lights, intensity)
            }),
        )
        .def(
            "get_intensity",
            call(|lm: &LightManager, lights: Vec<Light>| lm.get_intensity(&lights)),
        )
        .def_repr()
        .build();
    module.add_class(light_manager)
}
