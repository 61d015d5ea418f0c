//! Blueprint, actor and sensor classes

use std::sync::Arc;

use crate::bridge::{call, call_mut, make_callback};
use crate::engine::{
    Actor, ActorBlueprint, BlueprintLibrary, CollisionEvent, GnssMeasurement, Image,
    ImuMeasurement, Location, Sensor, SensorData, Transform, VehicleControl, WalkerControl,
    DEFAULT_TM_PORT,
};
use crate::script::{Class, ClassBuilder, FromArgs, FromValue, Module, NativeClass, ScriptError, Value};

use super::convert::actor_value;

/// Classes whose instances are actors
trait AsActor: NativeClass {
    fn as_actor(&self) -> &Actor;
}

impl AsActor for Actor {
    fn as_actor(&self) -> &Actor {
        self
    }
}

impl AsActor for Sensor {
    fn as_actor(&self) -> &Actor {
        self.actor()
    }
}

/// Methods every actor class shares
fn actor_methods<T: AsActor>(builder: ClassBuilder<T>) -> ClassBuilder<T> {
    builder
        .def("id", call(|a: &T| a.as_actor().id()))
        .def("type_id", call(|a: &T| a.as_actor().type_id().to_string()))
        .def("is_alive", call(|a: &T| a.as_actor().is_alive()))
        .def(
            "attributes",
            call(|a: &T| {
                a.as_actor()
                    .attributes()
                    .map(|attributes| attributes.into_iter().collect::<Vec<(String, String)>>())
            }),
        )
        .def(
            "get_parent",
            call(|a: &T| a.as_actor().parent().map(|parent| parent.map(actor_value))),
        )
        .def("get_transform", call(|a: &T| a.as_actor().get_transform()))
        .def("get_location", call(|a: &T| a.as_actor().get_location()))
        .def(
            "set_transform",
            call(|a: &T, transform: Transform| a.as_actor().set_transform(transform)),
        )
        .def(
            "set_location",
            call(|a: &T, location: Location| a.as_actor().set_location(location)),
        )
        .def(
            "apply_control",
            call(|a: &T, control: VehicleControl| a.as_actor().apply_control(control)),
        )
        .def("get_control", call(|a: &T| a.as_actor().get_control()))
        .def(
            "apply_walker_control",
            call(|a: &T, control: WalkerControl| a.as_actor().apply_walker_control(control)),
        )
        .def(
            "set_autopilot",
            call(|a: &T, enabled: Option<bool>, port: Option<u16>| {
                a.as_actor()
                    .set_autopilot(enabled.unwrap_or(true), port.unwrap_or(DEFAULT_TM_PORT))
            }),
        )
        .def("is_autopilot", call(|a: &T| a.as_actor().is_autopilot()))
        .def("destroy", call(|a: &T| a.as_actor().destroy()))
        .def_repr()
}

pub fn export_blueprint(module: &mut Module) -> Result<(), ScriptError> {
    module.add_class(
        Class::of::<ActorBlueprint>()
            .def("id", call(|bp: &ActorBlueprint| bp.id().to_string()))
            .def("tags", call(|bp: &ActorBlueprint| bp.tags().to_vec()))
            .def("has_tag", call(|bp: &ActorBlueprint, tag: String| bp.has_tag(&tag)))
            .def(
                "match_tags",
                call(|bp: &ActorBlueprint, pattern: String| bp.matches_tags(&pattern)),
            )
            .def(
                "has_attribute",
                call(|bp: &ActorBlueprint, name: String| bp.has_attribute(&name)),
            )
            .def(
                "get_attribute",
                call(|bp: &ActorBlueprint, name: String| bp.get_attribute(&name).map(str::to_string)),
            )
            .def(
                "set_attribute",
                call_mut(|bp: &mut ActorBlueprint, name: String, value: String| {
                    bp.set_attribute(&name, &value)
                }),
            )
            .def_repr()
            .build(),
    )?;

    module.add_class(
        Class::of::<BlueprintLibrary>()
            .def(
                "filter",
                call(|library: &BlueprintLibrary, pattern: String| library.filter(&pattern)),
            )
            .def(
                "find",
                call(|library: &BlueprintLibrary, id: String| {
                    library
                        .find(&id)
                        .ok_or_else(|| ScriptError::IndexError(format!("no blueprint with id '{}'", id)))
                }),
            )
            .def("__len__", call(BlueprintLibrary::len))
            .def(
                "__getitem__",
                call(|library: &BlueprintLibrary, index: usize| {
                    library
                        .get(index)
                        .cloned()
                        .ok_or_else(|| ScriptError::IndexError("index out of range".to_string()))
                }),
            )
            .def(
                "to_list",
                call(|library: &BlueprintLibrary| library.iter().cloned().collect::<Vec<_>>()),
            )
            .def_repr()
            .build(),
    )?;
    Ok(())
}

pub fn export_actor(module: &mut Module) -> Result<(), ScriptError> {
    module.add_class(actor_methods(Class::of::<Actor>()).build())
}

pub fn export_sensor(module: &mut Module) -> Result<(), ScriptError> {
    let sensor = actor_methods(Class::of::<Sensor>())
        .def_raw("listen", |held, receiver, args| {
            let (callback,): (Value,) = FromArgs::from_args(&args)?;
            // Rejected before anything is installed
            let callback = make_callback::<SensorData>(held, &callback)?;
            let sensor = Sensor::from_value(receiver)?;
            sensor.listen(Arc::new(callback))?;
            Ok(Value::None)
        })
        .def("stop", call(Sensor::stop))
        .def("is_listening", call(Sensor::is_listening))
        .build();
    module.add_class(sensor)
}

pub fn export_sensor_data(module: &mut Module) -> Result<(), ScriptError> {
    module.add_class(
        getters!(Class::of::<SensorData>(), SensorData { frame, timestamp, transform })
            .def("kind", call(|data: &SensorData| data.payload.kind()))
            .def("payload", call(|data: &SensorData| data.payload.clone()))
            .def_repr()
            .build(),
    )?;
    module.add_class(
        getters!(Class::of::<Image>(), Image { width, height, fov })
            .def_repr()
            .build(),
    )?;
    module.add_class(
        getters!(Class::of::<CollisionEvent>(), CollisionEvent { other_actor, normal_impulse })
            .def_repr()
            .build(),
    )?;
    module.add_class(
        getters!(Class::of::<GnssMeasurement>(), GnssMeasurement { latitude, longitude, altitude })
            .def_repr()
            .build(),
    )?;
    module.add_class(
        getters!(Class::of::<ImuMeasurement>(), ImuMeasurement { accelerometer, gyroscope, compass })
            .def_repr()
            .build(),
    )?;
    Ok(())
}
