//! Geometry, control and weather classes

use crate::bridge::call;
use crate::engine::{
    Location, Rotation, Transform, Vector3D, VehicleControl, WalkerControl, WeatherParameters,
};
use crate::script::{Class, FromValue, IntoValue, Module, ScriptError, Value};

use super::function;

type Xyz = (Option<f32>, Option<f32>, Option<f32>);

fn xyz((x, y, z): Xyz) -> (f32, f32, f32) {
    (x.unwrap_or(0.0), y.unwrap_or(0.0), z.unwrap_or(0.0))
}

pub fn export_geom(module: &mut Module) -> Result<(), ScriptError> {
    let vector = Class::of::<Vector3D>().init(|args: Xyz| {
        let (x, y, z) = xyz(args);
        Vector3D::new(x, y, z)
    });
    module.add_class(
        fields!(vector, Vector3D { x: f32, y: f32, z: f32 })
            .def("length", call(Vector3D::length))
            .def("dot", call(|v: &Vector3D, other: Vector3D| v.dot(&other)))
            .def("make_unit_vector", call(Vector3D::normalized))
            .def("__add__", call(|v: &Vector3D, other: Vector3D| *v + other))
            .def("__sub__", call(|v: &Vector3D, other: Vector3D| *v - other))
            .def("__mul__", call(|v: &Vector3D, k: f32| *v * k))
            .def("__eq__", call(|v: &Vector3D, other: Vector3D| *v == other))
            .def_repr()
            .build(),
    )?;

    let location = Class::of::<Location>().init(|args: Xyz| {
        let (x, y, z) = xyz(args);
        Location::new(x, y, z)
    });
    module.add_class(
        fields!(location, Location { x: f32, y: f32, z: f32 })
            .def("distance", call(|l: &Location, other: Location| l.distance(&other)))
            .def("__add__", call(|l: &Location, offset: Vector3D| *l + offset))
            .def("__eq__", call(|l: &Location, other: Location| *l == other))
            .def_repr()
            .build(),
    )?;

    let rotation = Class::of::<Rotation>().init(|args: Xyz| {
        let (pitch, yaw, roll) = xyz(args);
        Rotation::new(pitch, yaw, roll)
    });
    module.add_class(
        fields!(rotation, Rotation { pitch: f32, yaw: f32, roll: f32 })
            .def("get_forward_vector", call(Rotation::forward_vector))
            .def("__eq__", call(|r: &Rotation, other: Rotation| *r == other))
            .def_repr()
            .build(),
    )?;

    let transform = Class::of::<Transform>().init(
        |(location, rotation): (Option<Location>, Option<Rotation>)| {
            Transform::new(location.unwrap_or_default(), rotation.unwrap_or_default())
        },
    );
    module.add_class(
        fields!(transform, Transform { location: Location, rotation: Rotation })
            .def("get_forward_vector", call(|t: &Transform| t.rotation.forward_vector()))
            .def("transform", call(|t: &Transform, point: Vector3D| t.transform_point(point)))
            .def("__eq__", call(|t: &Transform, other: Transform| *t == other))
            .def_repr()
            .build(),
    )?;
    Ok(())
}

pub fn export_control(module: &mut Module) -> Result<(), ScriptError> {
    let vehicle = Class::of::<VehicleControl>().init(
        |(throttle, steer, brake, hand_brake, reverse): (
            Option<f32>,
            Option<f32>,
            Option<f32>,
            Option<bool>,
            Option<bool>,
        )| VehicleControl {
            throttle: throttle.unwrap_or(0.0),
            steer: steer.unwrap_or(0.0),
            brake: brake.unwrap_or(0.0),
            hand_brake: hand_brake.unwrap_or(false),
            reverse: reverse.unwrap_or(false),
            ..VehicleControl::default()
        },
    );
    module.add_class(
        fields!(vehicle, VehicleControl {
            throttle: f32,
            steer: f32,
            brake: f32,
            hand_brake: bool,
            reverse: bool,
            manual_gear_shift: bool,
            gear: i32,
        })
        .def("__eq__", call(|c: &VehicleControl, other: VehicleControl| *c == other))
        .def_repr()
        .build(),
    )?;

    let walker = Class::of::<WalkerControl>().init(
        |(direction, speed, jump): (Option<Vector3D>, Option<f32>, Option<bool>)| {
            let defaults = WalkerControl::default();
            WalkerControl {
                jump: jump.unwrap_or(false),
                ..WalkerControl::new(direction.unwrap_or(defaults.direction), speed.unwrap_or(0.0))
            }
        },
    );
    module.add_class(
        fields!(walker, WalkerControl { direction: Vector3D, speed: f32, jump: bool })
            .def_repr()
            .build(),
    )?;
    Ok(())
}

pub fn export_weather(module: &mut Module) -> Result<(), ScriptError> {
    // Up to nine positional floats, in field order
    let weather = Class::of::<WeatherParameters>().init_raw(|_held, args| {
        if args.len() > 9 {
            return Err(ScriptError::TypeError(format!(
                "expected at most 9 argument(s), got {}",
                args.len()
            )));
        }
        let mut values = [None::<f32>; 9];
        for (slot, arg) in values.iter_mut().zip(&args) {
            *slot = Option::<f32>::from_value(arg)?;
        }
        let defaults = WeatherParameters::default();
        let pick = |i: usize, default: f32| values[i].unwrap_or(default);
        let weather = WeatherParameters {
            cloudiness: pick(0, defaults.cloudiness),
            precipitation: pick(1, defaults.precipitation),
            precipitation_deposits: pick(2, defaults.precipitation_deposits),
            wind_intensity: pick(3, defaults.wind_intensity),
            sun_azimuth_angle: pick(4, defaults.sun_azimuth_angle),
            sun_altitude_angle: pick(5, defaults.sun_altitude_angle),
            fog_density: pick(6, defaults.fog_density),
            fog_distance: pick(7, defaults.fog_distance),
            wetness: pick(8, defaults.wetness),
        };
        Ok(weather.into_value())
    });
    module.add_class(
        fields!(weather, WeatherParameters {
            cloudiness: f32,
            precipitation: f32,
            precipitation_deposits: f32,
            wind_intensity: f32,
            sun_azimuth_angle: f32,
            sun_altitude_angle: f32,
            fog_density: f32,
            fog_distance: f32,
            wetness: f32,
        })
        .def("__eq__", call(|w: &WeatherParameters, other: WeatherParameters| *w == other))
        .def_repr()
        .build(),
    )?;

    module.add_function(function("weather_preset", |(name,): (String,)| {
        WeatherParameters::preset(&name).ok_or_else(|| {
            ScriptError::ValueError(format!("unknown weather preset '{}'", name))
        })
    }))?;
    module.set_attr(
        "WEATHER_PRESETS",
        WeatherParameters::PRESETS.iter().map(|name| Value::Str(name.to_string())).collect::<Vec<_>>(),
    );
    Ok(())
}
