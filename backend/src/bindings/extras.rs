//! Optional subsystems: the RSS restrictor and the OSM to OpenDRIVE converter

use crate::script::{Class, Module, ScriptError};

#[cfg(feature = "rss")]
pub fn export_ad_rss(module: &mut Module) -> Result<(), ScriptError> {
    use crate::bridge::call;
    use crate::engine::{RssRestrictor, VehicleControl};

    let restrictor = Class::of::<RssRestrictor>().init(
        |(max_brake_deceleration, response_time, min_safe_distance): (
            Option<f32>,
            Option<f32>,
            Option<f32>,
        )| {
            let defaults = RssRestrictor::default();
            RssRestrictor {
                max_brake_deceleration: max_brake_deceleration
                    .unwrap_or(defaults.max_brake_deceleration),
                response_time: response_time.unwrap_or(defaults.response_time),
                min_safe_distance: min_safe_distance.unwrap_or(defaults.min_safe_distance),
            }
        },
    );
    module.add_class(
        fields!(restrictor, RssRestrictor {
            max_brake_deceleration: f32,
            response_time: f32,
            min_safe_distance: f32,
        })
        .def("safe_distance", call(|rss: &RssRestrictor, speed: f32| rss.safe_distance(speed)))
        .def(
            "restrict_vehicle_control",
            call(|rss: &RssRestrictor, control: VehicleControl, distance: f32, speed: f32| {
                rss.restrict(control, distance, speed)
            }),
        )
        .def_repr()
        .build(),
    )
}

#[cfg(feature = "osm2odr")]
pub fn export_osm2odr(module: &mut Module) -> Result<(), ScriptError> {
    use crate::engine::{osm2odr, OsmToOdrSettings};

    use super::function;

    let settings = Class::of::<OsmToOdrSettings>().init(|(json,): (Option<String>,)| match json {
        Some(json) => OsmToOdrSettings::from_json(&json),
        None => Ok(OsmToOdrSettings::default()),
    });
    module.add_class(
        fields!(settings, OsmToOdrSettings {
            use_offsets: bool,
            offset_x: f64,
            offset_y: f64,
            default_lane_width: f64,
            elevation_layer_height: f64,
            generate_traffic_lights: bool,
        })
        .def_repr()
        .build(),
    )?;

    module.add_function(function(
        "osm_to_xodr",
        |(osm, settings): (String, Option<OsmToOdrSettings>)| {
            osm2odr::convert(&osm, &settings.unwrap_or_default())
        },
    ))
}
