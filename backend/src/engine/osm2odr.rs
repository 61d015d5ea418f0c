//! OpenStreetMap to OpenDRIVE conversion
//!
//! Understands the subset of OSM XML the converter needs: `node` elements
//! with coordinates and `way` elements referencing them. Each way becomes
//! one OpenDRIVE road with a straight-line reference geometry per segment.

use std::collections::HashMap;
use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

use super::error::EngineError;

const METERS_PER_DEGREE: f64 = 111_319.49;

/// Conversion settings
///
/// # Example
/// ```
/// use libsim::engine::OsmToOdrSettings;
///
/// let settings = OsmToOdrSettings::from_json(r#"{"default_lane_width": 3.0}"#).unwrap();
/// assert_eq!(settings.default_lane_width, 3.0);
/// assert!(!settings.use_offsets);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OsmToOdrSettings {
    pub use_offsets: bool,
    pub offset_x: f64,
    pub offset_y: f64,
    pub default_lane_width: f64,
    pub elevation_layer_height: f64,
    pub generate_traffic_lights: bool,
}

impl Default for OsmToOdrSettings {
    fn default() -> Self {
        OsmToOdrSettings {
            use_offsets: false,
            offset_x: 0.0,
            offset_y: 0.0,
            default_lane_width: 4.0,
            elevation_layer_height: 0.0,
            generate_traffic_lights: false,
        }
    }
}

impl OsmToOdrSettings {
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl fmt::Display for OsmToOdrSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OSM2ODR_Settings(use_offsets={}, offset_x={}, offset_y={}, default_lane_width={})",
            self.use_offsets, self.offset_x, self.offset_y, self.default_lane_width
        )
    }
}

/// Convert OSM XML into an OpenDRIVE document
///
/// # Errors
///
/// `InvalidArgument` when the input is not an OSM document or a way
/// references an unknown node.
pub fn convert(osm: &str, settings: &OsmToOdrSettings) -> Result<String, EngineError> {
    if !osm.contains("<osm") {
        return Err(EngineError::InvalidArgument(
            "input is not an OpenStreetMap document".to_string(),
        ));
    }

    let mut nodes = HashMap::new();
    for tag in elements(osm, "node") {
        let id = attribute(tag, "id")?;
        let lat: f64 = parse(attribute(tag, "lat")?, "lat")?;
        let lon: f64 = parse(attribute(tag, "lon")?, "lon")?;
        nodes.insert(id, (lat, lon));
    }
    let origin_lat = nodes
        .values()
        .map(|&(lat, _)| lat)
        .fold(f64::INFINITY, f64::min);
    let origin_lat = if origin_lat.is_finite() { origin_lat } else { 0.0 };

    let project = |(lat, lon): (f64, f64)| {
        let mut x = lon * METERS_PER_DEGREE * origin_lat.to_radians().cos();
        let mut y = lat * METERS_PER_DEGREE;
        if settings.use_offsets {
            x += settings.offset_x;
            y += settings.offset_y;
        }
        (x, y)
    };

    let mut roads = String::new();
    let mut road_id = 0;
    let mut rest = osm;
    while let Some(start) = rest.find("<way") {
        let end = rest[start..]
            .find("</way>")
            .map(|end| start + end)
            .unwrap_or(rest.len());
        let way = &rest[start..end];
        rest = &rest[end..];
        if rest.starts_with("</way>") {
            rest = &rest["</way>".len()..];
        }

        let mut points = Vec::new();
        for nd in elements(way, "nd") {
            let reference = attribute(nd, "ref")?;
            let node = nodes.get(reference).ok_or_else(|| {
                EngineError::InvalidArgument(format!("way references unknown node {}", reference))
            })?;
            points.push(project(*node));
        }
        if points.len() < 2 {
            continue;
        }

        road_id += 1;
        write_road(&mut roads, road_id, &points, settings);
    }

    let mut document = String::from("<?xml version=\"1.0\" standalone=\"yes\"?>\n<OpenDRIVE>\n");
    document.push_str("  <header revMajor=\"1\" revMinor=\"4\" name=\"osm2odr\"/>\n");
    document.push_str(&roads);
    document.push_str("</OpenDRIVE>\n");
    log::debug!("converted {} node(s) into {} road(s)", nodes.len(), road_id);
    Ok(document)
}

fn write_road(out: &mut String, id: u32, points: &[(f64, f64)], settings: &OsmToOdrSettings) {
    let segments: Vec<((f64, f64), f64, f64)> = points
        .windows(2)
        .map(|pair| {
            let (dx, dy) = (pair[1].0 - pair[0].0, pair[1].1 - pair[0].1);
            (pair[0], dy.atan2(dx), dx.hypot(dy))
        })
        .collect();
    let length: f64 = segments.iter().map(|segment| segment.2).sum();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "  <road id=\"{}\" length=\"{:.3}\" junction=\"-1\">", id, length);
    let _ = writeln!(out, "    <planView>");
    let mut s = 0.0;
    for ((x, y), heading, segment_length) in &segments {
        let _ = writeln!(
            out,
            "      <geometry s=\"{:.3}\" x=\"{:.3}\" y=\"{:.3}\" hdg=\"{:.6}\" length=\"{:.3}\"><line/></geometry>",
            s, x, y, heading, segment_length
        );
        s += segment_length;
    }
    let _ = writeln!(out, "    </planView>");
    let _ = writeln!(
        out,
        "    <lanes><laneSection s=\"0\"><right><lane id=\"-1\" type=\"driving\"><width a=\"{:.3}\"/></lane></right></laneSection></lanes>",
        settings.default_lane_width
    );
    let _ = writeln!(out, "  </road>");
}

/// Opening tags `<name ...>` in document order
fn elements<'a>(xml: &'a str, name: &str) -> impl Iterator<Item = &'a str> + 'a {
    let open = format!("<{}", name);
    let mut rest = xml;
    std::iter::from_fn(move || loop {
        let start = rest.find(&open)?;
        let after = &rest[start + open.len()..];
        let end = after.find('>')?;
        let tag = &after[..end];
        rest = &after[end..];
        // `<node` must not match `<nodes` and the like
        if tag.starts_with(|c: char| c.is_whitespace() || c == '/') || tag.is_empty() {
            return Some(tag);
        }
    })
}

fn attribute<'a>(tag: &'a str, name: &str) -> Result<&'a str, EngineError> {
    let key = format!(" {}=\"", name);
    let start = tag
        .find(&key)
        .map(|i| i + key.len())
        .ok_or_else(|| EngineError::InvalidArgument(format!("missing attribute '{}'", name)))?;
    let end = tag[start..]
        .find('"')
        .ok_or_else(|| EngineError::InvalidArgument(format!("unterminated attribute '{}'", name)))?;
    Ok(&tag[start..start + end])
}

fn parse(value: &str, name: &str) -> Result<f64, EngineError> {
    value
        .parse()
        .map_err(|_| EngineError::InvalidArgument(format!("invalid {} '{}'", name, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const OSM: &str = r#"<?xml version="1.0"?>
<osm version="0.6">
  <node id="1" lat="0.0" lon="0.0"/>
  <node id="2" lat="0.0" lon="0.001"/>
  <node id="3" lat="0.001" lon="0.001"/>
  <way id="10">
    <nd ref="1"/>
    <nd ref="2"/>
    <nd ref="3"/>
    <tag k="highway" v="residential"/>
  </way>
</osm>"#;

    #[test]
    fn test_one_way_becomes_one_road() {
        let odr = convert(OSM, &OsmToOdrSettings::default()).unwrap();
        assert_eq!(odr.matches("<road ").count(), 1);
        assert_eq!(odr.matches("<geometry ").count(), 2);
        assert!(odr.contains("<width a=\"4.000\"/>"));
    }

    #[test]
    fn test_unknown_node_reference() {
        let broken = OSM.replace("<nd ref=\"3\"/>", "<nd ref=\"99\"/>");
        let err = convert(&broken, &OsmToOdrSettings::default()).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidArgument("way references unknown node 99".to_string())
        );
    }

    #[test]
    fn test_rejects_non_osm_input() {
        assert!(convert("<svg/>", &OsmToOdrSettings::default()).is_err());
    }
}
