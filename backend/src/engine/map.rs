//! Road network of an episode
//!
//! Towns are built from straight roads along the x axis; enough topology
//! for waypoint queries and spawn points, no routing.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::EngineError;
use super::geom::{Location, Rotation, Transform};

/// Maps the simulator can load
pub const AVAILABLE_MAPS: [&str; 3] = ["Town01", "Town02", "Town03"];

/// Lateral distance beyond which a location is off-road
const MAX_PROJECTION_DISTANCE: f32 = 10.0;

/// Spacing between spawn points along a road
const SPAWN_POINT_SPACING: f32 = 25.0;

/// Height of spawn points above the road surface
const SPAWN_HEIGHT: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Road {
    id: u32,
    /// Start of the road center line
    origin: Location,
    length: f32,
    lane_width: f32,
}

/// A point on a road center line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub road_id: u32,
    pub lane_id: i32,
    /// Distance from the road start in meters
    pub s: f32,
    pub transform: Transform,
    pub lane_width: f32,
}

impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Waypoint(road_id={}, lane_id={}, s={:.6})",
            self.road_id, self.lane_id, self.s
        )
    }
}

/// The road network of a town
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Map {
    name: String,
    roads: Vec<Road>,
}

impl Map {
    /// Load one of [`AVAILABLE_MAPS`]
    pub fn load(name: &str) -> Result<Map, EngineError> {
        let (roads, length) = match name {
            "Town01" => (2, 200.0),
            "Town02" => (3, 150.0),
            "Town03" => (4, 400.0),
            _ => return Err(EngineError::MapNotFound(name.to_string())),
        };
        Ok(Map {
            name: name.to_string(),
            roads: (0..roads)
                .map(|i| Road {
                    id: i as u32,
                    origin: Location::new(0.0, 30.0 * i as f32, 0.0),
                    length,
                    lane_width: 3.5,
                })
                .collect(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Recommended spawn transforms, ordered by road then distance
    pub fn get_spawn_points(&self) -> Vec<Transform> {
        let mut points = Vec::new();
        for road in &self.roads {
            let mut s = 0.0;
            while s <= road.length {
                let location = Location::new(road.origin.x + s, road.origin.y, road.origin.z + SPAWN_HEIGHT);
                points.push(Transform::new(location, Rotation::default()));
                s += SPAWN_POINT_SPACING;
            }
        }
        points
    }

    /// Nearest waypoint on a road center line, or `None` when off-road
    ///
    /// # Example
    /// ```
    /// use libsim::engine::{Location, Map};
    ///
    /// let map = Map::load("Town01").unwrap();
    /// let waypoint = map.get_waypoint(&Location::new(12.0, 1.0, 0.0)).unwrap();
    /// assert_eq!((waypoint.road_id, waypoint.s), (0, 12.0));
    /// assert!(map.get_waypoint(&Location::new(0.0, -50.0, 0.0)).is_none());
    /// ```
    pub fn get_waypoint(&self, location: &Location) -> Option<Waypoint> {
        self.roads
            .iter()
            .map(|road| {
                let s = (location.x - road.origin.x).clamp(0.0, road.length);
                let on_road = Location::new(road.origin.x + s, road.origin.y, road.origin.z);
                (road, s, on_road.distance(location))
            })
            .filter(|(_, _, distance)| *distance <= MAX_PROJECTION_DISTANCE)
            .min_by(|a, b| a.2.total_cmp(&b.2))
            .map(|(road, s, _)| waypoint_on(road, s))
    }

    /// Waypoints every `distance` meters along every road
    pub fn generate_waypoints(&self, distance: f32) -> Result<Vec<Waypoint>, EngineError> {
        if !(distance > 0.0) {
            return Err(EngineError::InvalidArgument(format!(
                "waypoint distance must be positive, got {}",
                distance
            )));
        }
        let mut waypoints = Vec::new();
        for road in &self.roads {
            let mut s = 0.0;
            while s <= road.length {
                waypoints.push(waypoint_on(road, s));
                s += distance;
            }
        }
        Ok(waypoints)
    }
}

fn waypoint_on(road: &Road, s: f32) -> Waypoint {
    Waypoint {
        road_id: road.id,
        lane_id: -1,
        s,
        transform: Transform::new(
            Location::new(road.origin.x + s, road.origin.y, road.origin.z),
            Rotation::default(),
        ),
        lane_width: road.lane_width,
    }
}

impl fmt::Display for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Map(name={})", self.name)
    }
}
