//! Street light control

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::episode::Episode;
use super::error::EngineError;
use super::geom::Location;

/// Category of a light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightGroup {
    Street,
    Building,
    Vehicle,
    Other,
}

impl fmt::Display for LightGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LightGroup::Street => "Street",
            LightGroup::Building => "Building",
            LightGroup::Vehicle => "Vehicle",
            LightGroup::Other => "Other",
        };
        f.write_str(name)
    }
}

impl FromStr for LightGroup {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Street" => Ok(LightGroup::Street),
            "Building" => Ok(LightGroup::Building),
            "Vehicle" => Ok(LightGroup::Vehicle),
            "Other" => Ok(LightGroup::Other),
            _ => Err(EngineError::InvalidArgument(format!("unknown light group '{}'", s))),
        }
    }
}

/// One light of the map
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub id: u32,
    pub location: Location,
    pub group: LightGroup,
}

impl fmt::Display for Light {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Light(id={}, group={}, location={})", self.id, self.group, self.location)
    }
}

/// Mutable state of a light
#[derive(Debug, Clone)]
pub(crate) struct LightRecord {
    pub light: Light,
    pub on: bool,
    /// Lumens
    pub intensity: f32,
}

impl LightRecord {
    pub fn new(light: Light) -> Self {
        LightRecord {
            light,
            on: false,
            intensity: 0.0,
        }
    }
}

/// Batch control over an episode's lights
#[derive(Clone)]
pub struct LightManager {
    episode: Arc<Episode>,
}

impl LightManager {
    pub(crate) fn new(episode: Arc<Episode>) -> Self {
        LightManager { episode }
    }

    /// All lights, optionally only those of one group
    pub fn get_all_lights(&self, group: Option<LightGroup>) -> Vec<Light> {
        self.episode
            .lock()
            .lights
            .iter()
            .map(|record| record.light)
            .filter(|light| group.map_or(true, |g| light.group == g))
            .collect()
    }

    pub fn turn_on(&self, lights: &[Light]) {
        self.update(lights, |record| record.on = true);
    }

    pub fn turn_off(&self, lights: &[Light]) {
        self.update(lights, |record| record.on = false);
    }

    /// Whether each light is on; unknown lights report `false`
    pub fn is_active(&self, lights: &[Light]) -> Vec<bool> {
        let state = self.episode.lock();
        lights
            .iter()
            .map(|light| {
                state
                    .lights
                    .iter()
                    .find(|record| record.light.id == light.id)
                    .map_or(false, |record| record.on)
            })
            .collect()
    }

    pub fn set_intensity(&self, lights: &[Light], intensity: f32) -> Result<(), EngineError> {
        if intensity < 0.0 {
            return Err(EngineError::InvalidArgument(format!(
                "light intensity must not be negative, got {}",
                intensity
            )));
        }
        self.update(lights, |record| record.intensity = intensity);
        Ok(())
    }

    pub fn get_intensity(&self, lights: &[Light]) -> Vec<f32> {
        let state = self.episode.lock();
        lights
            .iter()
            .map(|light| {
                state
                    .lights
                    .iter()
                    .find(|record| record.light.id == light.id)
                    .map_or(0.0, |record| record.intensity)
            })
            .collect()
    }

    fn update(&self, lights: &[Light], mut apply: impl FnMut(&mut LightRecord)) {
        let mut state = self.episode.lock();
        for record in state.lights.iter_mut() {
            if lights.iter().any(|light| light.id == record.light.id) {
                apply(record);
            }
        }
    }
}

impl fmt::Display for LightManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LightManager(episode={})", self.episode.id())
    }
}
