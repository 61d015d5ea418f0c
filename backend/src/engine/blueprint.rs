//! Actor blueprints and the blueprint library

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bridge::DisplayList;

use super::error::EngineError;

/// Template an actor is spawned from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorBlueprint {
    id: String,
    tags: Vec<String>,
    attributes: BTreeMap<String, String>,
}

impl ActorBlueprint {
    /// Blueprint with tags taken from the dotted id
    pub fn new(id: &str, attributes: &[(&str, &str)]) -> Self {
        ActorBlueprint {
            id: id.to_string(),
            tags: id.split('.').map(str::to_string).collect(),
            attributes: attributes
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Whether the id or any tag matches `pattern`
    pub fn matches_tags(&self, pattern: &str) -> bool {
        wildcard_match(pattern, &self.id) || self.tags.iter().any(|tag| wildcard_match(pattern, tag))
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Override an existing attribute
    pub fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), EngineError> {
        match self.attributes.get_mut(name) {
            Some(slot) => {
                *slot = value.to_string();
                Ok(())
            }
            None => Err(EngineError::InvalidArgument(format!(
                "blueprint '{}' has no attribute '{}'",
                self.id, name
            ))),
        }
    }

    pub fn is_sensor(&self) -> bool {
        self.id.starts_with("sensor.")
    }
}

impl fmt::Display for ActorBlueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorBlueprint(id={}, tags={})", self.id, DisplayList(&self.tags))
    }
}

/// All blueprints available in an episode
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlueprintLibrary {
    blueprints: Vec<ActorBlueprint>,
}

impl BlueprintLibrary {
    pub fn new(blueprints: Vec<ActorBlueprint>) -> Self {
        BlueprintLibrary { blueprints }
    }

    /// The blueprints every map ships with
    pub fn standard() -> Self {
        BlueprintLibrary::new(vec![
            ActorBlueprint::new(
                "vehicle.tesla.model3",
                &[("number_of_wheels", "4"), ("role_name", "autopilot"), ("color", "17,37,103")],
            ),
            ActorBlueprint::new(
                "vehicle.audi.tt",
                &[("number_of_wheels", "4"), ("role_name", "autopilot"), ("color", "255,255,255")],
            ),
            ActorBlueprint::new(
                "vehicle.carlamotors.carlacola",
                &[("number_of_wheels", "4"), ("role_name", "autopilot")],
            ),
            ActorBlueprint::new(
                "walker.pedestrian.0001",
                &[("is_invincible", "true"), ("role_name", "walker")],
            ),
            ActorBlueprint::new(
                "sensor.camera.rgb",
                &[("image_size_x", "800"), ("image_size_y", "600"), ("fov", "90"), ("role_name", "front")],
            ),
            ActorBlueprint::new("sensor.other.collision", &[("role_name", "collision")]),
            ActorBlueprint::new("sensor.other.gnss", &[("role_name", "gnss")]),
            ActorBlueprint::new("sensor.other.imu", &[("role_name", "imu")]),
            ActorBlueprint::new("static.prop.streetbarrier", &[("size", "small")]),
        ])
    }

    /// Blueprints whose id or tags match a `*`/`?` wildcard pattern
    ///
    /// # Example
    /// ```
    /// use libsim::engine::BlueprintLibrary;
    ///
    /// let library = BlueprintLibrary::standard();
    /// assert_eq!(library.filter("vehicle.*").len(), 3);
    /// assert_eq!(library.filter("gnss").len(), 1);
    /// ```
    pub fn filter(&self, pattern: &str) -> BlueprintLibrary {
        BlueprintLibrary::new(
            self.blueprints
                .iter()
                .filter(|bp| bp.matches_tags(pattern))
                .cloned()
                .collect(),
        )
    }

    pub fn find(&self, id: &str) -> Option<ActorBlueprint> {
        self.blueprints.iter().find(|bp| bp.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.blueprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ActorBlueprint> {
        self.blueprints.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActorBlueprint> {
        self.blueprints.iter()
    }
}

impl fmt::Display for BlueprintLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", DisplayList(&self.blueprints))
    }
}

/// Shell-style matching: `*` any run, `?` any single character
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    p = star + 1;
                    t = matched + 1;
                    backtrack = Some((star, matched + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_match() {
        assert!(wildcard_match("vehicle.*", "vehicle.audi.tt"));
        assert!(wildcard_match("*", ""));
        assert!(wildcard_match("sensor.?ther.*", "sensor.other.imu"));
        assert!(!wildcard_match("vehicle.*", "walker.pedestrian.0001"));
        assert!(!wildcard_match("a?", "a"));
    }

    #[test]
    fn test_find_missing_is_none() {
        assert!(BlueprintLibrary::standard().find("vehicle.unknown").is_none());
    }

    #[test]
    fn test_set_unknown_attribute_fails() {
        let mut bp = ActorBlueprint::new("sensor.other.imu", &[("role_name", "imu")]);
        assert!(bp.set_attribute("role_name", "hero").is_ok());
        assert_eq!(bp.get_attribute("role_name"), Some("hero"));
        assert!(matches!(
            bp.set_attribute("fov", "90"),
            Err(EngineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_display_lists_tags() {
        let bp = ActorBlueprint::new("static.prop.streetbarrier", &[]);
        assert_eq!(
            bp.to_string(),
            "ActorBlueprint(id=static.prop.streetbarrier, tags=[static, prop, streetbarrier])"
        );
    }
}
