//! Weather parameters and presets

use std::fmt;

use serde::{Deserialize, Serialize};

/// Weather of an episode
///
/// Percentages are in `[0, 100]`, angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherParameters {
    pub cloudiness: f32,
    pub precipitation: f32,
    pub precipitation_deposits: f32,
    pub wind_intensity: f32,
    pub sun_azimuth_angle: f32,
    pub sun_altitude_angle: f32,
    pub fog_density: f32,
    pub fog_distance: f32,
    pub wetness: f32,
}

impl Default for WeatherParameters {
    fn default() -> Self {
        WeatherParameters::CLEAR_NOON
    }
}

impl WeatherParameters {
    pub const CLEAR_NOON: WeatherParameters = WeatherParameters::preset_values(5.0, 0.0, 0.0, 10.0, 45.0);
    pub const CLOUDY_NOON: WeatherParameters = WeatherParameters::preset_values(60.0, 0.0, 0.0, 10.0, 45.0);
    pub const WET_NOON: WeatherParameters = WeatherParameters::preset_values(5.0, 0.0, 50.0, 10.0, 45.0);
    pub const HARD_RAIN_NOON: WeatherParameters = WeatherParameters::preset_values(100.0, 100.0, 90.0, 100.0, 45.0);
    pub const CLEAR_SUNSET: WeatherParameters = WeatherParameters::preset_values(5.0, 0.0, 0.0, 10.0, 15.0);

    const fn preset_values(
        cloudiness: f32,
        precipitation: f32,
        precipitation_deposits: f32,
        wind_intensity: f32,
        sun_altitude_angle: f32,
    ) -> Self {
        WeatherParameters {
            cloudiness,
            precipitation,
            precipitation_deposits,
            wind_intensity,
            sun_azimuth_angle: 0.0,
            sun_altitude_angle,
            fog_density: 0.0,
            fog_distance: 0.0,
            wetness: 0.0,
        }
    }

    /// Names of the built-in presets
    pub const PRESETS: [&'static str; 5] =
        ["ClearNoon", "CloudyNoon", "WetNoon", "HardRainNoon", "ClearSunset"];

    /// Look up a preset by name
    ///
    /// # Example
    /// ```
    /// use libsim::engine::WeatherParameters;
    ///
    /// let weather = WeatherParameters::preset("HardRainNoon").unwrap();
    /// assert_eq!(weather.precipitation, 100.0);
    /// assert!(WeatherParameters::preset("Snow").is_none());
    /// ```
    pub fn preset(name: &str) -> Option<WeatherParameters> {
        match name {
            "ClearNoon" => Some(WeatherParameters::CLEAR_NOON),
            "CloudyNoon" => Some(WeatherParameters::CLOUDY_NOON),
            "WetNoon" => Some(WeatherParameters::WET_NOON),
            "HardRainNoon" => Some(WeatherParameters::HARD_RAIN_NOON),
            "ClearSunset" => Some(WeatherParameters::CLEAR_SUNSET),
            _ => None,
        }
    }
}

impl fmt::Display for WeatherParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WeatherParameters(cloudiness={:.6}, precipitation={:.6}, precipitation_deposits={:.6}, wind_intensity={:.6}, sun_azimuth_angle={:.6}, sun_altitude_angle={:.6}, fog_density={:.6}, fog_distance={:.6}, wetness={:.6})",
            self.cloudiness,
            self.precipitation,
            self.precipitation_deposits,
            self.wind_intensity,
            self.sun_azimuth_angle,
            self.sun_altitude_angle,
            self.fog_density,
            self.fog_distance,
            self.wetness
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_preset_name_resolves() {
        for name in WeatherParameters::PRESETS {
            assert!(WeatherParameters::preset(name).is_some(), "{}", name);
        }
    }
}
