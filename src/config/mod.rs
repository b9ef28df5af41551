use heapless::String;
use serde::{Deserialize, Serialize};

/// Pilot and instrument preferences, loaded by the configuration storage
/// collaborator and handed to the core components once at startup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub metric: bool,
    pub beeps_on_start: bool,
    pub sink_alarm: bool,
    pub sound_off: bool,
    pub time_zone: i8,
    /// Climb threshold in m/s; ~20 fpm by default.
    pub climb_threshold: f64,
    /// Sink threshold in m/s; ~-400 fpm by default.
    pub sink_threshold: f64,
    /// Ground-speed gate for flight detection, knots.
    pub min_speed_knots: i32,
    pub pilot_name: String<32>,
    pub glider_model: String<32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            metric: false,
            beeps_on_start: true,
            sink_alarm: true,
            sound_off: false,
            time_zone: 0,
            climb_threshold: 0.1,
            sink_threshold: -2.0,
            min_speed_knots: 5,
            pilot_name: String::new(),
            glider_model: String::new(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::Settings;

    #[test]
    fn test_round_trip() {
        let mut settings = Settings::default();
        settings.metric = true;
        settings.climb_threshold = 0.2;
        settings.pilot_name.push_str("A Pilot").ok();

        let json = serde_json::to_string(&settings).unwrap();
        let decoded: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, settings);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let decoded: Settings = serde_json::from_str(r#"{"sink_threshold":-2.5}"#).unwrap();
        assert_eq!(decoded.sink_threshold, -2.5);
        assert_eq!(decoded.climb_threshold, 0.1);
        assert_eq!(decoded.min_speed_knots, 5);
    }
}
