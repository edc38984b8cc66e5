use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{Season, TimeOfDay};

/// Temporal and weather context a rule set is evaluated under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisContext {
    pub time_of_day: TimeOfDay,
    pub season: Season,
    pub active_conditions: BTreeSet<String>,
    pub temperature_f: f64,
    pub wind_direction_deg: f64,
    pub wind_speed_mph: f64,
}

impl Default for AnalysisContext {
    fn default() -> Self {
        Self {
            time_of_day: TimeOfDay::Any,
            season: Season::Any,
            active_conditions: BTreeSet::new(),
            temperature_f: 50.0,
            wind_direction_deg: 0.0,
            wind_speed_mph: 0.0,
        }
    }
}

impl AnalysisContext {
    pub fn new(time_of_day: TimeOfDay, season: Season) -> Self {
        Self { time_of_day, season, ..Self::default() }
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.active_conditions.insert(condition.into());
        self
    }

    pub fn with_weather(mut self, temperature_f: f64, wind_direction_deg: f64, wind_speed_mph: f64) -> Self {
        self.temperature_f = temperature_f;
        self.wind_direction_deg = wind_direction_deg;
        self.wind_speed_mph = wind_speed_mph;
        self
    }

    pub fn is_active(&self, condition: &str) -> bool {
        self.active_conditions.contains(condition)
    }

    pub fn from_json(text: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_with_partial_fields() {
        let ctx = AnalysisContext::from_json(
            r#"{ "time_of_day": "dusk", "season": "rut", "active_conditions": ["cold_front"], "wind_speed_mph": 12 }"#,
        )
        .unwrap();
        assert_eq!(ctx.time_of_day, TimeOfDay::Dusk);
        assert_eq!(ctx.season, Season::Rut);
        assert!(ctx.is_active("cold_front"));
        assert_eq!(ctx.wind_speed_mph, 12.0);
        assert_eq!(ctx.temperature_f, 50.0);
    }
}
