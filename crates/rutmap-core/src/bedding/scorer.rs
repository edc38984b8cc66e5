//! Wind- and thermal-aware bedding site scoring.
//!
//! An ordered cascade: strong wind makes leeward shelter the deciding factor,
//! otherwise the temperature band decides which aspect is preferred. A slope
//! adjustment is applied last regardless of the branch taken. Every step
//! records a reason; the first reason names the branch that fired.

use serde::Serialize;

use crate::coords::{angular_distance, normalize_bearing};

/// Wind speed (mph) above which shelter dominates.
pub const HIGH_WIND_MPH: f64 = 10.0;
/// Below this temperature (°F) deer seek sun.
pub const COLD_F: f64 = 40.0;
/// Above this temperature (°F) deer seek shade.
pub const HOT_F: f64 = 75.0;

pub const MAX_SCORE: f64 = 100.0;
const BONUS: f64 = 5.0;

// Leeward bands under high wind.
const LEEWARD_EXCELLENT_DEG: f64 = 30.0;
const LEEWARD_GOOD_DEG: f64 = 60.0;
const LEEWARD_PARTIAL_DEG: f64 = 90.0;
/// Within this of the wind direction the slope faces straight into the wind.
const INTO_WIND_DEG: f64 = 30.0;
/// Low-wind leeward alignment bonus threshold.
const LIGHT_LEEWARD_DEG: f64 = 45.0;

// Aspect classes (compass degrees, inclusive).
const SOUTH: (f64, f64) = (135.0, 225.0);
const NORTH: (f64, f64) = (315.0, 45.0);
const EAST: (f64, f64) = (60.0, 120.0);
const WEST: (f64, f64) = (240.0, 300.0);
const SOUTHEAST_QUADRANT: (f64, f64) = (90.0, 180.0);

// Slope adjustment.
const STEEP_SLOPE_DEG: f64 = 30.0;
const STEEP_PENALTY_PER_DEG: f64 = 2.0;
const STEEP_PENALTY_CAP: f64 = 20.0;
const IDEAL_SLOPE_DEG: (f64, f64) = (10.0, 25.0);

/// Score with the reasons that produced it, most important first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeddingAssessment {
    pub score: f64,
    pub reasons: Vec<String>,
}

impl BeddingAssessment {
    fn new(score: f64, reason: impl Into<String>) -> Self {
        Self { score, reasons: vec![reason.into()] }
    }

    fn bonus(&mut self, points: f64, reason: impl Into<String>) {
        self.score = (self.score + points).min(MAX_SCORE);
        self.reasons.push(reason.into());
    }

    /// Reasons joined into one line.
    pub fn reason(&self) -> String {
        self.reasons.join("; ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Facing {
    South,
    North,
    East,
    West,
    Other,
}

impl Facing {
    fn of(aspect: f64) -> Self {
        let a = normalize_bearing(aspect);
        if within(a, SOUTH) {
            Facing::South
        } else if a >= NORTH.0 || a <= NORTH.1 {
            Facing::North
        } else if within(a, EAST) {
            Facing::East
        } else if within(a, WEST) {
            Facing::West
        } else {
            Facing::Other
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Thermal {
    Cold,
    Hot,
    Moderate,
}

impl Thermal {
    fn of(temperature_f: f64) -> Self {
        if temperature_f < COLD_F {
            Thermal::Cold
        } else if temperature_f > HOT_F {
            Thermal::Hot
        } else {
            Thermal::Moderate
        }
    }
}

#[inline]
fn within(a: f64, (lo, hi): (f64, f64)) -> bool {
    a >= lo && a <= hi
}

/// Stateless scorer for a single candidate site.
#[derive(Debug, Clone, Copy, Default)]
pub struct BeddingSiteScorer;

impl BeddingSiteScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score a site in `[0, 100]`.
    ///
    /// `aspect_deg` is the downhill bearing, `wind_dir_deg` the bearing the
    /// wind blows from, `wind_speed` in mph and `temperature` in °F.
    pub fn score(
        &self,
        aspect_deg: f64,
        wind_dir_deg: f64,
        wind_speed: f64,
        temperature: f64,
        slope_deg: f64,
    ) -> BeddingAssessment {
        let leeward_dir = normalize_bearing(wind_dir_deg + 180.0);
        let leeward_diff = angular_distance(aspect_deg, leeward_dir);
        let facing = Facing::of(aspect_deg);
        let thermal = Thermal::of(temperature);

        let mut a = if wind_speed > HIGH_WIND_MPH {
            wind_shelter(aspect_deg, wind_dir_deg, leeward_diff, facing, thermal)
        } else {
            thermal_preference(aspect_deg, leeward_diff, facing, thermal)
        };

        slope_adjustment(&mut a, slope_deg);
        a.score = a.score.clamp(0.0, MAX_SCORE);
        a
    }
}

fn wind_shelter(aspect: f64, wind_dir: f64, leeward_diff: f64, facing: Facing, thermal: Thermal) -> BeddingAssessment {
    let mut a = if leeward_diff <= LEEWARD_EXCELLENT_DEG {
        BeddingAssessment::new(100.0, format!("Excellent leeward shelter ({leeward_diff:.0}° off leeward)"))
    } else if leeward_diff <= LEEWARD_GOOD_DEG {
        BeddingAssessment::new(90.0, format!("Good leeward shelter ({leeward_diff:.0}° off leeward)"))
    } else if leeward_diff <= LEEWARD_PARTIAL_DEG {
        BeddingAssessment::new(75.0, format!("Partial leeward shelter ({leeward_diff:.0}° off leeward)"))
    } else if angular_distance(aspect, wind_dir) <= INTO_WIND_DEG {
        BeddingAssessment::new(30.0, "Windward exposure: slope faces into the wind")
    } else {
        BeddingAssessment::new(50.0, "Crosswind exposure: little shelter from the wind")
    };

    if leeward_diff <= LEEWARD_GOOD_DEG {
        match (thermal, facing) {
            (Thermal::Cold, Facing::South) => a.bonus(BONUS, "thermal bonus: south-facing in cold weather"),
            (Thermal::Hot, Facing::North) => a.bonus(BONUS, "thermal bonus: north-facing in hot weather"),
            _ => {}
        }
    }
    a
}

fn thermal_preference(aspect: f64, leeward_diff: f64, facing: Facing, thermal: Thermal) -> BeddingAssessment {
    let mut a = match (thermal, facing) {
        (Thermal::Cold, Facing::South) => BeddingAssessment::new(100.0, "Thermal optimal: south-facing slope in cold weather"),
        (Thermal::Cold, Facing::East | Facing::West) => {
            BeddingAssessment::new(80.0, "Thermal good: partial sun exposure in cold weather")
        }
        (Thermal::Cold, Facing::North) => BeddingAssessment::new(50.0, "Thermal poor: north-facing slope in cold weather"),
        (Thermal::Cold, Facing::Other) => BeddingAssessment::new(65.0, "Thermal fair: oblique aspect in cold weather"),

        (Thermal::Hot, Facing::North) => BeddingAssessment::new(100.0, "Thermal optimal: north-facing shade in hot weather"),
        (Thermal::Hot, Facing::East) => BeddingAssessment::new(85.0, "Thermal good: morning sun only in hot weather"),
        (Thermal::Hot, Facing::South) => BeddingAssessment::new(50.0, "Thermal poor: south-facing slope in hot weather"),
        (Thermal::Hot, Facing::West | Facing::Other) => {
            BeddingAssessment::new(70.0, "Thermal fair: partial shade in hot weather")
        }

        (Thermal::Moderate, _) if within(normalize_bearing(aspect), SOUTHEAST_QUADRANT) => {
            BeddingAssessment::new(90.0, "Moderate temperature: south-east aspect catches morning sun")
        }
        (Thermal::Moderate, _) => BeddingAssessment::new(80.0, "Moderate temperature: aspect is secondary"),
    };

    if leeward_diff <= LIGHT_LEEWARD_DEG {
        a.bonus(BONUS, format!("light leeward alignment ({leeward_diff:.0}° off leeward)"));
    }
    a
}

fn slope_adjustment(a: &mut BeddingAssessment, slope: f64) {
    if slope > STEEP_SLOPE_DEG {
        let penalty = (STEEP_PENALTY_PER_DEG * (slope - STEEP_SLOPE_DEG)).min(STEEP_PENALTY_CAP);
        a.score -= penalty;
        a.reasons.push(format!("steep slope penalty (-{penalty:.0})"));
    } else if within(slope, IDEAL_SLOPE_DEG) {
        a.bonus(BONUS, "ideal bedding slope");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn score(aspect: f64, wind_dir: f64, wind_speed: f64, temperature: f64, slope: f64) -> BeddingAssessment {
        BeddingSiteScorer::new().score(aspect, wind_dir, wind_speed, temperature, slope)
    }

    #[test]
    fn high_wind_prefers_leeward() {
        let a = score(90.0, 270.0, 15.0, 50.0, 15.0);
        assert_relative_eq!(a.score, 100.0);
        assert!(a.reasons[0].contains("leeward"), "{}", a.reason());
    }

    #[test]
    fn cold_calm_prefers_south() {
        let a = score(180.0, 0.0, 3.0, 30.0, 15.0);
        assert_relative_eq!(a.score, 100.0);
        assert!(a.reasons[0].starts_with("Thermal optimal"), "{}", a.reason());
    }

    #[test]
    fn leeward_bands() {
        // Wind from the west: leeward is east (90°).
        assert_relative_eq!(score(130.0, 270.0, 20.0, 50.0, 5.0).score, 90.0);
        assert_relative_eq!(score(0.0, 270.0, 20.0, 50.0, 5.0).score, 75.0);
        assert_relative_eq!(score(225.0, 270.0, 20.0, 50.0, 5.0).score, 50.0);
    }

    #[test]
    fn facing_into_wind_is_penalized_and_steepness_hurts() {
        let a = score(270.0, 270.0, 20.0, 50.0, 35.0);
        // 30 for windward exposure, -10 for 5° over the steep limit.
        assert_relative_eq!(a.score, 20.0);
        assert!(a.reasons[0].starts_with("Windward"));
        assert!(a.reason().contains("steep slope penalty"));
    }

    #[test]
    fn thermal_bonus_only_when_already_sheltered() {
        // Leeward diff 45°: good shelter plus cold south-facing bonus.
        let a = score(225.0, 0.0, 12.0, 30.0, 5.0);
        assert_relative_eq!(a.score, 95.0);
        assert!(a.reason().contains("thermal bonus"));
        // Same aspect, wind from the south-west: no shelter, no bonus.
        let b = score(225.0, 225.0, 12.0, 30.0, 5.0);
        assert_relative_eq!(b.score, 30.0);
        assert_eq!(b.reasons.len(), 1);
    }

    #[test]
    fn hot_weather_bands() {
        assert_relative_eq!(score(0.0, 180.0, 5.0, 85.0, 5.0).score, 100.0);
        assert_relative_eq!(score(90.0, 0.0, 5.0, 85.0, 5.0).score, 85.0);
        // South-facing in heat with the maximum steep penalty.
        assert_relative_eq!(score(180.0, 180.0, 5.0, 85.0, 50.0).score, 30.0);
        assert_relative_eq!(score(270.0, 0.0, 5.0, 85.0, 5.0).score, 70.0);
    }

    #[test]
    fn cold_weather_bands() {
        assert_relative_eq!(score(90.0, 90.0, 2.0, 20.0, 5.0).score, 80.0);
        assert_relative_eq!(score(0.0, 0.0, 2.0, 20.0, 5.0).score, 50.0);
        // 50° is between the north and east bands.
        assert_relative_eq!(score(50.0, 50.0, 2.0, 20.0, 5.0).score, 65.0);
    }

    #[test]
    fn moderate_weather_prefers_south_east() {
        // Leeward diff 45 adds the light-leeward bonus; 20° slope adds 5.
        let a = score(135.0, 0.0, 5.0, 60.0, 20.0);
        assert_relative_eq!(a.score, 100.0);
        assert_eq!(a.reasons.len(), 3);
        assert_relative_eq!(score(300.0, 0.0, 5.0, 60.0, 28.0).score, 80.0);
    }

    #[test]
    fn score_stays_in_range() {
        for aspect in (0..360).step_by(15) {
            for slope in [0.0, 12.0, 31.0, 60.0, 89.0] {
                for (speed, temp) in [(0.0, 10.0), (25.0, 90.0), (8.0, 55.0)] {
                    let s = score(aspect as f64, 200.0, speed, temp, slope).score;
                    assert!((0.0..=100.0).contains(&s));
                }
            }
        }
    }
}
