//! Declarative behavior rules and their evaluation.
pub mod context;
pub mod engine;

pub use context::AnalysisContext;
pub use engine::{RuleEngine, ScoreSurfaces};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::features::{FeatureRef, ANY};

/// Deer behavior a rule scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Behavior {
    Travel,
    Bedding,
    Feeding,
}

impl Behavior {
    pub const ALL: [Behavior; 3] = [Behavior::Travel, Behavior::Bedding, Behavior::Feeding];

    pub fn name(self) -> &'static str {
        match self {
            Behavior::Travel => "travel",
            Behavior::Bedding => "bedding",
            Behavior::Feeding => "feeding",
        }
    }
}

/// Time-of-day window. `Any` in a rule matches every context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeOfDay {
    Dawn,
    Dusk,
    MidDay,
    Night,
    #[default]
    Any,
}

/// Hunting season phase. `Any` in a rule matches every context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    EarlySeason,
    Rut,
    LateSeason,
    #[default]
    Any,
}

fn any_ref() -> FeatureRef {
    FeatureRef::Any
}

fn any_condition() -> String {
    ANY.to_string()
}

/// One scoring rule: where `terrain` and `vegetation` both hold, add
/// `confidence` (scaled by season and weather) to the `behavior` surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub behavior: Behavior,
    #[serde(default = "any_ref")]
    pub terrain: FeatureRef,
    #[serde(default = "any_ref")]
    pub vegetation: FeatureRef,
    #[serde(default)]
    pub time: TimeOfDay,
    #[serde(default)]
    pub season: Season,
    #[serde(default = "any_condition")]
    pub weather_condition: String,
    pub confidence: f64,
}

impl Rule {
    /// Rule matching every cell, time, season and weather.
    pub fn new(behavior: Behavior, confidence: f64) -> Self {
        Self {
            name: None,
            behavior,
            terrain: FeatureRef::Any,
            vegetation: FeatureRef::Any,
            time: TimeOfDay::Any,
            season: Season::Any,
            weather_condition: any_condition(),
            confidence,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn terrain(mut self, r: impl Into<FeatureRef>) -> Self {
        self.terrain = r.into();
        self
    }

    pub fn vegetation(mut self, r: impl Into<FeatureRef>) -> Self {
        self.vegetation = r.into();
        self
    }

    pub fn time(mut self, t: TimeOfDay) -> Self {
        self.time = t;
        self
    }

    pub fn season(mut self, s: Season) -> Self {
        self.season = s;
        self
    }

    pub fn weather(mut self, condition: impl Into<String>) -> Self {
        self.weather_condition = condition.into();
        self
    }

    /// Label for log lines.
    pub fn label(&self) -> String {
        match &self.name {
            Some(n) => n.clone(),
            None => format!("{}:{}+{}", self.behavior.name(), self.terrain, self.vegetation),
        }
    }

    /// Whether the rule applies under `ctx`.
    pub fn matches(&self, ctx: &AnalysisContext) -> bool {
        (self.time == TimeOfDay::Any || self.time == ctx.time_of_day)
            && (self.season == Season::Any || self.season == ctx.season)
            && (self.weather_condition == ANY || ctx.active_conditions.contains(&self.weather_condition))
    }

    fn validate(&self, index: usize) -> Result<()> {
        if !(self.confidence > 0.0 && self.confidence <= 10.0) {
            return Err(Error::InvalidRule {
                index,
                reason: format!("confidence {} outside (0, 10]", self.confidence),
            });
        }
        if self.weather_condition.trim().is_empty() {
            return Err(Error::InvalidRule { index, reason: "empty weather_condition".to_string() });
        }
        Ok(())
    }
}

/// A validated, non-empty collection of rules.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

const BUILTIN_RULES: &str = include_str!("builtin_rules.json");

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Result<Self> {
        if rules.is_empty() {
            return Err(Error::EmptyRuleSet);
        }
        for (i, r) in rules.iter().enumerate() {
            r.validate(i)?;
        }
        Ok(Self { rules })
    }

    /// Parse a JSON array of rules. Unknown enum values fail to parse.
    pub fn from_json(text: &str) -> Result<Self> {
        let rules: Vec<Rule> = serde_json::from_str(text)?;
        Self::new(rules)
    }

    /// The rule set shipped with the library.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_RULES)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Always false: a `RuleSet` is non-empty by construction.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Same rules in reverse order.
    pub fn reversed(&self) -> Self {
        Self { rules: self.rules.iter().rev().cloned().collect() }
    }
}

impl<'de> Deserialize<'de> for RuleSet {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let rules = Vec::<Rule>::deserialize(d)?;
        RuleSet::new(rules).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureKey;

    #[test]
    fn rule_json_defaults_to_any() {
        let r: Rule = serde_json::from_str(r#"{ "behavior": "feeding", "vegetation": "field", "confidence": 5 }"#).unwrap();
        assert_eq!(r.terrain, FeatureRef::Any);
        assert_eq!(r.vegetation, FeatureRef::Known(FeatureKey::Field));
        assert_eq!(r.time, TimeOfDay::Any);
        assert_eq!(r.season, Season::Any);
        assert_eq!(r.weather_condition, "any");
    }

    #[test]
    fn enum_wire_names() {
        let r: Rule = serde_json::from_str(
            r#"{ "behavior": "travel", "time": "mid-day", "season": "late_season", "confidence": 2 }"#,
        )
        .unwrap();
        assert_eq!(r.time, TimeOfDay::MidDay);
        assert_eq!(r.season, Season::LateSeason);
    }

    #[test]
    fn unknown_enum_is_rejected() {
        assert!(RuleSet::from_json(r#"[{ "behavior": "rutting", "confidence": 5 }]"#).is_err());
        assert!(RuleSet::from_json(r#"[{ "behavior": "travel", "season": "summer", "confidence": 5 }]"#).is_err());
    }

    #[test]
    fn empty_and_out_of_range_rule_sets_fail() {
        assert!(matches!(RuleSet::new(vec![]), Err(Error::EmptyRuleSet)));
        assert!(matches!(
            RuleSet::new(vec![Rule::new(Behavior::Travel, 0.0)]),
            Err(Error::InvalidRule { index: 0, .. })
        ));
        assert!(RuleSet::new(vec![Rule::new(Behavior::Travel, 10.5)]).is_err());
        assert!(RuleSet::new(vec![Rule::new(Behavior::Travel, 10.0)]).is_ok());
    }

    #[test]
    fn matching_honours_wildcards() {
        let ctx = AnalysisContext::new(TimeOfDay::Dawn, Season::Rut).with_condition("cold_front");
        assert!(Rule::new(Behavior::Travel, 1.0).matches(&ctx));
        assert!(Rule::new(Behavior::Travel, 1.0).time(TimeOfDay::Dawn).matches(&ctx));
        assert!(!Rule::new(Behavior::Travel, 1.0).time(TimeOfDay::Dusk).matches(&ctx));
        assert!(!Rule::new(Behavior::Travel, 1.0).season(Season::EarlySeason).matches(&ctx));
        assert!(Rule::new(Behavior::Travel, 1.0).weather("cold_front").matches(&ctx));
        assert!(!Rule::new(Behavior::Travel, 1.0).weather("rain").matches(&ctx));
    }

    #[test]
    fn builtin_rules_load() {
        let set = RuleSet::builtin().unwrap();
        assert!(set.len() > 10);
        for b in Behavior::ALL {
            assert!(set.rules().iter().any(|r| r.behavior == b), "no {} rule", b.name());
        }
    }
}
