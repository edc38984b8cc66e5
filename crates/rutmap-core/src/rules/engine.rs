//! Rule evaluation into per-behavior score surfaces.
//!
//! Every matching rule adds `confidence × seasonal weight × weather factor`
//! onto the cells where both its terrain and vegetation masks hold. The
//! surfaces are then dampened near roads, boosted on winter yards during
//! severe weather, and scaled so each maximum becomes the score ceiling.

use std::cmp::Ordering;

use log::{debug, trace};
use serde::Serialize;

use super::{AnalysisContext, Behavior, Rule, RuleSet};
use crate::config::ScoringWeights;
use crate::error::{Error, Result};
use crate::features::{FeatureKey, FeatureRef, FeatureSet};
use crate::raster::Raster;
use crate::stats::scale_to_max;

/// One normalized surface per behavior.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSurfaces {
    pub travel: Raster<f64>,
    pub bedding: Raster<f64>,
    pub feeding: Raster<f64>,
}

impl ScoreSurfaces {
    pub fn get(&self, behavior: Behavior) -> &Raster<f64> {
        match behavior {
            Behavior::Travel => &self.travel,
            Behavior::Bedding => &self.bedding,
            Behavior::Feeding => &self.feeding,
        }
    }

    fn get_mut(&mut self, behavior: Behavior) -> &mut Raster<f64> {
        match behavior {
            Behavior::Travel => &mut self.travel,
            Behavior::Bedding => &mut self.bedding,
            Behavior::Feeding => &mut self.feeding,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Behavior, &Raster<f64>)> {
        Behavior::ALL.into_iter().map(move |b| (b, self.get(b)))
    }
}

/// Stateless evaluator; the weights are fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    weights: ScoringWeights,
}

impl RuleEngine {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Weighted score a matching rule contributes per cell.
    pub fn rule_score(&self, rule: &Rule, ctx: &AnalysisContext) -> f64 {
        let seasonal = self.weights.seasonal.for_season(ctx.season).get(rule.behavior);
        let weather = self.weights.weather_factor(&ctx.active_conditions, rule.behavior);
        rule.confidence * seasonal * weather
    }

    pub fn evaluate(&self, rules: &RuleSet, features: &FeatureSet, ctx: &AnalysisContext) -> Result<ScoreSurfaces> {
        let (rows, cols) = features.shape();
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimensions { rows, cols, len: 0 });
        }
        if !(self.weights.score_ceiling > 0.0) {
            return Err(Error::InvalidParameter {
                name: "score_ceiling",
                value: self.weights.score_ceiling.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        let mut active: Vec<(&Rule, f64)> = rules
            .rules()
            .iter()
            .filter(|r| {
                let hit = r.matches(ctx);
                if !hit {
                    trace!("rule '{}' skipped for context", r.label());
                }
                hit
            })
            .map(|r| (r, self.rule_score(r, ctx)))
            .collect();
        // Float sums depend on order; a canonical order makes the surfaces
        // independent of how the rule file is arranged.
        active.sort_by(|a, b| canonical_order(a.0, b.0));
        debug!("{} of {} rules active", active.len(), rules.len());

        let mut surfaces = self.accumulate_all(&active, features);
        self.apply_access_pressure(&mut surfaces, features);
        self.apply_winter_severity(&mut surfaces, features, ctx);

        for b in Behavior::ALL {
            let s = surfaces.get_mut(b);
            scale_to_max(s.data_mut(), self.weights.score_ceiling);
            debug!("{} surface max {:.3}", b.name(), s.max_value());
        }
        Ok(surfaces)
    }

    #[cfg(feature = "threading")]
    fn accumulate_all(&self, active: &[(&Rule, f64)], features: &FeatureSet) -> ScoreSurfaces {
        let (travel, (bedding, feeding)) = rayon::join(
            || accumulate(Behavior::Travel, active, features),
            || {
                rayon::join(
                    || accumulate(Behavior::Bedding, active, features),
                    || accumulate(Behavior::Feeding, active, features),
                )
            },
        );
        ScoreSurfaces { travel, bedding, feeding }
    }

    #[cfg(not(feature = "threading"))]
    fn accumulate_all(&self, active: &[(&Rule, f64)], features: &FeatureSet) -> ScoreSurfaces {
        ScoreSurfaces {
            travel: accumulate(Behavior::Travel, active, features),
            bedding: accumulate(Behavior::Bedding, active, features),
            feeding: accumulate(Behavior::Feeding, active, features),
        }
    }

    fn apply_access_pressure(&self, surfaces: &mut ScoreSurfaces, features: &FeatureSet) {
        let ap = &self.weights.access_pressure;
        if !ap.enabled {
            return;
        }
        let near_road = if let Some(mask) = features.get(&FeatureRef::from(ap.layer.as_str())) {
            mask.to_mask()
        } else if let Some(distance) = features.get(&FeatureRef::from(ap.distance_layer.as_str())) {
            distance.to_values().map(|d| d <= ap.max_distance_m)
        } else {
            debug!("access pressure: neither '{}' nor '{}' supplied", ap.layer, ap.distance_layer);
            return;
        };
        for b in Behavior::ALL {
            for (v, &hit) in surfaces.get_mut(b).data_mut().iter_mut().zip(near_road.data()) {
                if hit {
                    *v *= ap.factor;
                }
            }
        }
        debug!("access pressure applied on {} cells", near_road.count_true());
    }

    fn apply_winter_severity(&self, surfaces: &mut ScoreSurfaces, features: &FeatureSet, ctx: &AnalysisContext) {
        let ws = &self.weights.winter_severity;
        if !ctx.is_active(&ws.condition) {
            return;
        }
        let Some(layer) = features.get_key(FeatureKey::WinterYardPotential) else {
            return;
        };
        let yard = layer.to_values();
        for (v, &w) in surfaces.bedding.data_mut().iter_mut().zip(yard.data()) {
            *v += ws.boost * w;
        }
    }
}

fn accumulate(behavior: Behavior, active: &[(&Rule, f64)], features: &FeatureSet) -> Raster<f64> {
    let (rows, cols) = features.shape();
    let mut surface = Raster::filled(features.bounds(), rows, cols, 0.0);
    for (rule, score) in active.iter().filter(|(r, _)| r.behavior == behavior) {
        let terrain = features.resolve_mask(&rule.terrain);
        let vegetation = features.resolve_mask(&rule.vegetation);
        let hit = |i: usize| {
            terrain.as_ref().map_or(true, |m| m.data()[i]) && vegetation.as_ref().map_or(true, |m| m.data()[i])
        };
        for (i, v) in surface.data_mut().iter_mut().enumerate() {
            if hit(i) {
                *v += score;
            }
        }
        trace!("rule '{}' adds {:.3}", rule.label(), score);
    }
    surface
}

fn canonical_order(a: &Rule, b: &Rule) -> Ordering {
    a.behavior
        .cmp(&b.behavior)
        .then_with(|| a.terrain.cmp(&b.terrain))
        .then_with(|| a.vegetation.cmp(&b.vegetation))
        .then_with(|| a.time.cmp(&b.time))
        .then_with(|| a.season.cmp(&b.season))
        .then_with(|| a.weather_condition.cmp(&b.weather_condition))
        .then_with(|| a.confidence.total_cmp(&b.confidence))
}
