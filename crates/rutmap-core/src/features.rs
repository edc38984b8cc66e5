//! Named layers consumed by the rule engine.
//!
//! Terrain and vegetation layers are addressed by the closed `FeatureKey`
//! enum. Layers supplied by external collaborators (road proximity, access
//! density, security score …) are addressed by name.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::coords::GeoBounds;
use crate::error::{Error, Result};
use crate::raster::Raster;
use crate::terrain::TerrainGrid;
use crate::vegetation::VegetationGrid;

/// The wildcard feature reference.
pub const ANY: &str = "any";

/// Layers derived by `TerrainGrid` and `VegetationGrid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FeatureKey {
    Elevation,
    Slope,
    Aspect,
    Curvature,
    Vegetation,
    Ridge,
    Saddle,
    Flat,
    SouthSlope,
    NorthSlope,
    SouthwestSlope,
    BluffPinch,
    CreekBottom,
    Water,
    Field,
    Hardwood,
    ConiferCorridor,
    ConiferDense,
    DeepForest,
    ForestEdge,
    WinterYardPotential,
    HardwoodBench,
    Swamp,
}

impl FeatureKey {
    pub const ALL: [FeatureKey; 23] = [
        FeatureKey::Elevation,
        FeatureKey::Slope,
        FeatureKey::Aspect,
        FeatureKey::Curvature,
        FeatureKey::Vegetation,
        FeatureKey::Ridge,
        FeatureKey::Saddle,
        FeatureKey::Flat,
        FeatureKey::SouthSlope,
        FeatureKey::NorthSlope,
        FeatureKey::SouthwestSlope,
        FeatureKey::BluffPinch,
        FeatureKey::CreekBottom,
        FeatureKey::Water,
        FeatureKey::Field,
        FeatureKey::Hardwood,
        FeatureKey::ConiferCorridor,
        FeatureKey::ConiferDense,
        FeatureKey::DeepForest,
        FeatureKey::ForestEdge,
        FeatureKey::WinterYardPotential,
        FeatureKey::HardwoodBench,
        FeatureKey::Swamp,
    ];

    /// Wire name used in rule files.
    pub fn name(self) -> &'static str {
        match self {
            FeatureKey::Elevation => "elevation",
            FeatureKey::Slope => "slope",
            FeatureKey::Aspect => "aspect",
            FeatureKey::Curvature => "curvature",
            FeatureKey::Vegetation => "vegetation",
            FeatureKey::Ridge => "ridge",
            FeatureKey::Saddle => "saddle",
            FeatureKey::Flat => "flat",
            FeatureKey::SouthSlope => "south_slope",
            FeatureKey::NorthSlope => "north_slope",
            FeatureKey::SouthwestSlope => "southwest_slope",
            FeatureKey::BluffPinch => "bluff_pinch",
            FeatureKey::CreekBottom => "creek_bottom",
            FeatureKey::Water => "water",
            FeatureKey::Field => "field",
            FeatureKey::Hardwood => "hardwood",
            FeatureKey::ConiferCorridor => "conifer_corridor",
            FeatureKey::ConiferDense => "conifer_dense",
            FeatureKey::DeepForest => "deep_forest",
            FeatureKey::ForestEdge => "forest_edge",
            FeatureKey::WinterYardPotential => "winter_yard_potential",
            FeatureKey::HardwoodBench => "hardwood_bench",
            FeatureKey::Swamp => "swamp",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

/// What a rule's `terrain` / `vegetation` field points at.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FeatureRef {
    Any,
    Known(FeatureKey),
    Auxiliary(String),
}

impl From<String> for FeatureRef {
    fn from(s: String) -> Self {
        if s == ANY {
            FeatureRef::Any
        } else if let Some(k) = FeatureKey::from_name(&s) {
            FeatureRef::Known(k)
        } else {
            FeatureRef::Auxiliary(s)
        }
    }
}

impl From<&str> for FeatureRef {
    fn from(s: &str) -> Self {
        FeatureRef::from(s.to_string())
    }
}

impl From<FeatureRef> for String {
    fn from(r: FeatureRef) -> String {
        r.to_string()
    }
}

impl fmt::Display for FeatureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureRef::Any => f.write_str(ANY),
            FeatureRef::Known(k) => f.write_str(k.name()),
            FeatureRef::Auxiliary(s) => f.write_str(s),
        }
    }
}

/// A float or boolean raster.
#[derive(Debug, Clone)]
pub enum Layer {
    Value(Raster<f64>),
    Mask(Raster<bool>),
}

impl Layer {
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Layer::Value(r) => r.shape(),
            Layer::Mask(r) => r.shape(),
        }
    }

    /// Boolean view: masks as-is, values where strictly positive.
    pub fn to_mask(&self) -> Raster<bool> {
        match self {
            Layer::Mask(m) => m.clone(),
            Layer::Value(v) => v.map(|x| x > 0.0),
        }
    }

    /// Float view: masks as 0/1.
    pub fn to_values(&self) -> Raster<f64> {
        match self {
            Layer::Value(v) => v.clone(),
            Layer::Mask(m) => m.map(|b| if b { 1.0 } else { 0.0 }),
        }
    }

    pub fn value_at(&self, row: usize, col: usize) -> f64 {
        match self {
            Layer::Value(v) => v.get(row, col),
            Layer::Mask(m) => {
                if m.get(row, col) {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// Every layer available to rule evaluation, all sharing one shape.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    shape: (usize, usize),
    known: BTreeMap<FeatureKey, Layer>,
    auxiliary: BTreeMap<String, Layer>,
}

impl FeatureSet {
    /// Empty set for rasters of `shape`.
    pub fn new(shape: (usize, usize)) -> Self {
        Self { shape, known: BTreeMap::new(), auxiliary: BTreeMap::new() }
    }

    /// Merge terrain and vegetation layers.
    pub fn from_grids(terrain: &TerrainGrid, vegetation: &VegetationGrid) -> Self {
        let mut set = Self::new(terrain.shape());
        let values = [
            (FeatureKey::Elevation, &terrain.elevation),
            (FeatureKey::Slope, &terrain.slope),
            (FeatureKey::Aspect, &terrain.aspect),
            (FeatureKey::Curvature, &terrain.curvature),
            (FeatureKey::Vegetation, &vegetation.density),
        ];
        for (k, r) in values {
            set.known.insert(k, Layer::Value(r.clone()));
        }
        let masks = [
            (FeatureKey::Ridge, &terrain.ridge),
            (FeatureKey::Saddle, &terrain.saddle),
            (FeatureKey::Flat, &terrain.flat),
            (FeatureKey::SouthSlope, &terrain.south_slope),
            (FeatureKey::NorthSlope, &terrain.north_slope),
            (FeatureKey::SouthwestSlope, &terrain.southwest_slope),
            (FeatureKey::BluffPinch, &terrain.bluff_pinch),
            (FeatureKey::CreekBottom, &terrain.creek_bottom),
            (FeatureKey::Water, &vegetation.water),
            (FeatureKey::Field, &vegetation.field),
            (FeatureKey::Hardwood, &vegetation.hardwood),
            (FeatureKey::ConiferCorridor, &vegetation.conifer_corridor),
            (FeatureKey::ConiferDense, &vegetation.conifer_dense),
            (FeatureKey::DeepForest, &vegetation.deep_forest),
            (FeatureKey::ForestEdge, &vegetation.forest_edge),
            (FeatureKey::WinterYardPotential, &vegetation.winter_yard_potential),
            (FeatureKey::HardwoodBench, &vegetation.hardwood_bench),
            (FeatureKey::Swamp, &vegetation.swamp),
        ];
        for (k, r) in masks {
            set.known.insert(k, Layer::Mask(r.clone()));
        }
        set
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Add or replace a derived layer.
    pub fn insert(&mut self, key: FeatureKey, layer: Layer) -> Result<()> {
        self.check(key.name(), &layer)?;
        self.known.insert(key, layer);
        Ok(())
    }

    /// Add or replace an externally supplied layer.
    pub fn insert_auxiliary(&mut self, name: impl Into<String>, layer: Layer) -> Result<()> {
        let name = name.into();
        self.check(&name, &layer)?;
        // A name that matches a derived layer replaces that layer.
        match FeatureRef::from(name) {
            FeatureRef::Known(k) => {
                self.known.insert(k, layer);
            }
            FeatureRef::Auxiliary(n) => {
                self.auxiliary.insert(n, layer);
            }
            FeatureRef::Any => {
                return Err(Error::InvalidParameter {
                    name: "layer",
                    value: ANY.to_string(),
                    reason: "reserved wildcard name".to_string(),
                })
            }
        }
        Ok(())
    }

    pub fn get(&self, r: &FeatureRef) -> Option<&Layer> {
        match r {
            FeatureRef::Any => None,
            FeatureRef::Known(k) => self.known.get(k),
            FeatureRef::Auxiliary(n) => self.auxiliary.get(n),
        }
    }

    pub fn get_key(&self, key: FeatureKey) -> Option<&Layer> {
        self.known.get(&key)
    }

    pub fn get_auxiliary(&self, name: &str) -> Option<&Layer> {
        self.auxiliary.get(name)
    }

    /// Mask for `r`: `Any` is all-true, an absent layer is all-false.
    /// `None` stands for "all true" so callers can skip the AND.
    pub fn resolve_mask(&self, r: &FeatureRef) -> Option<Raster<bool>> {
        match r {
            FeatureRef::Any => None,
            _ => Some(match self.get(r) {
                Some(layer) => layer.to_mask(),
                None => {
                    log::debug!("feature '{r}' not in feature set; treating as empty mask");
                    self.empty_mask()
                }
            }),
        }
    }

    /// Bounds of the layers; every layer of a set shares them.
    pub fn bounds(&self) -> GeoBounds {
        self.known
            .values()
            .chain(self.auxiliary.values())
            .next()
            .map(|l| match l {
                Layer::Value(v) => *v.bounds(),
                Layer::Mask(m) => *m.bounds(),
            })
            .unwrap_or(GeoBounds::new(0.0, 0.0, 0.0, 0.0))
    }

    fn empty_mask(&self) -> Raster<bool> {
        Raster::filled(self.bounds(), self.shape.0, self.shape.1, false)
    }

    fn check(&self, name: &str, layer: &Layer) -> Result<()> {
        let (ar, ac) = layer.shape();
        if (ar, ac) != self.shape {
            return Err(Error::SizeMismatch {
                layer: name.to_string(),
                er: self.shape.0,
                ec: self.shape.1,
                ar,
                ac,
            });
        }
        Ok(())
    }
}
