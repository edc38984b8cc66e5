//! Land-cover classes from a vegetation density raster.
//!
//! Density scale: 0 = water, ≈0.2 = field, ≈0.5 = moderate forest,
//! ≈1.0 = dense conifer. Some classes combine density with terrain layers,
//! so the grid is built against an existing `TerrainGrid`.
use crate::config::VegetationThresholds;
use crate::error::Result;
use crate::raster::Raster;
use crate::stats::percentile;
use crate::terrain::{gradient, TerrainGrid};

#[derive(Debug, Clone)]
pub struct VegetationGrid {
    pub density: Raster<f64>,
    pub water: Raster<bool>,
    pub field: Raster<bool>,
    pub hardwood: Raster<bool>,
    pub conifer_corridor: Raster<bool>,
    pub conifer_dense: Raster<bool>,
    pub deep_forest: Raster<bool>,
    pub forest_edge: Raster<bool>,
    pub winter_yard_potential: Raster<bool>,
    pub hardwood_bench: Raster<bool>,
    pub swamp: Raster<bool>,
}

impl VegetationGrid {
    /// Classify `density`, which must share the terrain's shape.
    pub fn new(density: Raster<f64>, terrain: &TerrainGrid, t: &VegetationThresholds) -> Result<Self> {
        terrain.elevation.check_shape(&density, "vegetation")?;

        let water = density.map(|v| v < t.water_max);
        let field = density.map(|v| v <= t.field_max);
        let hardwood = density.map(|v| v > t.field_max && v < t.hardwood_max);
        let conifer_corridor = density.map(|v| v >= t.hardwood_max && v <= t.conifer_corridor_max);
        let conifer_dense = density.map(|v| v > t.conifer_dense_min);
        let deep_forest = density.map(|v| v > t.deep_forest_min);
        let forest_edge = edge_mask(&density, t.forest_min, t.forest_edge_percentile);

        let winter_yard_potential =
            conifer_dense.zip_map(&terrain.elevation, |d, e| d && e < t.winter_yard_max_elevation_m);

        let bench_slope = terrain
            .slope
            .map(|s| s > t.bench_min_slope_deg && s < t.bench_max_slope_deg);
        let hardwood_bench = hardwood
            .zip_map(&terrain.southwest_slope, |h, sw| h && sw)
            .zip_map(&bench_slope, |a, b| a && b);

        let swamp = terrain
            .creek_bottom
            .zip_map(&density, |cb, v| cb && v > t.swamp_min && v <= t.swamp_max);

        log::debug!(
            "vegetation: {} field, {} hardwood, {} conifer-dense, {} edge cells",
            field.count_true(),
            hardwood.count_true(),
            conifer_dense.count_true(),
            forest_edge.count_true()
        );

        Ok(Self {
            density,
            water,
            field,
            hardwood,
            conifer_corridor,
            conifer_dense,
            deep_forest,
            forest_edge,
            winter_yard_potential,
            hardwood_bench,
            swamp,
        })
    }
}

/// Cells where the gradient magnitude of the binarized forest mask exceeds
/// its `pct` percentile.
fn edge_mask(density: &Raster<f64>, forest_min: f64, pct: f64) -> Raster<bool> {
    let (rows, cols) = density.shape();
    let mask: Vec<f64> = density.iter().map(|&v| if v >= forest_min { 1.0 } else { 0.0 }).collect();
    // Index-space gradient: the edge test is scale-free.
    let (gx, gy) = gradient(&mask, rows, cols, 1.0, 1.0);
    let magnitude: Vec<f64> = gx.iter().zip(&gy).map(|(x, y)| (x * x + y * y).sqrt()).collect();
    let cut = percentile(&magnitude, pct);
    Raster::from_fn(*density.bounds(), rows, cols, |r, c| magnitude[r * cols + c] > cut)
}
