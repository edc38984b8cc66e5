//! Deterministic synthetic tiles for demos and tests.
//!
//! Elevation and vegetation density are independent fractal noise fields. A
//! straight east-west road crosses the tile and provides the
//! `road_distance_m` layer.
use std::collections::BTreeMap;

use noise::{NoiseFn, Perlin};

use crate::coords::{GeoBounds, LatLon, METRES_PER_DEG_LAT};
use crate::pipeline::TileInput;

/// Tile edge length in degrees for a `size × size` grid of ≈30 m cells.
fn extent_deg(size: usize) -> f64 {
    size as f64 * 30.0 / METRES_PER_DEG_LAT
}

/// Octave stack over one Perlin source, normalized to roughly `±1`.
///
/// Octave `i` has frequency `2^i` and weight `2^(-i·hurst)`. Each octave is
/// sampled at its own shifted origin so the lattice points do not line up.
struct Octaves {
    noise: Perlin,
    weights: Vec<f64>,
    total: f64,
}

impl Octaves {
    fn new(seed: u32, hurst: f64, count: u32) -> Self {
        let weights: Vec<f64> = (0..count).map(|i| 2f64.powf(-(i as f64) * hurst)).collect();
        let total = weights.iter().sum::<f64>().max(f64::EPSILON);
        Self { noise: Perlin::new(seed), weights, total }
    }

    fn at(&self, x: f64, y: f64) -> f64 {
        let sum: f64 = self
            .weights
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let freq = (1u64 << i) as f64;
                let shift = 31.7 * i as f64;
                w * self.noise.get([x * freq + shift, y * freq - shift])
            })
            .sum();
        sum / self.total
    }
}

/// Parameters of a generated tile.
#[derive(Debug, Clone)]
pub struct SyntheticTile {
    pub seed: u32,
    pub size: usize,
    pub base_elevation_m: f64,
    pub relief_m: f64,
    pub hurst: f64,
    /// Row of the east-west road, as a fraction of the tile height.
    pub road_row_fraction: f64,
}

impl SyntheticTile {
    pub fn new(seed: u32, size: usize) -> Self {
        Self {
            seed,
            size: size.max(2),
            base_elevation_m: 350.0,
            relief_m: 120.0,
            hurst: 0.8,
            road_row_fraction: 0.2,
        }
    }

    /// Tile of `size × size` cells centred on `origin`.
    pub fn generate(&self, origin: LatLon) -> TileInput {
        let n = self.size;
        let bounds = GeoBounds::around(origin, extent_deg(n));
        let base_freq = 4.0 / n as f64;

        let terrain = Octaves::new(self.seed, self.hurst, 6);
        let cover = Octaves::new(self.seed.wrapping_add(0x5A5A), 0.6, 4);

        let mut elevation = Vec::with_capacity(n * n);
        let mut vegetation = Vec::with_capacity(n * n);
        for r in 0..n {
            for c in 0..n {
                let (x, y) = (c as f64 * base_freq, r as f64 * base_freq);
                elevation.push(self.base_elevation_m + self.relief_m * terrain.at(x, y));
                // Centre on moderate forest, spread across the density scale.
                let density = 0.55 + cover.at(x + 17.3, y - 4.1);
                vegetation.push(density.clamp(0.0, 1.0));
            }
        }

        let (_, dy) = bounds.cell_size_m(n, n);
        let road_row = (self.road_row_fraction.clamp(0.0, 1.0) * (n - 1) as f64).round();
        let road: Vec<f64> = (0..n * n)
            .map(|i| ((i / n) as f64 - road_row).abs() * dy)
            .collect();

        let mut auxiliary = BTreeMap::new();
        auxiliary.insert("road_distance_m".to_string(), road);

        TileInput { bounds, rows: n, cols: n, elevation, vegetation, auxiliary }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octaves_vary_and_stay_bounded() {
        let field = Octaves::new(42, 0.75, 8);
        let values: Vec<f64> = (0..64).map(|i| field.at(i as f64 * 0.1, 0.37)).collect();
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        assert!(max - min > 0.01);
        assert!(values.iter().all(|v| v.abs() <= 1.0));
    }

    #[test]
    fn same_seed_same_tile() {
        let origin = LatLon::new(46.0, -91.0);
        let a = SyntheticTile::new(3, 16).generate(origin);
        let b = SyntheticTile::new(3, 16).generate(origin);
        assert_eq!(a.elevation, b.elevation);
        assert_eq!(a.vegetation, b.vegetation);
        let c = SyntheticTile::new(4, 16).generate(origin);
        assert_ne!(a.elevation, c.elevation);
    }

    #[test]
    fn layers_match_grid_and_ranges() {
        let t = SyntheticTile::new(9, 20).generate(LatLon::new(45.0, -90.0));
        assert_eq!(t.elevation.len(), 400);
        assert!(t.vegetation.iter().all(|v| (0.0..=1.0).contains(v)));
        let road = &t.auxiliary["road_distance_m"];
        assert_eq!(road.len(), 400);
        assert!(road.iter().any(|&d| d == 0.0));
        assert!(t.bounds.contains(LatLon::new(45.0, -90.0)));
    }
}
