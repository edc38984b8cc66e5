//! Per-cell terrain descriptors derived from an elevation raster.
//!
//! Slope and aspect come from the finite-difference gradient, curvature from
//! the discrete Laplacian, and the ridge/saddle classes from the principal
//! curvatures of the 2×2 Hessian. Boolean terrain classes are thresholded
//! from those with `TerrainThresholds`.
mod gradient;

pub(crate) use gradient::gradient;

use crate::config::TerrainThresholds;
use crate::coords::{normalize_bearing, LatLon};
use crate::raster::Raster;
use crate::stats::percentile;

/// Gradient magnitudes below this are treated as flat (aspect undefined → 0°).
const FLAT_GRADIENT_EPS: f64 = 1e-9;

/// Terrain descriptors at one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainSample {
    pub elevation_m: f64,
    pub slope_deg: f64,
    pub aspect_deg: f64,
}

/// Elevation raster plus everything derived from it.
#[derive(Debug, Clone)]
pub struct TerrainGrid {
    pub elevation: Raster<f64>,
    /// Degrees from horizontal.
    pub slope: Raster<f64>,
    /// Compass bearing of the downhill direction, `[0, 360)`.
    pub aspect: Raster<f64>,
    /// Discrete Laplacian `z_xx + z_yy` (1/m).
    pub curvature: Raster<f64>,
    /// Larger principal curvature of the Hessian.
    pub curv1: Raster<f64>,
    /// Smaller principal curvature of the Hessian.
    pub curv2: Raster<f64>,

    pub ridge: Raster<bool>,
    pub saddle: Raster<bool>,
    pub flat: Raster<bool>,
    pub south_slope: Raster<bool>,
    pub north_slope: Raster<bool>,
    pub southwest_slope: Raster<bool>,
    pub bluff_pinch: Raster<bool>,
    pub creek_bottom: Raster<bool>,
}

impl TerrainGrid {
    /// Derive all terrain layers from `elevation` (metres).
    pub fn new(elevation: Raster<f64>, t: &TerrainThresholds) -> Self {
        let (rows, cols) = elevation.shape();
        let (dx, dy) = elevation.cell_size_m();
        let z = elevation.data();

        let (gx, gy) = gradient::gradient(z, rows, cols, dx, dy);
        let (fxx, fyy, fxy) = gradient::hessian(z, rows, cols, dx, dy);

        let bounds = *elevation.bounds();
        let at = |v: &[f64], r: usize, c: usize| v[r * cols + c];

        let slope = Raster::from_fn(bounds, rows, cols, |r, c| {
            let (x, y) = (at(&gx, r, c), at(&gy, r, c));
            (x * x + y * y).sqrt().atan().to_degrees()
        });

        let aspect = Raster::from_fn(bounds, rows, cols, |r, c| {
            downhill_bearing(at(&gx, r, c), at(&gy, r, c))
        });

        let curvature = Raster::from_fn(bounds, rows, cols, |r, c| at(&fxx, r, c) + at(&fyy, r, c));

        // Eigenvalues of [[fxx, fxy], [fxy, fyy]].
        let principal = |r: usize, c: usize| {
            let (a, b, d) = (at(&fxx, r, c), at(&fxy, r, c), at(&fyy, r, c));
            let mean = (a + d) / 2.0;
            let radius = (((a - d) / 2.0).powi(2) + b * b).sqrt();
            (mean + radius, mean - radius)
        };
        let curv1 = Raster::from_fn(bounds, rows, cols, |r, c| principal(r, c).0);
        let curv2 = Raster::from_fn(bounds, rows, cols, |r, c| principal(r, c).1);

        let ridge = curvature.zip_map(&slope, |k, s| k < 0.0 && s > t.ridge_min_slope_deg);
        let saddle = Raster::from_fn(bounds, rows, cols, |r, c| {
            curv1.get(r, c) > 0.0 && curv2.get(r, c) < 0.0 && slope.get(r, c) < t.saddle_max_slope_deg
        });
        let flat = slope.map(|s| s < t.flat_max_slope_deg);
        let south_slope = aspect.map(|a| in_band(a, t.south_aspect));
        let north_slope = aspect.map(|a| a >= t.north_aspect.0 || a <= t.north_aspect.1);
        let southwest_slope = aspect.map(|a| in_band(a, t.southwest_aspect));

        let abs_curv: Vec<f64> = curvature.iter().map(|k| k.abs()).collect();
        let curv_cut = percentile(&abs_curv, t.bluff_curvature_percentile);
        let bluff_pinch = curvature.zip_map(&slope, |k, s| s > t.bluff_min_slope_deg && k.abs() > curv_cut);

        let elev_cut = percentile(z, t.creek_elevation_percentile);
        let creek_bottom = elevation.zip_map(&slope, |e, s| e < elev_cut && s < t.creek_max_slope_deg);

        log::debug!(
            "terrain {}x{}: cell {:.1}x{:.1} m, {} ridge, {} saddle, {} creek-bottom cells",
            rows,
            cols,
            dx,
            dy,
            ridge.count_true(),
            saddle.count_true(),
            creek_bottom.count_true()
        );

        Self {
            elevation,
            slope,
            aspect,
            curvature,
            curv1,
            curv2,
            ridge,
            saddle,
            flat,
            south_slope,
            north_slope,
            southwest_slope,
            bluff_pinch,
            creek_bottom,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.elevation.shape()
    }

    /// Descriptors of the cell at `(row, col)`.
    pub fn sample_cell(&self, row: usize, col: usize) -> TerrainSample {
        TerrainSample {
            elevation_m: self.elevation.get(row, col),
            slope_deg: self.slope.get(row, col),
            aspect_deg: self.aspect.get(row, col),
        }
    }

    /// Descriptors of the cell containing `p`; `None` outside the tile.
    pub fn sample(&self, p: LatLon) -> Option<TerrainSample> {
        self.elevation.cell_at(p).map(|(r, c)| self.sample_cell(r, c))
    }
}

/// Compass bearing (clockwise from north) of `-∇z`.
fn downhill_bearing(dz_east: f64, dz_north: f64) -> f64 {
    if (dz_east * dz_east + dz_north * dz_north).sqrt() < FLAT_GRADIENT_EPS {
        return 0.0;
    }
    normalize_bearing((-dz_east).atan2(-dz_north).to_degrees())
}

#[inline]
fn in_band(a: f64, (lo, hi): (f64, f64)) -> bool {
    a >= lo && a <= hi
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::GeoBounds;

    /// Bounds giving ≈30 m square cells at the equator.
    fn bounds(n: usize) -> GeoBounds {
        let extent = n as f64 * 30.0 / 111_320.0;
        GeoBounds::new(0.0, extent, 0.0, extent)
    }

    /// Planar slope of `deg` degrees falling toward `downhill` (compass bearing).
    fn plane(n: usize, deg: f64, downhill: f64) -> Raster<f64> {
        let rise = 30.0 * deg.to_radians().tan();
        let (s, c) = downhill.to_radians().sin_cos();
        Raster::from_fn(bounds(n), n, n, |r, col| {
            let east = col as f64;
            let north = (n - 1 - r) as f64;
            // Elevation drops along the downhill unit vector (east = sin, north = cos).
            500.0 - rise * (east * s + north * c)
        })
    }

    #[test]
    fn plane_slope_and_aspect() {
        for (deg, downhill) in [(12.0, 180.0), (25.0, 90.0), (8.0, 225.0), (20.0, 0.0)] {
            let tg = TerrainGrid::new(plane(16, deg, downhill), &TerrainThresholds::default());
            let s = tg.sample_cell(8, 8);
            assert!((s.slope_deg - deg).abs() < 0.5, "slope {} vs {deg}", s.slope_deg);
            let diff = crate::coords::angular_distance(s.aspect_deg, downhill);
            assert!(diff < 1.0, "aspect {} vs {downhill}", s.aspect_deg);
        }
    }

    #[test]
    fn aspect_classes_follow_bands() {
        let south = TerrainGrid::new(plane(8, 15.0, 200.0), &TerrainThresholds::default());
        assert!(south.south_slope.get(4, 4));
        assert!(south.southwest_slope.get(4, 4));
        assert!(!south.north_slope.get(4, 4));

        let north = TerrainGrid::new(plane(8, 15.0, 0.0), &TerrainThresholds::default());
        assert!(north.north_slope.get(4, 4));
        assert!(!north.south_slope.get(4, 4));
    }

    #[test]
    fn flat_tile_is_all_flat() {
        let tg = TerrainGrid::new(Raster::filled(bounds(10), 10, 10, 300.0), &TerrainThresholds::default());
        assert_eq!(tg.flat.count_true(), 100);
        assert_eq!(tg.ridge.count_true(), 0);
        assert_eq!(tg.saddle.count_true(), 0);
        assert_eq!(tg.bluff_pinch.count_true(), 0);
        // No cell is strictly below the 20th percentile of a constant field.
        assert_eq!(tg.creek_bottom.count_true(), 0);
        assert!(tg.aspect.iter().all(|&a| a == 0.0));
    }

    #[test]
    fn ridge_crest_is_detected() {
        // East-west ridge line along the middle row; 8 m per 30 m cell ≈ 15° flanks.
        let n = 15;
        let elev = Raster::from_fn(bounds(n), n, n, |r, _| 800.0 - 8.0 * (r as f64 - 7.0).abs());
        let tg = TerrainGrid::new(elev, &TerrainThresholds::default());
        // Cells adjacent to the crest see negative curvature and a steep flank.
        assert!(tg.curvature.get(7, 7) < 0.0);
        assert!(tg.ridge.get(6, 7) || tg.ridge.get(8, 7));
        // Far down the flanks the surface is planar.
        assert!(!tg.ridge.get(2, 7));
    }

    #[test]
    fn saddle_between_two_peaks() {
        // z = x² − y² scaled down: a classic saddle at the centre.
        let n = 21;
        let elev = Raster::from_fn(bounds(n), n, n, |r, c| {
            let x = c as f64 - 10.0;
            let y = 10.0 - r as f64;
            400.0 + 0.05 * (x * x - y * y)
        });
        let tg = TerrainGrid::new(elev, &TerrainThresholds::default());
        assert!(tg.curv1.get(10, 10) > 0.0);
        assert!(tg.curv2.get(10, 10) < 0.0);
        assert!(tg.saddle.get(10, 10));
    }

    #[test]
    fn creek_bottom_marks_low_gentle_cells() {
        // Valley floor in the last two rows, gentle rise northward.
        let n = 10;
        let elev = Raster::from_fn(bounds(n), n, n, |r, _| if r >= 8 { 100.0 } else { 100.0 + (8 - r) as f64 * 2.0 });
        let tg = TerrainGrid::new(elev, &TerrainThresholds::default());
        assert!(tg.creek_bottom.get(9, 5));
        assert!(!tg.creek_bottom.get(0, 5));
    }

    #[test]
    fn sample_outside_is_none() {
        let tg = TerrainGrid::new(plane(8, 10.0, 90.0), &TerrainThresholds::default());
        assert!(tg.sample(LatLon::new(5.0, 5.0)).is_none());
        assert!(tg.sample(tg.elevation.bounds().center()).is_some());
    }
}
