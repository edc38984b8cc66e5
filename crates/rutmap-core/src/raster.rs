use serde::Serialize;

use crate::coords::{GeoBounds, LatLon};
use crate::error::{Error, Result};

/// A rectangular row-major grid tied to a geographic extent.
///
/// Row 0 is the northern edge, column 0 the western edge. Every derived
/// raster keeps the shape and bounds of the elevation raster it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Raster<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
    bounds: GeoBounds,
}

impl<T: Copy> Raster<T> {
    /// Wrap row-major `data`. Fails when the grid is empty, the length
    /// does not match `rows × cols`, or the bounds are not a proper extent.
    pub fn new(bounds: GeoBounds, rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        let expected = rows.checked_mul(cols).filter(|&n| n > 0);
        if expected != Some(data.len()) {
            return Err(Error::InvalidDimensions { rows, cols, len: data.len() });
        }
        bounds.validate()?;
        Ok(Self { data, rows, cols, bounds })
    }

    /// A raster with every cell set to `fill`.
    ///
    /// # Panics
    /// Panics if `rows` or `cols` is zero.
    pub fn filled(bounds: GeoBounds, rows: usize, cols: usize, fill: T) -> Self {
        assert!(rows > 0 && cols > 0, "raster must be non-empty");
        Self { data: vec![fill; rows * cols], rows, cols, bounds }
    }

    /// Build a raster by evaluating `f(row, col)` for every cell.
    ///
    /// # Panics
    /// Panics if `rows` or `cols` is zero.
    pub fn from_fn(bounds: GeoBounds, rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        assert!(rows > 0 && cols > 0, "raster must be non-empty");
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                data.push(f(r, c));
            }
        }
        Self { data, rows, cols, bounds }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: T) {
        self.data[row * self.cols + col] = val;
    }

    /// Cell-wise transform into a raster of the same shape.
    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> Raster<U> {
        Raster {
            data: self.data.iter().map(|&v| f(v)).collect(),
            rows: self.rows,
            cols: self.cols,
            bounds: self.bounds,
        }
    }

    /// Cell-wise combination with another raster of the same shape.
    ///
    /// # Panics
    /// Panics on shape mismatch; callers validate shapes up front.
    pub fn zip_map<U: Copy, V: Copy>(&self, other: &Raster<U>, f: impl Fn(T, U) -> V) -> Raster<V> {
        assert_eq!(self.shape(), other.shape(), "zip_map on rasters of different shape");
        Raster {
            data: self.data.iter().zip(&other.data).map(|(&a, &b)| f(a, b)).collect(),
            rows: self.rows,
            cols: self.cols,
            bounds: self.bounds,
        }
    }

    /// Verify that `other` has this raster's shape; `layer` names it in the error.
    pub fn check_shape<U>(&self, other: &Raster<U>, layer: &str) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(Error::SizeMismatch {
                layer: layer.to_string(),
                er: self.rows,
                ec: self.cols,
                ar: other.rows,
                ac: other.cols,
            });
        }
        Ok(())
    }
}

impl<T> Raster<T> {
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false: rasters are non-empty by construction.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn bounds(&self) -> &GeoBounds {
        &self.bounds
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// `(row, col)` of the flat index `i`.
    #[inline]
    pub fn index_to_cell(&self, i: usize) -> (usize, usize) {
        (i / self.cols, i % self.cols)
    }

    /// Geographic centre of cell `(row, col)`.
    pub fn cell_center(&self, row: usize, col: usize) -> LatLon {
        let b = &self.bounds;
        let lat = b.max_lat - (row as f64 + 0.5) * b.lat_span() / self.rows as f64;
        let lon = b.min_lon + (col as f64 + 0.5) * b.lon_span() / self.cols as f64;
        LatLon::new(lat, lon)
    }

    /// Cell containing `p`, or `None` when `p` is outside the bounds.
    pub fn cell_at(&self, p: LatLon) -> Option<(usize, usize)> {
        let b = &self.bounds;
        if !b.contains(p) {
            return None;
        }
        let fr = (b.max_lat - p.lat) / b.lat_span() * self.rows as f64;
        let fc = (p.lon - b.min_lon) / b.lon_span() * self.cols as f64;
        let r = (fr.floor().max(0.0) as usize).min(self.rows - 1);
        let c = (fc.floor().max(0.0) as usize).min(self.cols - 1);
        Some((r, c))
    }

    /// Cell sizes `(dx, dy)` in metres.
    pub fn cell_size_m(&self) -> (f64, f64) {
        self.bounds.cell_size_m(self.rows, self.cols)
    }
}

impl Raster<f64> {
    pub fn max_value(&self) -> f64 {
        self.data.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    }
}

impl Raster<bool> {
    pub fn count_true(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> GeoBounds {
        GeoBounds::new(0.0, 1.0, 0.0, 2.0)
    }

    #[test]
    fn new_rejects_bad_lengths() {
        assert!(Raster::new(bounds(), 2, 2, vec![0.0; 3]).is_err());
        assert!(Raster::<f64>::new(bounds(), 0, 2, vec![]).is_err());
        assert!(Raster::new(bounds(), 2, 2, vec![0.0; 4]).is_ok());
    }

    #[test]
    fn new_rejects_overflowing_shape() {
        let err = Raster::new(bounds(), usize::MAX, 2, vec![0.0; 4]).unwrap_err();
        assert!(matches!(err, Error::InvalidDimensions { rows: usize::MAX, cols: 2, len: 4 }));
    }

    #[test]
    fn new_rejects_improper_bounds() {
        for b in [
            GeoBounds::new(1.0, 0.0, 0.0, 2.0),
            GeoBounds::new(0.0, 1.0, 2.0, 0.0),
            GeoBounds::new(0.0, 0.0, 0.0, 2.0),
            GeoBounds::new(0.0, f64::NAN, 0.0, 2.0),
            GeoBounds::new(0.0, 1.0, f64::NEG_INFINITY, 2.0),
        ] {
            let err = Raster::new(b, 2, 2, vec![0.0; 4]).unwrap_err();
            assert!(matches!(err, Error::InvalidParameter { name: "bounds", .. }), "{b:?}");
        }
    }

    #[test]
    fn cell_center_row_zero_is_north() {
        let r = Raster::filled(bounds(), 4, 4, 0u8);
        let nw = r.cell_center(0, 0);
        let se = r.cell_center(3, 3);
        assert!((nw.lat - 0.875).abs() < 1e-12);
        assert!((nw.lon - 0.25).abs() < 1e-12);
        assert!((se.lat - 0.125).abs() < 1e-12);
        assert!((se.lon - 1.75).abs() < 1e-12);
    }

    #[test]
    fn cell_at_inverts_cell_center() {
        let r = Raster::filled(bounds(), 5, 7, 0u8);
        for row in 0..5 {
            for col in 0..7 {
                assert_eq!(r.cell_at(r.cell_center(row, col)), Some((row, col)));
            }
        }
        assert_eq!(r.cell_at(LatLon::new(1.5, 0.5)), None);
        // Edges clamp into the grid.
        assert_eq!(r.cell_at(LatLon::new(0.0, 2.0)), Some((4, 6)));
    }

    #[test]
    fn check_shape_reports_mismatch() {
        let a = Raster::filled(bounds(), 3, 3, 0.0);
        let b = Raster::filled(bounds(), 3, 4, false);
        let err = a.check_shape(&b, "vegetation").unwrap_err();
        assert!(err.to_string().contains("vegetation"));
    }
}
