//! Finite-difference derivatives on a row-major grid.
//! Shared by `TerrainGrid` and `VegetationGrid`.
//!
//! Central differences in the interior, one-sided first differences on the
//! borders. A dimension of length 1 has zero derivative along it.
//!
//! Axes: `x` points east (increasing column), `y` points north (decreasing
//! row). Spacing is in metres.

/// Partial derivatives `(∂f/∂x, ∂f/∂y)` at every cell.
pub(crate) fn gradient(data: &[f64], rows: usize, cols: usize, dx: f64, dy: f64) -> (Vec<f64>, Vec<f64>) {
    debug_assert_eq!(data.len(), rows * cols);
    let mut gx = vec![0.0; data.len()];
    let mut gy = vec![0.0; data.len()];

    for r in 0..rows {
        for c in 0..cols {
            let i = r * cols + c;
            gx[i] = axis_diff(cols, c, |k| data[r * cols + k]) / dx;
            // Row index grows southward, so northward slope is the negated row derivative.
            gy[i] = -axis_diff(rows, r, |k| data[k * cols + c]) / dy;
        }
    }
    (gx, gy)
}

/// Second derivatives `(f_xx, f_yy, f_xy)` obtained by differencing the gradient.
pub(crate) fn hessian(data: &[f64], rows: usize, cols: usize, dx: f64, dy: f64) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let (gx, gy) = gradient(data, rows, cols, dx, dy);
    let (fxx, fxy) = gradient(&gx, rows, cols, dx, dy);
    let (_, fyy) = gradient(&gy, rows, cols, dx, dy);
    (fxx, fyy, fxy)
}

/// Difference along one axis of length `n` at position `k`, in index units.
#[inline]
fn axis_diff(n: usize, k: usize, at: impl Fn(usize) -> f64) -> f64 {
    if n < 2 {
        0.0
    } else if k == 0 {
        at(1) - at(0)
    } else if k == n - 1 {
        at(n - 1) - at(n - 2)
    } else {
        (at(k + 1) - at(k - 1)) / 2.0
    }
}
