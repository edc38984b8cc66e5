//! Small order statistics over raster values.

/// Percentile `p` (0–100) with linear interpolation between closest ranks.
///
/// NaN values are ignored. Returns NaN for an empty (or all-NaN) input.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_by(f64::total_cmp);
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let t = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * t
}

/// Rescale so the maximum becomes `ceiling`, clamping into `[0, ceiling]`.
/// Leaves an all-zero (or non-positive) input untouched.
pub fn scale_to_max(values: &mut [f64], ceiling: f64) {
    let max = values.iter().copied().fold(0.0f64, f64::max);
    if max <= 0.0 {
        return;
    }
    for v in values.iter_mut() {
        *v = (*v / max * ceiling).clamp(0.0, ceiling);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn percentile_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(percentile(&v, 0.0), 1.0);
        assert_relative_eq!(percentile(&v, 50.0), 3.0);
        assert_relative_eq!(percentile(&v, 100.0), 5.0);
        assert_relative_eq!(percentile(&v, 90.0), 4.6);
    }

    #[test]
    fn percentile_ignores_nan_and_handles_empty() {
        assert!(percentile(&[], 50.0).is_nan());
        assert_relative_eq!(percentile(&[f64::NAN, 2.0, 4.0], 50.0), 3.0);
    }

    #[test]
    fn scale_to_max_hits_ceiling() {
        let mut v = vec![0.0, 2.5, 5.0];
        scale_to_max(&mut v, 10.0);
        assert_eq!(v, vec![0.0, 5.0, 10.0]);

        let mut zeros = vec![0.0; 4];
        scale_to_max(&mut zeros, 10.0);
        assert!(zeros.iter().all(|&x| x == 0.0));
    }
}
