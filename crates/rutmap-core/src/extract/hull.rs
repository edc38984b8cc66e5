//! Convex hull of integer grid points (Andrew's monotone chain).

/// Grid point `(x, y)` in index units.
pub type GridPoint = (i64, i64);

fn cross(o: GridPoint, a: GridPoint, b: GridPoint) -> i64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

/// Hull vertices in counter-clockwise order, without collinear points and
/// without repeating the first vertex. Fewer than three vertices means the
/// input is degenerate (empty, a point or a line).
pub fn convex_hull(points: &[GridPoint]) -> Vec<GridPoint> {
    let mut pts = points.to_vec();
    pts.sort_unstable();
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut hull: Vec<GridPoint> = Vec::with_capacity(2 * pts.len());
    for &p in &pts {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0 {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}
