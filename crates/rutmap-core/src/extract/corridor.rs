//! Lowest-cost travel corridors across a score surface.
//!
//! The surface is inverted into a cost raster `max - score + 1`, so every
//! step costs at least 1 and high-score cells are cheap. A* on the
//! 4-connected grid, with the Euclidean cell distance as heuristic, joins
//! the first and last high-score cells in scan order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::{debug, trace};
use serde::Serialize;

use super::geojson::{Feature, Geometry};
use crate::coords::LatLon;
use crate::raster::Raster;
use crate::rules::Behavior;
use crate::stats::percentile;

/// Ordered path of cell centers. Empty when no corridor was found.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Polyline {
    pub points: Vec<LatLon>,
    /// Summed destination-cell cost along the path.
    pub cost: f64,
}

impl Polyline {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Length along the path in metres.
    pub fn length_m(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance_m(w[1])).sum()
    }

    /// `LineString` feature, or `None` for an empty path.
    pub fn to_feature(&self, behavior: Behavior) -> Option<Feature> {
        if self.is_empty() {
            return None;
        }
        Some(
            Feature::new(Geometry::line_string(&self.points))
                .with_property("behavior", behavior.name())
                .with_property("kind", "corridor")
                .with_property("cost", self.cost)
                .with_property("length_cells", self.points.len())
                .with_property("length_m", self.length_m()),
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct Node {
    f: f64,
    g: f64,
    idx: usize,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Node {}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap on f; ties prefer the lower index so paths are deterministic.
        other.f.total_cmp(&self.f).then_with(|| other.idx.cmp(&self.idx))
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CorridorExtractor {
    /// Endpoint candidates score at or above this percentile.
    percentile: f64,
}

impl Default for CorridorExtractor {
    fn default() -> Self {
        Self { percentile: 90.0 }
    }
}

impl CorridorExtractor {
    pub fn new(percentile: f64) -> Self {
        Self { percentile: percentile.clamp(0.0, 100.0) }
    }

    /// Corridor between the first and last high-score cell in scan order.
    pub fn extract(&self, score: &Raster<f64>) -> Polyline {
        let cut = percentile(score.data(), self.percentile);
        let mut high = score.iter().enumerate().filter(|&(_, &s)| s >= cut).map(|(i, _)| i);
        let (Some(start), Some(goal)) = (high.next(), high.last()) else {
            debug!("corridor: fewer than two cells at or above p{}", self.percentile);
            return Polyline::default();
        };

        let max = score.max_value();
        let cost = score.map(|s| max - s + 1.0);
        match astar(&cost, start, goal) {
            Some((cells, total)) => {
                trace!("corridor: {} cells, cost {:.2}", cells.len(), total);
                Polyline {
                    points: cells
                        .into_iter()
                        .map(|i| {
                            let (r, c) = score.index_to_cell(i);
                            score.cell_center(r, c)
                        })
                        .collect(),
                    cost: total,
                }
            }
            None => {
                debug!("corridor: no path between {start} and {goal}");
                Polyline::default()
            }
        }
    }
}

/// A* over the 4-connected grid; returns the cell indices from `start` to
/// `goal` and the summed cost.
fn astar(cost: &Raster<f64>, start: usize, goal: usize) -> Option<(Vec<usize>, f64)> {
    let (rows, cols) = cost.shape();
    let (gr, gc) = cost.index_to_cell(goal);
    let heuristic = |i: usize| {
        let (r, c) = (i / cols, i % cols);
        let dr = r as f64 - gr as f64;
        let dc = c as f64 - gc as f64;
        (dr * dr + dc * dc).sqrt()
    };

    let n = rows * cols;
    let mut best = vec![f64::INFINITY; n];
    let mut came_from = vec![usize::MAX; n];
    let mut closed = vec![false; n];
    let mut open = BinaryHeap::new();

    best[start] = 0.0;
    open.push(Node { f: heuristic(start), g: 0.0, idx: start });

    while let Some(Node { g, idx, .. }) = open.pop() {
        if idx == goal {
            let mut path = vec![goal];
            let mut cur = goal;
            while cur != start {
                cur = came_from[cur];
                path.push(cur);
            }
            path.reverse();
            return Some((path, g));
        }
        if closed[idx] {
            continue;
        }
        closed[idx] = true;

        let (r, c) = (idx / cols, idx % cols);
        let neighbours = [
            (r > 0).then(|| idx - cols),
            (r + 1 < rows).then(|| idx + cols),
            (c > 0).then(|| idx - 1),
            (c + 1 < cols).then(|| idx + 1),
        ];
        for next in neighbours.into_iter().flatten() {
            if closed[next] {
                continue;
            }
            let step = cost.data()[next];
            if !step.is_finite() {
                continue;
            }
            let tentative = g + step;
            if tentative < best[next] {
                best[next] = tentative;
                came_from[next] = idx;
                open.push(Node { f: tentative + heuristic(next), g: tentative, idx: next });
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::GeoBounds;
    use approx::assert_relative_eq;

    fn b(rows: usize, cols: usize) -> GeoBounds {
        GeoBounds::new(45.0, 45.0 + rows as f64 * 0.001, -90.0, -90.0 + cols as f64 * 0.001)
    }

    #[test]
    fn single_peak_gives_no_corridor() {
        let s = Raster::new(b(1, 5), 1, 5, vec![0.0, 0.0, 0.0, 0.0, 10.0]).unwrap();
        let line = CorridorExtractor::default().extract(&s);
        assert!(line.is_empty());
        assert!(line.to_feature(Behavior::Travel).is_none());
    }

    #[test]
    fn path_follows_the_cheap_valley() {
        // High-score ring around a low-score block; the path must go around.
        let (rows, cols) = (5, 5);
        let s = Raster::from_fn(b(rows, cols), rows, cols, |r, c| {
            if (1..=3).contains(&r) && (1..=3).contains(&c) && !(r == 1 && c == 1) {
                0.0
            } else {
                10.0
            }
        });
        let line = CorridorExtractor::new(50.0).extract(&s);
        assert!(!line.is_empty());
        // Start at the north-west corner, end at the south-east corner.
        assert_eq!(line.points[0], s.cell_center(0, 0));
        assert_eq!(*line.points.last().unwrap(), s.cell_center(4, 4));
        // Manhattan-shortest path on the rim: 9 cells, each costing 1.
        assert_eq!(line.len(), 9);
        assert_relative_eq!(line.cost, 8.0);
        for p in &line.points {
            let (r, c) = s.cell_at(*p).unwrap();
            assert_eq!(s.get(r, c), 10.0);
        }
    }

    #[test]
    fn uniform_surface_connects_corners() {
        let s = Raster::filled(b(3, 4), 3, 4, 2.0);
        let line = CorridorExtractor::default().extract(&s);
        assert_eq!(line.len(), 3 + 4 - 1);
        assert_eq!(line.points[0], s.cell_center(0, 0));
    }

    #[test]
    fn feature_carries_properties() {
        let s = Raster::filled(b(2, 2), 2, 2, 5.0);
        let f = CorridorExtractor::default().extract(&s).to_feature(Behavior::Travel).unwrap();
        assert_eq!(f.property("kind").unwrap(), "corridor");
        assert_eq!(f.property("behavior").unwrap(), "travel");
        assert_eq!(f.property("length_cells").unwrap(), 3);
    }
}
