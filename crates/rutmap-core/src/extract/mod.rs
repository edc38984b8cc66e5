//! Geographic artifacts extracted from score surfaces.
pub mod corridor;
pub mod geojson;
pub mod hull;
pub mod zone;

pub use corridor::{CorridorExtractor, Polyline};
pub use geojson::{Feature, FeatureCollection, Geometry};
pub use zone::{Polygon, ZoneExtractor};
