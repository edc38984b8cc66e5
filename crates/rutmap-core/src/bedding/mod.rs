//! Bedding site refinement: point scoring, candidate promotion and the
//! ring sweep that produces ranked bedding zones.
pub mod candidate;
pub mod scorer;
pub mod sweep;

pub use candidate::{BeddingCandidate, BeddingZone, ZoneType};
pub use scorer::{BeddingAssessment, BeddingSiteScorer};
pub use sweep::SiteSweep;
