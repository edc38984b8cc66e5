//! Error types for the analysis core.
//!
//! Only precondition violations are errors. Insufficient data for a corridor,
//! zone or bedding site is an empty result, never an `Err`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid raster dimensions: {rows}x{cols} with {len} values")]
    InvalidDimensions { rows: usize, cols: usize, len: usize },

    #[error("Raster size mismatch for '{layer}': expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch {
        layer: String,
        er: usize,
        ec: usize,
        ar: usize,
        ac: usize,
    },

    #[error("Rule set is empty")]
    EmptyRuleSet,

    #[error("Invalid rule #{index}: {reason}")]
    InvalidRule { index: usize, reason: String },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
