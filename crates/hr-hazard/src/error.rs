//! Hazard-subsystem error type.

use thiserror::Error;

use hr_core::ChunkId;

use crate::BoundingBox;

/// Errors produced by `hr-hazard`.
#[derive(Debug, Error)]
pub enum HazardError {
    #[error("degenerate bounding box {0}")]
    DegenerateBoundingBox(BoundingBox),

    #[error("invalid grid step {0}: must be finite and positive")]
    InvalidStep(f64),

    #[error("grid of {rows}x{cols} chunks is too large")]
    GridTooLarge { rows: usize, cols: usize },

    #[error("invalid hazard value {value} for {chunk}")]
    InvalidHazard { chunk: ChunkId, value: f64 },

    #[error("invalid hazard range [{low}, {high})")]
    InvalidRange { low: f64, high: f64 },

    #[error("invalid cell borders: {0}")]
    InvalidBorders(String),

    #[error("{0} not found in grid")]
    ChunkNotFound(ChunkId),

    #[error("expected {expected} chunk values, got {got}")]
    ChunkCountMismatch { expected: usize, got: usize },

    #[error("chunk data does not match the grid: {0}")]
    ChunkMismatch(String),

    #[error("chunk data parse error: {0}")]
    Parse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type HazardResult<T> = Result<T, HazardError>;
