//! Routing error type.

use thiserror::Error;

use hr_core::{CoreError, EdgeId, NodeId};
use hr_hazard::HazardError;
use hr_spatial::SpatialError;

/// Errors produced by `hr-routing`.
///
/// Every variant is a per-request failure; none leaves shared state
/// modified.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(#[from] CoreError),

    #[error("no route from {from} to {to}")]
    NoPath { from: NodeId, to: NodeId },

    #[error("chunk data unavailable")]
    ChunkDataUnavailable,

    #[error("road graph unavailable")]
    GraphUnavailable,

    #[error("expected {expected} edge weights, got {got}")]
    WeightCountMismatch { expected: usize, got: usize },

    #[error("invalid weight {value} for {edge}")]
    InvalidWeight { edge: EdgeId, value: f64 },

    #[error(transparent)]
    Spatial(#[from] SpatialError),

    #[error(transparent)]
    Hazard(#[from] HazardError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("GeoJSON error: {0}")]
    GeoJson(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RoutingResult<T> = Result<T, RoutingError>;
