//! Spatial-subsystem error type.

use thiserror::Error;

use hr_core::{CoreError, NodeId};

/// Errors produced by `hr-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("road network has no nodes")]
    EmptyNetwork,

    #[error("no edge from {from} to {to}")]
    NoEdge { from: NodeId, to: NodeId },

    #[error("{0} not found in network")]
    NodeNotFound(NodeId),

    #[error("edge {from} -> {to} has invalid length {length_m}")]
    InvalidLength { from: NodeId, to: NodeId, length_m: f64 },

    #[error("duplicate key {key} for edge {from} -> {to}")]
    DuplicateKey { from: NodeId, to: NodeId, key: u32 },

    #[error("invalid node coordinate: {0}")]
    InvalidCoordinate(#[from] CoreError),

    #[error("graph parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
