//! Per-edge routing weights.
//!
//! # Formula
//!
//! For an edge `u → v`:
//!
//! ```text
//! midpoint = ((lat_u + lat_v) / 2, (lon_u + lon_v) / 2)
//! factor   = policy(grid.lookup(midpoint))
//! weight   = length_m.unwrap_or(1.0) * factor
//! ```
//!
//! The midpoint is the plain arithmetic mean, not the geodesic midpoint.
//! Edges without a length count as unit edges.
//!
//! # Side map
//!
//! Weights are never written onto the graph.  [`compute_weights`] returns an
//! [`EdgeWeights`] table indexed by `EdgeId` which the caller passes to the
//! router explicitly, so any number of weight tables can exist for one
//! shared network.

use serde::{Deserialize, Serialize};

use hr_core::EdgeId;
use hr_hazard::ChunkGrid;
use hr_spatial::{EdgeRef, RoadNetwork};

use crate::{RoutingError, RoutingResult};

/// Length assumed for edges that carry none.
pub const UNIT_LENGTH: f64 = 1.0;

// ── HazardPolicy ──────────────────────────────────────────────────────────────

/// How a chunk's hazard value becomes a cost multiplier.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardPolicy {
    /// Factors below 1 are raised to 1, so `weight >= length` for every edge.
    #[default]
    NonDecreasing,
    /// The hazard value is used as-is; favourable conditions may lower cost.
    Raw,
}

impl HazardPolicy {
    #[inline]
    pub fn factor(self, hazard: f64) -> f64 {
        match self {
            HazardPolicy::NonDecreasing => hazard.max(1.0),
            HazardPolicy::Raw => hazard,
        }
    }
}

// ── EdgeWeights ───────────────────────────────────────────────────────────────

/// Routing weight of every edge, indexed by `EdgeId`.
///
/// Every entry is finite and non-negative.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeWeights {
    weights: Vec<f64>,
}

impl EdgeWeights {
    /// Wrap precomputed weights for `network`.  Fails if the count does not
    /// match the edge count or any value is negative or non-finite.
    pub fn from_vec(network: &RoadNetwork, weights: Vec<f64>) -> RoutingResult<Self> {
        if weights.len() != network.edge_count() {
            return Err(RoutingError::WeightCountMismatch {
                expected: network.edge_count(),
                got:      weights.len(),
            });
        }
        if let Some((i, &value)) = weights
            .iter()
            .enumerate()
            .find(|(_, w)| !(w.is_finite() && **w >= 0.0))
        {
            return Err(RoutingError::InvalidWeight { edge: EdgeId(i as u32), value });
        }
        Ok(Self { weights })
    }

    #[inline]
    pub fn get(&self, edge: EdgeId) -> f64 {
        self.weights[edge.index()]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Sum of all weights.  Handy as a cheap fingerprint in logs.
    pub fn total(&self) -> f64 {
        self.weights.iter().sum()
    }
}

// ── Computation ───────────────────────────────────────────────────────────────

/// Weight of a single edge.
#[inline]
pub fn edge_weight(network: &RoadNetwork, grid: &ChunkGrid, policy: HazardPolicy, edge: EdgeRef<'_>) -> f64 {
    let from = network.node_pos[edge.source.index()];
    let to = network.node_pos[edge.target.index()];
    let factor = policy.factor(grid.lookup(from.midpoint(to)));
    edge.length_m.unwrap_or(UNIT_LENGTH) * factor
}

/// Weights for every edge of `network`.
///
/// A pure function of its inputs: calling it twice with the same network,
/// grid and policy yields bit-identical tables.  With the `parallel` feature
/// the edges are split across the Rayon pool; the result is the same.
pub fn compute_weights(network: &RoadNetwork, grid: &ChunkGrid, policy: HazardPolicy) -> EdgeWeights {
    #[cfg(not(feature = "parallel"))]
    let weights = compute_weights_sequential(network, grid, policy);

    #[cfg(feature = "parallel")]
    let weights = {
        use rayon::prelude::*;

        EdgeWeights {
            weights: (0..network.edge_count())
                .into_par_iter()
                .map(|i| edge_weight(network, grid, policy, network.edge(EdgeId(i as u32))))
                .collect(),
        }
    };

    report(grid, policy, &weights);
    weights
}

/// Single-threaded [`compute_weights`].
pub fn compute_weights_sequential(network: &RoadNetwork, grid: &ChunkGrid, policy: HazardPolicy) -> EdgeWeights {
    EdgeWeights {
        weights: network
            .edges()
            .map(|edge| edge_weight(network, grid, policy, edge))
            .collect(),
    }
}

fn report(grid: &ChunkGrid, policy: HazardPolicy, weights: &EdgeWeights) {
    if policy == HazardPolicy::NonDecreasing {
        let below = grid.hazards().iter().filter(|&&h| h < 1.0).count();
        if below > 0 {
            log::warn!("{below} chunks carry a hazard below 1; their factor was raised to 1");
        }
    }
    log::debug!(
        "computed {} edge weights (policy {policy:?}, total {:.3})",
        weights.len(),
        weights.total()
    );
}
