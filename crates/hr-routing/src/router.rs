//! Routing trait and default Dijkstra implementation.
//!
//! # Pluggability
//!
//! [`RoutingContext`](crate::RoutingContext) calls the solver through the
//! [`Router`] trait, so a contraction hierarchy or A* can replace the default
//! [`DijkstraRouter`] without touching the rest of the pipeline.
//!
//! # Determinism
//!
//! Edges are relaxed in `EdgeId` order and only on strict improvement, and
//! heap ties pop the lower `NodeId` first.  Among equal-weight paths the one
//! discovered first wins, which is stable across runs for the same graph and
//! weights.  Among parallel edges the cheapest is used, ties going to the
//! lowest `EdgeId`, matching [`RoadNetwork::edge_between`].

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use hr_core::NodeId;
use hr_spatial::{RoadNetwork, SpatialError};

use crate::weights::EdgeWeights;
use crate::{RoutingError, RoutingResult};

// ── Path ──────────────────────────────────────────────────────────────────────

/// Result of a routing query.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    /// Nodes from start to end, both inclusive.
    pub nodes: Vec<NodeId>,
    /// Sum of the weights of the traversed edges.
    pub total_weight: f64,
}

impl Path {
    /// `true` if start and end are the same node.
    pub fn is_trivial(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn start(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn end(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable shortest-path engine.
///
/// Implementations must be `Send + Sync` so one instance can serve
/// concurrent requests.
pub trait Router: Send + Sync {
    /// Minimum-weight path from `from` to `to` under `weights`.
    ///
    /// `from == to` yields a single-node path of weight 0.  An unreachable
    /// target yields [`RoutingError::NoPath`].
    fn route(
        &self,
        network: &RoadNetwork,
        weights: &EdgeWeights,
        from: NodeId,
        to: NodeId,
    ) -> RoutingResult<Path>;
}

// ── DijkstraRouter ────────────────────────────────────────────────────────────

/// Dijkstra's algorithm over the CSR road graph.
///
/// An optional weight limit bounds the search: paths heavier than the limit
/// are not explored and the query reports [`RoutingError::NoPath`].
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct DijkstraRouter {
    max_weight: Option<f64>,
}

impl DijkstraRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_weight(limit: f64) -> Self {
        Self { max_weight: Some(limit) }
    }

    pub fn max_weight(&self) -> Option<f64> {
        self.max_weight
    }
}

impl Router for DijkstraRouter {
    fn route(
        &self,
        network: &RoadNetwork,
        weights: &EdgeWeights,
        from: NodeId,
        to: NodeId,
    ) -> RoutingResult<Path> {
        if weights.len() != network.edge_count() {
            return Err(RoutingError::WeightCountMismatch {
                expected: network.edge_count(),
                got:      weights.len(),
            });
        }
        for node in [from, to] {
            if node.index() >= network.node_count() {
                return Err(SpatialError::NodeNotFound(node).into());
            }
        }
        dijkstra(network, weights, from, to, self.max_weight.unwrap_or(f64::INFINITY))
    }
}

// ── Dijkstra internals ────────────────────────────────────────────────────────

/// Heap key.  Weights are finite and non-negative, so `total_cmp` is the
/// usual numeric order.
#[derive(Copy, Clone, Debug, PartialEq)]
struct Cost(f64);

impl Eq for Cost {}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn dijkstra(
    network: &RoadNetwork,
    weights: &EdgeWeights,
    from: NodeId,
    to: NodeId,
    limit: f64,
) -> RoutingResult<Path> {
    if from == to {
        return Ok(Path { nodes: vec![from], total_weight: 0.0 });
    }

    let n = network.node_count();
    // dist[v] = best known weight to reach v.
    let mut dist = vec![f64::INFINITY; n];
    // prev[v] = node that reached v; NodeId::INVALID for unreached nodes.
    let mut prev = vec![NodeId::INVALID; n];

    dist[from.index()] = 0.0;

    // Min-heap on (cost, node); the node id breaks ties deterministically.
    let mut heap: BinaryHeap<Reverse<(Cost, NodeId)>> = BinaryHeap::new();
    heap.push(Reverse((Cost(0.0), from)));

    while let Some(Reverse((Cost(cost), node))) = heap.pop() {
        if node == to {
            return Ok(reconstruct(&prev, from, to, cost));
        }

        // Skip stale heap entries.
        if cost > dist[node.index()] {
            continue;
        }

        for edge in network.out_edges(node) {
            let neighbor = network.edge_to[edge.index()];
            let new_cost = cost + weights.get(edge);

            if new_cost <= limit && new_cost < dist[neighbor.index()] {
                dist[neighbor.index()] = new_cost;
                prev[neighbor.index()] = node;
                heap.push(Reverse((Cost(new_cost), neighbor)));
            }
        }
    }

    log::debug!("no route from {from} to {to}");
    Err(RoutingError::NoPath { from, to })
}

fn reconstruct(prev: &[NodeId], from: NodeId, to: NodeId, total_weight: f64) -> Path {
    let mut nodes = vec![to];
    let mut cur = to;
    while cur != from {
        cur = prev[cur.index()];
        debug_assert!(cur.is_valid(), "broken predecessor chain to {to}");
        nodes.push(cur);
    }
    nodes.reverse();
    Path { nodes, total_weight }
}
