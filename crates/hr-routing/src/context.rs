//! Shared routing state and the request entry point.
//!
//! # Lifecycle
//!
//! ```text
//! RoutingContext::new(config)
//!        │
//!        ├─ refresh(network, grid)      ─┐  build a new RoutingSnapshot
//!        ├─ refresh_network(network)     ├─ (weights computed here, outside
//!        └─ refresh_hazards(grid)       ─┘   the request path) and swap it in
//!
//! route(request) ── clone Arc<RoutingSnapshot> ── snap ── solve ── serialize
//! ```
//!
//! A snapshot is immutable.  A request clones the current `Arc` under a read
//! lock and then runs without holding any lock, so a refresh never disturbs
//! an in-flight request: it keeps routing on the snapshot it started with.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use hr_core::{GeoPoint, NodeId};
use hr_hazard::ChunkGrid;
use hr_spatial::RoadNetwork;

use crate::config::RoutingConfig;
use crate::geometry::{RouteGeometry, serialize_route};
use crate::request::RouteRequest;
use crate::router::{DijkstraRouter, Path, Router};
use crate::weights::{EdgeWeights, compute_weights};
use crate::{RoutingError, RoutingResult};

// ── RouteResult ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct RouteResult {
    /// Graph node the start coordinate snapped to.
    pub start_node: NodeId,
    /// Graph node the end coordinate snapped to.
    pub end_node:   NodeId,
    pub path:       Path,
    pub geometry:   RouteGeometry,
}

// ── RoutingSnapshot ───────────────────────────────────────────────────────────

/// One consistent view of the graph, the hazard grid and the weights derived
/// from them.
pub struct RoutingSnapshot {
    network: Arc<RoadNetwork>,
    grid:    Arc<ChunkGrid>,
    weights: EdgeWeights,
}

impl RoutingSnapshot {
    pub fn new(network: Arc<RoadNetwork>, grid: Arc<ChunkGrid>, config: &RoutingConfig) -> Self {
        let weights = compute_weights(&network, &grid, config.policy);
        Self { network, grid, weights }
    }

    pub fn network(&self) -> &Arc<RoadNetwork> {
        &self.network
    }

    pub fn grid(&self) -> &Arc<ChunkGrid> {
        &self.grid
    }

    pub fn weights(&self) -> &EdgeWeights {
        &self.weights
    }

    /// Snap both endpoints, solve, and serialize.
    pub fn route<R: Router + ?Sized>(&self, router: &R, request: &RouteRequest) -> RoutingResult<RouteResult> {
        request.validate()?;
        let start_node = self.network.nearest_node(request.start)?;
        let end_node = self.network.nearest_node(request.end)?;

        let path = router.route(&self.network, &self.weights, start_node, end_node)?;
        let geometry = serialize_route(&self.network, &self.weights, &path)?;

        log::debug!(
            "routed {start_node} -> {end_node}: {} nodes, weight {:.3}",
            path.nodes.len(),
            path.total_weight
        );
        Ok(RouteResult { start_node, end_node, path, geometry })
    }
}

// ── RoutingContext ────────────────────────────────────────────────────────────

#[derive(Default)]
struct State {
    network:  Option<Arc<RoadNetwork>>,
    grid:     Option<Arc<ChunkGrid>>,
    snapshot: Option<Arc<RoutingSnapshot>>,
}

/// Process-wide routing state for one region.
///
/// `Send + Sync`; share it behind an `Arc` across request handlers.
pub struct RoutingContext {
    config:  RoutingConfig,
    router:  DijkstraRouter,
    state:   RwLock<State>,
    /// Serializes refreshes so two of them cannot interleave their reads and
    /// writes of `state`.
    refresh: Mutex<()>,
}

impl RoutingContext {
    /// An empty context.  Routing fails until both a network and a grid have
    /// been supplied.
    pub fn new(config: RoutingConfig) -> RoutingResult<Self> {
        config.validate()?;
        Ok(Self {
            router: config.router(),
            config,
            state: RwLock::new(State::default()),
            refresh: Mutex::new(()),
        })
    }

    /// Context with data loaded up front.
    pub fn with_data(config: RoutingConfig, network: RoadNetwork, grid: ChunkGrid) -> RoutingResult<Self> {
        let context = Self::new(config)?;
        context.refresh(network, grid)?;
        Ok(context)
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    pub fn region(&self) -> &str {
        &self.config.region
    }

    /// `true` if `point` lies inside the served region.  Points outside are
    /// still routed; they snap to the nearest graph node.
    pub fn covers(&self, point: GeoPoint) -> bool {
        self.config.bbox.contains(point)
    }

    // ── Refresh ───────────────────────────────────────────────────────────

    /// Replace both the network and the hazard grid.
    pub fn refresh(&self, network: RoadNetwork, grid: ChunkGrid) -> RoutingResult<()> {
        let _guard = self.refresh.lock().unwrap_or_else(PoisonError::into_inner);
        let grid = self.prepare_grid(grid)?;
        self.publish(Arc::new(network), grid);
        Ok(())
    }

    /// Replace the network, keeping the current grid.
    pub fn refresh_network(&self, network: RoadNetwork) {
        let _guard = self.refresh.lock().unwrap_or_else(PoisonError::into_inner);
        let grid = self.read_state().grid.clone();
        match grid {
            Some(grid) => self.publish(Arc::new(network), grid),
            None => {
                log::info!("{}: network loaded ({} nodes), waiting for chunk data", self.region(), network.node_count());
                self.write_state().network = Some(Arc::new(network));
            }
        }
    }

    /// Replace the hazard grid, keeping the current network.
    pub fn refresh_hazards(&self, grid: ChunkGrid) -> RoutingResult<()> {
        let _guard = self.refresh.lock().unwrap_or_else(PoisonError::into_inner);
        let grid = self.prepare_grid(grid)?;
        let network = self.read_state().network.clone();
        match network {
            Some(network) => self.publish(network, grid),
            None => {
                log::info!("{}: chunk data loaded ({} chunks), waiting for network", self.region(), grid.len());
                self.write_state().grid = Some(grid);
            }
        }
        Ok(())
    }

    /// The current snapshot.
    ///
    /// Fails with [`RoutingError::GraphUnavailable`] or
    /// [`RoutingError::ChunkDataUnavailable`] until both have been loaded.
    pub fn snapshot(&self) -> RoutingResult<Arc<RoutingSnapshot>> {
        let state = self.read_state();
        match (&state.snapshot, &state.network) {
            (Some(snapshot), _) => Ok(Arc::clone(snapshot)),
            (None, None) => Err(RoutingError::GraphUnavailable),
            (None, Some(_)) => Err(RoutingError::ChunkDataUnavailable),
        }
    }

    // ── Routing ───────────────────────────────────────────────────────────

    /// Route `request` on the current snapshot.
    pub fn route(&self, request: &RouteRequest) -> RoutingResult<RouteResult> {
        request.validate()?;
        self.snapshot()?.route(&self.router, request)
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn prepare_grid(&self, grid: ChunkGrid) -> RoutingResult<Arc<ChunkGrid>> {
        if grid.bbox() != self.config.bbox {
            log::warn!(
                "{}: chunk grid covers {} but the region is {}",
                self.region(),
                grid.bbox(),
                self.config.bbox
            );
        }
        Ok(Arc::new(grid.with_default_hazard(self.config.default_hazard)?))
    }

    /// Compute weights outside the lock, then swap everything in at once.
    fn publish(&self, network: Arc<RoadNetwork>, grid: Arc<ChunkGrid>) {
        let snapshot = Arc::new(RoutingSnapshot::new(Arc::clone(&network), Arc::clone(&grid), &self.config));
        log::info!(
            "{}: published snapshot ({} nodes, {} edges, {} chunks)",
            self.region(),
            network.node_count(),
            network.edge_count(),
            grid.len()
        );
        let mut state = self.write_state();
        state.network = Some(network);
        state.grid = Some(grid);
        state.snapshot = Some(snapshot);
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
