//! Road network representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing edges.
//! Given a `NodeId n`, its outgoing edges occupy the slice:
//!
//! ```text
//! edge_to[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! All edge arrays are sorted by source node (stable, so parallel edges keep
//! their insertion order) and indexed by `EdgeId`.  The iteration order of
//! [`RoadNetwork::edges`] and of a node's outgoing edges is therefore fixed
//! for the lifetime of the network.
//!
//! The network holds topology only.  Routing weights are kept outside it in a
//! side array indexed by `EdgeId`, so one `RoadNetwork` can be shared
//! read-only between any number of concurrent requests.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) over an equirectangular projection of the nodes:
//! `[lat, lon · cos(lat_ref)]`, with `lat_ref` the mean node latitude.  The
//! tree only orders candidates; [`RoadNetwork::nearest_node`] ranks them by
//! haversine distance.

use rstar::{AABB, PointDistance, RTree, RTreeObject};
use rustc_hash::{FxHashMap, FxHashSet};

use hr_core::{EdgeId, GeoPoint, NodeId};

use crate::{SpatialError, SpatialResult};

// ── R-tree node entry ─────────────────────────────────────────────────────────

/// Degrees of arc to metres on the mean Earth sphere.
const METRES_PER_DEGREE: f64 = 6_371_000.0 * std::f64::consts::PI / 180.0;

/// Relative error allowed between the projected distance and the haversine
/// distance before the nearest-node search stops looking.
const SNAP_SLACK: f64 = 0.05;

/// Entry stored in the R-tree spatial index: a projected 2-D point with the
/// associated `NodeId`.
#[derive(Clone)]
struct NodeEntry {
    point: [f64; 2], // [lat, lon · lon_scale]
    id: NodeId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared Euclidean distance in projected degrees.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

// ── EdgeRef ───────────────────────────────────────────────────────────────────

/// Borrowed view of one directed edge and its attributes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EdgeRef<'a> {
    pub id:       EdgeId,
    pub source:   NodeId,
    pub target:   NodeId,
    /// Disambiguates parallel edges between the same ordered node pair.
    pub key:      u32,
    /// Physical length in metres, if the source data carried one.
    pub length_m: Option<f64>,
    /// Explicit path geometry, if any.  `None` means the straight line
    /// between the endpoints.
    pub geometry: Option<&'a [GeoPoint]>,
}

// ── RoadNetwork ───────────────────────────────────────────────────────────────

/// Directed road multigraph in CSR format plus a spatial index for node
/// snapping.
///
/// Fields are `pub` for direct indexed access on hot paths.  Do not construct
/// directly; use [`RoadNetworkBuilder`].
pub struct RoadNetwork {
    // ── Node data ─────────────────────────────────────────────────────────
    /// Geographic position of each node.  Indexed by `NodeId`.
    pub node_pos: Vec<GeoPoint>,

    /// Identifier of each node in the source data (e.g. an OSM id).
    pub node_external_id: Vec<i64>,

    // ── CSR edge adjacency ────────────────────────────────────────────────
    /// CSR row pointer.  Length = `node_count + 1`.
    pub node_out_start: Vec<u32>,

    // ── Edge data (indexed by EdgeId = position in sorted order) ──────────
    pub edge_from: Vec<NodeId>,
    pub edge_to: Vec<NodeId>,
    pub edge_key: Vec<u32>,
    pub edge_length_m: Vec<Option<f64>>,
    pub edge_geometry: Vec<Option<Box<[GeoPoint]>>>,

    // ── Lookup structures ─────────────────────────────────────────────────
    external_index: FxHashMap<i64, NodeId>,
    spatial_idx: RTree<NodeEntry>,
    /// `cos(lat_ref)`: shrinks longitude to the same scale as latitude.
    lon_scale: f64,
}

impl RoadNetwork {
    /// Construct an empty network with no nodes or edges.
    ///
    /// Any nearest-node request against it fails with
    /// [`SpatialError::EmptyNetwork`].
    pub fn empty() -> Self {
        RoadNetworkBuilder::new().assemble()
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn node_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    // ── Node access ───────────────────────────────────────────────────────

    /// Position of `node`, or `None` if the id is out of range.
    pub fn node_position(&self, node: NodeId) -> Option<GeoPoint> {
        self.node_pos.get(node.index()).copied()
    }

    /// Resolve a source-data identifier to its `NodeId`.
    pub fn find_external(&self, external_id: i64) -> Option<NodeId> {
        self.external_index.get(&external_id).copied()
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Iterator over the `EdgeId`s of all outgoing edges from `node`.
    #[inline]
    pub fn out_edges(&self, node: NodeId) -> impl Iterator<Item = EdgeId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| EdgeId(i as u32))
    }

    #[inline]
    pub fn out_degree(&self, node: NodeId) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    /// Borrowed view of a single edge.
    pub fn edge(&self, id: EdgeId) -> EdgeRef<'_> {
        let i = id.index();
        EdgeRef {
            id,
            source:   self.edge_from[i],
            target:   self.edge_to[i],
            key:      self.edge_key[i],
            length_m: self.edge_length_m[i],
            geometry: self.edge_geometry[i].as_deref(),
        }
    }

    /// All edges in `EdgeId` order.
    ///
    /// Lazy; call again to restart.  The order is stable for the lifetime of
    /// the network, which keeps weight assignment reproducible.
    pub fn edges(&self) -> impl Iterator<Item = EdgeRef<'_>> + Clone + '_ {
        (0..self.edge_count()).map(|i| self.edge(EdgeId(i as u32)))
    }

    /// Among the (possibly parallel) edges `from → to`, the one with the
    /// lowest weight in `weights`; ties go to the lowest `EdgeId`.
    ///
    /// `weights` is indexed by `EdgeId`.  Edges without an entry count as
    /// infinitely expensive.
    pub fn edge_between(&self, from: NodeId, to: NodeId, weights: &[f64]) -> SpatialResult<EdgeId> {
        if from.index() >= self.node_count() {
            return Err(SpatialError::NodeNotFound(from));
        }
        let mut best: Option<(EdgeId, f64)> = None;
        for e in self.out_edges(from) {
            if self.edge_to[e.index()] != to {
                continue;
            }
            let w = weights.get(e.index()).copied().unwrap_or(f64::INFINITY);
            match best {
                Some((_, best_w)) if w >= best_w => {}
                _ => best = Some((e, w)),
            }
        }
        best.map(|(e, _)| e).ok_or(SpatialError::NoEdge { from, to })
    }

    /// Coordinates of the edge's path: the explicit geometry when present,
    /// otherwise the two endpoint positions.
    pub fn edge_coords(&self, id: EdgeId) -> Vec<GeoPoint> {
        match &self.edge_geometry[id.index()] {
            Some(geometry) => geometry.to_vec(),
            None => vec![
                self.node_pos[self.edge_from[id.index()].index()],
                self.node_pos[self.edge_to[id.index()].index()],
            ],
        }
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Return the `NodeId` of the road node geographically nearest to `pos`.
    ///
    /// Candidates come out of the R-tree in projected order and are ranked
    /// by [`GeoPoint::distance_m`]; the walk stops once the projected
    /// distance is clearly past the best haversine distance.  When several
    /// nodes are equally near the lowest `NodeId` wins.
    pub fn nearest_node(&self, pos: GeoPoint) -> SpatialResult<NodeId> {
        let mut best: Option<(f64, NodeId)> = None;
        for (entry, d2) in self.spatial_idx.nearest_neighbor_iter_with_distance_2(&self.project(pos)) {
            if let Some((best_m, _)) = best
                && d2.sqrt() * METRES_PER_DEGREE > best_m * (1.0 + SNAP_SLACK)
            {
                break;
            }
            let d = pos.distance_m(self.node_pos[entry.id.index()]);
            best = match best {
                Some((best_m, best_id)) if best_m < d || (best_m == d && best_id < entry.id) => {
                    Some((best_m, best_id))
                }
                _ => Some((d, entry.id)),
            };
        }
        best.map(|(_, id)| id).ok_or(SpatialError::EmptyNetwork)
    }

    /// Return up to `k` nodes near `pos`, in ascending projected distance.
    pub fn k_nearest_nodes(&self, pos: GeoPoint, k: usize) -> Vec<NodeId> {
        self.spatial_idx
            .nearest_neighbor_iter(&self.project(pos))
            .take(k)
            .map(|e| e.id)
            .collect()
    }

    #[inline]
    fn project(&self, pos: GeoPoint) -> [f64; 2] {
        [pos.lat, pos.lon * self.lon_scale]
    }
}

// ── RoadNetworkBuilder ────────────────────────────────────────────────────────

/// Construct a [`RoadNetwork`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use hr_core::GeoPoint;
/// use hr_spatial::RoadNetworkBuilder;
///
/// let mut b = RoadNetworkBuilder::new();
/// let a = b.add_node(GeoPoint::new(44.494, 11.342));
/// let c = b.add_node(GeoPoint::new(44.500, 11.350));
/// b.add_road(a, c, 1_200.0);
/// let net = b.build().unwrap();
/// assert_eq!(net.node_count(), 2);
/// assert_eq!(net.edge_count(), 2); // bidirectional
/// ```
pub struct RoadNetworkBuilder {
    nodes:        Vec<GeoPoint>,
    external_ids: Vec<i64>,
    raw_edges:    Vec<RawEdge>,
    next_key:     FxHashMap<(NodeId, NodeId), u32>,
}

struct RawEdge {
    from:     NodeId,
    to:       NodeId,
    key:      u32,
    length_m: Option<f64>,
    geometry: Option<Box<[GeoPoint]>>,
}

impl RoadNetworkBuilder {
    pub fn new() -> Self {
        Self {
            nodes:        Vec::new(),
            external_ids: Vec::new(),
            raw_edges:    Vec::new(),
            next_key:     FxHashMap::default(),
        }
    }

    /// Pre-allocate for the expected number of nodes and edges.
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            nodes:        Vec::with_capacity(nodes),
            external_ids: Vec::with_capacity(nodes),
            raw_edges:    Vec::with_capacity(edges),
            next_key:     FxHashMap::default(),
        }
    }

    /// Add a road node and return its `NodeId` (sequential from 0).  The
    /// external id defaults to the `NodeId` itself.
    pub fn add_node(&mut self, pos: GeoPoint) -> NodeId {
        let external_id = self.nodes.len() as i64;
        self.add_node_with_id(external_id, pos)
    }

    /// Add a road node carrying a source-data identifier.
    pub fn add_node_with_id(&mut self, external_id: i64, pos: GeoPoint) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(pos);
        self.external_ids.push(external_id);
        id
    }

    /// Add a fully specified **directed** edge.
    ///
    /// `key` of `None` takes the next free key for the `(from, to)` pair,
    /// starting at 0.  An explicit key already used for the pair is rejected
    /// by [`build`](Self::build).
    pub fn add_edge(
        &mut self,
        from:     NodeId,
        to:       NodeId,
        key:      Option<u32>,
        length_m: Option<f64>,
        geometry: Option<Vec<GeoPoint>>,
    ) -> u32 {
        let next = self.next_key.entry((from, to)).or_insert(0);
        let key = match key {
            Some(k) => k,
            None => *next,
        };
        *next = (*next).max(key.saturating_add(1));

        self.raw_edges.push(RawEdge {
            from,
            to,
            key,
            length_m,
            geometry: geometry.map(Vec::into_boxed_slice),
        });
        key
    }

    /// Add a **directed** edge with a length and no explicit geometry.
    pub fn add_directed_edge(&mut self, from: NodeId, to: NodeId, length_m: f64) -> u32 {
        self.add_edge(from, to, None, Some(length_m), None)
    }

    /// Add edges in **both directions** for an undirected road segment.
    pub fn add_road(&mut self, a: NodeId, b: NodeId, length_m: f64) {
        self.add_directed_edge(a, b, length_m);
        self.add_directed_edge(b, a, length_m);
    }

    /// Look up the position of a node added earlier.
    pub fn node_pos(&self, id: NodeId) -> GeoPoint {
        self.nodes[id.index()]
    }

    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.raw_edges.len() }

    /// Validate and consume the builder, producing a [`RoadNetwork`].
    ///
    /// Fails if an edge references an unknown node, carries a negative or
    /// non-finite length, or repeats the key of another edge between the
    /// same ordered node pair.
    ///
    /// Time complexity: O(E log E) for the edge sort + O(N log N) for the
    /// R-tree bulk load.
    pub fn build(self) -> SpatialResult<RoadNetwork> {
        let node_count = self.nodes.len();
        let mut seen: FxHashSet<(NodeId, NodeId, u32)> = FxHashSet::default();
        for e in &self.raw_edges {
            for endpoint in [e.from, e.to] {
                if endpoint.index() >= node_count {
                    return Err(SpatialError::NodeNotFound(endpoint));
                }
            }
            if let Some(length_m) = e.length_m
                && !(length_m.is_finite() && length_m >= 0.0)
            {
                return Err(SpatialError::InvalidLength { from: e.from, to: e.to, length_m });
            }
            if !seen.insert((e.from, e.to, e.key)) {
                return Err(SpatialError::DuplicateKey { from: e.from, to: e.to, key: e.key });
            }
        }
        Ok(self.assemble())
    }

    fn assemble(self) -> RoadNetwork {
        let node_count = self.nodes.len();
        let edge_count = self.raw_edges.len();

        // Stable sort keeps parallel edges in insertion order.
        let mut raw = self.raw_edges;
        raw.sort_by_key(|e| e.from.0);

        let edge_from:     Vec<NodeId>      = raw.iter().map(|e| e.from).collect();
        let edge_to:       Vec<NodeId>      = raw.iter().map(|e| e.to).collect();
        let edge_key:      Vec<u32>         = raw.iter().map(|e| e.key).collect();
        let edge_length_m: Vec<Option<f64>> = raw.iter().map(|e| e.length_m).collect();
        let edge_geometry: Vec<Option<Box<[GeoPoint]>>> =
            raw.into_iter().map(|e| e.geometry).collect();

        let mut node_out_start = vec![0u32; node_count + 1];
        for from in &edge_from {
            node_out_start[from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, edge_count);

        let external_index: FxHashMap<i64, NodeId> = self
            .external_ids
            .iter()
            .enumerate()
            .map(|(i, &ext)| (ext, NodeId(i as u32)))
            .collect();

        let lat_ref = if node_count == 0 {
            0.0
        } else {
            self.nodes.iter().map(|p| p.lat).sum::<f64>() / node_count as f64
        };
        let lon_scale = lat_ref.to_radians().cos();

        let entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, &pos)| NodeEntry {
                point: [pos.lat, pos.lon * lon_scale],
                id: NodeId(i as u32),
            })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        RoadNetwork {
            node_pos: self.nodes,
            node_external_id: self.external_ids,
            node_out_start,
            edge_from,
            edge_to,
            edge_key,
            edge_length_m,
            edge_geometry,
            external_index,
            spatial_idx,
            lon_scale,
        }
    }
}

impl Default for RoadNetworkBuilder {
    fn default() -> Self {
        Self::new()
    }
}
