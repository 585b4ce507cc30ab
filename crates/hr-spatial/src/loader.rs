//! CSV road network loader.
//!
//! The road graph for a city is produced by an external collaborator and
//! handed over as two CSV files.
//!
//! # Node file
//!
//! ```csv
//! id,lat,lon
//! 240118,44.4949,11.3426
//! 240119,44.4953,11.3431
//! ```
//!
//! # Edge file
//!
//! ```csv
//! source,target,key,length,geometry
//! 240118,240119,0,61.2,
//! 240119,240118,,61.2,44.4953 11.3431;44.4951 11.3428;44.4949 11.3426
//! ```
//!
//! `key`, `length` and `geometry` may be empty.  A missing key takes the next
//! free key for the pair; a missing length is kept as `None` (weighted as a
//! unit edge); `geometry` is a `;`-separated list of `lat lon` pairs.
//!
//! Nodes are inserted in ascending `id` order, so the lowest-`NodeId`
//! tie-break of [`RoadNetwork::nearest_node`] is also the lowest source id.

use std::io::Read;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::Deserialize;

use hr_core::{GeoPoint, NodeId};

use crate::network::{RoadNetwork, RoadNetworkBuilder};
use crate::{SpatialError, SpatialResult};

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct NodeRecord {
    id:  i64,
    lat: f64,
    lon: f64,
}

#[derive(Deserialize)]
struct EdgeRecord {
    source:   i64,
    target:   i64,
    key:      Option<u32>,
    length:   Option<f64>,
    geometry: Option<String>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a road network from a node CSV file and an edge CSV file.
pub fn load_network_csv(nodes: &Path, edges: &Path) -> SpatialResult<RoadNetwork> {
    let node_file = std::fs::File::open(nodes)?;
    let edge_file = std::fs::File::open(edges)?;
    load_network_reader(node_file, edge_file)
}

/// Like [`load_network_csv`] but accepts any `Read` sources.
pub fn load_network_reader<N: Read, E: Read>(nodes: N, edges: E) -> SpatialResult<RoadNetwork> {
    // ── Nodes ─────────────────────────────────────────────────────────────
    let mut node_rows: Vec<NodeRecord> = Vec::new();
    for result in csv::Reader::from_reader(nodes).deserialize::<NodeRecord>() {
        node_rows.push(result.map_err(|e| SpatialError::Parse(e.to_string()))?);
    }
    node_rows.sort_by_key(|n| n.id);

    let mut builder = RoadNetworkBuilder::with_capacity(node_rows.len(), node_rows.len() * 2);
    let mut by_external: FxHashMap<i64, NodeId> =
        FxHashMap::with_capacity_and_hasher(node_rows.len(), Default::default());

    for row in &node_rows {
        let pos = GeoPoint::validated(row.lat, row.lon)?;
        if by_external.contains_key(&row.id) {
            return Err(SpatialError::Parse(format!("duplicate node id {}", row.id)));
        }
        by_external.insert(row.id, builder.add_node_with_id(row.id, pos));
    }

    // ── Edges ─────────────────────────────────────────────────────────────
    for result in csv::Reader::from_reader(edges).deserialize::<EdgeRecord>() {
        let row = result.map_err(|e| SpatialError::Parse(e.to_string()))?;
        let resolve = |id: i64| {
            by_external
                .get(&id)
                .copied()
                .ok_or_else(|| SpatialError::Parse(format!("edge references unknown node {id}")))
        };
        let from = resolve(row.source)?;
        let to = resolve(row.target)?;
        let geometry = match row.geometry.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(s) => Some(parse_geometry(s)?),
        };
        builder.add_edge(from, to, row.key, row.length, geometry);
    }

    let network = builder.build()?;
    log::info!(
        "loaded road network: {} nodes, {} edges",
        network.node_count(),
        network.edge_count()
    );
    Ok(network)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn parse_geometry(s: &str) -> SpatialResult<Vec<GeoPoint>> {
    s.split(';')
        .map(|pair| {
            let mut parts = pair.split_whitespace();
            let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err(SpatialError::Parse(format!(
                    "invalid geometry point {pair:?}: expected \"lat lon\""
                )));
            };
            let parse = |v: &str| {
                v.parse::<f64>()
                    .map_err(|_| SpatialError::Parse(format!("invalid coordinate {v:?}")))
            };
            Ok(GeoPoint::validated(parse(lat)?, parse(lon)?)?)
        })
        .collect()
}
