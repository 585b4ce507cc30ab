//! Synthetic Bologna road network.
//!
//! A jittered street lattice over the city box, two-way everywhere, plus a
//! curved ring road with explicit geometry and a one-way parallel lane on
//! the busiest avenue.  Lengths are haversine distances in metres.

use hr_core::{GeoPoint, NodeId};
use hr_spatial::{RoadNetwork, RoadNetworkBuilder, SpatialResult};

const ROWS: usize = 17;
const COLS: usize = 35;
const SOUTH: f64 = 44.462;
const WEST: f64 = 11.252;
const SPACING: f64 = 0.0045;

/// Named places used as trip endpoints.
pub struct Landmarks {
    pub piazza_maggiore: GeoPoint,
    pub stazione_centrale: GeoPoint,
    pub sant_orsola: GeoPoint,
    pub aeroporto: GeoPoint,
    pub san_luca: GeoPoint,
}

pub const LANDMARKS: Landmarks = Landmarks {
    piazza_maggiore:   GeoPoint { lat: 44.4938, lon: 11.3430 },
    stazione_centrale: GeoPoint { lat: 44.5058, lon: 11.3426 },
    sant_orsola:       GeoPoint { lat: 44.4928, lon: 11.3600 },
    aeroporto:         GeoPoint { lat: 44.5354, lon: 11.2887 },
    san_luca:          GeoPoint { lat: 44.4795, lon: 11.2985 },
};

pub fn build_network() -> SpatialResult<RoadNetwork> {
    let mut b = RoadNetworkBuilder::with_capacity(ROWS * COLS, 4 * ROWS * COLS + 64);

    // Deterministic jitter so streets are not perfectly straight.
    let jitter = |r: usize, c: usize| ((r * 31 + c * 17) % 7) as f64 * 0.000_15;

    let mut grid = vec![NodeId::INVALID; ROWS * COLS];
    for r in 0..ROWS {
        for c in 0..COLS {
            let pos = GeoPoint::new(SOUTH + r as f64 * SPACING + jitter(r, c), WEST + c as f64 * SPACING);
            grid[r * COLS + c] = b.add_node(pos);
        }
    }
    let at = |r: usize, c: usize| grid[r * COLS + c];

    for r in 0..ROWS {
        for c in 0..COLS {
            if c + 1 < COLS {
                road(&mut b, at(r, c), at(r, c + 1));
            }
            if r + 1 < ROWS {
                road(&mut b, at(r, c), at(r + 1, c));
            }
        }
    }

    // Ring road: long curved links around the centre.
    let ring = [(4, 10), (4, 24), (12, 24), (12, 10)];
    for i in 0..ring.len() {
        let (r0, c0) = ring[i];
        let (r1, c1) = ring[(i + 1) % ring.len()];
        let (from, to) = (at(r0, c0), at(r1, c1));
        let (p, q) = (b.node_pos(from), b.node_pos(to));
        let bulge = GeoPoint::new((p.lat + q.lat) / 2.0 + 0.002, (p.lon + q.lon) / 2.0 + 0.002);
        let geometry = vec![p, bulge, q];
        let length = p.distance_m(bulge) + bulge.distance_m(q);
        let reversed: Vec<GeoPoint> = geometry.iter().rev().copied().collect();
        b.add_edge(from, to, None, Some(length), Some(geometry));
        b.add_edge(to, from, None, Some(length), Some(reversed));
    }

    // One-way fast lane alongside the central avenue.
    for c in 10..24 {
        let (from, to) = (at(8, c), at(8, c + 1));
        let length = b.node_pos(from).distance_m(b.node_pos(to)) * 0.9;
        b.add_edge(from, to, None, Some(length), None);
    }

    b.build()
}

fn road(b: &mut RoadNetworkBuilder, from: NodeId, to: NodeId) {
    let length = b.node_pos(from).distance_m(b.node_pos(to));
    b.add_road(from, to, length);
}
