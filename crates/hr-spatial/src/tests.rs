//! Unit tests for hr-spatial.
//!
//! All tests use hand-crafted networks so they run without external data.

#[cfg(test)]
mod helpers {
    use hr_core::{GeoPoint, NodeId};
    use crate::{RoadNetwork, RoadNetworkBuilder};

    /// Small grid network.
    ///
    /// Nodes (lat, lon):
    ///   0:(0,0)  1:(0,1)  2:(0,2)
    ///   3:(1,0)           4:(1,2)
    ///
    /// Undirected roads: 0-1, 1-2, 0-3, 2-4, 3-4
    pub fn grid_network() -> (RoadNetwork, [NodeId; 5]) {
        let mut b = RoadNetworkBuilder::new();

        let n0 = b.add_node(GeoPoint::new(0.0, 0.0));
        let n1 = b.add_node(GeoPoint::new(0.0, 1.0));
        let n2 = b.add_node(GeoPoint::new(0.0, 2.0));
        let n3 = b.add_node(GeoPoint::new(1.0, 0.0));
        let n4 = b.add_node(GeoPoint::new(1.0, 2.0));

        b.add_road(n0, n1, 100.0);
        b.add_road(n1, n2, 100.0);
        b.add_road(n2, n4, 100.0);
        b.add_road(n0, n3, 500.0);
        b.add_road(n3, n4, 100.0);

        (b.build().unwrap(), [n0, n1, n2, n3, n4])
    }
}

// ── Builder & network structure ────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use hr_core::{GeoPoint, NodeId};
    use crate::{RoadNetworkBuilder, SpatialError};

    #[test]
    fn empty_build() {
        let net = RoadNetworkBuilder::new().build().unwrap();
        assert_eq!(net.node_count(), 0);
        assert_eq!(net.edge_count(), 0);
        assert!(net.is_empty());
    }

    #[test]
    fn single_road() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(GeoPoint::new(44.49, 11.34));
        let c = b.add_node(GeoPoint::new(44.50, 11.34));
        b.add_road(a, c, 1_000.0);
        let net = b.build().unwrap();
        assert_eq!(net.node_count(), 2);
        assert_eq!(net.edge_count(), 2);
    }

    #[test]
    fn csr_out_degrees() {
        let (net, [n0, n1, n2, n3, n4]) = super::helpers::grid_network();
        assert_eq!(net.out_degree(n0), 2);
        assert_eq!(net.out_degree(n1), 2);
        assert_eq!(net.out_degree(n2), 2);
        assert_eq!(net.out_degree(n3), 2);
        assert_eq!(net.out_degree(n4), 2);
        for e in net.out_edges(n0) {
            assert_eq!(net.edge_from[e.index()], n0);
        }
    }

    #[test]
    fn parallel_edges_get_sequential_keys() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(GeoPoint::new(0.0, 0.0));
        let c = b.add_node(GeoPoint::new(0.0, 1.0));
        assert_eq!(b.add_directed_edge(a, c, 10.0), 0);
        assert_eq!(b.add_directed_edge(a, c, 12.0), 1);
        assert_eq!(b.add_edge(a, c, Some(7), Some(9.0), None), 7);
        assert_eq!(b.add_directed_edge(a, c, 11.0), 8);
        // Keys are per ordered pair.
        assert_eq!(b.add_directed_edge(c, a, 10.0), 0);
        let net = b.build().unwrap();
        let keys: Vec<u32> = net.out_edges(a).map(|e| net.edge_key[e.index()]).collect();
        assert_eq!(keys, vec![0, 1, 7, 8]);
    }

    #[test]
    fn rejects_negative_length() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(GeoPoint::new(0.0, 0.0));
        let c = b.add_node(GeoPoint::new(0.0, 1.0));
        b.add_directed_edge(a, c, -1.0);
        assert!(matches!(b.build(), Err(SpatialError::InvalidLength { .. })));
    }

    #[test]
    fn rejects_reused_key() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(GeoPoint::new(0.0, 0.0));
        let c = b.add_node(GeoPoint::new(0.0, 1.0));
        b.add_directed_edge(a, c, 10.0);
        b.add_edge(a, c, Some(0), Some(12.0), None);
        assert!(matches!(
            b.build(),
            Err(SpatialError::DuplicateKey { key: 0, .. })
        ));

        // The same key in the opposite direction is a different pair.
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(GeoPoint::new(0.0, 0.0));
        let c = b.add_node(GeoPoint::new(0.0, 1.0));
        b.add_edge(a, c, Some(3), Some(10.0), None);
        b.add_edge(c, a, Some(3), Some(10.0), None);
        assert_eq!(b.build().unwrap().edge_count(), 2);
    }

    #[test]
    fn rejects_unknown_endpoint() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(GeoPoint::new(0.0, 0.0));
        b.add_directed_edge(a, NodeId(5), 1.0);
        assert!(matches!(b.build(), Err(SpatialError::NodeNotFound(NodeId(5)))));
    }

    #[test]
    fn external_ids_resolve() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node_with_id(9_001, GeoPoint::new(0.0, 0.0));
        let c = b.add_node_with_id(42, GeoPoint::new(0.0, 1.0));
        let net = b.build().unwrap();
        assert_eq!(net.find_external(9_001), Some(a));
        assert_eq!(net.find_external(42), Some(c));
        assert_eq!(net.find_external(7), None);
    }
}

// ── Edge iteration & selection ────────────────────────────────────────────────

#[cfg(test)]
mod edges {
    use hr_core::{EdgeId, GeoPoint};
    use crate::{RoadNetworkBuilder, SpatialError};

    #[test]
    fn edges_iteration_is_restartable_and_stable() {
        let (net, _) = super::helpers::grid_network();
        let first: Vec<EdgeId> = net.edges().map(|e| e.id).collect();
        let second: Vec<EdgeId> = net.edges().map(|e| e.id).collect();
        assert_eq!(first.len(), net.edge_count());
        assert_eq!(first, second);

        let iter = net.edges();
        assert_eq!(iter.clone().count(), iter.count());
    }

    #[test]
    fn edges_sorted_by_source() {
        let (net, _) = super::helpers::grid_network();
        let sources: Vec<u32> = net.edges().map(|e| e.source.0).collect();
        let mut sorted = sources.clone();
        sorted.sort();
        assert_eq!(sources, sorted);
    }

    #[test]
    fn edge_between_picks_minimum_weight() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(GeoPoint::new(0.0, 0.0));
        let c = b.add_node(GeoPoint::new(0.0, 1.0));
        b.add_directed_edge(a, c, 10.0);
        b.add_directed_edge(a, c, 5.0);
        b.add_directed_edge(a, c, 5.0);
        let net = b.build().unwrap();

        let ids: Vec<EdgeId> = net.out_edges(a).collect();
        let weights = [10.0, 5.0, 5.0];
        // Tie between the two 5.0 edges goes to the lower EdgeId.
        assert_eq!(net.edge_between(a, c, &weights).unwrap(), ids[1]);

        let weights = [1.0, 5.0, 5.0];
        assert_eq!(net.edge_between(a, c, &weights).unwrap(), ids[0]);
    }

    #[test]
    fn edge_between_missing_edge() {
        let (net, [n0, _, _, _, n4]) = super::helpers::grid_network();
        let weights = vec![1.0; net.edge_count()];
        assert!(matches!(
            net.edge_between(n0, n4, &weights),
            Err(SpatialError::NoEdge { .. })
        ));
    }

    #[test]
    fn edge_coords_default_to_straight_line() {
        let mut b = RoadNetworkBuilder::new();
        let a = b.add_node(GeoPoint::new(0.0, 0.0));
        let c = b.add_node(GeoPoint::new(0.0, 1.0));
        let bend = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.1, 0.5),
            GeoPoint::new(0.0, 1.0),
        ];
        b.add_directed_edge(a, c, 10.0);
        b.add_edge(c, a, None, Some(12.0), Some(bend.clone()));
        let net = b.build().unwrap();

        let straight = net.out_edges(a).next().unwrap();
        assert_eq!(net.edge_coords(straight), vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0)]);
        assert!(net.edge(straight).geometry.is_none());

        let curved = net.out_edges(c).next().unwrap();
        assert_eq!(net.edge_coords(curved), bend);
        assert_eq!(net.edge(curved).geometry.map(<[GeoPoint]>::len), Some(3));
    }
}

// ── Spatial snap ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod snap {
    use hr_core::{GeoPoint, NodeId};
    use crate::{RoadNetwork, RoadNetworkBuilder, SpatialError};

    #[test]
    fn snap_exact_position() {
        let (net, [n0, ..]) = super::helpers::grid_network();
        assert_eq!(net.nearest_node(GeoPoint::new(0.0, 0.0)).unwrap(), n0);
    }

    #[test]
    fn snap_nearest() {
        let (net, [n0, n1, ..]) = super::helpers::grid_network();
        assert_eq!(net.nearest_node(GeoPoint::new(0.0, 0.4)).unwrap(), n0);
        assert_eq!(net.nearest_node(GeoPoint::new(0.0, 0.6)).unwrap(), n1);
    }

    #[test]
    fn equidistant_nodes_resolve_to_lowest_id() {
        // (0.5, 0.0) is exactly between n0 (0,0) and n3 (1,0).
        let (net, [n0, ..]) = super::helpers::grid_network();
        assert_eq!(net.nearest_node(GeoPoint::new(0.5, 0.0)).unwrap(), n0);

        // Same test with ids inserted in the opposite spatial order.
        let mut b = RoadNetworkBuilder::new();
        let north = b.add_node(GeoPoint::new(1.0, 0.0));
        let _south = b.add_node(GeoPoint::new(0.0, 0.0));
        let net = b.build().unwrap();
        assert_eq!(net.nearest_node(GeoPoint::new(0.5, 0.0)).unwrap(), north);
        assert_eq!(north, NodeId(0));
    }

    #[test]
    fn snap_uses_ground_distance() {
        // At 44.5° N a degree of longitude is ~0.71 of a degree of latitude:
        // +0.001° lat is ~111 m away, +0.0012° lon only ~95 m.
        let query = GeoPoint::new(44.5, 11.3);
        let mut b = RoadNetworkBuilder::new();
        let north = b.add_node(GeoPoint::new(44.501, 11.3));
        let east = b.add_node(GeoPoint::new(44.5, 11.3012));
        let net = b.build().unwrap();

        assert!(query.distance_m(net.node_pos[east.index()]) < query.distance_m(net.node_pos[north.index()]));
        assert_eq!(net.nearest_node(query).unwrap(), east);
    }

    #[test]
    fn snap_matches_brute_force() {
        use rand::rngs::SmallRng;
        use rand::{Rng, SeedableRng};

        let mut rng = SmallRng::seed_from_u64(11);
        let mut b = RoadNetworkBuilder::new();
        for _ in 0..400 {
            b.add_node(GeoPoint::new(rng.gen_range(44.46..44.54), rng.gen_range(11.25..11.42)));
        }
        let net = b.build().unwrap();

        for _ in 0..500 {
            let q = GeoPoint::new(rng.gen_range(44.44..44.56), rng.gen_range(11.23..11.44));
            let expected = (0..net.node_count())
                .map(|i| (q.distance_m(net.node_pos[i]), NodeId(i as u32)))
                .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
                .map(|(_, id)| id)
                .unwrap();
            assert_eq!(net.nearest_node(q).unwrap(), expected, "query {q}");
        }
    }

    #[test]
    fn empty_network_has_no_nearest_node() {
        let net = RoadNetwork::empty();
        assert!(matches!(
            net.nearest_node(GeoPoint::new(0.0, 0.0)),
            Err(SpatialError::EmptyNetwork)
        ));
    }

    #[test]
    fn k_nearest_order() {
        let (net, nodes) = super::helpers::grid_network();
        let nearest = net.k_nearest_nodes(GeoPoint::new(0.0, 0.0), 2);
        assert_eq!(nearest[0], nodes[0]);
        assert!(nearest[1] == nodes[1] || nearest[1] == nodes[3]);
    }
}

// ── CSV loader ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod loader {
    use std::io::{Cursor, Write};

    use hr_core::GeoPoint;
    use crate::{SpatialError, load_network_csv, load_network_reader};

    const NODES: &str = "\
id,lat,lon\n\
30,44.4960,11.3440\n\
10,44.4949,11.3426\n\
20,44.4953,11.3431\n\
";

    const EDGES: &str = "\
source,target,key,length,geometry\n\
10,20,0,61.2,\n\
20,10,,61.2,44.4953 11.3431;44.4951 11.3428;44.4949 11.3426\n\
20,30,,,\n\
";

    #[test]
    fn nodes_ordered_by_external_id() {
        let net = load_network_reader(Cursor::new(NODES), Cursor::new(EDGES)).unwrap();
        assert_eq!(net.node_count(), 3);
        assert_eq!(net.node_external_id, vec![10, 20, 30]);
        assert_eq!(net.node_pos[0], GeoPoint::new(44.4949, 11.3426));
    }

    #[test]
    fn edge_attributes_parsed() {
        let net = load_network_reader(Cursor::new(NODES), Cursor::new(EDGES)).unwrap();
        assert_eq!(net.edge_count(), 3);

        let n10 = net.find_external(10).unwrap();
        let n20 = net.find_external(20).unwrap();
        let n30 = net.find_external(30).unwrap();

        let e = net.out_edges(n10).next().unwrap();
        assert_eq!(net.edge(e).length_m, Some(61.2));
        assert!(net.edge(e).geometry.is_none());

        let back: Vec<_> = net.out_edges(n20).map(|e| net.edge(e)).collect();
        assert_eq!(back[0].target, n10);
        assert_eq!(back[0].geometry.map(<[GeoPoint]>::len), Some(3));
        assert_eq!(back[1].target, n30);
        assert_eq!(back[1].length_m, None);
        assert_eq!(back[1].key, 0);
    }

    #[test]
    fn unknown_node_is_parse_error() {
        let edges = "source,target,key,length,geometry\n10,99,,1.0,\n";
        let result = load_network_reader(Cursor::new(NODES), Cursor::new(edges));
        assert!(matches!(result, Err(SpatialError::Parse(_))));
    }

    #[test]
    fn invalid_coordinate_rejected() {
        let nodes = "id,lat,lon\n1,95.0,11.0\n";
        let edges = "source,target,key,length,geometry\n";
        let result = load_network_reader(Cursor::new(nodes), Cursor::new(edges));
        assert!(matches!(result, Err(SpatialError::InvalidCoordinate(_))));
    }

    #[test]
    fn malformed_geometry_rejected() {
        let edges = "source,target,key,length,geometry\n10,20,,1.0,44.49\n";
        let result = load_network_reader(Cursor::new(NODES), Cursor::new(edges));
        assert!(matches!(result, Err(SpatialError::Parse(_))));
    }

    #[test]
    fn duplicate_edge_key_rejected() {
        let edges = "source,target,key,length,geometry\n10,20,0,61.2,\n10,20,0,70.0,\n";
        let result = load_network_reader(Cursor::new(NODES), Cursor::new(edges));
        assert!(matches!(result, Err(SpatialError::DuplicateKey { key: 0, .. })));
    }

    #[test]
    fn duplicate_node_rejected() {
        let nodes = "id,lat,lon\n1,44.0,11.0\n1,44.1,11.1\n";
        let edges = "source,target,key,length,geometry\n";
        let result = load_network_reader(Cursor::new(nodes), Cursor::new(edges));
        assert!(matches!(result, Err(SpatialError::Parse(_))));
    }

    #[test]
    fn load_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let nodes_path = dir.path().join("nodes.csv");
        let edges_path = dir.path().join("edges.csv");
        std::fs::File::create(&nodes_path).unwrap().write_all(NODES.as_bytes()).unwrap();
        std::fs::File::create(&edges_path).unwrap().write_all(EDGES.as_bytes()).unwrap();

        let net = load_network_csv(&nodes_path, &edges_path).unwrap();
        assert_eq!(net.node_count(), 3);
        assert_eq!(net.edge_count(), 3);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_network_csv(&dir.path().join("a.csv"), &dir.path().join("b.csv"));
        assert!(matches!(result, Err(SpatialError::Io(_))));
    }
}
