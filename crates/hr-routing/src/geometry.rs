//! Route geometry and GeoJSON export.
//!
//! A [`Path`] of N nodes becomes N-1 [`RouteSegment`]s, one per consecutive
//! node pair.  Each segment is the geometry of the cheapest edge between the
//! pair: its explicit path when the edge carries one, otherwise the straight
//! line between the endpoints.  Coordinates stay in WGS84; nothing is
//! projected.
//!
//! GeoJSON positions are `[lon, lat]`, so the export swaps axis order.

use geo::{Coord, LineString};
use geojson::{Feature, FeatureCollection, Geometry, GeometryValue};
use serde::Serialize;
use serde_json::json;

use hr_core::{EdgeId, GeoPoint, NodeId};
use hr_spatial::RoadNetwork;

use crate::router::Path;
use crate::weights::EdgeWeights;
use crate::{RoutingError, RoutingResult};

// ── RouteSegment ──────────────────────────────────────────────────────────────

/// The piece of a route covering one edge.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RouteSegment {
    pub edge:     EdgeId,
    pub source:   NodeId,
    pub target:   NodeId,
    pub key:      u32,
    pub length_m: Option<f64>,
    pub weight:   f64,
    pub coords:   Vec<GeoPoint>,
}

impl RouteSegment {
    pub fn first(&self) -> Option<GeoPoint> {
        self.coords.first().copied()
    }

    pub fn last(&self) -> Option<GeoPoint> {
        self.coords.last().copied()
    }

    fn to_feature(&self, index: usize) -> RoutingResult<Feature> {
        let geometry = Geometry::new(GeometryValue::from(&line_string(&self.coords)));
        let value = json!({
            "type": "Feature",
            "geometry": geometry,
            "properties": {
                "segment_index": index,
                "edge": self.edge.0,
                "source": self.source.0,
                "target": self.target.0,
                "key": self.key,
                "length_m": self.length_m,
                "weight": self.weight,
            }
        });
        serde_json::from_value::<Feature>(value).map_err(|e| RoutingError::GeoJson(e.to_string()))
    }
}

// ── RouteGeometry ─────────────────────────────────────────────────────────────

/// Ordered segments of a route.  Empty for a single-node path.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RouteGeometry {
    pub segments: Vec<RouteSegment>,
}

impl RouteGeometry {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.segments.iter().map(|s| s.edge)
    }

    /// All coordinates in route order, with the joint between consecutive
    /// segments emitted once.
    pub fn coords(&self) -> Vec<GeoPoint> {
        let mut out: Vec<GeoPoint> = Vec::new();
        for segment in &self.segments {
            let skip = match (out.last(), segment.first()) {
                (Some(&prev), Some(first)) if prev == first => 1,
                _ => 0,
            };
            out.extend(segment.coords.iter().skip(skip).copied());
        }
        out
    }

    /// The whole route as one line.
    pub fn to_line_string(&self) -> LineString<f64> {
        line_string(&self.coords())
    }

    /// One `LineString` feature per segment, tagged with its edge.
    pub fn to_geojson(&self) -> RoutingResult<FeatureCollection> {
        let features = self
            .segments
            .iter()
            .enumerate()
            .map(|(i, segment)| segment.to_feature(i))
            .collect::<RoutingResult<Vec<_>>>()?;

        Ok(FeatureCollection {
            features,
            bbox: None,
            foreign_members: None,
        })
    }

    pub fn to_geojson_string(&self) -> RoutingResult<String> {
        serde_json::to_string(&self.to_geojson()?).map_err(|e| RoutingError::GeoJson(e.to_string()))
    }
}

/// Turn `path` into route geometry, choosing the cheapest edge for each hop.
///
/// Deterministic: the same path and weights always produce the same
/// segments.  Fails with a "no edge" error if two consecutive nodes are not
/// connected, which cannot happen for a path returned by a router over the
/// same network.
pub fn serialize_route(network: &RoadNetwork, weights: &EdgeWeights, path: &Path) -> RoutingResult<RouteGeometry> {
    let segments = path
        .nodes
        .windows(2)
        .map(|pair| -> RoutingResult<RouteSegment> {
            let id = network.edge_between(pair[0], pair[1], weights.as_slice())?;
            let edge = network.edge(id);
            Ok(RouteSegment {
                edge:     id,
                source:   edge.source,
                target:   edge.target,
                key:      edge.key,
                length_m: edge.length_m,
                weight:   weights.get(id),
                coords:   network.edge_coords(id),
            })
        })
        .collect::<RoutingResult<Vec<_>>>()?;

    Ok(RouteGeometry { segments })
}

fn line_string(points: &[GeoPoint]) -> LineString<f64> {
    LineString::new(points.iter().map(|p| Coord { x: p.lon, y: p.lat }).collect())
}
