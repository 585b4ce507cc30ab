//! Validated route endpoints.

use serde::{Deserialize, Serialize};

use hr_core::GeoPoint;

use crate::RoutingResult;

/// A start and an end coordinate.
///
/// Both are checked against latitude ∈ [-90, 90] and longitude ∈ [-180, 180]
/// before anything reaches the solver.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub start: GeoPoint,
    pub end:   GeoPoint,
}

impl RouteRequest {
    pub fn new(start_lat: f64, start_lon: f64, end_lat: f64, end_lon: f64) -> RoutingResult<Self> {
        Ok(Self {
            start: GeoPoint::validated(start_lat, start_lon)?,
            end:   GeoPoint::validated(end_lat, end_lon)?,
        })
    }

    pub fn from_points(start: GeoPoint, end: GeoPoint) -> RoutingResult<Self> {
        let request = Self { start, end };
        request.validate()?;
        Ok(request)
    }

    /// Re-check both endpoints.  Needed for requests built field by field or
    /// deserialized.
    pub fn validate(&self) -> RoutingResult<()> {
        GeoPoint::validated(self.start.lat, self.start.lon)?;
        GeoPoint::validated(self.end.lat, self.end.lon)?;
        Ok(())
    }
}
