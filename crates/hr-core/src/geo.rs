//! Geographic coordinate type and spatial utilities.
//!
//! `GeoPoint` stores WGS-84 latitude/longitude in `f64`.  Hazard chunks are
//! a few hundredths of a degree wide and edge midpoints land close to chunk
//! borders, so single precision would misplace points near a boundary.

use crate::{CoreError, CoreResult};

/// A WGS-84 geographic coordinate.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Construct without validation.  Use [`GeoPoint::validated`] for values
    /// that come from outside the process.
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Construct a point, rejecting latitudes outside `[-90, 90]`, longitudes
    /// outside `[-180, 180]`, and non-finite values.
    pub fn validated(lat: f64, lon: f64) -> CoreResult<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoreError::InvalidLatitude(lat));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(CoreError::InvalidLongitude(lon));
        }
        Ok(Self { lat, lon })
    }

    /// `true` if both components are inside their valid WGS-84 ranges.
    pub fn is_valid(self) -> bool {
        Self::validated(self.lat, self.lon).is_ok()
    }

    /// Arithmetic mean of the two coordinates.
    ///
    /// Not the geodesic midpoint.  At city scale the difference is far below
    /// the width of a hazard chunk.
    #[inline]
    pub fn midpoint(self, other: GeoPoint) -> GeoPoint {
        GeoPoint {
            lat: (self.lat + other.lat) / 2.0,
            lon: (self.lon + other.lon) / 2.0,
        }
    }

    /// Haversine great-circle distance in metres.
    pub fn distance_m(self, other: GeoPoint) -> f64 {
        const R: f64 = 6_371_000.0; // mean Earth radius, metres

        let d_lat = (other.lat - self.lat).to_radians();
        let d_lon = (other.lon - self.lon).to_radians();

        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();

        let a = (d_lat * 0.5).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);

        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        R * c
    }

    /// `true` if both components are within `tolerance` degrees of `other`.
    #[inline]
    pub fn approx_eq(self, other: GeoPoint, tolerance: f64) -> bool {
        (self.lat - other.lat).abs() <= tolerance && (self.lon - other.lon).abs() <= tolerance
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}
