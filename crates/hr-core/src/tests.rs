//! Unit tests for hr-core primitives.

#[cfg(test)]
mod ids {
    use crate::{ChunkId, EdgeId, NodeId};

    #[test]
    fn index_roundtrip() {
        let id = NodeId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(NodeId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn ordering() {
        assert!(EdgeId(0) < EdgeId(1));
        assert!(NodeId(100) > NodeId(99));
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(NodeId::INVALID.0, u32::MAX);
        assert_eq!(EdgeId::INVALID.0, u32::MAX);
        assert_eq!(ChunkId::INVALID.0, u32::MAX);
        assert!(!NodeId::INVALID.is_valid());
        assert!(NodeId(0).is_valid());
    }

    #[test]
    fn display() {
        assert_eq!(ChunkId(7).to_string(), "chunk 7");
        assert_eq!(NodeId(3).to_string(), "node 3");
        assert_eq!(EdgeId::INVALID.to_string(), "edge <unset>");
    }

    #[test]
    fn chunk_row_col() {
        let id = ChunkId::at(2, 5, 17);
        assert_eq!(id, ChunkId(39));
        assert_eq!(id.row_col(17), (2, 5));
    }

    #[test]
    fn oversized_index_rejected() {
        assert!(EdgeId::try_from(u32::MAX as usize + 1).is_err());
    }
}

#[cfg(test)]
mod geo {
    use crate::{CoreError, GeoPoint};

    #[test]
    fn validated_accepts_range_limits() {
        assert!(GeoPoint::validated(90.0, 180.0).is_ok());
        assert!(GeoPoint::validated(-90.0, -180.0).is_ok());
        assert!(GeoPoint::validated(44.4936, 11.3430).is_ok());
    }

    #[test]
    fn validated_rejects_out_of_range() {
        assert_eq!(
            GeoPoint::validated(90.5, 0.0),
            Err(CoreError::InvalidLatitude(90.5))
        );
        assert_eq!(
            GeoPoint::validated(0.0, -180.01),
            Err(CoreError::InvalidLongitude(-180.01))
        );
    }

    #[test]
    fn validated_rejects_non_finite() {
        assert!(matches!(
            GeoPoint::validated(f64::NAN, 0.0),
            Err(CoreError::InvalidLatitude(_))
        ));
        assert!(matches!(
            GeoPoint::validated(0.0, f64::INFINITY),
            Err(CoreError::InvalidLongitude(_))
        ));
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn midpoint_is_arithmetic_mean() {
        let a = GeoPoint::new(44.0, 11.0);
        let b = GeoPoint::new(45.0, 12.0);
        assert_eq!(a.midpoint(b), GeoPoint::new(44.5, 11.5));
        assert_eq!(a.midpoint(b), b.midpoint(a));
    }

    #[test]
    fn zero_distance() {
        let p = GeoPoint::new(44.4949, 11.3426);
        assert!(p.distance_m(p) < 0.01);
    }

    #[test]
    fn one_degree_latitude() {
        // ~1 degree of latitude ≈ 111 km
        let a = GeoPoint::new(44.0, 11.0);
        let b = GeoPoint::new(45.0, 11.0);
        let d = a.distance_m(b);
        assert!((d - 111_195.0).abs() < 500.0, "got {d}");
    }

    #[test]
    fn approx_eq_tolerance() {
        let a = GeoPoint::new(44.5, 11.3);
        assert!(a.approx_eq(GeoPoint::new(44.5 + 1e-12, 11.3), 1e-9));
        assert!(!a.approx_eq(GeoPoint::new(44.51, 11.3), 1e-9));
    }
}
