//! Great-circle distance on a spherical Earth.

use crate::waypoint::Waypoint;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometers between two latitude/longitude pairs
/// given in degrees.
///
/// Inputs must be finite and inside the geographic range, see
/// [`is_valid_coordinate`]. The result is then finite and non-negative.
#[inline]
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let h = (d_lat / 2.0).sin() * (d_lat / 2.0).sin()
        + lat1.to_radians().cos() * lat2.to_radians().cos()
            * (d_lng / 2.0).sin() * (d_lng / 2.0).sin();
    // Rounding can push h just past 1 for near-antipodal pairs.
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Distance in kilometers between two waypoints.
#[inline]
pub fn distance(a: &Waypoint, b: &Waypoint) -> f64 {
    haversine_km(a.lat, a.lng, b.lat, b.lng)
}

/// Latitude within [-90, 90], longitude within [-180, 180], both finite.
pub fn is_valid_coordinate(lat: f64, lng: f64) -> bool {
    lat.is_finite()
        && lng.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lng)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wp(id: &str, lat: f64, lng: f64) -> Waypoint {
        Waypoint::new(id, id, lat, lng)
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        let points = [
            wp("a", 37.5665, 126.9780),
            wp("b", -33.8688, 151.2093),
            wp("pole", 90.0, 0.0),
            wp("dateline", 0.0, 180.0),
        ];
        for p in &points {
            assert_eq!(distance(p, p), 0.0);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = wp("a", 37.5665, 126.9780);
        let b = wp("b", 37.5600, 126.9700);
        let c = wp("c", -22.9068, -43.1729);
        assert_eq!(distance(&a, &b), distance(&b, &a));
        assert_eq!(distance(&a, &c), distance(&c, &a));
        assert_eq!(distance(&b, &c), distance(&c, &b));
    }

    #[test]
    fn test_known_distances() {
        // One degree of latitude along a meridian.
        let d = haversine_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111.19).abs() < 0.01, "got {}", d);

        // Seoul City Hall to a point ~1 km south-west.
        let d = haversine_km(37.5665, 126.9780, 37.5600, 126.9700);
        assert!(d > 0.9 && d < 1.1, "got {}", d);

        // Antipodal points are half the circumference apart.
        let d = haversine_km(0.0, 0.0, 0.0, 180.0);
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_finite_at_antipodes_and_poles() {
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_KM;
        let mut checked = 0;

        for lat_step in -900..=900 {
            let lat = lat_step as f64 / 10.0;
            for lng_step in -180..=180 {
                let lng = lng_step as f64;
                let anti_lng = if lng > 0.0 { lng - 180.0 } else { lng + 180.0 };

                let d = haversine_km(lat, lng, -lat, anti_lng);
                assert!(d.is_finite() && d >= 0.0, "({}, {}) -> {}", lat, lng, d);
                assert!(d <= half_circumference + 1e-6, "({}, {}) -> {}", lat, lng, d);
                checked += 1;
            }
        }
        assert_eq!(checked, 1801 * 361);

        for &(lat1, lng1, lat2, lng2) in &[
            (90.0, 0.0, -90.0, 0.0),
            (90.0, -180.0, 90.0, 180.0),
            (0.0, -180.0, 0.0, 180.0),
            (-89.9, 179.9, 89.9, -0.1),
        ] {
            let d = haversine_km(lat1, lng1, lat2, lng2);
            assert!(d.is_finite() && d >= 0.0, "({}, {}, {}, {}) -> {}", lat1, lng1, lat2, lng2, d);
        }
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(is_valid_coordinate(37.5, 127.0));
        assert!(is_valid_coordinate(-90.0, 180.0));
        assert!(!is_valid_coordinate(f64::NAN, 0.0));
        assert!(!is_valid_coordinate(0.0, f64::INFINITY));
        assert!(!is_valid_coordinate(90.5, 0.0));
        assert!(!is_valid_coordinate(0.0, -180.01));
    }
}
