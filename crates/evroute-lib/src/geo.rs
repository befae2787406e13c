//! Great-circle geometry and naive travel-time estimation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Fixed average driving speed used when no traffic data is available.
pub const DEFAULT_AVERAGE_SPEED_KMH: f64 = 60.0;

/// WGS-84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Both components are finite and within the WGS-84 ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Haversine distance to `other` in kilometres.
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        distance_km(*self, *other)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// Haversine great-circle distance between two coordinates in kilometres.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();

    let h = (d_lat * 0.5).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Minutes needed to cover `distance_km` at a constant `avg_speed_kmh`.
pub fn travel_time_minutes(distance_km: f64, avg_speed_kmh: f64) -> f64 {
    distance_km / avg_speed_kmh * 60.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let p = Coordinate::new(48.8566, 2.3522);
        assert_eq!(distance_km(p, p), 0.0);
    }

    #[test]
    fn one_degree_of_longitude_on_equator() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 1.0);
        let expected = EARTH_RADIUS_KM * 1f64.to_radians();
        assert!((distance_km(a, b) - expected).abs() < 1e-9);
    }

    #[test]
    fn paris_to_london_is_roughly_344_km() {
        let paris = Coordinate::new(48.8566, 2.3522);
        let london = Coordinate::new(51.5074, -0.1278);
        let d = distance_km(paris, london);
        assert!((d - 343.5).abs() < 1.5, "unexpected distance {d}");
        assert!((d - distance_km(london, paris)).abs() < 1e-9);
    }

    #[test]
    fn travel_time_at_default_speed() {
        assert_eq!(travel_time_minutes(90.0, DEFAULT_AVERAGE_SPEED_KMH), 90.0);
        assert_eq!(travel_time_minutes(50.0, 100.0), 30.0);
    }

    #[test]
    fn coordinate_validation() {
        assert!(Coordinate::new(45.0, 7.0).is_valid());
        assert!(!Coordinate::new(91.0, 7.0).is_valid());
        assert!(!Coordinate::new(0.0, -181.0).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }
}
