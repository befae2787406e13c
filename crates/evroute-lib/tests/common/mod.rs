//! Common test utilities shared by the integration tests.
//!
//! Provides deterministic energy predictors, a fixed departure time and
//! helpers that place points at exact great-circle distances along the
//! equator so expected SOC values can be computed by hand.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use evroute_lib::energy::{EnergyPredictor, EnergyQuery, PredictionError};
use evroute_lib::geo::EARTH_RADIUS_KM;
use evroute_lib::{ChargingStation, Coordinate, VehicleProfile};

/// Point on the equator `km` kilometres east of (0, 0).
#[allow(dead_code)]
pub fn equator_point(km: f64) -> Coordinate {
    Coordinate::new(0.0, (km / EARTH_RADIUS_KM).to_degrees())
}

#[allow(dead_code)]
pub fn station_at(id: &str, km: f64) -> ChargingStation {
    ChargingStation::new(id, format!("Station {id}"), equator_point(km))
}

/// 60 kWh battery, 11 kW AC, 150 kW DC.
#[allow(dead_code)]
pub fn standard_vehicle() -> VehicleProfile {
    VehicleProfile::new(60.0, 11.0, 150.0).expect("valid vehicle")
}

#[allow(dead_code)]
pub fn departure() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0)
        .single()
        .expect("valid timestamp")
}

#[allow(dead_code)]
pub fn approx_eq(actual: f64, expected: f64, tolerance: f64) -> bool {
    (actual - expected).abs() <= tolerance
}

/// Predictor charging a fixed amount per kilometre.
#[allow(dead_code)]
pub struct PerKmPredictor(pub f64);

impl EnergyPredictor for PerKmPredictor {
    fn predict(&self, query: &EnergyQuery) -> Result<f64, PredictionError> {
        Ok(query.distance_km * self.0)
    }
}

/// Predictor that is always unreachable.
#[allow(dead_code)]
pub struct FailingPredictor;

impl EnergyPredictor for FailingPredictor {
    fn predict(&self, _query: &EnergyQuery) -> Result<f64, PredictionError> {
        Err(PredictionError::Unavailable("connection refused".to_string()))
    }
}

/// Heuristic-equivalent predictor that counts its invocations.
#[allow(dead_code)]
#[derive(Default)]
pub struct CountingPredictor {
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl CountingPredictor {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EnergyPredictor for CountingPredictor {
    fn predict(&self, query: &EnergyQuery) -> Result<f64, PredictionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(query.distance_km * 0.15)
    }
}
