//! Route optimization entry point.
//!
//! This module provides:
//! - [`RouteRequest`] - Inputs for one optimization run
//! - [`RoutePlan`] - Planned route result, see [`assembler`]
//! - [`optimize_route`] - Main entry point for computing routes
//!
//! # Example
//!
//! ```
//! use evroute_lib::{optimize_route, Coordinate, EnergyEstimator, RouteRequest, VehicleProfile};
//!
//! let vehicle = VehicleProfile::new(60.0, 11.0, 150.0).unwrap();
//! let request = RouteRequest::new(
//!     Coordinate::new(52.52, 13.405),
//!     Coordinate::new(52.39, 13.065),
//!     vehicle,
//!     80.0,
//! );
//! let plan = optimize_route(&request, &EnergyEstimator::heuristic()).unwrap();
//! assert!(plan.feasible);
//! assert!(plan.charging_stops.is_empty());
//! ```

pub mod assembler;

pub use assembler::{assemble_route, ChargingStop, RouteLeg, RoutePlan};

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::charging::ChargingPolicy;
use crate::energy::EnergyEstimator;
use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::graph::{build_graph, GraphBuildOptions, DESTINATION_KEY, START_KEY};
use crate::search::{search_charging_route, SearchOptions};
use crate::vehicle::{ChargingStation, VehicleProfile};

/// Inputs for one optimization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub start: Coordinate,
    pub destination: Coordinate,
    pub vehicle: VehicleProfile,
    /// State of charge at departure, in percent.
    pub current_soc: f64,
    /// Pre-filtered candidate stations, in catalog order.
    #[serde(default)]
    pub stations: Vec<ChargingStation>,
    /// Defaults to the current time when absent.
    #[serde(default)]
    pub departure_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub policy: ChargingPolicy,
    #[serde(default)]
    pub graph_options: GraphBuildOptions,
}

impl RouteRequest {
    /// Request without candidate stations using the default policy.
    pub fn new(
        start: Coordinate,
        destination: Coordinate,
        vehicle: VehicleProfile,
        current_soc: f64,
    ) -> Self {
        Self {
            start,
            destination,
            vehicle,
            current_soc,
            stations: Vec::new(),
            departure_time: None,
            policy: ChargingPolicy::default(),
            graph_options: GraphBuildOptions::default(),
        }
    }

    pub fn with_stations(mut self, stations: Vec<ChargingStation>) -> Self {
        self.stations = stations;
        self
    }

    pub fn with_departure(mut self, departure_time: DateTime<Utc>) -> Self {
        self.departure_time = Some(departure_time);
        self
    }

    pub fn with_policy(mut self, policy: ChargingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Reject invalid input before any graph is built.
    ///
    /// Station coordinates are deliberately not checked here: bad station
    /// data surfaces from the graph builder as a geometry error.
    pub fn validate(&self) -> Result<()> {
        for (coordinate, field) in [(self.start, "start"), (self.destination, "destination")] {
            if !coordinate.is_valid() {
                return Err(Error::invalid(format!(
                    "{field} coordinate {coordinate} is missing or out of range"
                )));
            }
        }

        if !self.current_soc.is_finite() || !(0.0..=100.0).contains(&self.current_soc) {
            return Err(Error::invalid(format!(
                "current_soc must be between 0 and 100, got {}",
                self.current_soc
            )));
        }

        self.vehicle.validate()?;
        self.policy.validate()?;

        let speed = self.graph_options.average_speed_kmh;
        if !speed.is_finite() || speed <= 0.0 {
            return Err(Error::invalid(
                "average_speed_kmh must be a finite positive number",
            ));
        }

        let mut seen = HashSet::new();
        for station in &self.stations {
            if station.id.trim().is_empty() {
                return Err(Error::invalid("station id must not be empty"));
            }
            if station.id == START_KEY || station.id == DESTINATION_KEY {
                return Err(Error::invalid(format!(
                    "station id '{}' is reserved",
                    station.id
                )));
            }
            if !seen.insert(station.id.as_str()) {
                return Err(Error::invalid(format!(
                    "duplicate station id '{}'",
                    station.id
                )));
            }
        }

        Ok(())
    }
}

/// Compute a charging-aware route with default search options.
pub fn optimize_route(request: &RouteRequest, estimator: &EnergyEstimator) -> Result<RoutePlan> {
    optimize_route_with_options(request, estimator, &SearchOptions::default())
}

/// Compute a charging-aware route.
///
/// This is the main entry point for route optimization. It:
/// 1. Validates the request
/// 2. Builds the complete graph over start, stations and destination
/// 3. Runs the charging-aware search
/// 4. Assembles the plan with timestamps for every charging stop
///
/// An unreachable destination or a low arrival SOC yields a plan with
/// `feasible == false` rather than an error.
pub fn optimize_route_with_options(
    request: &RouteRequest,
    estimator: &EnergyEstimator,
    options: &SearchOptions,
) -> Result<RoutePlan> {
    request.validate()?;

    let graph = build_graph(
        request.start,
        request.destination,
        &request.stations,
        &request.graph_options,
    )?;

    let outcome = search_charging_route(
        &graph,
        &request.vehicle,
        request.current_soc,
        &request.policy,
        estimator,
        options,
    )?;

    let departure = request.departure_time.unwrap_or_else(Utc::now);
    let plan = assemble_route(&graph, &outcome, &request.policy, departure);

    info!(
        nodes = graph.len(),
        feasible = plan.feasible,
        stops = plan.charging_stops.len(),
        total_distance_km = plan.total_distance_km,
        total_time_minutes = plan.total_time_minutes,
        final_soc = plan.final_arrival_soc_percent,
        fallback_estimates = plan.stats.fallback_estimates,
        "route optimized"
    );

    Ok(plan)
}
