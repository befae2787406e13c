//! EV route optimization library entry points.
//!
//! This crate plans multi-stop routes for electric vehicles: it builds a
//! complete graph over the start, the candidate charging stations and the
//! destination, then runs a charging-aware Dijkstra search whose edge costs
//! depend on the state of charge carried into each node. Energy per segment
//! comes from an external predictor with a heuristic fallback. Higher-level
//! consumers (CLI, services) should only depend on the functions exported
//! here instead of reimplementing behavior.
//!

#![deny(warnings)]

pub mod charging;
pub mod energy;
pub mod error;
pub mod geo;
pub mod graph;
pub mod output;
pub mod routing;
pub mod search;
pub mod vehicle;

pub use charging::{decide_charge, ChargeDecision, ChargingPolicy};
pub use energy::{
    fallback_energy_kwh, EnergyEstimate, EnergyEstimator, EnergyPredictor, EnergyQuery,
    HttpEnergyPredictor, PredictionError, PredictorConfig,
};
pub use error::{Error, Result};
pub use geo::{distance_km, travel_time_minutes, Coordinate};
pub use graph::{build_graph, Graph, GraphBuildOptions, GraphEdge, GraphNode, NodeId, NodeKind};
pub use output::{ChargingStopResponse, RouteRenderMode, RouteResponse};
pub use routing::{
    assemble_route, optimize_route, optimize_route_with_options, ChargingStop, RouteLeg,
    RoutePlan, RouteRequest,
};
pub use search::{search_charging_route, SearchOptions, SearchOutcome, SearchState, SearchStats};
pub use vehicle::{ChargingStation, VehicleProfile};
