//! Turn a finished search into a [`RoutePlan`].
//!
//! The assembler walks the predecessor chain from the destination (or the
//! furthest node reached) back to the start, then replays it forward to
//! accumulate distance and time and to stamp each charging stop with
//! wall-clock arrival and departure times.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::charging::ChargingPolicy;
use crate::geo::distance_km;
use crate::graph::{Graph, NodeId};
use crate::search::{SearchOutcome, SearchStats};

/// Charging stop along the planned route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargingStop {
    pub station_id: String,
    pub station_name: String,
    pub arrival_soc_percent: f64,
    pub charge_to_soc_percent: f64,
    pub charging_duration_minutes: f64,
    pub arrival_timestamp: DateTime<Utc>,
    pub departure_timestamp: DateTime<Utc>,
}

/// One traversed edge of the planned route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteLeg {
    pub from: String,
    pub to: String,
    pub distance_km: f64,
    pub travel_time_minutes: f64,
    pub energy_kwh: f64,
    /// The energy value came from the heuristic rather than the predictor.
    pub used_fallback: bool,
}

/// Planned route returned by the library.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutePlan {
    /// Node sequence from start to destination. When the destination was
    /// unreachable the sequence stops at the node that got closest to it.
    pub path: Vec<NodeId>,
    pub legs: Vec<RouteLeg>,
    pub total_distance_km: f64,
    /// Driving plus charging time.
    pub total_time_minutes: f64,
    pub charging_stops: Vec<ChargingStop>,
    /// SOC on arrival at the destination, or zero when it was never reached.
    pub final_arrival_soc_percent: f64,
    pub feasible: bool,
    pub departure_time: DateTime<Utc>,
    pub estimated_arrival_time: DateTime<Utc>,
    pub stats: SearchStats,
}

impl RoutePlan {
    /// Number of legs in the route.
    pub fn hop_count(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    /// Total minutes spent charging.
    pub fn charging_time_minutes(&self) -> f64 {
        self.charging_stops
            .iter()
            .map(|stop| stop.charging_duration_minutes)
            .sum()
    }

    /// No charging stop was planned and the vehicle arrives (or strands)
    /// below the feasible-arrival threshold.
    pub fn no_stations_available(&self, policy: &ChargingPolicy) -> bool {
        self.charging_stops.is_empty() && self.final_arrival_soc_percent < policy.min_arrival_soc
    }
}

/// Build the route plan from a completed search.
///
/// When the destination was never finalized the plan is a best-effort
/// partial route: it ends at the finalized node closest to the destination,
/// carries the legs and stops up to that node, and is never feasible.
pub fn assemble_route(
    graph: &Graph,
    outcome: &SearchOutcome,
    policy: &ChargingPolicy,
    departure: DateTime<Utc>,
) -> RoutePlan {
    let destination = graph.destination();
    let reached = outcome.destination_reached();
    let goal = if reached {
        destination
    } else {
        furthest_progress(graph, outcome)
    };
    let path = outcome
        .path_to(goal)
        .unwrap_or_else(|| vec![graph.start()]);

    let mut legs = Vec::with_capacity(path.len().saturating_sub(1));
    let mut charging_stops = Vec::new();
    let mut total_distance_km = 0.0;
    let mut elapsed_minutes = 0.0;

    for pair in path.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        let Some(edge) = graph.edge(from, to) else {
            continue;
        };
        let state = outcome.state(to);
        let energy = state.inbound_energy.unwrap_or_default();

        total_distance_km += edge.distance_km;
        elapsed_minutes += edge.travel_time_minutes;
        legs.push(RouteLeg {
            from: graph.node(from).key.clone(),
            to: graph.node(to).key.clone(),
            distance_km: edge.distance_km,
            travel_time_minutes: edge.travel_time_minutes,
            energy_kwh: energy.energy_kwh,
            used_fallback: energy.used_fallback,
        });

        let node = graph.node(to);
        if node.is_charging_station() && to != destination {
            let arrival_timestamp = departure + minutes(elapsed_minutes);
            elapsed_minutes += state.charging_duration_minutes;
            charging_stops.push(ChargingStop {
                station_id: node.key.clone(),
                station_name: node.display_name.clone(),
                arrival_soc_percent: state.arrival_soc,
                charge_to_soc_percent: state.charge_to_soc,
                charging_duration_minutes: state.charging_duration_minutes,
                arrival_timestamp,
                departure_timestamp: departure + minutes(elapsed_minutes),
            });
        }
    }

    let final_arrival_soc_percent = if reached {
        outcome.state(destination).arrival_soc
    } else {
        0.0
    };

    RoutePlan {
        path,
        legs,
        total_distance_km,
        total_time_minutes: elapsed_minutes,
        charging_stops,
        final_arrival_soc_percent,
        feasible: reached && final_arrival_soc_percent >= policy.min_arrival_soc,
        departure_time: departure,
        estimated_arrival_time: departure + minutes(elapsed_minutes),
        stats: outcome.stats,
    }
}

/// Finalized node with the smallest remaining distance to the destination.
///
/// Ties go to the lowest node index, so the start wins when nothing got closer.
fn furthest_progress(graph: &Graph, outcome: &SearchOutcome) -> NodeId {
    let target = graph.node(graph.destination()).coordinate;
    let mut best: Option<(NodeId, f64)> = None;
    for (index, state) in outcome.states().iter().enumerate() {
        if !state.visited || !state.is_reached() {
            continue;
        }
        let node = NodeId(index);
        let remaining = distance_km(graph.node(node).coordinate, target);
        match best {
            Some((_, closest)) if closest <= remaining => {}
            _ => best = Some((node, remaining)),
        }
    }
    best.map_or(graph.start(), |(node, _)| node)
}

fn minutes(value: f64) -> Duration {
    Duration::microseconds((value * 60_000_000.0).round() as i64)
}
