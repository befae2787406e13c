//! Charging-aware shortest-path search.
//!
//! A Dijkstra variant whose edge weights depend on the state of charge the
//! vehicle carries into each node. Every node keeps a [`SearchState`] record
//! instead of a scalar distance: the SOC on arrival decides whether the
//! vehicle charges there, and the charging time is part of the cost of the
//! edge that reached it.
//!
//! Node selection is a linear scan over unvisited nodes. Graphs are small
//! (pre-filtered candidate stations plus two endpoints), and the scan gives
//! a simple deterministic tie-break: the lowest node index wins, and within
//! one relaxation round the first neighbour in insertion order keeps an
//! equal-cost slot.

use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, trace};

use crate::charging::{decide_charge, ChargingPolicy};
use crate::energy::{EnergyEstimate, EnergyEstimator, EnergyQuery};
use crate::error::{Error, Result};
use crate::graph::{Graph, GraphEdge, NodeId};
use crate::vehicle::VehicleProfile;

/// Costs closer than this are treated as equal, so the first relaxation wins.
const COST_EPSILON: f64 = 1e-9;

/// Per-node record maintained during the search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchState {
    /// Minutes of travel, charging and detour penalty to reach the node.
    pub cumulative_cost: f64,
    pub predecessor: Option<NodeId>,
    /// SOC on arrival; only meaningful once the node has been reached.
    pub arrival_soc: f64,
    /// SOC the vehicle departs the node with.
    pub charge_to_soc: f64,
    pub charging_duration_minutes: f64,
    /// Finalized nodes receive no further relaxation.
    pub visited: bool,
    /// Energy estimate of the edge that produced this state.
    pub inbound_energy: Option<EnergyEstimate>,
}

impl SearchState {
    fn unreached() -> Self {
        Self {
            cumulative_cost: f64::INFINITY,
            predecessor: None,
            arrival_soc: 0.0,
            charge_to_soc: 0.0,
            charging_duration_minutes: 0.0,
            visited: false,
            inbound_energy: None,
        }
    }

    fn origin(initial_soc: f64) -> Self {
        Self {
            cumulative_cost: 0.0,
            predecessor: None,
            arrival_soc: initial_soc,
            charge_to_soc: initial_soc,
            charging_duration_minutes: 0.0,
            visited: false,
            inbound_energy: None,
        }
    }

    /// Whether at least one accepted edge (or the origin) reached this node.
    pub fn is_reached(&self) -> bool {
        self.cumulative_cost.is_finite()
    }
}

/// Caller-supplied search limits.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    /// Checked before every node finalization.
    pub deadline: Option<Instant>,
}

/// Counters collected during one search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub finalized_nodes: usize,
    pub energy_estimates: usize,
    pub fallback_estimates: usize,
    pub pruned_edges: usize,
}

/// Final per-node states plus counters.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    states: Vec<SearchState>,
    destination: NodeId,
    pub stats: SearchStats,
}

impl SearchOutcome {
    pub fn state(&self, node: NodeId) -> &SearchState {
        &self.states[node.0]
    }

    pub fn states(&self) -> &[SearchState] {
        &self.states
    }

    /// The destination was finalized with a finite cost.
    pub fn destination_reached(&self) -> bool {
        let state = self.state(self.destination);
        state.visited && state.is_reached()
    }

    /// Walk predecessor links from `goal` back to the origin.
    ///
    /// Returns `None` when `goal` was never reached.
    pub fn path_to(&self, goal: NodeId) -> Option<Vec<NodeId>> {
        if !self.state(goal).is_reached() {
            return None;
        }

        let mut path = vec![goal];
        let mut current = goal;
        while let Some(previous) = self.state(current).predecessor {
            path.push(previous);
            current = previous;
        }
        path.reverse();
        Some(path)
    }
}

/// Run the charging-aware search from the graph's start to its destination.
///
/// Edges whose traversal would leave the battery below the policy's safety
/// floor are pruned outright. An unreachable destination is not an error:
/// inspect [`SearchOutcome::destination_reached`].
pub fn search_charging_route(
    graph: &Graph,
    vehicle: &VehicleProfile,
    initial_soc: f64,
    policy: &ChargingPolicy,
    estimator: &EnergyEstimator,
    options: &SearchOptions,
) -> Result<SearchOutcome> {
    let destination = graph.destination();
    let mut states = vec![SearchState::unreached(); graph.len()];
    states[graph.start().0] = SearchState::origin(initial_soc);
    let mut stats = SearchStats::default();

    loop {
        if let Some(deadline) = options.deadline {
            if Instant::now() >= deadline {
                return Err(Error::DeadlineExceeded {
                    finalized: stats.finalized_nodes,
                });
            }
        }

        let Some(current) = select_next(&states) else {
            debug!(
                finalized = stats.finalized_nodes,
                "no reachable unvisited nodes remain"
            );
            break;
        };

        states[current.0].visited = true;
        stats.finalized_nodes += 1;
        if current == destination {
            break;
        }

        let source = states[current.0];
        let candidates: Vec<&GraphEdge> = graph
            .neighbours(current)
            .iter()
            .filter(|edge| !states[edge.target.0].visited)
            .collect();

        // Predictions are independent per edge; collect keeps insertion order.
        let estimates: Vec<EnergyEstimate> = candidates
            .par_iter()
            .map(|edge| {
                estimator.estimate(&EnergyQuery {
                    distance_km: edge.distance_km,
                    elevation_gain_m: edge.elevation_gain_m,
                    battery_capacity_kwh: vehicle.battery_capacity_kwh,
                })
            })
            .collect();

        for (edge, estimate) in candidates.into_iter().zip(estimates) {
            stats.energy_estimates += 1;
            if estimate.used_fallback {
                stats.fallback_estimates += 1;
            }

            let soc_after_travel =
                source.charge_to_soc - vehicle.soc_percent_of(estimate.energy_kwh);
            if !policy.above_floor(soc_after_travel) {
                stats.pruned_edges += 1;
                debug!(
                    from = %current,
                    to = %edge.target,
                    soc_after_travel,
                    "pruned edge below safety floor"
                );
                continue;
            }

            let target = graph.node(edge.target);
            let decision = decide_charge(
                policy,
                vehicle,
                target.is_charging_station(),
                soc_after_travel,
            );
            if decision.charged() {
                debug!(
                    station = %target.key,
                    arrival_soc = soc_after_travel,
                    charge_to_soc = decision.charge_to_soc,
                    duration_minutes = decision.duration_minutes,
                    "charging stop candidate"
                );
            }
            let weight =
                edge.travel_time_minutes + decision.duration_minutes + edge.detour_penalty_minutes;
            let candidate_cost = source.cumulative_cost + weight;

            let state = &mut states[edge.target.0];
            if candidate_cost + COST_EPSILON < state.cumulative_cost {
                *state = SearchState {
                    cumulative_cost: candidate_cost,
                    predecessor: Some(current),
                    arrival_soc: soc_after_travel,
                    charge_to_soc: decision.charge_to_soc,
                    charging_duration_minutes: decision.duration_minutes,
                    visited: false,
                    inbound_energy: Some(estimate),
                };
                trace!(
                    node = %target.key,
                    cost = candidate_cost,
                    arrival_soc = soc_after_travel,
                    charge_to_soc = decision.charge_to_soc,
                    "relaxed edge"
                );
            }
        }
    }

    Ok(SearchOutcome {
        states,
        destination,
        stats,
    })
}

fn select_next(states: &[SearchState]) -> Option<NodeId> {
    let mut best: Option<(NodeId, f64)> = None;
    for (index, state) in states.iter().enumerate() {
        if state.visited || !state.is_reached() {
            continue;
        }
        match best {
            Some((_, cost)) if cost <= state.cumulative_cost => {}
            _ => best = Some((NodeId(index), state.cumulative_cost)),
        }
    }
    best.map(|(node, _)| node)
}
