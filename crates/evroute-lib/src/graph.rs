use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::geo::{distance_km, travel_time_minutes, Coordinate, DEFAULT_AVERAGE_SPEED_KMH};
use crate::vehicle::ChargingStation;

/// Key of the start node in plans and legs.
pub const START_KEY: &str = "start";
/// Key of the destination node in plans and legs.
pub const DESTINATION_KEY: &str = "destination";

/// Index of a node within a [`Graph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Role a node plays in the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Start,
    ChargingStation,
    Destination,
}

/// Node in the routing graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: NodeId,
    /// `start`, `destination`, or the station id.
    pub key: String,
    pub coordinate: Coordinate,
    pub kind: NodeKind,
    pub display_name: String,
}

impl GraphNode {
    pub fn is_charging_station(&self) -> bool {
        self.kind == NodeKind::ChargingStation
    }
}

/// Directed edge stored on its source node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GraphEdge {
    pub target: NodeId,
    pub distance_km: f64,
    pub travel_time_minutes: f64,
    /// Extra distance this hop adds compared to driving straight from the
    /// start to the destination, clamped at zero. Added to the edge weight
    /// as minutes.
    pub detour_penalty_minutes: f64,
    /// Always zero until elevation data becomes an input.
    pub elevation_gain_m: f64,
}

/// Options controlling graph construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphBuildOptions {
    /// Average speed used to derive edge travel times.
    pub average_speed_kmh: f64,
}

impl Default for GraphBuildOptions {
    fn default() -> Self {
        Self {
            average_speed_kmh: DEFAULT_AVERAGE_SPEED_KMH,
        }
    }
}

/// Complete directed graph over start, candidate stations and destination.
///
/// Nodes are stored in insertion order: the start first, then one node per
/// station in input order, then the destination. Each node's edge list
/// follows the same order, which keeps neighbour iteration stable.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<GraphNode>,
    adjacency: Vec<Vec<GraphEdge>>,
    direct_distance_km: f64,
}

impl Graph {
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> &GraphNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn start(&self) -> NodeId {
        NodeId(0)
    }

    pub fn destination(&self) -> NodeId {
        NodeId(self.nodes.len() - 1)
    }

    /// Great-circle distance from start to destination.
    pub fn direct_distance_km(&self) -> f64 {
        self.direct_distance_km
    }

    /// Return the outgoing edges of a node.
    pub fn neighbours(&self, node: NodeId) -> &[GraphEdge] {
        self.adjacency
            .get(node.0)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Look up the edge between two nodes.
    pub fn edge(&self, from: NodeId, to: NodeId) -> Option<&GraphEdge> {
        self.neighbours(from).iter().find(|edge| edge.target == to)
    }
}

/// Build the routing graph for one optimization run.
///
/// Edges are computed for every ordered pair of distinct nodes, so the cost
/// is quadratic in the number of stations; callers are expected to
/// pre-filter candidates. Non-finite coordinates or distances are reported
/// as [`Error::MalformedGeometry`].
pub fn build_graph(
    start: Coordinate,
    destination: Coordinate,
    stations: &[ChargingStation],
    options: &GraphBuildOptions,
) -> Result<Graph> {
    let mut nodes = Vec::with_capacity(stations.len() + 2);
    nodes.push(GraphNode {
        id: NodeId(0),
        key: START_KEY.to_string(),
        coordinate: start,
        kind: NodeKind::Start,
        display_name: "Start".to_string(),
    });
    for station in stations {
        nodes.push(GraphNode {
            id: NodeId(nodes.len()),
            key: station.id.clone(),
            coordinate: station.coordinate,
            kind: NodeKind::ChargingStation,
            display_name: station.name.clone(),
        });
    }
    nodes.push(GraphNode {
        id: NodeId(nodes.len()),
        key: DESTINATION_KEY.to_string(),
        coordinate: destination,
        kind: NodeKind::Destination,
        display_name: "Destination".to_string(),
    });

    for node in &nodes {
        if !node.coordinate.latitude.is_finite() || !node.coordinate.longitude.is_finite() {
            return Err(Error::MalformedGeometry {
                node: node.key.clone(),
                message: format!("non-finite coordinate {}", node.coordinate),
            });
        }
    }

    let direct_distance_km = distance_km(start, destination);
    let adjacency = nodes
        .par_iter()
        .map(|source| build_edges(source, &nodes, destination, direct_distance_km, options))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        nodes = nodes.len(),
        edges = adjacency.iter().map(Vec::len).sum::<usize>(),
        direct_distance_km,
        "built routing graph"
    );

    Ok(Graph {
        nodes,
        adjacency,
        direct_distance_km,
    })
}

fn build_edges(
    source: &GraphNode,
    nodes: &[GraphNode],
    destination: Coordinate,
    direct_distance_km: f64,
    options: &GraphBuildOptions,
) -> Result<Vec<GraphEdge>> {
    let mut edges = Vec::with_capacity(nodes.len().saturating_sub(1));
    for target in nodes.iter().filter(|target| target.id != source.id) {
        let distance = distance_km(source.coordinate, target.coordinate);
        let remaining = distance_km(target.coordinate, destination);
        if !distance.is_finite() || !remaining.is_finite() {
            return Err(Error::MalformedGeometry {
                node: target.key.clone(),
                message: format!(
                    "distance from {} to {} is not finite",
                    source.key, target.key
                ),
            });
        }

        edges.push(GraphEdge {
            target: target.id,
            distance_km: distance,
            travel_time_minutes: travel_time_minutes(distance, options.average_speed_kmh),
            detour_penalty_minutes: (distance + remaining - direct_distance_km).max(0.0),
            elevation_gain_m: 0.0,
        });
    }
    Ok(edges)
}
