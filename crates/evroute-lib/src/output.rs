use std::fmt::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::charging::ChargingPolicy;
use crate::routing::{ChargingStop, RoutePlan};

/// Round to two decimal places; applied only at the output boundary.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Presentation style for turning a [`RouteResponse`] into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteRenderMode {
    PlainText,
    Compact,
}

/// Charging stop as exposed to clients.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChargingStopResponse {
    pub station_id: String,
    pub station_name: String,
    #[serde(rename = "arrivalSOC")]
    pub arrival_soc: f64,
    #[serde(rename = "chargeToSOC")]
    pub charge_to_soc: f64,
    /// Minutes.
    pub charging_duration: f64,
    pub arrival_time: DateTime<Utc>,
}

impl From<&ChargingStop> for ChargingStopResponse {
    fn from(stop: &ChargingStop) -> Self {
        Self {
            station_id: stop.station_id.clone(),
            station_name: stop.station_name.clone(),
            arrival_soc: round2(stop.arrival_soc_percent),
            charge_to_soc: round2(stop.charge_to_soc_percent),
            charging_duration: round2(stop.charging_duration_minutes),
            arrival_time: stop.arrival_timestamp,
        }
    }
}

/// Serialisable route result handed to HTTP and CLI consumers.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponse {
    /// Kilometres.
    pub total_distance: f64,
    /// Minutes, driving plus charging.
    pub total_time: f64,
    pub charging_stops: Vec<ChargingStopResponse>,
    #[serde(rename = "finalArrivalSOC")]
    pub final_arrival_soc: f64,
    pub no_stations_available: bool,
    pub feasible: bool,
    pub departure_time: DateTime<Utc>,
    pub estimated_arrival: DateTime<Utc>,
}

impl RouteResponse {
    /// Convert a [`RoutePlan`] into its boundary representation.
    pub fn from_plan(plan: &RoutePlan, policy: &ChargingPolicy) -> Self {
        Self {
            total_distance: round2(plan.total_distance_km),
            total_time: round2(plan.total_time_minutes),
            charging_stops: plan
                .charging_stops
                .iter()
                .map(ChargingStopResponse::from)
                .collect(),
            final_arrival_soc: round2(plan.final_arrival_soc_percent),
            no_stations_available: plan.no_stations_available(policy),
            feasible: plan.feasible,
            departure_time: plan.departure_time,
            estimated_arrival: plan.estimated_arrival_time,
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Render the response using the requested textual mode.
    pub fn render(&self, mode: RouteRenderMode) -> String {
        match mode {
            RouteRenderMode::PlainText => self.render_plain(),
            RouteRenderMode::Compact => self.render_compact(),
        }
    }

    fn status_label(&self) -> &'static str {
        if self.feasible {
            "feasible"
        } else if self.no_stations_available {
            "infeasible (no charging stations available)"
        } else {
            "infeasible"
        }
    }

    fn render_plain(&self) -> String {
        let mut buffer = String::new();
        let _ = writeln!(
            buffer,
            "Route: {:.2} km, {:.2} min, {} charging stop(s), {}",
            self.total_distance,
            self.total_time,
            self.charging_stops.len(),
            self.status_label()
        );
        let _ = writeln!(buffer, "Depart: {}", timestamp(&self.departure_time));
        for (index, stop) in self.charging_stops.iter().enumerate() {
            let _ = writeln!(
                buffer,
                "{:>3}: {} ({}) arrive {} at {:.2}%, charge to {:.2}% in {:.2} min",
                index + 1,
                stop.station_name,
                stop.station_id,
                timestamp(&stop.arrival_time),
                stop.arrival_soc,
                stop.charge_to_soc,
                stop.charging_duration
            );
        }
        let _ = writeln!(
            buffer,
            "Arrive: {} with {:.2}% SOC",
            timestamp(&self.estimated_arrival),
            self.final_arrival_soc
        );
        buffer
    }

    fn render_compact(&self) -> String {
        let stops = self
            .charging_stops
            .iter()
            .map(|stop| stop.station_id.as_str())
            .collect::<Vec<_>>();
        let via = if stops.is_empty() {
            "direct".to_string()
        } else {
            format!("via {}", stops.join(" -> "))
        };
        format!(
            "{} {:.2} km {:.2} min {} soc={:.2}\n",
            self.status_label(),
            self.total_distance,
            self.total_time,
            via,
            self.final_arrival_soc
        )
    }
}

fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_rounds_half_away_from_zero() {
        assert_eq!(round2(1.005_000_1), 1.01);
        assert_eq!(round2(12.344), 12.34);
        assert_eq!(round2(-0.125_01), -0.13);
    }
}
