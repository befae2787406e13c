//! Charging policy thresholds and the per-arrival charging decision.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::vehicle::VehicleProfile;

/// Hard lower bound on SOC along any accepted edge, in percent.
pub const SAFETY_FLOOR_SOC: f64 = 10.0;
/// Minimum SOC on arrival at the destination for a plan to count as feasible.
pub const MIN_ARRIVAL_SOC: f64 = 20.0;
/// Arrival SOC below which the vehicle charges at a station.
pub const CHARGE_TRIGGER_SOC: f64 = 40.0;
/// SOC the vehicle charges up to when it stops.
pub const CHARGE_TARGET_SOC: f64 = 80.0;
/// Upper bound on charge power assumed at any station.
pub const STATION_POWER_CAP_KW: f64 = 50.0;

/// Charging thresholds applied during the constrained search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargingPolicy {
    pub safety_floor_soc: f64,
    pub min_arrival_soc: f64,
    pub charge_trigger_soc: f64,
    pub charge_target_soc: f64,
    pub station_power_cap_kw: f64,
}

impl Default for ChargingPolicy {
    fn default() -> Self {
        Self {
            safety_floor_soc: SAFETY_FLOOR_SOC,
            min_arrival_soc: MIN_ARRIVAL_SOC,
            charge_trigger_soc: CHARGE_TRIGGER_SOC,
            charge_target_soc: CHARGE_TARGET_SOC,
            station_power_cap_kw: STATION_POWER_CAP_KW,
        }
    }
}

impl ChargingPolicy {
    /// Validate that thresholds are finite, ordered and within [0, 100].
    pub fn validate(&self) -> Result<()> {
        let fields = [
            (self.safety_floor_soc, "safety_floor_soc"),
            (self.min_arrival_soc, "min_arrival_soc"),
            (self.charge_trigger_soc, "charge_trigger_soc"),
            (self.charge_target_soc, "charge_target_soc"),
        ];
        for (value, field) in fields {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(Error::invalid(format!(
                    "{field} must be between 0 and 100, got {value}"
                )));
            }
        }

        if self.safety_floor_soc > self.charge_trigger_soc
            || self.charge_trigger_soc > self.charge_target_soc
        {
            return Err(Error::invalid(
                "charging thresholds must satisfy safety_floor <= trigger <= target",
            ));
        }

        if !self.station_power_cap_kw.is_finite() || self.station_power_cap_kw <= 0.0 {
            return Err(Error::invalid(
                "station_power_cap_kw must be a finite positive number",
            ));
        }

        Ok(())
    }

    /// Charge power the vehicle can draw at a station, in kW.
    ///
    /// DC power is used when the vehicle supports it; AC-only vehicles fall
    /// back to their AC limit. Both are capped by the station power cap.
    pub fn effective_power_kw(&self, vehicle: &VehicleProfile) -> f64 {
        let vehicle_power = if vehicle.max_dc_charge_power_kw > 0.0 {
            vehicle.max_dc_charge_power_kw
        } else {
            vehicle.max_ac_charge_power_kw
        };
        vehicle_power.min(self.station_power_cap_kw)
    }

    /// Whether `soc` respects the hard safety floor.
    pub fn above_floor(&self, soc: f64) -> bool {
        soc >= self.safety_floor_soc
    }
}

/// Outcome of arriving at a node with a given SOC.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargeDecision {
    /// SOC the vehicle departs with.
    pub charge_to_soc: f64,
    /// Minutes spent charging (zero when no charge occurs).
    pub duration_minutes: f64,
}

impl ChargeDecision {
    pub fn charged(&self) -> bool {
        self.duration_minutes > 0.0
    }
}

/// Decide whether to charge on arrival at a node.
///
/// Charging happens only at charging stations when the arrival SOC is below
/// the trigger; the vehicle then charges to the target at the effective
/// charge power.
///
/// ```
/// use evroute_lib::charging::{decide_charge, ChargingPolicy};
/// use evroute_lib::VehicleProfile;
///
/// let vehicle = VehicleProfile::new(60.0, 11.0, 150.0).unwrap();
/// let policy = ChargingPolicy::default();
///
/// let decision = decide_charge(&policy, &vehicle, true, 30.0);
/// assert_eq!(decision.charge_to_soc, 80.0);
/// // 50% of 60 kWh at 50 kW takes 36 minutes.
/// assert!((decision.duration_minutes - 36.0).abs() < 1e-9);
///
/// let skipped = decide_charge(&policy, &vehicle, true, 55.0);
/// assert_eq!(skipped.charge_to_soc, 55.0);
/// assert_eq!(skipped.duration_minutes, 0.0);
/// ```
pub fn decide_charge(
    policy: &ChargingPolicy,
    vehicle: &VehicleProfile,
    is_charging_station: bool,
    arrival_soc: f64,
) -> ChargeDecision {
    if is_charging_station
        && arrival_soc < policy.charge_trigger_soc
        && arrival_soc < policy.charge_target_soc
    {
        let energy_kwh =
            (policy.charge_target_soc - arrival_soc) / 100.0 * vehicle.battery_capacity_kwh;
        let duration_minutes = energy_kwh / policy.effective_power_kw(vehicle) * 60.0;
        ChargeDecision {
            charge_to_soc: policy.charge_target_soc,
            duration_minutes,
        }
    } else {
        ChargeDecision {
            charge_to_soc: arrival_soc,
            duration_minutes: 0.0,
        }
    }
}
