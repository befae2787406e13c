//! Vehicle profile and charging station inputs.
//!
//! Both are supplied by catalog collaborators and treated as read-only for
//! the duration of one optimization run.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geo::Coordinate;

/// Battery and charging characteristics of the vehicle being routed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleProfile {
    pub battery_capacity_kwh: f64,
    pub max_ac_charge_power_kw: f64,
    pub max_dc_charge_power_kw: f64,
}

impl VehicleProfile {
    pub fn new(
        battery_capacity_kwh: f64,
        max_ac_charge_power_kw: f64,
        max_dc_charge_power_kw: f64,
    ) -> Result<Self> {
        let profile = Self {
            battery_capacity_kwh,
            max_ac_charge_power_kw,
            max_dc_charge_power_kw,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Validate the profile for correctness.
    pub fn validate(&self) -> Result<()> {
        if !self.battery_capacity_kwh.is_finite() || self.battery_capacity_kwh <= 0.0 {
            return Err(Error::invalid(
                "battery_capacity_kwh must be a finite positive number",
            ));
        }

        let powers = [
            (self.max_ac_charge_power_kw, "max_ac_charge_power_kw"),
            (self.max_dc_charge_power_kw, "max_dc_charge_power_kw"),
        ];
        for (value, field) in powers {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::invalid(format!(
                    "{field} must be finite and non-negative"
                )));
            }
        }

        if self.max_ac_charge_power_kw <= 0.0 && self.max_dc_charge_power_kw <= 0.0 {
            return Err(Error::invalid(
                "vehicle must accept either AC or DC charging power",
            ));
        }

        Ok(())
    }

    /// Convert an energy amount into percentage points of this battery.
    pub fn soc_percent_of(&self, energy_kwh: f64) -> f64 {
        energy_kwh / self.battery_capacity_kwh * 100.0
    }
}

/// Candidate charging station supplied by the station catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargingStation {
    pub id: String,
    pub name: String,
    pub coordinate: Coordinate,
}

impl ChargingStation {
    pub fn new(id: impl Into<String>, name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            coordinate,
        }
    }
}
