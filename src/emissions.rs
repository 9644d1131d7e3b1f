//! Local emission estimates.
//!
//! The backend computes authoritative emissions from its own factor table.
//! These hardcoded factors (kg CO2e per unit) give an instant preview while
//! an entry is being entered, and a fallback summary when the dashboard
//! endpoint is unavailable.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Serialize;

use crate::types::CarbonEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Electricity,
    NaturalGas,
    Diesel,
    Petrol,
    Flight,
    Vehicle,
    Waste,
    Water,
}

impl EntryType {
    pub const ALL: [Self; 8] = [
        Self::Electricity,
        Self::NaturalGas,
        Self::Diesel,
        Self::Petrol,
        Self::Flight,
        Self::Vehicle,
        Self::Waste,
        Self::Water,
    ];

    /// kg CO2e per unit.
    #[must_use]
    pub fn factor(self) -> f64 {
        match self {
            Self::Electricity => 0.233,
            Self::NaturalGas => 2.02,
            Self::Diesel => 2.68,
            Self::Petrol => 2.31,
            Self::Flight => 0.255,
            Self::Vehicle => 0.171,
            Self::Waste => 0.467,
            Self::Water => 0.344,
        }
    }

    #[must_use]
    pub fn unit(self) -> &'static str {
        match self {
            Self::Electricity => "kWh",
            Self::NaturalGas | Self::Water => "m3",
            Self::Diesel | Self::Petrol => "L",
            Self::Flight | Self::Vehicle => "km",
            Self::Waste => "kg",
        }
    }

    /// GHG protocol scope: 1 direct combustion, 2 purchased energy, 3 value chain.
    #[must_use]
    pub fn scope(self) -> u8 {
        match self {
            Self::NaturalGas | Self::Diesel | Self::Petrol | Self::Vehicle => 1,
            Self::Electricity => 2,
            Self::Flight | Self::Waste | Self::Water => 3,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Electricity => "electricity",
            Self::NaturalGas => "natural_gas",
            Self::Diesel => "diesel",
            Self::Petrol => "petrol",
            Self::Flight => "flight",
            Self::Vehicle => "vehicle",
            Self::Waste => "waste",
            Self::Water => "water",
        }
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "electricity" => Ok(Self::Electricity),
            "natural_gas" | "gas" | "naturalgas" => Ok(Self::NaturalGas),
            "diesel" => Ok(Self::Diesel),
            "petrol" | "gasoline" => Ok(Self::Petrol),
            "flight" | "flights" | "air_travel" => Ok(Self::Flight),
            "vehicle" | "car" | "car_travel" => Ok(Self::Vehicle),
            "waste" => Ok(Self::Waste),
            "water" => Ok(Self::Water),
            _ => Err(format!("unknown entry type: {s}")),
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Estimate {
    pub entry_type: Option<EntryType>,
    pub factor: Option<f64>,
    pub scope: Option<u8>,
    pub emissions_kg: f64,
}

/// `quantity × factor` for known types; zero with no factor otherwise.
#[must_use]
pub fn estimate(entry_type: &str, quantity: f64) -> Estimate {
    match entry_type.parse::<EntryType>() {
        Ok(kind) => Estimate {
            entry_type: Some(kind),
            factor: Some(kind.factor()),
            scope: Some(kind.scope()),
            emissions_kg: quantity * kind.factor(),
        },
        Err(_) => Estimate { entry_type: None, factor: None, scope: None, emissions_kg: 0.0 },
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LocalSummary {
    pub total_kg: f64,
    pub by_scope: BTreeMap<u8, f64>,
    pub by_type: BTreeMap<String, f64>,
}

/// Aggregate entries, preferring the backend's `emissions` and falling back
/// to the local estimate when the backend reported zero.
#[must_use]
pub fn summarize(entries: &[CarbonEntry]) -> LocalSummary {
    let mut summary = LocalSummary::default();
    for entry in entries {
        let local = estimate(&entry.entry_type, entry.quantity);
        let kg = if entry.emissions > 0.0 { entry.emissions } else { local.emissions_kg };
        summary.total_kg += kg;
        if let Some(scope) = entry.scope.or(local.scope) {
            *summary.by_scope.entry(scope).or_default() += kg;
        }
        *summary.by_type.entry(entry.entry_type.clone()).or_default() += kg;
    }
    summary
}

#[cfg(test)]
#[path = "emissions_test.rs"]
mod tests;
