//! Named external perturbations of the world state.
//!
//! Scenarios are the operator's levers: they nudge lab counts, bed
//! occupancy or stock levels and let the agents react on their next tick.

use std::str::FromStr;

use medsim_types::{BedKind, Disease, Hazard, RiskTier};
use serde::{Deserialize, Serialize};

use crate::error::WorldError;
use crate::state::WorldState;

/// Occupancy the hospital-overload scenario sets every bed pool to.
const OVERLOAD_OCCUPANCY: f64 = 0.95;

/// Share of stock left after the medicine-shortage scenario.
const SHORTAGE_REMAINING: f64 = 0.3;

/// Medicine categories hit by the medicine-shortage scenario.
const SHORTAGE_CATEGORIES: [&str; 2] = ["Antivirals", "Antibiotics"];

/// A named perturbation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// Dengue surge in every lab.
    Dengue,
    /// Malaria surge in every lab.
    Malaria,
    /// COVID surge in every lab, plus ICU and isolation admissions.
    Covid,
    /// Heatwave in every zone, plus general admissions.
    Heatwave,
    /// Fill every bed pool in the most loaded zone to 95%.
    HospitalOverload,
    /// Deplete antivirals and antibiotics to 30%.
    MedicineShortage,
    /// Close the day in every lab.
    AdvanceDay,
    /// Lift the heatwave.
    Reset,
}

impl Scenario {
    /// Every scenario, in menu order.
    pub const ALL: [Self; 8] = [
        Self::Dengue,
        Self::Malaria,
        Self::Covid,
        Self::Heatwave,
        Self::HospitalOverload,
        Self::MedicineShortage,
        Self::AdvanceDay,
        Self::Reset,
    ];

    /// URL-friendly name, e.g. `hospital-overload`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dengue => "dengue",
            Self::Malaria => "malaria",
            Self::Covid => "covid",
            Self::Heatwave => "heatwave",
            Self::HospitalOverload => "hospital-overload",
            Self::MedicineShortage => "medicine-shortage",
            Self::AdvanceDay => "advance-day",
            Self::Reset => "reset",
        }
    }

    /// Apply the perturbation and return a message describing it.
    pub fn apply(self, world: &mut WorldState) -> String {
        match self {
            Self::Dengue => {
                surge(world, Disease::Dengue, (25, 15, 10));
                "Dengue outbreak simulated: labs show increased positive tests".to_owned()
            }
            Self::Malaria => {
                surge(world, Disease::Malaria, (20, 12, 8));
                "Malaria outbreak simulated".to_owned()
            }
            Self::Covid => {
                surge(world, Disease::Covid, (30, 18, 12));
                for hospital in world.hospitals.values_mut() {
                    if let Some(pool) = hospital.beds.get_mut(&BedKind::Icu) {
                        pool.apply_delta(3);
                    }
                    if let Some(pool) = hospital.beds.get_mut(&BedKind::Isolation) {
                        pool.apply_delta(8);
                    }
                }
                "COVID surge simulated: ICU and isolation beds filling up".to_owned()
            }
            Self::Heatwave => {
                for risk in world.city.risk_zones.values_mut() {
                    risk.set(Hazard::Heatwave, RiskTier::High);
                }
                for hospital in world.hospitals.values_mut() {
                    if let Some(pool) = hospital.beds.get_mut(&BedKind::General) {
                        pool.apply_delta(10);
                    }
                }
                "Heatwave simulated: increased hospital admissions".to_owned()
            }
            Self::HospitalOverload => overload_busiest_zone(world),
            Self::MedicineShortage => {
                for pharmacy in world.pharmacies.values_mut() {
                    for medicine in pharmacy.medicines.values_mut() {
                        if SHORTAGE_CATEGORIES.contains(&medicine.category.as_str()) {
                            medicine.stock = scale_down(medicine.stock, SHORTAGE_REMAINING);
                        }
                    }
                }
                "Medicine shortage simulated: antivirals and antibiotics depleted".to_owned()
            }
            Self::AdvanceDay => {
                for lab in world.labs.values_mut() {
                    lab.close_day();
                }
                "Day advanced: lab counts moved into history".to_owned()
            }
            Self::Reset => {
                for risk in world.city.risk_zones.values_mut() {
                    risk.set(Hazard::Heatwave, RiskTier::Low);
                }
                "Heatwave lifted: heat risk back to baseline".to_owned()
            }
        }
    }
}

impl FromStr for Scenario {
    type Err = WorldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scenario| scenario.name() == s)
            .ok_or_else(|| WorldError::UnknownScenario(s.to_owned()))
    }
}

impl core::fmt::Display for Scenario {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Add `(tests, positive, negative)` to every lab's counts for `disease`
/// and the matching new cases to the city stats.
fn surge(world: &mut WorldState, disease: Disease, (tests, positive, negative): (u32, u32, u32)) {
    for lab in world.labs.values_mut() {
        if let Some(counts) = lab.tests.get_mut(&disease) {
            counts.record(tests, positive, negative);
        }
    }
    let stats = world.city.stats_mut(disease);
    stats.new_today = stats.new_today.saturating_add(positive);
    stats.active_cases = stats.active_cases.saturating_add(positive);
}

/// Set every bed pool in the zone with the highest bed load to 95%.
fn overload_busiest_zone(world: &mut WorldState) -> String {
    let busiest = world
        .hospitals
        .values()
        .max_by(|a, b| a.load().total_cmp(&b.load()))
        .map(|hospital| hospital.zone.clone());
    let Some(zone) = busiest else {
        return "No hospitals to overload".to_owned();
    };
    for hospital in world.hospitals.values_mut().filter(|h| h.zone == zone) {
        for pool in hospital.beds.values_mut() {
            let target = scale_down(pool.total, OVERLOAD_OCCUPANCY);
            pool.set_occupied(target);
        }
    }
    format!("Hospital overload simulated in {zone}")
}

/// `floor(value * factor)` for a factor in `[0, 1]`.
// In range: 0 <= result <= value <= u32::MAX.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale_down(value: u32, factor: f64) -> u32 {
    (f64::from(value) * factor.clamp(0.0, 1.0)).floor() as u32
}
