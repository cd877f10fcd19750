//! Built-in seed snapshot for the MedSim simulation.
//!
//! Three zones, three hospitals, two labs, two pharmacies and two
//! suppliers. Lab L1 in Zone-2 starts with a rising dengue curve, so the
//! first lab tick predicts an outbreak and the full cascade runs without
//! any scenario trigger.

use std::collections::{BTreeMap, BTreeSet};

use medsim_types::{BedKind, Criticality, Disease, Hazard, RiskTier};

use crate::city::{CityState, DiseaseStats, ZoneRisk};
use crate::hospital::{BedPool, EquipmentPool, Hospital};
use crate::lab::{DiseaseTests, History, Lab};
use crate::pharmacy::{Medicine, Pharmacy};
use crate::state::WorldState;
use crate::supplier::{Fleet, Supplier};

/// Helper to build a [`Hospital`] with general, ICU and isolation wards.
#[allow(clippy::too_many_arguments)]
fn hospital(
    name: &str,
    zone: &str,
    general: (u32, u32),
    icu: (u32, u32),
    isolation: (u32, u32),
    ventilators: (u32, u32),
    inflow: f64,
) -> Hospital {
    let beds = BTreeMap::from([
        (BedKind::General, BedPool::new(general.0, general.1)),
        (BedKind::Icu, BedPool::new(icu.0, icu.1)),
        (BedKind::Isolation, BedPool::new(isolation.0, isolation.1)),
    ]);
    let equipment = BTreeMap::from([(
        "ventilators".to_owned(),
        EquipmentPool::new(ventilators.0, ventilators.1),
    )]);
    Hospital {
        name: name.to_owned(),
        zone: zone.to_owned(),
        beds,
        equipment,
        patient_inflow_per_hour: inflow,
        prepared_for: BTreeSet::new(),
        reserved_beds: BTreeMap::new(),
    }
}

/// Helper to build one disease's [`DiseaseTests`].
fn tests(today: u32, positive: u32, history: &[u32]) -> DiseaseTests {
    DiseaseTests {
        today,
        positive,
        negative: today.saturating_sub(positive),
        history: History::from(history.to_vec()),
    }
}

/// Helper to build a [`Medicine`] line.
fn medicine(
    name: &str,
    category: &str,
    stock: u32,
    daily_usage: f64,
    reorder_point: u32,
    criticality: Criticality,
) -> (String, Medicine) {
    (
        name.to_owned(),
        Medicine {
            name: name.to_owned(),
            category: category.to_owned(),
            stock,
            daily_usage,
            reorder_point,
            criticality,
            supplier_id: None,
        },
    )
}

/// Helper to build a [`ZoneRisk`] from `(hazard, tier)` pairs.
fn zone_risk(tiers: &[(Hazard, RiskTier)]) -> ZoneRisk {
    ZoneRisk(tiers.iter().copied().collect())
}

/// Build the default starting world.
pub fn starting_world() -> WorldState {
    let hospitals = BTreeMap::from([
        (
            "H1".to_owned(),
            hospital(
                "City Central Hospital",
                "Zone-1",
                (100, 60),
                (20, 10),
                (20, 4),
                (15, 10),
                8.0,
            ),
        ),
        (
            "H2".to_owned(),
            hospital(
                "Sunrise Hospital",
                "Zone-2",
                (80, 52),
                (10, 6),
                (10, 3),
                (10, 6),
                5.0,
            ),
        ),
        (
            "H3".to_owned(),
            hospital(
                "Riverside Medical Centre",
                "Zone-3",
                (60, 30),
                (8, 3),
                (6, 1),
                (8, 6),
                3.0,
            ),
        ),
    ]);

    let labs = BTreeMap::from([
        (
            "L1".to_owned(),
            Lab {
                name: "Metro Diagnostics".to_owned(),
                zone: "Zone-2".to_owned(),
                tests: BTreeMap::from([
                    (Disease::Dengue, tests(30, 18, &[10, 14, 18])),
                    (Disease::Malaria, tests(8, 2, &[7, 9, 8])),
                    (Disease::Covid, tests(12, 3, &[10, 11, 12])),
                ]),
                testing_capacity: 200,
                queue_length: 12,
            },
        ),
        (
            "L2".to_owned(),
            Lab {
                name: "Northside Laboratories".to_owned(),
                zone: "Zone-1".to_owned(),
                tests: BTreeMap::from([
                    (Disease::Dengue, tests(9, 2, &[8, 9, 10])),
                    (Disease::Malaria, tests(5, 1, &[4, 6, 5])),
                    (Disease::Covid, tests(20, 5, &[18, 19, 21])),
                ]),
                testing_capacity: 150,
                queue_length: 5,
            },
        ),
    ]);

    let mut p1_medicines = BTreeMap::from([
        medicine("paracetamol", "Analgesics", 500, 50.0, 150, Criticality::Standard),
        medicine("ors", "Rehydration", 150, 20.0, 60, Criticality::Standard),
        medicine("antiviral", "Antivirals", 80, 8.0, 30, Criticality::Critical),
        medicine("dengue_med", "Dengue Care", 50, 5.0, 20, Criticality::Critical),
        medicine("antimalarial", "Antimalarials", 60, 4.0, 20, Criticality::High),
        medicine("amoxicillin", "Antibiotics", 120, 10.0, 40, Criticality::High),
    ]);
    for line in p1_medicines.values_mut() {
        line.supplier_id = Some("S1".to_owned());
    }
    let p2_medicines = BTreeMap::from([
        medicine("paracetamol", "Analgesics", 400, 40.0, 120, Criticality::Standard),
        medicine("ors", "Rehydration", 120, 15.0, 45, Criticality::Standard),
        medicine("antiviral", "Antivirals", 60, 6.0, 25, Criticality::Critical),
        medicine("dengue_med", "Dengue Care", 40, 4.0, 15, Criticality::Critical),
        medicine("antimalarial", "Antimalarials", 45, 3.0, 15, Criticality::High),
        medicine("amoxicillin", "Antibiotics", 90, 8.0, 30, Criticality::High),
    ]);

    let pharmacies = BTreeMap::from([
        (
            "P1".to_owned(),
            Pharmacy {
                name: "HealthPlus Pharmacy".to_owned(),
                zone: "Zone-2".to_owned(),
                medicines: p1_medicines,
                ..Pharmacy::default()
            },
        ),
        (
            "P2".to_owned(),
            Pharmacy {
                name: "CareWell Pharmacy".to_owned(),
                zone: "Zone-1".to_owned(),
                medicines: p2_medicines,
                ..Pharmacy::default()
            },
        ),
    ]);

    let suppliers = BTreeMap::from([
        (
            "S1".to_owned(),
            Supplier {
                name: "MediSupply Co.".to_owned(),
                zone: "Central".to_owned(),
                inventory: BTreeMap::from([
                    ("paracetamol".to_owned(), 10_000),
                    ("ors".to_owned(), 2_000),
                    ("antiviral".to_owned(), 1_000),
                    ("dengue_med".to_owned(), 500),
                    ("antimalarial".to_owned(), 800),
                    ("amoxicillin".to_owned(), 1_500),
                    ("ventilators".to_owned(), 50),
                ]),
                fleet: Fleet::idle(5),
                active_orders: Vec::new(),
                serves_zones: Vec::new(),
            },
        ),
        (
            "S2".to_owned(),
            Supplier {
                name: "QuickMed Logistics".to_owned(),
                zone: "Zone-3".to_owned(),
                inventory: BTreeMap::from([
                    ("paracetamol".to_owned(), 2_000),
                    ("ors".to_owned(), 600),
                    ("antiviral".to_owned(), 90),
                    ("dengue_med".to_owned(), 80),
                    ("ventilators".to_owned(), 4),
                ]),
                fleet: Fleet::idle(2),
                active_orders: Vec::new(),
                serves_zones: vec!["Zone-1".to_owned(), "Zone-3".to_owned()],
            },
        ),
    ]);

    let city = CityState {
        risk_zones: BTreeMap::from([
            (
                "Zone-1".to_owned(),
                zone_risk(&[
                    (Hazard::Dengue, RiskTier::Low),
                    (Hazard::Malaria, RiskTier::Low),
                    (Hazard::Covid, RiskTier::Low),
                    (Hazard::Heatwave, RiskTier::Medium),
                ]),
            ),
            (
                "Zone-2".to_owned(),
                zone_risk(&[
                    (Hazard::Dengue, RiskTier::Medium),
                    (Hazard::Malaria, RiskTier::Low),
                    (Hazard::Covid, RiskTier::Low),
                    (Hazard::Heatwave, RiskTier::Low),
                ]),
            ),
            (
                "Zone-3".to_owned(),
                zone_risk(&[
                    (Hazard::Dengue, RiskTier::Low),
                    (Hazard::Malaria, RiskTier::Low),
                    (Hazard::Covid, RiskTier::Low),
                    (Hazard::Heatwave, RiskTier::Low),
                ]),
            ),
        ]),
        active_alerts: Vec::new(),
        disease_stats: BTreeMap::from([
            (
                Disease::Dengue,
                DiseaseStats {
                    active_cases: 42,
                    new_today: 6,
                    predicted_cases: 0,
                },
            ),
            (
                Disease::Malaria,
                DiseaseStats {
                    active_cases: 11,
                    new_today: 2,
                    predicted_cases: 0,
                },
            ),
            (
                Disease::Covid,
                DiseaseStats {
                    active_cases: 27,
                    new_today: 4,
                    predicted_cases: 0,
                },
            ),
        ]),
    };

    WorldState {
        city,
        hospitals,
        labs,
        pharmacies,
        suppliers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_has_every_entity_kind() {
        let world = starting_world();
        assert_eq!(world.hospitals.len(), 3);
        assert_eq!(world.labs.len(), 2);
        assert_eq!(world.pharmacies.len(), 2);
        assert_eq!(world.suppliers.len(), 2);
        assert_eq!(world.zones(), vec!["Zone-1", "Zone-2", "Zone-3"]);
    }

    #[test]
    fn seed_counts_respect_clamps() {
        let world = starting_world();
        for hospital in world.hospitals.values() {
            for pool in hospital.beds.values() {
                assert!(pool.occupied <= pool.total);
            }
            for pool in hospital.equipment.values() {
                assert!(pool.available <= pool.total);
            }
        }
        for supplier in world.suppliers.values() {
            assert_eq!(supplier.fleet.available, supplier.fleet.total);
        }
    }

    #[test]
    fn zone_two_is_most_loaded() {
        let world = starting_world();
        let busiest = world
            .hospitals
            .values()
            .max_by(|a, b| a.load().total_cmp(&b.load()))
            .map(|h| h.zone.as_str());
        assert_eq!(busiest, Some("Zone-2"));
    }
}
