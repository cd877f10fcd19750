//! The [`WorldState`] aggregate shared by every agent.

use std::collections::BTreeMap;
use std::path::Path;

use medsim_types::{OrderId, Requester};
use serde::{Deserialize, Serialize};

use crate::city::CityState;
use crate::error::WorldError;
use crate::hospital::Hospital;
use crate::lab::Lab;
use crate::pharmacy::Pharmacy;
use crate::supplier::Supplier;

/// The whole simulated city.
///
/// Entity maps are keyed by stable seed ids (`"H1"`, `"L1"`, ...) so
/// iteration order is deterministic. Entities are never added or removed
/// after seeding; only orders and history entries come and go.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldState {
    /// City-wide risk picture.
    pub city: CityState,
    /// Hospitals by id.
    pub hospitals: BTreeMap<String, Hospital>,
    /// Labs by id.
    pub labs: BTreeMap<String, Lab>,
    /// Pharmacies by id.
    pub pharmacies: BTreeMap<String, Pharmacy>,
    /// Suppliers by id.
    pub suppliers: BTreeMap<String, Supplier>,
}

impl WorldState {
    /// Parse a seed snapshot from JSON. Missing sections default to empty.
    pub fn from_json_str(json: &str) -> Result<Self, WorldError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a seed snapshot from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, WorldError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| WorldError::SeedIo {
            path: path.to_path_buf(),
            source,
        })?;
        let world = Self::from_json_str(&raw)?;
        tracing::info!(
            path = %path.display(),
            hospitals = world.hospitals.len(),
            labs = world.labs.len(),
            pharmacies = world.pharmacies.len(),
            suppliers = world.suppliers.len(),
            "Loaded seed snapshot"
        );
        Ok(world)
    }

    /// Whether any supplier already queues or carries order `id`.
    pub fn order_claimed(&self, id: OrderId) -> bool {
        self.suppliers.values().any(|supplier| supplier.has_order(id))
    }

    /// Whether any supplier has an open order of `item` for `requester`.
    pub fn open_supply_for(&self, requester: &Requester, item: &str) -> bool {
        self.suppliers.values().any(|supplier| {
            supplier
                .active_orders
                .iter()
                .any(|order| order.is_open() && &order.requester == requester && order.item == item)
        })
    }

    /// Every distinct zone referenced by an entity or the city map.
    pub fn zones(&self) -> Vec<String> {
        let mut zones: Vec<String> = self
            .city
            .risk_zones
            .keys()
            .cloned()
            .chain(self.hospitals.values().map(|h| h.zone.clone()))
            .chain(self.labs.values().map(|l| l.zone.clone()))
            .chain(self.pharmacies.values().map(|p| p.zone.clone()))
            .filter(|zone| !zone.is_empty())
            .collect();
        zones.sort();
        zones.dedup();
        zones
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn partial_seed_fills_defaults() {
        let world = WorldState::from_json_str(
            r#"{ "hospitals": { "H9": { "name": "Field Clinic", "zone": "Zone-9" } } }"#,
        )
        .unwrap();
        let hospital = &world.hospitals["H9"];
        assert!(hospital.beds.is_empty());
        assert!(world.labs.is_empty());
        assert!(world.city.active_alerts.is_empty());
    }

    #[test]
    fn malformed_seed_is_rejected() {
        assert!(matches!(
            WorldState::from_json_str("{ not json"),
            Err(WorldError::SeedJson(_))
        ));
    }

    #[test]
    fn missing_seed_file_reports_path() {
        let err = WorldState::from_json_file("/nonexistent/medsim-seed.json").unwrap_err();
        assert!(err.to_string().contains("medsim-seed.json"));
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let world = crate::starting_world();
        let json = serde_json::to_string(&world).unwrap();
        assert_eq!(WorldState::from_json_str(&json).unwrap(), world);
    }
}
