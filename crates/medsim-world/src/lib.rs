//! World state for the MedSim city health network simulation.
//!
//! This crate owns the shared model every agent reads and mutates: the
//! city's risk picture, hospitals, labs, pharmacies, suppliers and the
//! orders flowing between them. Invariants are enforced where the data
//! changes, so agents never need to re-check them.
//!
//! # Modules
//!
//! - [`city`] -- Zone hazard tiers, alerts and per-disease case counts.
//! - [`error`] -- Error types for world mutations and seed loading.
//! - [`hospital`] -- Bed and equipment pools, clamped to `[0, total]`.
//! - [`lab`] -- Per-disease test counts with a bounded history window.
//! - [`order`] -- Supply orders with forward-only status transitions.
//! - [`pharmacy`] -- Medicine stock and deduplicated pending orders.
//! - [`scenario`] -- Named perturbations triggered by operators.
//! - [`starting_world`] -- The built-in seed snapshot.
//! - [`state`] -- The [`WorldState`] aggregate and JSON seed loading.
//! - [`supplier`] -- Inventory, fleet and active orders.

pub mod city;
pub mod error;
pub mod hospital;
pub mod lab;
pub mod order;
pub mod pharmacy;
pub mod scenario;
pub mod starting_world;
pub mod state;
pub mod supplier;

// Re-export primary types at crate root.
pub use city::{Alert, CityState, DiseaseStats, ZoneRisk};
pub use error::WorldError;
pub use hospital::{BedPool, EquipmentPool, Hospital};
pub use lab::{DiseaseTests, HISTORY_WINDOW, History, Lab};
pub use order::Order;
pub use pharmacy::{Medicine, Pharmacy};
pub use scenario::Scenario;
pub use starting_world::starting_world;
pub use state::WorldState;
pub use supplier::{Fleet, Supplier};
