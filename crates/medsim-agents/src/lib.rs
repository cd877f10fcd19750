//! Rule-based agents for the MedSim simulation.
//!
//! Five agent kinds share the [`Agent`] trait. Each agent holds only its
//! entity id, its thresholds and its tick interval; every decision reads
//! and mutates the world through the [`AgentContext`] it is handed, and
//! every reaction to another agent goes through the event bus.
//!
//! # Modules
//!
//! - [`agent`] -- The [`Agent`] trait: tick, subscriptions, timer callbacks.
//! - [`city`] -- [`CityAgent`]: zone risk tiers, alerts and summaries.
//! - [`config`] -- Decision thresholds ([`AgentConfig`]).
//! - [`error`] -- [`AgentError`].
//! - [`hospital`] -- [`HospitalAgent`]: overload, equipment and outbreak preparation.
//! - [`lab`] -- [`LabAgent`]: outbreak detection and capacity warnings.
//! - [`pharmacy`] -- [`PharmacyAgent`]: stock checks, demand scaling and restocking.
//! - [`supplier`] -- [`SupplierAgent`]: order intake, fleet dispatch and delivery.
//!
//! [`AgentContext`]: medsim_events::AgentContext

pub mod agent;
pub mod city;
pub mod config;
mod convert;
pub mod error;
pub mod hospital;
pub mod lab;
pub mod pharmacy;
pub mod supplier;

pub use agent::Agent;
pub use city::{CITY_ID, CityAgent};
pub use config::{AgentConfig, HospitalConfig, LabConfig, PharmacyConfig, SupplierConfig};
pub use error::AgentError;
pub use hospital::{HospitalAgent, VENTILATORS};
pub use lab::{GrowthAssessment, LabAgent, assess};
pub use pharmacy::{PharmacyAgent, order_quantity, urgency_for};
pub use supplier::{SupplierAgent, delivery_ms, priority};
