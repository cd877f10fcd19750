//! Shared type definitions for the MedSim city health network simulation.
//!
//! This crate is the single source of truth for the enums, identifiers,
//! event payloads and log records used across the workspace. Types that
//! the dashboard reads flow downstream to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`enums`] -- Diseases, hazards, tiers, order status, bed and agent kinds
//! - [`events`] -- Event bus payloads ([`SimEvent`]) and subscription keys ([`EventKind`])
//! - [`ids`] -- Order identifiers and entity references
//! - [`log`] -- Structured log entries produced by agents

pub mod enums;
pub mod events;
pub mod ids;
pub mod log;

// Re-export all public types at crate root for convenience.
pub use enums::{
    AgentKind, AlertType, BedKind, Criticality, Disease, Hazard, OrderStatus, RequesterKind,
    RiskTier, Urgency,
};
pub use events::{
    DeliveryCompleted, EquipmentShortage, EventKind, HospitalOverloadRisk, LabCapacityWarning,
    MedicineRequest, MedicineShortageRisk, OutbreakPredicted, SimEvent, SupplyConfirmed,
};
pub use ids::{OrderId, Requester};
pub use log::{LogEntry, LogMeta};

#[cfg(test)]
mod tests {
    //! Binding generation for the dashboard.

    #[test]
    fn export_bindings() {
        // ts-rs writes the TypeScript files to `bindings/` relative to the
        // crate root when `export_all` runs.
        use ts_rs::TS;

        let _ = crate::ids::OrderId::export_all();
        let _ = crate::ids::Requester::export_all();

        let _ = crate::enums::Disease::export_all();
        let _ = crate::enums::Hazard::export_all();
        let _ = crate::enums::RiskTier::export_all();
        let _ = crate::enums::Urgency::export_all();
        let _ = crate::enums::Criticality::export_all();
        let _ = crate::enums::OrderStatus::export_all();
        let _ = crate::enums::RequesterKind::export_all();
        let _ = crate::enums::BedKind::export_all();
        let _ = crate::enums::AgentKind::export_all();
        let _ = crate::enums::AlertType::export_all();

        let _ = crate::log::LogEntry::export_all();
        let _ = crate::log::LogMeta::export_all();
    }
}
