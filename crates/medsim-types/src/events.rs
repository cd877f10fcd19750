//! Event payloads carried by the in-process event bus.
//!
//! Each [`SimEvent`] variant wraps one payload struct. Subscriptions are
//! keyed by [`EventKind`]; outbreak predictions are keyed per disease so
//! an agent can listen to one disease without filtering the others.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{Criticality, Disease, RiskTier, Urgency};
use crate::ids::{OrderId, Requester};

/// Subscription key for the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// A lab predicted an outbreak of the given disease.
    OutbreakPredicted(Disease),
    /// A lab is close to its testing capacity.
    LabCapacityWarning,
    /// A hospital's predicted bed occupancy crossed the overload line.
    HospitalOverloadRisk,
    /// A hospital is short on an equipment item.
    EquipmentShortage,
    /// A hospital asks pharmacies in its zone to check a medicine.
    MedicineRequest,
    /// A pharmacy is about to run short of a medicine.
    MedicineShortageRisk,
    /// A supplier put an order on a vehicle.
    SupplyConfirmed,
    /// A supplier's vehicle reached the requester.
    DeliveryCompleted,
}

impl EventKind {
    /// Every outbreak-predicted kind, one per tracked disease.
    pub fn all_outbreaks() -> impl Iterator<Item = Self> {
        Disease::ALL.into_iter().map(Self::OutbreakPredicted)
    }
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutbreakPredicted(disease) => {
                write!(f, "{}_OUTBREAK_PREDICTED", disease.label())
            }
            Self::LabCapacityWarning => f.write_str("LAB_CAPACITY_WARNING"),
            Self::HospitalOverloadRisk => f.write_str("HOSPITAL_OVERLOAD_RISK"),
            Self::EquipmentShortage => f.write_str("EQUIPMENT_SHORTAGE"),
            Self::MedicineRequest => f.write_str("MEDICINE_REQUEST"),
            Self::MedicineShortageRisk => f.write_str("MEDICINE_SHORTAGE_RISK"),
            Self::SupplyConfirmed => f.write_str("SUPPLY_CONFIRMED"),
            Self::DeliveryCompleted => f.write_str("DELIVERY_COMPLETED"),
        }
    }
}

/// A signal published on the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimEvent {
    /// See [`OutbreakPredicted`].
    OutbreakPredicted(OutbreakPredicted),
    /// See [`LabCapacityWarning`].
    LabCapacityWarning(LabCapacityWarning),
    /// See [`HospitalOverloadRisk`].
    HospitalOverloadRisk(HospitalOverloadRisk),
    /// See [`EquipmentShortage`].
    EquipmentShortage(EquipmentShortage),
    /// See [`MedicineRequest`].
    MedicineRequest(MedicineRequest),
    /// See [`MedicineShortageRisk`].
    MedicineShortageRisk(MedicineShortageRisk),
    /// See [`SupplyConfirmed`].
    SupplyConfirmed(SupplyConfirmed),
    /// See [`DeliveryCompleted`].
    DeliveryCompleted(DeliveryCompleted),
}

impl SimEvent {
    /// The subscription key this event is dispatched under.
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::OutbreakPredicted(e) => EventKind::OutbreakPredicted(e.disease),
            Self::LabCapacityWarning(_) => EventKind::LabCapacityWarning,
            Self::HospitalOverloadRisk(_) => EventKind::HospitalOverloadRisk,
            Self::EquipmentShortage(_) => EventKind::EquipmentShortage,
            Self::MedicineRequest(_) => EventKind::MedicineRequest,
            Self::MedicineShortageRisk(_) => EventKind::MedicineShortageRisk,
            Self::SupplyConfirmed(_) => EventKind::SupplyConfirmed,
            Self::DeliveryCompleted(_) => EventKind::DeliveryCompleted,
        }
    }

    /// The zone the event concerns.
    pub fn zone(&self) -> &str {
        match self {
            Self::OutbreakPredicted(e) => &e.zone,
            Self::LabCapacityWarning(e) => &e.zone,
            Self::HospitalOverloadRisk(e) => &e.zone,
            Self::EquipmentShortage(e) => &e.zone,
            Self::MedicineRequest(e) => &e.zone,
            Self::MedicineShortageRisk(e) => &e.zone,
            Self::SupplyConfirmed(e) => &e.zone,
            Self::DeliveryCompleted(e) => &e.zone,
        }
    }
}

/// A lab's test volume for a disease spiked beyond the growth threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutbreakPredicted {
    /// The disease whose tests spiked.
    pub disease: Disease,
    /// Zone served by the lab.
    pub zone: String,
    /// Lab that raised the prediction.
    pub lab_id: String,
    /// Tests recorded today.
    pub today: u32,
    /// Mean of the last two history entries.
    pub average: f64,
    /// `(today - average) / average`.
    pub growth_rate: f64,
    /// Tier derived from the growth rate.
    pub risk: RiskTier,
    /// Confidence in the prediction, 0..1.
    pub confidence: f64,
    /// Projected case count, `round(today * (1 + growth_rate))`.
    pub predicted_cases: u32,
}

/// A lab's daily test volume is close to its capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabCapacityWarning {
    /// Lab that raised the warning.
    pub lab_id: String,
    /// Zone served by the lab.
    pub zone: String,
    /// Tests recorded today across all diseases.
    pub tests_today: u32,
    /// Daily testing capacity.
    pub testing_capacity: u32,
    /// `tests_today / testing_capacity`.
    pub utilization: f64,
    /// Samples waiting to be processed.
    pub queue_length: u32,
}

/// A hospital's predicted occupancy crossed the overload threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalOverloadRisk {
    /// Hospital at risk.
    pub hospital_id: String,
    /// Zone of the hospital.
    pub zone: String,
    /// Occupied beds plus expected near-term inflow.
    pub predicted_occupied: f64,
    /// Total beds across all categories.
    pub capacity: u32,
    /// `predicted_occupied / capacity`.
    pub occupancy: f64,
}

/// A hospital is short on an equipment item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentShortage {
    /// Hospital that is short.
    pub hospital_id: String,
    /// Zone of the hospital.
    pub zone: String,
    /// Equipment item, e.g. `ventilators`.
    pub equipment: String,
    /// Units currently available.
    pub available: u32,
    /// Units owned in total.
    pub total: u32,
    /// Units needed to get back above the shortage line.
    pub requested: u32,
}

/// A hospital asks pharmacies in its zone to check a medicine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicineRequest {
    /// Requesting hospital.
    pub hospital_id: String,
    /// Zone whose pharmacies should respond.
    pub zone: String,
    /// Disease driving the request.
    pub disease: Disease,
    /// Medicine to check.
    pub medicine: String,
    /// Urgency derived from the outbreak's risk tier.
    pub urgency: Urgency,
}

/// A pharmacy is about to run short of a medicine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicineShortageRisk {
    /// Pharmacy running short.
    pub pharmacy_id: String,
    /// Zone of the pharmacy.
    pub zone: String,
    /// Medicine running short.
    pub medicine: String,
    /// Units left.
    pub stock: u32,
    /// Days of stock left at current usage; `None` when usage is zero.
    pub days_left: Option<f64>,
    /// Urgency derived from `days_left`.
    pub urgency: Urgency,
    /// Criticality of the medicine.
    pub criticality: Criticality,
    /// Units requested.
    pub quantity: u32,
    /// Preferred supplier from the medicine record.
    pub supplier_id: Option<String>,
    /// The pharmacy's pending order for this medicine.
    pub order_id: Option<OrderId>,
}

/// A supplier put an order on a vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyConfirmed {
    /// Shipping supplier.
    pub supplier_id: String,
    /// Order that shipped.
    pub order_id: OrderId,
    /// Who receives the shipment.
    pub requester: Requester,
    /// Destination zone.
    pub zone: String,
    /// Item shipped.
    pub item: String,
    /// Units shipped (may be less than requested).
    pub quantity: u32,
    /// Estimated arrival time.
    pub eta: DateTime<Utc>,
}

/// A supplier's vehicle reached the requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryCompleted {
    /// Shipping supplier.
    pub supplier_id: String,
    /// Order that arrived.
    pub order_id: OrderId,
    /// Who received the shipment.
    pub requester: Requester,
    /// Destination zone.
    pub zone: String,
    /// Item delivered.
    pub item: String,
    /// Units delivered.
    pub quantity: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbreak_kind_is_disease_specific() {
        let event = SimEvent::OutbreakPredicted(OutbreakPredicted {
            disease: Disease::Malaria,
            zone: "Zone-1".to_owned(),
            lab_id: "L1".to_owned(),
            today: 30,
            average: 12.0,
            growth_rate: 1.5,
            risk: RiskTier::Critical,
            confidence: 0.8,
            predicted_cases: 75,
        });
        assert_eq!(event.kind(), EventKind::OutbreakPredicted(Disease::Malaria));
        assert_ne!(event.kind(), EventKind::OutbreakPredicted(Disease::Dengue));
        assert_eq!(event.zone(), "Zone-1");
    }

    #[test]
    fn kind_display_uses_signal_names() {
        assert_eq!(
            EventKind::OutbreakPredicted(Disease::Dengue).to_string(),
            "DENGUE_OUTBREAK_PREDICTED"
        );
        assert_eq!(
            EventKind::MedicineShortageRisk.to_string(),
            "MEDICINE_SHORTAGE_RISK"
        );
    }

    #[test]
    fn all_outbreaks_covers_every_disease() {
        assert_eq!(EventKind::all_outbreaks().count(), Disease::ALL.len());
    }
}
