//! Enumeration types for the MedSim simulation.
//!
//! Diseases, hazards, tiers and status values shared by the world model,
//! the event bus payloads and the dashboard bindings.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Diseases and hazards
// ---------------------------------------------------------------------------

/// A disease tracked by diagnostic labs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Disease {
    /// Mosquito-borne dengue fever.
    Dengue,
    /// Mosquito-borne malaria.
    Malaria,
    /// Respiratory COVID-19.
    Covid,
}

impl Disease {
    /// Every tracked disease, in a stable order.
    pub const ALL: [Self; 3] = [Self::Dengue, Self::Malaria, Self::Covid];

    /// The medicine whose demand moves first when this disease surges.
    pub const fn primary_medicine(self) -> &'static str {
        match self {
            Self::Dengue => "dengue_med",
            Self::Malaria => "antimalarial",
            Self::Covid => "antiviral",
        }
    }

    /// Supporting medicines whose demand rises alongside the primary one.
    pub const fn related_medicines(self) -> &'static [&'static str] {
        match self {
            Self::Dengue => &["paracetamol", "ors"],
            Self::Malaria => &["paracetamol"],
            Self::Covid => &["paracetamol", "ors"],
        }
    }

    /// Upper-case label used in event and log type names.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dengue => "DENGUE",
            Self::Malaria => "MALARIA",
            Self::Covid => "COVID",
        }
    }
}

impl core::fmt::Display for Disease {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Dengue => "dengue",
            Self::Malaria => "malaria",
            Self::Covid => "covid",
        };
        f.write_str(name)
    }
}

/// A hazard the city tracks a per-zone risk tier for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Hazard {
    /// Dengue transmission.
    Dengue,
    /// Malaria transmission.
    Malaria,
    /// COVID transmission.
    Covid,
    /// Extreme heat.
    Heatwave,
}

impl From<Disease> for Hazard {
    fn from(disease: Disease) -> Self {
        match disease {
            Disease::Dengue => Self::Dengue,
            Disease::Malaria => Self::Malaria,
            Disease::Covid => Self::Covid,
        }
    }
}

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

/// Four-level risk tier derived from growth rates or occupancy ratios.
///
/// Ordered from least to most severe so tiers can be compared with `>`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RiskTier {
    /// Background level.
    #[default]
    Low,
    /// Noticeable rise.
    Medium,
    /// Outbreak-level rise.
    High,
    /// Rise beyond planning capacity.
    Critical,
}

impl RiskTier {
    /// Whether the tier counts as "high risk" for city summaries.
    pub const fn is_elevated(self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }

    /// Upper-case label used in log type names.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl core::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        })
    }
}

/// Urgency attached to supply requests and orders.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Urgency {
    /// Can wait for the next routine delivery.
    #[default]
    Low,
    /// Should ship within the day.
    Medium,
    /// Should ship on the next free vehicle.
    High,
    /// Stock runs out in under a day.
    Critical,
}

impl core::fmt::Display for Urgency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        })
    }
}

impl From<RiskTier> for Urgency {
    fn from(tier: RiskTier) -> Self {
        match tier {
            RiskTier::Low => Self::Low,
            RiskTier::Medium => Self::Medium,
            RiskTier::High => Self::High,
            RiskTier::Critical => Self::Critical,
        }
    }
}

/// Clinical criticality of a medicine or equipment item.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Criticality {
    /// Routine stock.
    #[default]
    Standard,
    /// Needed for active treatment.
    High,
    /// Life-saving; shortages are never acceptable.
    Critical,
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// Lifecycle status of a supply order.
///
/// Transitions are monotonic: `Requested -> Dispatched -> Delivered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum OrderStatus {
    /// Raised but not yet on a vehicle.
    Requested,
    /// On a vehicle, with an ETA.
    Dispatched,
    /// Received by the requester.
    Delivered,
}

impl OrderStatus {
    /// The status that legally follows this one, if any.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Requested => Some(Self::Dispatched),
            Self::Dispatched => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }
}

/// Kind of entity that raised an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RequesterKind {
    /// A hospital (equipment or ward supplies).
    Hospital,
    /// A pharmacy (medicine restock).
    Pharmacy,
}

// ---------------------------------------------------------------------------
// Hospitals
// ---------------------------------------------------------------------------

/// Category of hospital bed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum BedKind {
    /// General ward beds.
    General,
    /// Intensive care beds.
    Icu,
    /// Isolation ward beds.
    Isolation,
}

// ---------------------------------------------------------------------------
// Agents and alerts
// ---------------------------------------------------------------------------

/// Role of the component that produced a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum AgentKind {
    /// Diagnostic lab agent.
    Lab,
    /// Hospital agent.
    Hospital,
    /// Pharmacy agent.
    Pharmacy,
    /// Supplier agent.
    Supplier,
    /// City coordinator agent.
    City,
    /// The coordination substrate itself (bus, scheduler, scenarios).
    System,
}

impl core::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Category of a city alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export, export_to = "bindings/")]
pub enum AlertType {
    /// A lab predicted a disease outbreak.
    DiseaseOutbreak,
    /// A hospital is about to run out of beds.
    HospitalOverload,
    /// A pharmacy is about to run out of a medicine.
    MedicineShortage,
}
