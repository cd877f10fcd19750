//! Decision thresholds for every agent.
//!
//! The values mirror the `agents` section of `medsim-config.yaml`. Every
//! field has a default, so a partial YAML section only overrides what it
//! names. Ratios are fractions (0.85 means 85%).

use medsim_types::{Criticality, RiskTier};
use serde::{Deserialize, Serialize};

/// Thresholds for all agent kinds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Lab thresholds.
    pub lab: LabConfig,
    /// Hospital thresholds.
    pub hospital: HospitalConfig,
    /// Pharmacy thresholds.
    pub pharmacy: PharmacyConfig,
    /// Supplier thresholds.
    pub supplier: SupplierConfig,
}

/// Outbreak detection and lab capacity thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    /// `today / average` above which a spike is reported (default: 1.5).
    pub spike_ratio: f64,
    /// Growth rate at or above which the tier is Critical (default: 1.5).
    pub critical_growth: f64,
    /// Growth rate at or above which the tier is High (default: 0.8).
    pub high_growth: f64,
    /// Growth rate at or above which the tier is Medium (default: 0.4).
    pub medium_growth: f64,
    /// Utilization above which a capacity warning is raised (default: 0.85).
    pub capacity_warning: f64,
    /// History length that earns the confidence bonus (default: 5).
    pub confidence_history: usize,
    /// Confidence bonus for a long history (default: 0.1).
    pub confidence_bonus: f64,
    /// Upper bound on confidence (default: 0.95).
    pub confidence_cap: f64,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            spike_ratio: 1.5,
            critical_growth: 1.5,
            high_growth: 0.8,
            medium_growth: 0.4,
            capacity_warning: 0.85,
            confidence_history: 5,
            confidence_bonus: 0.1,
            confidence_cap: 0.95,
        }
    }
}

impl LabConfig {
    /// Tier for a growth rate.
    pub fn tier_for(&self, growth: f64) -> RiskTier {
        if growth >= self.critical_growth {
            RiskTier::Critical
        } else if growth >= self.high_growth {
            RiskTier::High
        } else if growth >= self.medium_growth {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    /// Confidence for a tier given `history_len` days of data.
    pub fn confidence_for(&self, tier: RiskTier, history_len: usize) -> f64 {
        let base = match tier {
            RiskTier::Low => 0.5,
            RiskTier::Medium => 0.6,
            RiskTier::High => 0.7,
            RiskTier::Critical => 0.8,
        };
        let bonus = if history_len >= self.confidence_history {
            self.confidence_bonus
        } else {
            0.0
        };
        (base + bonus).min(self.confidence_cap)
    }
}

/// Bed and equipment thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HospitalConfig {
    /// Predicted occupancy above which overload is reported (default: 0.85).
    pub overload_ratio: f64,
    /// Share of the hourly inflow counted as near-term admissions (default: 0.5).
    pub inflow_weight: f64,
    /// Ventilator availability below which a shortage is reported (default: 0.2).
    pub ventilator_shortage: f64,
    /// Availability a ventilator request aims to restore (default: 0.3).
    pub ventilator_target: f64,
    /// ICU utilization above which `ICU_CRITICAL` is logged (default: 0.8).
    pub icu_critical: f64,
    /// Isolation beds reserved on outbreak preparation (default: 5).
    pub isolation_reserve: u32,
    /// General beds reserved on outbreak preparation (default: 10).
    pub general_reserve: u32,
}

impl Default for HospitalConfig {
    fn default() -> Self {
        Self {
            overload_ratio: 0.85,
            inflow_weight: 0.5,
            ventilator_shortage: 0.2,
            ventilator_target: 0.3,
            icu_critical: 0.8,
            isolation_reserve: 5,
            general_reserve: 10,
        }
    }
}

/// Stock monitoring and outbreak scaling thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PharmacyConfig {
    /// Days of stock below which a shortage is reported (default: 2).
    pub shortage_days: f64,
    /// Days below which urgency is Critical (default: 1).
    pub critical_days: f64,
    /// Days below which urgency is Medium (default: 4).
    pub medium_days: f64,
    /// Days of supply ordered for critical medicines (default: 14).
    pub critical_target_days: f64,
    /// Days of supply ordered for high-criticality medicines (default: 10).
    pub high_target_days: f64,
    /// Days of supply ordered for standard medicines (default: 7).
    pub standard_target_days: f64,
    /// Order quantities are rounded up to a multiple of this (default: 10).
    pub order_multiple: u32,
    /// Usage multiplier for a Low outbreak tier (default: 1.2).
    pub low_multiplier: f64,
    /// Usage multiplier for a Medium outbreak tier (default: 1.5).
    pub medium_multiplier: f64,
    /// Usage multiplier for a High outbreak tier (default: 2.0).
    pub high_multiplier: f64,
    /// Usage multiplier for a Critical outbreak tier (default: 2.5).
    pub critical_multiplier: f64,
    /// Usage multiplier for supporting medicines (default: 1.2).
    pub related_multiplier: f64,
    /// Scale usage only when an outbreak's tier rises above the tier
    /// already applied, instead of on every outbreak event (default: false).
    pub damp_repeat_outbreaks: bool,
    /// How long delivered orders stay listed, in milliseconds (default: 60000).
    pub retention_ms: u64,
}

impl Default for PharmacyConfig {
    fn default() -> Self {
        Self {
            shortage_days: 2.0,
            critical_days: 1.0,
            medium_days: 4.0,
            critical_target_days: 14.0,
            high_target_days: 10.0,
            standard_target_days: 7.0,
            order_multiple: 10,
            low_multiplier: 1.2,
            medium_multiplier: 1.5,
            high_multiplier: 2.0,
            critical_multiplier: 2.5,
            related_multiplier: 1.2,
            damp_repeat_outbreaks: false,
            retention_ms: 60_000,
        }
    }
}

impl PharmacyConfig {
    /// Usage multiplier for the primary medicine of an outbreak at `tier`.
    pub const fn outbreak_multiplier(&self, tier: RiskTier) -> f64 {
        match tier {
            RiskTier::Low => self.low_multiplier,
            RiskTier::Medium => self.medium_multiplier,
            RiskTier::High => self.high_multiplier,
            RiskTier::Critical => self.critical_multiplier,
        }
    }

    /// Days of supply an order should restore.
    pub const fn target_days(&self, criticality: Criticality) -> f64 {
        match criticality {
            Criticality::Critical => self.critical_target_days,
            Criticality::High => self.high_target_days,
            Criticality::Standard => self.standard_target_days,
        }
    }
}

/// Fleet and dispatch parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplierConfig {
    /// Inventory level below which `LOW_STOCK` is logged (default: 100).
    pub low_stock: u32,
    /// Queued orders dispatched per tick (default: 3).
    pub dispatch_per_tick: usize,
    /// Travel time with an idle fleet, in milliseconds (default: 15000).
    pub base_delivery_ms: u64,
    /// How long delivered orders stay listed, in milliseconds (default: 60000).
    pub retention_ms: u64,
    /// Priority bonus for hospital requesters (default: 15).
    pub hospital_bonus: u32,
}

impl Default for SupplierConfig {
    fn default() -> Self {
        Self {
            low_stock: 100,
            dispatch_per_tick: 3,
            base_delivery_ms: 15_000,
            retention_ms: 60_000,
            hospital_bonus: 15,
        }
    }
}
