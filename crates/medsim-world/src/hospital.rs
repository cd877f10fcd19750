//! Hospitals, bed pools and equipment pools.
//!
//! Every count is clamped at the mutation site: occupied beds stay within
//! `[0, total]` and available equipment within `[0, total]`, whatever
//! delta a scenario or agent applies.

use std::collections::{BTreeMap, BTreeSet};

use medsim_types::{BedKind, Disease};
use serde::{Deserialize, Serialize};

/// Beds of one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BedPool {
    /// Beds in the pool.
    pub total: u32,
    /// Beds currently occupied.
    pub occupied: u32,
}

impl BedPool {
    /// Create a pool, clamping `occupied` to `total`.
    pub fn new(total: u32, occupied: u32) -> Self {
        Self {
            total,
            occupied: occupied.min(total),
        }
    }

    /// Free beds.
    pub const fn available(&self) -> u32 {
        self.total.saturating_sub(self.occupied)
    }

    /// `occupied / total`, or 0 for an empty pool.
    pub fn utilization(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.occupied) / f64::from(self.total)
    }

    /// Add (or with a negative delta, release) occupied beds, clamped.
    ///
    /// Returns the new occupied count.
    pub fn apply_delta(&mut self, delta: i64) -> u32 {
        let next = i64::from(self.occupied)
            .saturating_add(delta)
            .clamp(0, i64::from(self.total));
        self.occupied = u32::try_from(next).unwrap_or(self.total);
        self.occupied
    }

    /// Set the occupied count directly, clamped to `total`.
    pub fn set_occupied(&mut self, occupied: u32) {
        self.occupied = occupied.min(self.total);
    }

    /// Occupy up to `wanted` free beds; returns how many were taken.
    pub fn reserve(&mut self, wanted: u32) -> u32 {
        let taken = wanted.min(self.available());
        self.occupied = self.occupied.saturating_add(taken);
        taken
    }
}

/// Units of one equipment item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentPool {
    /// Units owned.
    pub total: u32,
    /// Units not in use.
    pub available: u32,
}

impl EquipmentPool {
    /// Create a pool, clamping `available` to `total`.
    pub fn new(total: u32, available: u32) -> Self {
        Self {
            total,
            available: available.min(total),
        }
    }

    /// `available / total`, or 0 for an empty pool.
    pub fn availability(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.available) / f64::from(self.total)
    }

    /// Put up to `wanted` units into use; returns how many were taken.
    pub fn allocate(&mut self, wanted: u32) -> u32 {
        let taken = wanted.min(self.available);
        self.available = self.available.saturating_sub(taken);
        taken
    }

    /// Return units to the pool, never exceeding `total`.
    pub fn release(&mut self, units: u32) {
        self.available = self.available.saturating_add(units).min(self.total);
    }

    /// Add newly delivered units: both `total` and `available` grow.
    pub const fn receive(&mut self, units: u32) {
        self.total = self.total.saturating_add(units);
        self.available = self.available.saturating_add(units);
    }
}

/// A hospital and its capacity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hospital {
    /// Display name.
    pub name: String,
    /// Zone the hospital serves.
    pub zone: String,
    /// Bed pools by category.
    pub beds: BTreeMap<BedKind, BedPool>,
    /// Equipment pools by item, e.g. `ventilators`.
    pub equipment: BTreeMap<String, EquipmentPool>,
    /// Expected new patients per hour.
    pub patient_inflow_per_hour: f64,
    /// Diseases the hospital has prepared for.
    pub prepared_for: BTreeSet<Disease>,
    /// Beds occupied by outbreak preparation, by category.
    pub reserved_beds: BTreeMap<BedKind, u32>,
}

impl Hospital {
    /// Beds across all categories.
    pub fn total_beds(&self) -> u32 {
        self.beds
            .values()
            .fold(0_u32, |acc, pool| acc.saturating_add(pool.total))
    }

    /// Occupied beds across all categories.
    pub fn occupied_beds(&self) -> u32 {
        self.beds
            .values()
            .fold(0_u32, |acc, pool| acc.saturating_add(pool.occupied))
    }

    /// Occupied over total beds, or 0 with no beds.
    pub fn load(&self) -> f64 {
        let total = self.total_beds();
        if total == 0 {
            return 0.0;
        }
        f64::from(self.occupied_beds()) / f64::from(total)
    }

    /// Reserve up to `wanted` beds of `kind` and record the reservation.
    ///
    /// Returns how many beds were actually reserved (0 if the hospital has
    /// no pool of that kind).
    pub fn reserve_beds(&mut self, kind: BedKind, wanted: u32) -> u32 {
        let Some(pool) = self.beds.get_mut(&kind) else {
            return 0;
        };
        let taken = pool.reserve(wanted);
        if taken > 0 {
            let entry = self.reserved_beds.entry(kind).or_insert(0);
            *entry = entry.saturating_add(taken);
        }
        taken
    }

    /// Add delivered equipment units.
    pub fn receive_equipment(&mut self, item: &str, units: u32) {
        self.equipment
            .entry(item.to_owned())
            .or_default()
            .receive(units);
    }
}
