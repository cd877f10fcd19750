//! Pharmacies, their medicine stock and pending restock orders.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use medsim_types::{Criticality, Disease, OrderId, RiskTier};
use serde::{Deserialize, Serialize};

use crate::order::Order;

/// One medicine line in a pharmacy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Medicine {
    /// Display name.
    pub name: String,
    /// Category, e.g. `Antivirals`.
    pub category: String,
    /// Units on the shelf.
    pub stock: u32,
    /// Estimated units dispensed per day.
    pub daily_usage: f64,
    /// Stock level at which the pharmacy reorders.
    pub reorder_point: u32,
    /// Clinical criticality.
    pub criticality: Criticality,
    /// Preferred supplier.
    pub supplier_id: Option<String>,
}

impl Medicine {
    /// Days of stock left at current usage; `None` when usage is zero.
    pub fn days_left(&self) -> Option<f64> {
        (self.daily_usage > 0.0).then(|| f64::from(self.stock) / self.daily_usage)
    }

    /// Multiply the usage estimate, never letting it go negative.
    pub fn scale_usage(&mut self, factor: f64) {
        self.daily_usage = (self.daily_usage * factor).max(0.0);
    }

    /// Add delivered units.
    pub const fn restock(&mut self, units: u32) {
        self.stock = self.stock.saturating_add(units);
    }
}

/// A pharmacy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pharmacy {
    /// Display name.
    pub name: String,
    /// Zone the pharmacy serves.
    pub zone: String,
    /// Medicines keyed by item name, e.g. `antiviral`.
    pub medicines: BTreeMap<String, Medicine>,
    /// Restock orders raised by this pharmacy.
    pub pending_orders: Vec<Order>,
    /// Highest outbreak tier seen per disease.
    pub outbreak_adjustments: BTreeMap<Disease, RiskTier>,
}

impl Pharmacy {
    /// The open (not yet delivered) order for `item`, if any.
    pub fn open_order_for(&self, item: &str) -> Option<&Order> {
        self.pending_orders
            .iter()
            .find(|order| order.item == item && order.is_open())
    }

    /// Append `order` unless an open order for the same item exists.
    ///
    /// Returns `true` when the order was added.
    pub fn try_add_pending(&mut self, order: Order) -> bool {
        if self.open_order_for(&order.item).is_some() {
            return false;
        }
        self.pending_orders.push(order);
        true
    }

    /// Look up one of this pharmacy's orders.
    pub fn order_mut(&mut self, id: OrderId) -> Option<&mut Order> {
        self.pending_orders.iter_mut().find(|order| order.id == id)
    }

    /// Drop delivered orders whose delivery is older than `retention`.
    ///
    /// Returns how many orders were removed.
    pub fn prune_delivered(&mut self, now: DateTime<Utc>, retention: Duration) -> usize {
        let before = self.pending_orders.len();
        self.pending_orders.retain(|order| {
            order
                .delivered_at
                .is_none_or(|at| now.signed_duration_since(at) < retention)
        });
        before.saturating_sub(self.pending_orders.len())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use medsim_types::{OrderStatus, Requester, Urgency};

    use super::*;

    fn order(item: &str) -> Order {
        Order::request(
            item,
            40,
            "Zone-2",
            Requester::pharmacy("P1"),
            Urgency::High,
            Criticality::Critical,
            Utc::now(),
        )
    }

    #[test]
    fn only_one_open_order_per_item() {
        let mut pharmacy = Pharmacy::default();
        assert!(pharmacy.try_add_pending(order("antiviral")));
        assert!(!pharmacy.try_add_pending(order("antiviral")));
        assert!(pharmacy.try_add_pending(order("ors")));
        assert_eq!(pharmacy.pending_orders.len(), 2);
    }

    #[test]
    fn delivered_order_frees_the_slot() {
        let mut pharmacy = Pharmacy::default();
        let first = order("antiviral");
        let id = first.id;
        pharmacy.try_add_pending(first);
        let now = Utc::now();
        let pending = pharmacy.order_mut(id).unwrap();
        pending.advance(OrderStatus::Dispatched, now).unwrap();
        pending.advance(OrderStatus::Delivered, now).unwrap();
        assert!(pharmacy.try_add_pending(order("antiviral")));
    }

    #[test]
    fn prune_respects_retention() {
        let mut pharmacy = Pharmacy::default();
        let first = order("antiviral");
        let id = first.id;
        pharmacy.try_add_pending(first);
        let delivered = Utc::now();
        let pending = pharmacy.order_mut(id).unwrap();
        pending.advance(OrderStatus::Dispatched, delivered).unwrap();
        pending.advance(OrderStatus::Delivered, delivered).unwrap();

        let retention = Duration::seconds(60);
        assert_eq!(pharmacy.prune_delivered(delivered + Duration::seconds(30), retention), 0);
        assert_eq!(pharmacy.prune_delivered(delivered + Duration::seconds(61), retention), 1);
        assert!(pharmacy.pending_orders.is_empty());
    }

    #[test]
    fn days_left_is_unbounded_without_usage() {
        let medicine = Medicine {
            stock: 50,
            ..Medicine::default()
        };
        assert!(medicine.days_left().is_none());
        let medicine = Medicine {
            stock: 12,
            daily_usage: 12.5,
            ..Medicine::default()
        };
        assert!(medicine.days_left().is_some_and(|d| d < 1.0));
    }
}
