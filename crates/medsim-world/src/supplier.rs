//! Suppliers, their inventory and delivery fleet.

use std::collections::BTreeMap;

use medsim_types::OrderId;
use serde::{Deserialize, Serialize};

use crate::order::Order;

/// Delivery vehicles of one supplier.
///
/// `available + in_transit` never exceeds `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fleet {
    /// Vehicles owned.
    pub total: u32,
    /// Vehicles idle at the depot.
    pub available: u32,
    /// Vehicles out on delivery.
    pub in_transit: u32,
}

impl Fleet {
    /// A fleet with every vehicle at the depot.
    pub const fn idle(total: u32) -> Self {
        Self {
            total,
            available: total,
            in_transit: 0,
        }
    }

    /// Send one vehicle out. Returns `false` when none is free.
    pub const fn dispatch(&mut self) -> bool {
        if self.available == 0 {
            return false;
        }
        self.available = self.available.saturating_sub(1);
        self.in_transit = self.in_transit.saturating_add(1);
        true
    }

    /// Bring one vehicle back to the depot.
    pub fn return_vehicle(&mut self) {
        if self.in_transit == 0 {
            return;
        }
        self.in_transit = self.in_transit.saturating_sub(1);
        self.available = self.available.saturating_add(1).min(self.total);
    }

    /// Share of vehicles on the road, or 0 with no fleet.
    pub fn load(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.in_transit) / f64::from(self.total)
    }
}

/// A medical supplier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Supplier {
    /// Display name.
    pub name: String,
    /// Depot zone.
    pub zone: String,
    /// Units in stock by item.
    pub inventory: BTreeMap<String, u32>,
    /// Delivery vehicles.
    pub fleet: Fleet,
    /// Orders queued or in transit.
    pub active_orders: Vec<Order>,
    /// Zones served; empty means the whole city.
    pub serves_zones: Vec<String>,
}

impl Supplier {
    /// Whether the supplier delivers to `zone`.
    pub fn serves(&self, zone: &str) -> bool {
        self.serves_zones.is_empty() || self.serves_zones.iter().any(|z| z == zone)
    }

    /// Units of `item` in stock.
    pub fn stock_of(&self, item: &str) -> u32 {
        self.inventory.get(item).copied().unwrap_or(0)
    }

    /// Remove up to `wanted` units of `item`; returns the units taken.
    ///
    /// Inventory never goes negative: a short stock yields a partial
    /// shipment, an unknown item yields 0.
    pub fn take_stock(&mut self, item: &str, wanted: u32) -> u32 {
        let Some(stock) = self.inventory.get_mut(item) else {
            return 0;
        };
        let taken = wanted.min(*stock);
        *stock = stock.saturating_sub(taken);
        taken
    }

    /// Look up one of this supplier's orders.
    pub fn order_mut(&mut self, id: OrderId) -> Option<&mut Order> {
        self.active_orders.iter_mut().find(|order| order.id == id)
    }

    /// Whether the supplier is already handling order `id`.
    pub fn has_order(&self, id: OrderId) -> bool {
        self.active_orders.iter().any(|order| order.id == id)
    }

    /// Remove order `id`, returning it.
    pub fn remove_order(&mut self, id: OrderId) -> Option<Order> {
        let index = self.active_orders.iter().position(|order| order.id == id)?;
        Some(self.active_orders.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_stock_caps_at_inventory() {
        let mut supplier = Supplier::default();
        supplier.inventory.insert("antiviral".to_owned(), 30);
        assert_eq!(supplier.take_stock("antiviral", 50), 30);
        assert_eq!(supplier.stock_of("antiviral"), 0);
        assert_eq!(supplier.take_stock("antiviral", 5), 0);
        assert_eq!(supplier.take_stock("unknown", 5), 0);
    }

    #[test]
    fn fleet_dispatch_and_return_conserve_vehicles() {
        let mut fleet = Fleet::idle(2);
        assert!(fleet.dispatch());
        assert!(fleet.dispatch());
        assert!(!fleet.dispatch());
        assert_eq!((fleet.available, fleet.in_transit), (0, 2));
        fleet.return_vehicle();
        fleet.return_vehicle();
        fleet.return_vehicle();
        assert_eq!((fleet.available, fleet.in_transit), (2, 0));
    }

    #[test]
    fn empty_zone_list_serves_everyone() {
        let mut supplier = Supplier::default();
        assert!(supplier.serves("Zone-9"));
        supplier.serves_zones = vec!["Zone-1".to_owned()];
        assert!(supplier.serves("Zone-1"));
        assert!(!supplier.serves("Zone-2"));
    }
}
