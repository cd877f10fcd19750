//! Supplier agent: order intake, fleet dispatch and delivery.
//!
//! Orders enter `active_orders` as `Requested`. A free vehicle ships the
//! order at once; otherwise it waits for a later tick, where queued orders
//! are served by priority. Delivery completes on a timer after the ETA,
//! and the delivered order is dropped after the retention window.

use std::cmp::Reverse;
use std::sync::Arc;

use medsim_events::{AgentContext, EventHandler, HandlerError, TimerAction};
use medsim_types::{
    AgentKind, Criticality, DeliveryCompleted, EquipmentShortage, EventKind,
    HospitalOverloadRisk, MedicineShortageRisk, OrderId, OrderStatus, Requester, RequesterKind,
    SimEvent, SupplyConfirmed, Urgency,
};
use medsim_world::{Fleet, Order};

use crate::agent::Agent;
use crate::config::{AgentConfig, SupplierConfig};
use crate::convert::after_ms;
use crate::error::AgentError;
use crate::hospital::VENTILATORS;

/// Dispatch priority of an order: higher ships first.
pub fn priority(config: &SupplierConfig, order: &Order) -> u32 {
    let urgency: u32 = match order.urgency {
        Urgency::Critical => 40,
        Urgency::High => 30,
        Urgency::Medium => 20,
        Urgency::Low => 10,
    };
    let criticality: u32 = match order.criticality {
        Criticality::Critical => 20,
        Criticality::High => 10,
        Criticality::Standard => 0,
    };
    let requester = if order.requester.kind == RequesterKind::Hospital {
        config.hospital_bonus
    } else {
        0
    };
    urgency.saturating_add(criticality).saturating_add(requester)
}

/// Delivery time for the next vehicle: the base time stretched by the
/// share of the fleet already on the road.
pub fn delivery_ms(config: &SupplierConfig, fleet: &Fleet) -> u64 {
    let busy = config
        .base_delivery_ms
        .saturating_mul(u64::from(fleet.in_transit))
        .checked_div(u64::from(fleet.total))
        .unwrap_or(0);
    config.base_delivery_ms.saturating_add(busy)
}

/// Agent acting for one supplier.
#[derive(Debug, Clone)]
pub struct SupplierAgent {
    id: String,
    config: Arc<AgentConfig>,
    interval_ms: u64,
}

impl SupplierAgent {
    /// Create the agent for supplier `id`.
    pub fn new(id: impl Into<String>, config: Arc<AgentConfig>, interval_ms: u64) -> Self {
        Self {
            id: id.into(),
            config,
            interval_ms,
        }
    }

    /// Take an order into `active_orders` and ship it if a vehicle is free.
    fn accept(&self, order: Order, cx: &mut AgentContext<'_>) -> Result<(), AgentError> {
        let now = cx.now();
        let Some(supplier) = cx.world.suppliers.get_mut(&self.id) else {
            return Ok(());
        };
        let stock = supplier.stock_of(&order.item);
        if stock == 0 {
            cx.log(
                self.entry(
                    now,
                    "NO_SUPPLY",
                    format!(
                        "[Supplier {}] Cannot supply {} for {}: out of stock",
                        self.id, order.item, order.requester.id
                    ),
                )
                .field("item", order.item.as_str())
                .field("zone", order.zone.as_str()),
            );
            return Ok(());
        }

        let order_id = order.id;
        let item = order.item.clone();
        let requester = order.requester.id.clone();
        supplier.active_orders.push(order);
        if supplier.fleet.available == 0 {
            cx.log(
                self.entry(
                    now,
                    "FLEET_BUSY",
                    format!(
                        "[Supplier {}] All vehicles out; queued {item} for {requester}",
                        self.id
                    ),
                )
                .field("item", item.as_str())
                .field("orderId", order_id.to_string()),
            );
            return Ok(());
        }
        self.ship(order_id, cx).map(|_| ())
    }

    /// Load a queued order onto a vehicle. Returns whether it shipped.
    fn ship(&self, order_id: OrderId, cx: &mut AgentContext<'_>) -> Result<bool, AgentError> {
        let cfg = &self.config.supplier;
        let now = cx.now();
        let Some(supplier) = cx.world.suppliers.get_mut(&self.id) else {
            return Ok(false);
        };
        let Some((item, wanted)) = supplier
            .active_orders
            .iter()
            .find(|order| order.id == order_id && order.status == OrderStatus::Requested)
            .map(|order| (order.item.clone(), order.quantity))
        else {
            return Ok(false);
        };
        if supplier.fleet.available == 0 {
            return Ok(false);
        }

        let shipped = supplier.take_stock(&item, wanted);
        if shipped == 0 {
            supplier.remove_order(order_id);
            cx.log(
                self.entry(
                    now,
                    "NO_SUPPLY",
                    format!("[Supplier {}] Stock of {item} ran out before dispatch", self.id),
                )
                .field("item", item.as_str())
                .field("orderId", order_id.to_string()),
            );
            return Ok(false);
        }

        let delay = delivery_ms(cfg, &supplier.fleet);
        let eta = after_ms(now, delay);
        supplier.fleet.dispatch();
        let in_transit = supplier.fleet.in_transit;
        let Some(order) = supplier.order_mut(order_id) else {
            return Ok(false);
        };
        order.advance(OrderStatus::Dispatched, now)?;
        order.quantity = shipped;
        order.eta = Some(eta);
        order.supplier_id = Some(self.id.clone());
        let confirmed = SupplyConfirmed {
            supplier_id: self.id.clone(),
            order_id,
            requester: order.requester.clone(),
            zone: order.zone.clone(),
            item,
            quantity: shipped,
            eta,
        };

        cx.log(
            self.entry(
                now,
                "SUPPLY_SENT",
                format!(
                    "[Supplier {}] Dispatched {shipped} {} to {} in {}, ETA {}s",
                    self.id,
                    confirmed.item,
                    confirmed.requester.id,
                    confirmed.zone,
                    delay / 1_000
                ),
            )
            .field("item", confirmed.item.as_str())
            .field("quantity", shipped)
            .field("orderId", order_id.to_string())
            .field("inTransit", in_transit),
        );
        cx.schedule(self.key(), delay, TimerAction::DeliveryArrived { order_id });
        cx.publish(SimEvent::SupplyConfirmed(confirmed));
        Ok(true)
    }

    fn on_shortage(
        &self,
        event: &MedicineShortageRisk,
        cx: &mut AgentContext<'_>,
    ) -> Result<(), AgentError> {
        let Some(supplier) = cx.world.suppliers.get(&self.id) else {
            return Ok(());
        };
        let eligible = match &event.supplier_id {
            Some(id) => *id == self.id,
            None => supplier.serves(&event.zone),
        };
        let order_id = event.order_id.unwrap_or_default();
        if !eligible || cx.world.order_claimed(order_id) {
            return Ok(());
        }

        let order = Order {
            id: order_id,
            ..Order::request(
                event.medicine.as_str(),
                event.quantity,
                event.zone.as_str(),
                Requester::pharmacy(event.pharmacy_id.as_str()),
                event.urgency,
                event.criticality,
                cx.now(),
            )
        };
        self.accept(order, cx)
    }

    fn on_equipment_shortage(
        &self,
        event: &EquipmentShortage,
        cx: &mut AgentContext<'_>,
    ) -> Result<(), AgentError> {
        let requester = Requester::hospital(event.hospital_id.as_str());
        let Some(supplier) = cx.world.suppliers.get(&self.id) else {
            return Ok(());
        };
        if !supplier.serves(&event.zone) || cx.world.open_supply_for(&requester, &event.equipment)
        {
            return Ok(());
        }
        let order = Order::request(
            event.equipment.as_str(),
            event.requested,
            event.zone.as_str(),
            requester,
            Urgency::High,
            Criticality::Critical,
            cx.now(),
        );
        self.accept(order, cx)
    }

    fn on_overload(&self, event: &HospitalOverloadRisk, cx: &mut AgentContext<'_>) {
        let Some(supplier) = cx.world.suppliers.get(&self.id) else {
            return;
        };
        if !supplier.serves(&event.zone) {
            return;
        }
        let ventilators = supplier.stock_of(VENTILATORS);
        let now = cx.now();
        let entry = if ventilators > 0 {
            self.entry(
                now,
                "EQUIPMENT_READY",
                format!(
                    "[Supplier {}] {ventilators} ventilators ready for {} in {}",
                    self.id, event.hospital_id, event.zone
                ),
            )
        } else {
            self.entry(
                now,
                "EQUIPMENT_UNAVAILABLE",
                format!(
                    "[Supplier {}] No ventilators available for {}",
                    self.id, event.hospital_id
                ),
            )
        };
        cx.log(
            entry
                .field("zone", event.zone.as_str())
                .field("hospitalId", event.hospital_id.as_str())
                .field("ventilators", ventilators),
        );
    }

    fn on_arrival(&self, order_id: OrderId, cx: &mut AgentContext<'_>) -> Result<(), AgentError> {
        let now = cx.now();
        let Some(supplier) = cx.world.suppliers.get_mut(&self.id) else {
            return Ok(());
        };
        supplier.fleet.return_vehicle();
        let available = supplier.fleet.available;
        let Some(order) = supplier.order_mut(order_id) else {
            return Ok(());
        };
        order.advance(OrderStatus::Delivered, now)?;
        let delivered = DeliveryCompleted {
            supplier_id: self.id.clone(),
            order_id,
            requester: order.requester.clone(),
            zone: order.zone.clone(),
            item: order.item.clone(),
            quantity: order.quantity,
        };

        cx.log(
            self.entry(
                now,
                "DELIVERY_COMPLETED",
                format!(
                    "[Supplier {}] Delivered {} {} to {}",
                    self.id, delivered.quantity, delivered.item, delivered.requester.id
                ),
            )
            .field("item", delivered.item.as_str())
            .field("orderId", order_id.to_string())
            .field("fleetAvailable", available),
        );
        cx.schedule(
            self.key(),
            self.config.supplier.retention_ms,
            TimerAction::OrderExpired { order_id },
        );
        cx.publish(SimEvent::DeliveryCompleted(delivered));
        Ok(())
    }
}

impl EventHandler for SupplierAgent {
    fn handle(&self, event: &SimEvent, cx: &mut AgentContext<'_>) -> Result<(), HandlerError> {
        match event {
            SimEvent::MedicineShortageRisk(shortage) => self.on_shortage(shortage, cx)?,
            SimEvent::EquipmentShortage(shortage) => self.on_equipment_shortage(shortage, cx)?,
            SimEvent::HospitalOverloadRisk(risk) => self.on_overload(risk, cx),
            _ => {}
        }
        Ok(())
    }
}

impl Agent for SupplierAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Supplier
    }

    fn entity_id(&self) -> &str {
        &self.id
    }

    fn subscriptions(&self) -> Vec<EventKind> {
        vec![
            EventKind::MedicineShortageRisk,
            EventKind::HospitalOverloadRisk,
            EventKind::EquipmentShortage,
        ]
    }

    fn tick_interval_ms(&self) -> u64 {
        self.interval_ms
    }

    fn tick(&self, cx: &mut AgentContext<'_>) -> Result<(), AgentError> {
        let cfg = &self.config.supplier;
        let Some(supplier) = cx.world.suppliers.get(&self.id) else {
            return Ok(());
        };
        let low: Vec<(String, u32)> = supplier
            .inventory
            .iter()
            .filter(|(_, units)| **units < cfg.low_stock)
            .map(|(item, units)| (item.clone(), *units))
            .collect();
        let mut queued: Vec<(u32, OrderId)> = supplier
            .active_orders
            .iter()
            .filter(|order| order.status == OrderStatus::Requested)
            .map(|order| (priority(cfg, order), order.id))
            .collect();
        queued.sort_by_key(|(score, _)| Reverse(*score));

        let now = cx.now();
        for (item, units) in low {
            cx.log(
                self.entry(
                    now,
                    "LOW_STOCK",
                    format!("[Supplier {}] Low stock: {item} ({units} units)", self.id),
                )
                .field("item", item.as_str())
                .field("units", units),
            );
        }

        let mut shipped = 0_usize;
        for (_, order_id) in queued {
            if shipped >= cfg.dispatch_per_tick {
                break;
            }
            if self.ship(order_id, cx)? {
                shipped = shipped.saturating_add(1);
            }
        }
        Ok(())
    }

    fn on_timer(&self, action: TimerAction, cx: &mut AgentContext<'_>) -> Result<(), AgentError> {
        match action {
            TimerAction::DeliveryArrived { order_id } => self.on_arrival(order_id, cx),
            TimerAction::OrderExpired { order_id } => {
                let removed = cx
                    .world
                    .suppliers
                    .get_mut(&self.id)
                    .and_then(|supplier| supplier.remove_order(order_id));
                if removed.is_some() {
                    tracing::debug!(supplier = %self.id, %order_id, "Expired delivered order");
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use medsim_events::{EventBus, LogBuffer, TimerRequest};
    use medsim_world::{Supplier, WorldState};

    use super::*;

    fn order(urgency: Urgency, criticality: Criticality, requester: Requester) -> Order {
        Order::request("antiviral", 10, "Zone-1", requester, urgency, criticality, Utc::now())
    }

    #[test]
    fn hospital_requests_outrank_pharmacy_requests() {
        let cfg = SupplierConfig::default();
        let pharmacy = order(Urgency::High, Criticality::High, Requester::pharmacy("P1"));
        let hospital = order(Urgency::High, Criticality::High, Requester::hospital("H1"));
        assert_eq!(priority(&cfg, &pharmacy), 40);
        assert_eq!(priority(&cfg, &hospital), 55);
        let critical = order(Urgency::Critical, Criticality::Critical, Requester::pharmacy("P1"));
        assert_eq!(priority(&cfg, &critical), 60);
    }

    #[test]
    fn delivery_time_stretches_with_fleet_load() {
        let cfg = SupplierConfig::default();
        assert_eq!(delivery_ms(&cfg, &Fleet::idle(5)), 15_000);
        let busy = Fleet {
            total: 4,
            available: 2,
            in_transit: 2,
        };
        assert_eq!(delivery_ms(&cfg, &busy), 22_500);
        assert_eq!(delivery_ms(&cfg, &Fleet::default()), 15_000);
    }

    fn world() -> WorldState {
        let mut supplier = Supplier {
            zone: "Zone-1".to_owned(),
            fleet: Fleet::idle(1),
            ..Supplier::default()
        };
        supplier.inventory.insert("antiviral".to_owned(), 500);
        let mut world = WorldState::default();
        world.suppliers.insert("S1".to_owned(), supplier);
        world
    }

    fn shortage(order_id: OrderId) -> SimEvent {
        SimEvent::MedicineShortageRisk(MedicineShortageRisk {
            pharmacy_id: "P1".to_owned(),
            zone: "Zone-1".to_owned(),
            medicine: "antiviral".to_owned(),
            stock: 5,
            days_left: Some(0.5),
            urgency: Urgency::Critical,
            criticality: Criticality::Critical,
            quantity: 120,
            supplier_id: None,
            order_id: Some(order_id),
        })
    }

    #[test]
    fn second_order_waits_for_a_vehicle() {
        let mut world = world();
        let bus = EventBus::new();
        let sink = LogBuffer::new(32);
        let mut timers: Vec<TimerRequest> = Vec::new();
        let agent = SupplierAgent::new("S1", Arc::new(AgentConfig::default()), 10_000);
        {
            let mut cx = AgentContext::new(&mut world, &bus, &sink, &mut timers, Utc::now());
            agent.handle(&shortage(OrderId::new()), &mut cx).unwrap();
            agent.handle(&shortage(OrderId::new()), &mut cx).unwrap();
        }
        let supplier = &world.suppliers["S1"];
        assert_eq!(supplier.active_orders.len(), 2);
        assert_eq!(supplier.active_orders[0].status, OrderStatus::Dispatched);
        assert_eq!(supplier.active_orders[1].status, OrderStatus::Requested);
        assert_eq!(supplier.stock_of("antiviral"), 380);
        assert_eq!(timers.len(), 1);
        assert!(sink.contains_type("FLEET_BUSY"));
    }

    #[test]
    fn claimed_order_is_not_taken_twice() {
        let mut world = world();
        let bus = EventBus::new();
        let sink = LogBuffer::new(32);
        let mut timers: Vec<TimerRequest> = Vec::new();
        let agent = SupplierAgent::new("S1", Arc::new(AgentConfig::default()), 10_000);
        let id = OrderId::new();
        {
            let mut cx = AgentContext::new(&mut world, &bus, &sink, &mut timers, Utc::now());
            agent.handle(&shortage(id), &mut cx).unwrap();
            agent.handle(&shortage(id), &mut cx).unwrap();
        }
        assert_eq!(world.suppliers["S1"].active_orders.len(), 1);
    }

    #[test]
    fn empty_inventory_logs_no_supply() {
        let mut world = world();
        world.suppliers.get_mut("S1").unwrap().inventory.clear();
        let bus = EventBus::new();
        let sink = LogBuffer::new(32);
        let mut timers: Vec<TimerRequest> = Vec::new();
        let agent = SupplierAgent::new("S1", Arc::new(AgentConfig::default()), 10_000);
        {
            let mut cx = AgentContext::new(&mut world, &bus, &sink, &mut timers, Utc::now());
            agent.handle(&shortage(OrderId::new()), &mut cx).unwrap();
        }
        assert!(world.suppliers["S1"].active_orders.is_empty());
        assert!(sink.contains_type("NO_SUPPLY"));
    }
}
