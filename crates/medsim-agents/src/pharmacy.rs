//! Pharmacy agent: stock monitoring, outbreak demand scaling and restocking.
//!
//! A medicine is short when stock is at or below its reorder point or
//! covers less than `shortage_days` of usage. The pharmacy records one
//! open order per medicine before it announces the shortage, so a
//! supplier reacting within the same cascade finds the order in place.

use std::sync::Arc;

use medsim_events::{AgentContext, EventHandler, HandlerError};
use medsim_types::{
    AgentKind, DeliveryCompleted, EventKind, MedicineRequest, MedicineShortageRisk, OrderStatus,
    OutbreakPredicted, Requester, SimEvent, SupplyConfirmed, Urgency,
};
use medsim_world::{Medicine, Order};

use crate::agent::Agent;
use crate::config::{AgentConfig, PharmacyConfig};
use crate::convert::{ceil_count, window_ms};
use crate::error::AgentError;

/// Urgency for a medicine with `days_left` days of stock.
pub fn urgency_for(config: &PharmacyConfig, days_left: Option<f64>) -> Urgency {
    match days_left {
        Some(days) if days < config.critical_days => Urgency::Critical,
        Some(days) if days < config.shortage_days => Urgency::High,
        Some(days) if days < config.medium_days => Urgency::Medium,
        _ => Urgency::Low,
    }
}

/// Units to order so the medicine covers its target days of supply.
///
/// Rounded up to a multiple of `order_multiple`, never less than one
/// multiple.
pub fn order_quantity(config: &PharmacyConfig, medicine: &Medicine) -> u32 {
    let target = config.target_days(medicine.criticality) * medicine.daily_usage;
    let units = ceil_count(target - f64::from(medicine.stock));
    let multiple = config.order_multiple.max(1);
    units.div_ceil(multiple).max(1).saturating_mul(multiple)
}

/// Agent acting for one pharmacy.
#[derive(Debug, Clone)]
pub struct PharmacyAgent {
    id: String,
    config: Arc<AgentConfig>,
    interval_ms: u64,
}

impl PharmacyAgent {
    /// Create the agent for pharmacy `id`.
    pub fn new(id: impl Into<String>, config: Arc<AgentConfig>, interval_ms: u64) -> Self {
        Self {
            id: id.into(),
            config,
            interval_ms,
        }
    }

    fn requester(&self) -> Requester {
        Requester::pharmacy(self.id.as_str())
    }

    /// Evaluate one medicine and announce a shortage if it is short.
    fn check_medicine(&self, item: &str, cx: &mut AgentContext<'_>) {
        let cfg = &self.config.pharmacy;
        let now = cx.now();
        let requester = self.requester();
        let Some(pharmacy) = cx.world.pharmacies.get_mut(&self.id) else {
            return;
        };
        let Some(medicine) = pharmacy.medicines.get(item) else {
            return;
        };

        let days_left = medicine.days_left();
        let short = medicine.stock <= medicine.reorder_point
            || days_left.is_some_and(|days| days < cfg.shortage_days);
        if !short {
            return;
        }

        let urgency = urgency_for(cfg, days_left);
        let criticality = medicine.criticality;
        let stock = medicine.stock;
        let supplier_id = medicine.supplier_id.clone();
        let order = Order::request(
            item,
            order_quantity(cfg, medicine),
            pharmacy.zone.as_str(),
            requester,
            urgency,
            criticality,
            now,
        );
        let added = pharmacy.try_add_pending(order);
        let (order_id, quantity) = pharmacy
            .open_order_for(item)
            .map_or((None, 0), |open| (Some(open.id), open.quantity));
        let zone = pharmacy.zone.clone();

        let days_text = days_left.map_or_else(|| "n/a".to_owned(), |days| format!("{days:.1}"));
        cx.log(
            self.entry(
                now,
                "MED_SHORTAGE",
                format!(
                    "[Pharmacy {}] Shortage risk for {item}: {stock} left (~{days_text} days), urgency {urgency}",
                    self.id
                ),
            )
            .field("zone", zone.as_str())
            .field("item", item)
            .field("stock", stock)
            .field("newOrder", added),
        );
        cx.publish(SimEvent::MedicineShortageRisk(MedicineShortageRisk {
            pharmacy_id: self.id.clone(),
            zone,
            medicine: item.to_owned(),
            stock,
            days_left,
            urgency,
            criticality,
            quantity,
            supplier_id,
            order_id,
        }));
    }

    fn on_outbreak(&self, event: &OutbreakPredicted, cx: &mut AgentContext<'_>) {
        let cfg = &self.config.pharmacy;
        let primary = event.disease.primary_medicine();
        let Some(pharmacy) = cx.world.pharmacies.get_mut(&self.id) else {
            return;
        };
        if pharmacy.zone != event.zone {
            return;
        }

        let applied = pharmacy.outbreak_adjustments.get(&event.disease).copied();
        let target = cfg.outbreak_multiplier(event.risk);
        let (factor, related) = match applied {
            Some(tier) if cfg.damp_repeat_outbreaks => {
                if event.risk <= tier {
                    self.check_medicine(primary, cx);
                    return;
                }
                (target / cfg.outbreak_multiplier(tier), None)
            }
            _ => (target, Some(cfg.related_multiplier)),
        };

        if let Some(medicine) = pharmacy.medicines.get_mut(primary) {
            medicine.scale_usage(factor);
        }
        if let Some(related) = related {
            for item in event.disease.related_medicines() {
                if let Some(medicine) = pharmacy.medicines.get_mut(*item) {
                    medicine.scale_usage(related);
                }
            }
        }
        let tier = applied.map_or(event.risk, |tier| tier.max(event.risk));
        pharmacy.outbreak_adjustments.insert(event.disease, tier);
        let usage = pharmacy
            .medicines
            .get(primary)
            .map_or(0.0, |medicine| medicine.daily_usage);

        let now = cx.now();
        cx.log(
            self.entry(
                now,
                format!("{}_PREP", event.disease.label()),
                format!(
                    "[Pharmacy {}] Raising {primary} usage estimate to {usage:.1}/day for {} ({} risk)",
                    self.id, event.zone, event.risk
                ),
            )
            .field("zone", event.zone.as_str())
            .field("item", primary)
            .field("factor", factor),
        );

        self.check_medicine(primary, cx);
    }

    fn on_request(&self, event: &MedicineRequest, cx: &mut AgentContext<'_>) {
        let same_zone = cx
            .world
            .pharmacies
            .get(&self.id)
            .is_some_and(|pharmacy| pharmacy.zone == event.zone);
        if same_zone {
            self.check_medicine(&event.medicine, cx);
        }
    }

    fn on_confirmed(
        &self,
        event: &SupplyConfirmed,
        cx: &mut AgentContext<'_>,
    ) -> Result<(), AgentError> {
        if event.requester != self.requester() {
            return Ok(());
        }
        let now = cx.now();
        let Some(order) = cx
            .world
            .pharmacies
            .get_mut(&self.id)
            .and_then(|pharmacy| pharmacy.order_mut(event.order_id))
        else {
            return Ok(());
        };
        order.advance(OrderStatus::Dispatched, now)?;
        order.supplier_id = Some(event.supplier_id.clone());
        order.quantity = event.quantity;
        order.eta = Some(event.eta);

        cx.log(
            self.entry(
                now,
                "ORDER_DISPATCHED",
                format!(
                    "[Pharmacy {}] Supplier {} dispatched {} {}, arriving {}",
                    self.id,
                    event.supplier_id,
                    event.quantity,
                    event.item,
                    event.eta.format("%H:%M:%S")
                ),
            )
            .field("item", event.item.as_str())
            .field("orderId", event.order_id.to_string()),
        );
        Ok(())
    }

    fn on_delivery(
        &self,
        event: &DeliveryCompleted,
        cx: &mut AgentContext<'_>,
    ) -> Result<(), AgentError> {
        if event.requester != self.requester() {
            return Ok(());
        }
        let now = cx.now();
        let Some(pharmacy) = cx.world.pharmacies.get_mut(&self.id) else {
            return Ok(());
        };
        let stock = pharmacy.medicines.get_mut(&event.item).map(|medicine| {
            medicine.restock(event.quantity);
            medicine.stock
        });
        if let Some(order) = pharmacy.order_mut(event.order_id) {
            order.advance(OrderStatus::Delivered, now)?;
        }
        let Some(stock) = stock else {
            return Ok(());
        };

        cx.log(
            self.entry(
                now,
                "RESTOCKED",
                format!(
                    "[Pharmacy {}] Received {} {}; stock now {stock}",
                    self.id, event.quantity, event.item
                ),
            )
            .field("item", event.item.as_str())
            .field("quantity", event.quantity),
        );
        Ok(())
    }
}

impl EventHandler for PharmacyAgent {
    fn handle(&self, event: &SimEvent, cx: &mut AgentContext<'_>) -> Result<(), HandlerError> {
        match event {
            SimEvent::OutbreakPredicted(outbreak) => self.on_outbreak(outbreak, cx),
            SimEvent::MedicineRequest(request) => self.on_request(request, cx),
            SimEvent::SupplyConfirmed(confirmed) => self.on_confirmed(confirmed, cx)?,
            SimEvent::DeliveryCompleted(delivery) => self.on_delivery(delivery, cx)?,
            _ => {}
        }
        Ok(())
    }
}

impl Agent for PharmacyAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Pharmacy
    }

    fn entity_id(&self) -> &str {
        &self.id
    }

    fn subscriptions(&self) -> Vec<EventKind> {
        EventKind::all_outbreaks()
            .chain([
                EventKind::MedicineRequest,
                EventKind::SupplyConfirmed,
                EventKind::DeliveryCompleted,
            ])
            .collect()
    }

    fn tick_interval_ms(&self) -> u64 {
        self.interval_ms
    }

    fn tick(&self, cx: &mut AgentContext<'_>) -> Result<(), AgentError> {
        let now = cx.now();
        let retention = window_ms(self.config.pharmacy.retention_ms);
        let Some(pharmacy) = cx.world.pharmacies.get_mut(&self.id) else {
            return Ok(());
        };
        let pruned = pharmacy.prune_delivered(now, retention);
        if pruned > 0 {
            tracing::debug!(pharmacy = %self.id, pruned, "Pruned delivered orders");
        }
        let items: Vec<String> = pharmacy.medicines.keys().cloned().collect();
        for item in &items {
            self.check_medicine(item, cx);
        }
        Ok(())
    }
}
