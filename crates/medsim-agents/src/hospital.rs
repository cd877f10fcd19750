//! Hospital agent: bed overload, equipment shortage and outbreak preparation.

use std::sync::Arc;

use medsim_events::{AgentContext, EventHandler, HandlerError};
use medsim_types::{
    AgentKind, BedKind, DeliveryCompleted, EquipmentShortage, EventKind, HospitalOverloadRisk,
    MedicineRequest, OutbreakPredicted, Requester, SimEvent, Urgency,
};

use crate::agent::Agent;
use crate::config::AgentConfig;
use crate::convert::ceil_count;
use crate::error::AgentError;

/// Equipment item watched for shortages.
pub const VENTILATORS: &str = "ventilators";

/// Agent acting for one hospital.
#[derive(Debug, Clone)]
pub struct HospitalAgent {
    id: String,
    config: Arc<AgentConfig>,
    interval_ms: u64,
}

impl HospitalAgent {
    /// Create the agent for hospital `id`.
    pub fn new(id: impl Into<String>, config: Arc<AgentConfig>, interval_ms: u64) -> Self {
        Self {
            id: id.into(),
            config,
            interval_ms,
        }
    }

    fn on_outbreak(&self, event: &OutbreakPredicted, cx: &mut AgentContext<'_>) {
        let cfg = &self.config.hospital;
        let Some(hospital) = cx.world.hospitals.get_mut(&self.id) else {
            return;
        };
        if hospital.zone != event.zone {
            return;
        }

        hospital.prepared_for.insert(event.disease);
        let isolation = hospital.reserve_beds(BedKind::Isolation, cfg.isolation_reserve);
        let general = hospital.reserve_beds(BedKind::General, cfg.general_reserve);
        let zone = hospital.zone.clone();

        let now = cx.now();
        cx.log(
            self.entry(
                now,
                format!("{}_PREP", event.disease.label()),
                format!(
                    "[Hospital {}] Preparing {} ward for {zone}: reserved {isolation} isolation and {general} general beds",
                    self.id, event.disease,
                ),
            )
            .field("zone", zone.as_str())
            .field("risk", event.risk.to_string())
            .field("isolationReserved", isolation)
            .field("generalReserved", general),
        );

        cx.publish(SimEvent::MedicineRequest(MedicineRequest {
            hospital_id: self.id.clone(),
            zone,
            disease: event.disease,
            medicine: event.disease.primary_medicine().to_owned(),
            urgency: Urgency::from(event.risk),
        }));
    }

    fn on_delivery(&self, event: &DeliveryCompleted, cx: &mut AgentContext<'_>) {
        if event.requester != Requester::hospital(self.id.as_str()) {
            return;
        }
        let Some(hospital) = cx.world.hospitals.get_mut(&self.id) else {
            return;
        };
        hospital.receive_equipment(&event.item, event.quantity);
        let now = cx.now();
        cx.log(
            self.entry(
                now,
                "EQUIPMENT_RECEIVED",
                format!(
                    "[Hospital {}] Received {} {} from Supplier {}",
                    self.id, event.quantity, event.item, event.supplier_id
                ),
            )
            .field("item", event.item.as_str())
            .field("quantity", event.quantity),
        );
    }
}

impl EventHandler for HospitalAgent {
    fn handle(&self, event: &SimEvent, cx: &mut AgentContext<'_>) -> Result<(), HandlerError> {
        match event {
            SimEvent::OutbreakPredicted(outbreak) => self.on_outbreak(outbreak, cx),
            SimEvent::DeliveryCompleted(delivery) => self.on_delivery(delivery, cx),
            _ => {}
        }
        Ok(())
    }
}

impl Agent for HospitalAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Hospital
    }

    fn entity_id(&self) -> &str {
        &self.id
    }

    fn subscriptions(&self) -> Vec<EventKind> {
        EventKind::all_outbreaks()
            .chain([EventKind::DeliveryCompleted])
            .collect()
    }

    fn tick_interval_ms(&self) -> u64 {
        self.interval_ms
    }

    fn tick(&self, cx: &mut AgentContext<'_>) -> Result<(), AgentError> {
        let Some(hospital) = cx.world.hospitals.get(&self.id) else {
            return Ok(());
        };
        let cfg = &self.config.hospital;
        let zone = hospital.zone.clone();

        let capacity = hospital.total_beds();
        let predicted_occupied =
            f64::from(hospital.occupied_beds()) + cfg.inflow_weight * hospital.patient_inflow_per_hour;
        let overload = (capacity > 0)
            .then(|| predicted_occupied / f64::from(capacity))
            .filter(|occupancy| *occupancy > cfg.overload_ratio)
            .map(|occupancy| HospitalOverloadRisk {
                hospital_id: self.id.clone(),
                zone: zone.clone(),
                predicted_occupied,
                capacity,
                occupancy,
            });

        let shortage = hospital
            .equipment
            .get(VENTILATORS)
            .filter(|pool| pool.total > 0 && pool.availability() < cfg.ventilator_shortage)
            .map(|pool| {
                let target = ceil_count(cfg.ventilator_target * f64::from(pool.total));
                EquipmentShortage {
                    hospital_id: self.id.clone(),
                    zone: zone.clone(),
                    equipment: VENTILATORS.to_owned(),
                    available: pool.available,
                    total: pool.total,
                    requested: target.saturating_sub(pool.available).max(1),
                }
            });

        let icu_utilization = hospital
            .beds
            .get(&BedKind::Icu)
            .filter(|pool| pool.total > 0)
            .map(medsim_world::BedPool::utilization)
            .filter(|utilization| *utilization > cfg.icu_critical);

        if let Some(risk) = overload {
            let now = cx.now();
            cx.log(
                self.entry(
                    now,
                    "OVERLOAD_RISK",
                    format!(
                        "[Hospital {}] Overload risk: predicted {:.0}% beds used",
                        self.id,
                        risk.occupancy * 100.0
                    ),
                )
                .field("zone", zone.as_str())
                .field("occupancy", risk.occupancy),
            );
            cx.publish(SimEvent::HospitalOverloadRisk(risk));
        }

        if let Some(shortage) = shortage {
            let now = cx.now();
            cx.log(
                self.entry(
                    now,
                    "EQUIPMENT_SHORTAGE",
                    format!(
                        "[Hospital {}] Only {}/{} {} available, requesting {}",
                        self.id,
                        shortage.available,
                        shortage.total,
                        shortage.equipment,
                        shortage.requested
                    ),
                )
                .field("zone", zone.as_str())
                .field("item", shortage.equipment.as_str())
                .field("requested", shortage.requested),
            );
            cx.publish(SimEvent::EquipmentShortage(shortage));
        }

        if let Some(utilization) = icu_utilization {
            let now = cx.now();
            cx.log(
                self.entry(
                    now,
                    "ICU_CRITICAL",
                    format!(
                        "[Hospital {}] ICU at {:.0}% occupancy",
                        self.id,
                        utilization * 100.0
                    ),
                )
                .field("zone", zone.as_str())
                .field("utilization", utilization),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use medsim_events::{EventBus, LogBuffer, TimerRequest};
    use medsim_world::{BedPool, EquipmentPool, Hospital, WorldState};

    use super::*;

    fn world_with(occupied: u32, inflow: f64) -> WorldState {
        let mut hospital = Hospital {
            zone: "Zone-1".to_owned(),
            patient_inflow_per_hour: inflow,
            ..Hospital::default()
        };
        hospital
            .beds
            .insert(BedKind::General, BedPool::new(10_000, occupied));
        let mut world = WorldState::default();
        world.hospitals.insert("H1".to_owned(), hospital);
        world
    }

    fn overload_events(world: &mut WorldState) -> usize {
        let bus = EventBus::new();
        let sink = LogBuffer::new(16);
        let seen = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        bus.subscribe_fn(EventKind::HospitalOverloadRisk, move |_, _| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        });
        let mut timers: Vec<TimerRequest> = Vec::new();
        let mut cx = AgentContext::new(world, &bus, &sink, &mut timers, Utc::now());
        let agent = HospitalAgent::new("H1", Arc::new(AgentConfig::default()), 8_000);
        assert!(agent.tick(&mut cx).is_ok());
        seen.load(std::sync::atomic::Ordering::SeqCst)
    }

    #[test]
    fn exactly_85_percent_does_not_trigger() {
        // 8496 + 0.5 * 8 = 8500 of 10000.
        assert_eq!(overload_events(&mut world_with(8_496, 8.0)), 0);
    }

    #[test]
    fn just_above_85_percent_triggers() {
        assert_eq!(overload_events(&mut world_with(8_497, 8.0)), 1);
    }

    #[test]
    fn ventilator_request_restores_target_share() {
        let mut world = world_with(0, 0.0);
        if let Some(hospital) = world.hospitals.get_mut("H1") {
            hospital
                .equipment
                .insert(VENTILATORS.to_owned(), EquipmentPool::new(15, 2));
        }
        let bus = EventBus::new();
        let sink = LogBuffer::new(16);
        let requested = Arc::new(std::sync::Mutex::new(None));
        let out = Arc::clone(&requested);
        bus.subscribe_fn(EventKind::EquipmentShortage, move |event, _| {
            if let SimEvent::EquipmentShortage(shortage) = event {
                if let Ok(mut slot) = out.lock() {
                    *slot = Some(shortage.requested);
                }
            }
            Ok(())
        });
        let mut timers: Vec<TimerRequest> = Vec::new();
        let mut cx = AgentContext::new(&mut world, &bus, &sink, &mut timers, Utc::now());
        let agent = HospitalAgent::new("H1", Arc::new(AgentConfig::default()), 8_000);
        assert!(agent.tick(&mut cx).is_ok());
        // ceil(0.3 * 15) - 2 = 3
        assert_eq!(requested.lock().ok().and_then(|slot| *slot), Some(3));
        assert!(sink.contains_type("EQUIPMENT_SHORTAGE"));
    }

    #[test]
    fn repeated_outbreaks_fill_beds_up_to_total() {
        let mut world = world_with(0, 0.0);
        if let Some(hospital) = world.hospitals.get_mut("H1") {
            hospital.beds.insert(BedKind::General, BedPool::new(30, 10));
            hospital.beds.insert(BedKind::Isolation, BedPool::new(10, 2));
        }
        let bus = EventBus::new();
        let sink = LogBuffer::new(64);
        let requests = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = Arc::clone(&requests);
        bus.subscribe_fn(EventKind::MedicineRequest, move |_, _| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        });
        let outbreak = SimEvent::OutbreakPredicted(OutbreakPredicted {
            disease: medsim_types::Disease::Dengue,
            zone: "Zone-1".to_owned(),
            lab_id: "L1".to_owned(),
            today: 30,
            average: 12.0,
            growth_rate: 1.5,
            risk: medsim_types::RiskTier::Critical,
            confidence: 0.8,
            predicted_cases: 75,
        });
        let agent = HospitalAgent::new("H1", Arc::new(AgentConfig::default()), 8_000);
        let mut timers: Vec<TimerRequest> = Vec::new();
        {
            let mut cx = AgentContext::new(&mut world, &bus, &sink, &mut timers, Utc::now());
            for _ in 0..5 {
                assert!(agent.handle(&outbreak, &mut cx).is_ok());
            }
        }

        let hospital = world.hospitals.get("H1").unwrap();
        let general = hospital.beds.get(&BedKind::General).unwrap();
        let isolation = hospital.beds.get(&BedKind::Isolation).unwrap();
        assert_eq!(general.occupied, general.total);
        assert_eq!(isolation.occupied, isolation.total);
        assert_eq!(hospital.reserved_beds.get(&BedKind::General), Some(&20));
        assert_eq!(hospital.reserved_beds.get(&BedKind::Isolation), Some(&8));
        assert_eq!(requests.load(std::sync::atomic::Ordering::SeqCst), 5);
    }
}
