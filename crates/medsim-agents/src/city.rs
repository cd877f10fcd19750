//! City coordinator: zone risk tiers, alerts and the periodic summary.

use medsim_events::{AgentContext, EventHandler, HandlerError};
use medsim_types::{
    AgentKind, AlertType, EventKind, Hazard, HospitalOverloadRisk, MedicineShortageRisk,
    OutbreakPredicted, SimEvent,
};
use medsim_world::Alert;

use crate::agent::Agent;
use crate::error::AgentError;

/// Entity id the city agent logs under.
pub const CITY_ID: &str = "city";

/// The single city-wide coordinator.
#[derive(Debug, Clone)]
pub struct CityAgent {
    interval_ms: u64,
}

impl CityAgent {
    /// Create the coordinator ticking every `interval_ms`.
    pub const fn new(interval_ms: u64) -> Self {
        Self { interval_ms }
    }

    fn on_outbreak(&self, event: &OutbreakPredicted, cx: &mut AgentContext<'_>) {
        let now = cx.now();
        let city = &mut cx.world.city;
        let previous = city.set_risk(&event.zone, Hazard::from(event.disease), event.risk);
        let stats = city.stats_mut(event.disease);
        stats.predicted_cases = stats.predicted_cases.max(event.predicted_cases);
        let message = format!(
            "{} outbreak predicted in {} ({} risk, ~{} cases)",
            event.disease, event.zone, event.risk, event.predicted_cases
        );
        city.push_alert(Alert {
            alert_type: AlertType::DiseaseOutbreak,
            disease: Some(event.disease),
            zone: event.zone.clone(),
            message: message.clone(),
            timestamp: now,
        });

        cx.log(
            self.entry(
                now,
                format!("{}_RISK_{}", event.disease.label(), event.risk.label()),
                format!("[City] {message}"),
            )
            .field("zone", event.zone.as_str())
            .field("previous", previous.to_string())
            .field("confidence", event.confidence),
        );
    }

    fn on_overload(&self, event: &HospitalOverloadRisk, cx: &mut AgentContext<'_>) {
        let now = cx.now();
        let message = format!(
            "Hospital {} in {} predicted at {:.0}% occupancy",
            event.hospital_id,
            event.zone,
            event.occupancy * 100.0
        );
        cx.world.city.push_alert(Alert {
            alert_type: AlertType::HospitalOverload,
            disease: None,
            zone: event.zone.clone(),
            message: message.clone(),
            timestamp: now,
        });
        cx.log(
            self.entry(now, "OVERLOAD_ALERT", format!("[City] {message}"))
                .field("zone", event.zone.as_str())
                .field("hospitalId", event.hospital_id.as_str()),
        );
    }

    fn on_shortage(&self, event: &MedicineShortageRisk, cx: &mut AgentContext<'_>) {
        let now = cx.now();
        let message = format!(
            "Pharmacy {} in {} short of {} ({} left, {} urgency)",
            event.pharmacy_id, event.zone, event.medicine, event.stock, event.urgency
        );
        cx.world.city.push_alert(Alert {
            alert_type: AlertType::MedicineShortage,
            disease: None,
            zone: event.zone.clone(),
            message: message.clone(),
            timestamp: now,
        });
        cx.log(
            self.entry(now, "MED_SHORTAGE_ALERT", format!("[City] {message}"))
                .field("zone", event.zone.as_str())
                .field("item", event.medicine.as_str()),
        );
    }
}

impl EventHandler for CityAgent {
    fn handle(&self, event: &SimEvent, cx: &mut AgentContext<'_>) -> Result<(), HandlerError> {
        match event {
            SimEvent::OutbreakPredicted(outbreak) => self.on_outbreak(outbreak, cx),
            SimEvent::HospitalOverloadRisk(risk) => self.on_overload(risk, cx),
            SimEvent::MedicineShortageRisk(shortage) => self.on_shortage(shortage, cx),
            _ => {}
        }
        Ok(())
    }
}

impl Agent for CityAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::City
    }

    fn entity_id(&self) -> &str {
        CITY_ID
    }

    fn subscriptions(&self) -> Vec<EventKind> {
        EventKind::all_outbreaks()
            .chain([EventKind::HospitalOverloadRisk, EventKind::MedicineShortageRisk])
            .collect()
    }

    fn tick_interval_ms(&self) -> u64 {
        self.interval_ms
    }

    fn tick(&self, cx: &mut AgentContext<'_>) -> Result<(), AgentError> {
        let elevated = cx.world.city.elevated_zones();
        let summary = if elevated.is_empty() {
            "no zones at high risk".to_owned()
        } else {
            elevated
                .iter()
                .map(|(zone, hazards)| {
                    let names: Vec<String> = hazards
                        .iter()
                        .map(|hazard| format!("{hazard:?}").to_lowercase())
                        .collect();
                    format!("{zone} ({})", names.join(", "))
                })
                .collect::<Vec<_>>()
                .join("; ")
        };
        let zones: Vec<String> = elevated.into_iter().map(|(zone, _)| zone).collect();
        let now = cx.now();
        cx.log(
            self.entry(now, "CITY_SUMMARY", format!("[City] High-risk zones: {summary}"))
                .field("zones", zones)
                .field("alerts", cx.world.city.active_alerts.len()),
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use chrono::Utc;
    use medsim_events::{EventBus, LogBuffer, TimerRequest};
    use medsim_types::{Disease, RiskTier};
    use medsim_world::WorldState;

    use super::*;

    fn outbreak(risk: RiskTier, predicted_cases: u32) -> SimEvent {
        SimEvent::OutbreakPredicted(OutbreakPredicted {
            disease: Disease::Dengue,
            zone: "Zone-2".to_owned(),
            lab_id: "L1".to_owned(),
            today: 30,
            average: 12.0,
            growth_rate: 1.5,
            risk,
            confidence: 0.8,
            predicted_cases,
        })
    }

    #[test]
    fn latest_outbreak_sets_tier_and_alerts_accumulate() {
        let mut world = WorldState::default();
        let bus = EventBus::new();
        let sink = LogBuffer::new(16);
        let mut timers: Vec<TimerRequest> = Vec::new();
        let agent = CityAgent::new(15_000);
        {
            let mut cx = AgentContext::new(&mut world, &bus, &sink, &mut timers, Utc::now());
            assert!(agent.handle(&outbreak(RiskTier::Critical, 75), &mut cx).is_ok());
            assert!(agent.handle(&outbreak(RiskTier::Critical, 75), &mut cx).is_ok());
            assert!(agent.tick(&mut cx).is_ok());
            assert!(agent.handle(&outbreak(RiskTier::Medium, 40), &mut cx).is_ok());
            assert!(agent.tick(&mut cx).is_ok());
        }
        assert_eq!(
            world.city.risk_zones["Zone-2"].tier(Hazard::Dengue),
            RiskTier::Medium
        );
        assert_eq!(world.city.active_alerts.len(), 3);
        assert_eq!(world.city.disease_stats[&Disease::Dengue].predicted_cases, 75);
        assert!(sink.contains_type("DENGUE_RISK_CRITICAL"));
        assert!(sink.contains_type("DENGUE_RISK_MEDIUM"));
        // newest first: the last summary sees nothing elevated, the one before saw Zone-2
        let summaries: Vec<String> = sink
            .tail(usize::MAX)
            .into_iter()
            .filter(|entry| entry.meta.event_type == "CITY_SUMMARY")
            .map(|entry| entry.message)
            .collect();
        assert_eq!(summaries.len(), 2);
        assert!(summaries[0].contains("no zones at high risk"));
        assert!(summaries[1].contains("Zone-2"));
    }
}
