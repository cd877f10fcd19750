//! Diagnostic lab agent: outbreak detection and capacity warnings.
//!
//! Each tick compares today's test count for every disease with the mean
//! of the last two days. A count above `spike_ratio` times that mean is
//! published as an outbreak prediction, tiered by growth rate.

use std::sync::Arc;

use medsim_events::{AgentContext, EventHandler, HandlerError};
use medsim_types::{AgentKind, EventKind, LabCapacityWarning, OutbreakPredicted, RiskTier, SimEvent};
use medsim_world::DiseaseTests;

use crate::agent::Agent;
use crate::config::{AgentConfig, LabConfig};
use crate::convert::round_count;
use crate::error::AgentError;

/// Growth of today's count against the recent average.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthAssessment {
    /// Mean of the last two history entries.
    pub average: f64,
    /// `(today - average) / average`, 0 when the average is 0.
    pub growth_rate: f64,
    /// Tier derived from the growth rate.
    pub risk: RiskTier,
    /// Confidence in the tier.
    pub confidence: f64,
    /// `round(today * (1 + growth_rate))`.
    pub predicted_cases: u32,
    /// Whether today exceeds the spike threshold.
    pub spike: bool,
}

/// Assess one disease's counts. `None` with fewer than two history entries.
pub fn assess(config: &LabConfig, tests: &DiseaseTests) -> Option<GrowthAssessment> {
    let average = tests.history.recent_average()?;
    let today = f64::from(tests.today);
    let growth_rate = if average > 0.0 {
        (today - average) / average
    } else {
        0.0
    };
    let risk = config.tier_for(growth_rate);
    Some(GrowthAssessment {
        average,
        growth_rate,
        risk,
        confidence: config.confidence_for(risk, tests.history.len()),
        predicted_cases: round_count(today * (1.0 + growth_rate)),
        spike: average > 0.0 && today > config.spike_ratio * average,
    })
}

/// Agent acting for one lab.
#[derive(Debug, Clone)]
pub struct LabAgent {
    id: String,
    config: Arc<AgentConfig>,
    interval_ms: u64,
}

impl LabAgent {
    /// Create the agent for lab `id`.
    pub fn new(id: impl Into<String>, config: Arc<AgentConfig>, interval_ms: u64) -> Self {
        Self {
            id: id.into(),
            config,
            interval_ms,
        }
    }
}

impl EventHandler for LabAgent {
    fn handle(&self, _event: &SimEvent, _cx: &mut AgentContext<'_>) -> Result<(), HandlerError> {
        Ok(())
    }
}

impl Agent for LabAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Lab
    }

    fn entity_id(&self) -> &str {
        &self.id
    }

    fn subscriptions(&self) -> Vec<EventKind> {
        Vec::new()
    }

    fn tick_interval_ms(&self) -> u64 {
        self.interval_ms
    }

    fn tick(&self, cx: &mut AgentContext<'_>) -> Result<(), AgentError> {
        let Some(lab) = cx.world.labs.get(&self.id) else {
            return Ok(());
        };
        let cfg = &self.config.lab;

        let predictions: Vec<OutbreakPredicted> = lab
            .tests
            .iter()
            .filter_map(|(disease, tests)| {
                let assessment = assess(cfg, tests)?;
                assessment.spike.then(|| OutbreakPredicted {
                    disease: *disease,
                    zone: lab.zone.clone(),
                    lab_id: self.id.clone(),
                    today: tests.today,
                    average: assessment.average,
                    growth_rate: assessment.growth_rate,
                    risk: assessment.risk,
                    confidence: assessment.confidence,
                    predicted_cases: assessment.predicted_cases,
                })
            })
            .collect();

        let warning = (lab.testing_capacity > 0)
            .then(|| {
                let tests_today = lab.tests_today();
                let utilization = f64::from(tests_today) / f64::from(lab.testing_capacity);
                (utilization > cfg.capacity_warning).then(|| LabCapacityWarning {
                    lab_id: self.id.clone(),
                    zone: lab.zone.clone(),
                    tests_today,
                    testing_capacity: lab.testing_capacity,
                    utilization,
                    queue_length: lab.queue_length,
                })
            })
            .flatten();

        for prediction in predictions {
            let now = cx.now();
            cx.log(
                self.entry(
                    now,
                    format!("{}_ALERT", prediction.disease.label()),
                    format!(
                        "[Lab {}] {} spike in {}: today={}, avg={:.1}, growth={:.0}%, risk={}",
                        self.id,
                        prediction.disease.label(),
                        prediction.zone,
                        prediction.today,
                        prediction.average,
                        prediction.growth_rate * 100.0,
                        prediction.risk,
                    ),
                )
                .field("zone", prediction.zone.as_str())
                .field("disease", prediction.disease.to_string())
                .field("risk", prediction.risk.to_string())
                .field("confidence", prediction.confidence)
                .field("predictedCases", prediction.predicted_cases),
            );
            cx.publish(SimEvent::OutbreakPredicted(prediction));
        }

        if let Some(warning) = warning {
            let now = cx.now();
            cx.log(
                self.entry(
                    now,
                    "LAB_CAPACITY",
                    format!(
                        "[Lab {}] Running at {:.0}% of testing capacity ({} queued)",
                        self.id,
                        warning.utilization * 100.0,
                        warning.queue_length,
                    ),
                )
                .field("zone", warning.zone.as_str())
                .field("utilization", warning.utilization),
            );
            cx.publish(SimEvent::LabCapacityWarning(warning));
        }
        Ok(())
    }
}
