//! City-wide risk picture: zone tiers, alerts and disease statistics.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use medsim_types::{AlertType, Disease, Hazard, RiskTier};
use serde::{Deserialize, Serialize};

/// Risk tier per hazard for one zone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneRisk(pub BTreeMap<Hazard, RiskTier>);

impl ZoneRisk {
    /// Tier for `hazard`, `Low` when unset.
    pub fn tier(&self, hazard: Hazard) -> RiskTier {
        self.0.get(&hazard).copied().unwrap_or_default()
    }

    /// Replace the tier for `hazard`, returning the previous one.
    pub fn set(&mut self, hazard: Hazard, tier: RiskTier) -> RiskTier {
        self.0.insert(hazard, tier).unwrap_or_default()
    }

    /// Hazards at High or Critical.
    pub fn elevated(&self) -> Vec<Hazard> {
        self.0
            .iter()
            .filter(|(_, tier)| tier.is_elevated())
            .map(|(hazard, _)| *hazard)
            .collect()
    }
}

/// A city-level alert raised by an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Alert category.
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    /// Disease concerned, for outbreak alerts.
    pub disease: Option<Disease>,
    /// Zone concerned.
    pub zone: String,
    /// Human-readable message.
    pub message: String,
    /// When the alert was raised.
    pub timestamp: DateTime<Utc>,
}

/// Case counts for one disease across the city.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiseaseStats {
    /// Patients currently infected.
    pub active_cases: u32,
    /// Cases confirmed today.
    pub new_today: u32,
    /// Cases projected by the latest outbreak predictions.
    pub predicted_cases: u32,
}

/// The city coordinator's view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CityState {
    /// Hazard tiers per zone.
    pub risk_zones: BTreeMap<String, ZoneRisk>,
    /// Alerts raised so far, oldest first.
    pub active_alerts: Vec<Alert>,
    /// Case counts per disease.
    pub disease_stats: BTreeMap<Disease, DiseaseStats>,
}

impl CityState {
    /// Set a zone's hazard tier to the latest assessment, creating the
    /// zone entry if needed. Returns the previous tier.
    pub fn set_risk(&mut self, zone: &str, hazard: Hazard, tier: RiskTier) -> RiskTier {
        self.risk_zones
            .entry(zone.to_owned())
            .or_default()
            .set(hazard, tier)
    }

    /// Append an alert.
    pub fn push_alert(&mut self, alert: Alert) {
        self.active_alerts.push(alert);
    }

    /// Zones with at least one elevated hazard, with those hazards.
    pub fn elevated_zones(&self) -> Vec<(String, Vec<Hazard>)> {
        self.risk_zones
            .iter()
            .filter_map(|(zone, risk)| {
                let hazards = risk.elevated();
                (!hazards.is_empty()).then(|| (zone.clone(), hazards))
            })
            .collect()
    }

    /// Mutable stats for `disease`, created empty if missing.
    pub fn stats_mut(&mut self, disease: Disease) -> &mut DiseaseStats {
        self.disease_stats.entry(disease).or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_assessment_replaces_tier() {
        let mut city = CityState::default();
        assert_eq!(city.set_risk("Zone-1", Hazard::Dengue, RiskTier::High), RiskTier::Low);
        assert_eq!(city.set_risk("Zone-1", Hazard::Dengue, RiskTier::Medium), RiskTier::High);
        assert_eq!(
            city.risk_zones["Zone-1"].tier(Hazard::Dengue),
            RiskTier::Medium
        );
    }

    #[test]
    fn elevated_zones_lists_high_and_critical_only() {
        let mut city = CityState::default();
        city.set_risk("Zone-1", Hazard::Covid, RiskTier::Medium);
        city.set_risk("Zone-2", Hazard::Dengue, RiskTier::Critical);
        let elevated = city.elevated_zones();
        assert_eq!(elevated, vec![("Zone-2".to_owned(), vec![Hazard::Dengue])]);
    }

    #[test]
    fn zone_risk_serializes_as_map() {
        let mut risk = ZoneRisk::default();
        let _ = risk.set(Hazard::Heatwave, RiskTier::Medium);
        let json = serde_json::to_string(&risk).ok();
        assert_eq!(json.as_deref(), Some(r#"{"heatwave":"medium"}"#));
    }
}
