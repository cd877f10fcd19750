//! Diagnostic labs and their per-disease test counts.

use std::collections::{BTreeMap, VecDeque};

use medsim_types::Disease;
use serde::{Deserialize, Serialize};

/// Days of history a lab keeps per disease.
pub const HISTORY_WINDOW: usize = 14;

/// Daily test counts, oldest first, holding at most [`HISTORY_WINDOW`] days.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<u32>", into = "Vec<u32>")]
pub struct History {
    entries: VecDeque<u32>,
}

impl History {
    /// Append a day, dropping the oldest entries beyond the window.
    pub fn push(&mut self, count: u32) {
        self.entries.push_back(count);
        while self.entries.len() > HISTORY_WINDOW {
            self.entries.pop_front();
        }
    }

    /// Number of days held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no days are held.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mean of the two most recent days, if there are two.
    pub fn recent_average(&self) -> Option<f64> {
        let mut recent = self.entries.iter().rev();
        let last = recent.next()?;
        let previous = recent.next()?;
        Some(f64::midpoint(f64::from(*last), f64::from(*previous)))
    }

    /// Iterate oldest first.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.iter().copied()
    }
}

impl From<Vec<u32>> for History {
    fn from(days: Vec<u32>) -> Self {
        let mut history = Self::default();
        for day in days {
            history.push(day);
        }
        history
    }
}

impl From<History> for Vec<u32> {
    fn from(history: History) -> Self {
        history.entries.into()
    }
}

/// Test counts for one disease at one lab.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiseaseTests {
    /// Tests run today.
    pub today: u32,
    /// Positive results today.
    pub positive: u32,
    /// Negative results today.
    pub negative: u32,
    /// Previous days' totals.
    pub history: History,
}

impl DiseaseTests {
    /// Add a batch of results to today's counts.
    pub const fn record(&mut self, tests: u32, positive: u32, negative: u32) {
        self.today = self.today.saturating_add(tests);
        self.positive = self.positive.saturating_add(positive);
        self.negative = self.negative.saturating_add(negative);
    }

    /// Close the day: push today's total into history and reset the counters.
    pub fn close_day(&mut self) {
        self.history.push(self.today);
        self.today = 0;
        self.positive = 0;
        self.negative = 0;
    }
}

/// A diagnostic lab.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lab {
    /// Display name.
    pub name: String,
    /// Zone the lab serves.
    pub zone: String,
    /// Test counts by disease.
    pub tests: BTreeMap<Disease, DiseaseTests>,
    /// Tests the lab can run per day.
    pub testing_capacity: u32,
    /// Samples waiting to be processed.
    pub queue_length: u32,
}

impl Lab {
    /// Tests run today across all diseases.
    pub fn tests_today(&self) -> u32 {
        self.tests
            .values()
            .fold(0_u32, |acc, tests| acc.saturating_add(tests.today))
    }

    /// Close the day for every disease.
    pub fn close_day(&mut self) {
        for tests in self.tests.values_mut() {
            tests.close_day();
        }
    }
}
