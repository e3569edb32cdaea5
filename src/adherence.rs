//! Dose log aggregation: adherence percentage and missed-dose count.
//!
//! Always recomputed over the full dose history for a patient, so the
//! result depends only on the multiset of statuses.

use serde::{Deserialize, Serialize};

use crate::models::{DoseLogRecord, DoseStatus};

/// Adherence metrics derived from a patient's complete dose history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdherenceSummary {
    /// Share of logged doses with status Taken, in [0, 100].
    pub adherence_percent: f64,
    pub missed_count: u32,
    pub taken_count: u32,
    pub inconsistent_count: u32,
    pub total_count: u32,
}

impl AdherenceSummary {
    /// Summary of an empty history: 0% adherence, nothing missed.
    pub fn empty() -> Self {
        Self {
            adherence_percent: 0.0,
            missed_count: 0,
            taken_count: 0,
            inconsistent_count: 0,
            total_count: 0,
        }
    }

    /// Percentage rounded to one decimal place, for display.
    pub fn rounded_percent(&self) -> f64 {
        (self.adherence_percent * 10.0).round() / 10.0
    }
}

/// Reduce dose logs to an [`AdherenceSummary`].
///
/// An empty history yields 0.0% rather than an error.
pub fn aggregate(dose_logs: &[DoseLogRecord]) -> AdherenceSummary {
    if dose_logs.is_empty() {
        return AdherenceSummary::empty();
    }

    let mut summary = AdherenceSummary::empty();
    for log in dose_logs {
        match log.status {
            DoseStatus::Taken => summary.taken_count += 1,
            DoseStatus::Missed => summary.missed_count += 1,
            DoseStatus::Inconsistent => summary.inconsistent_count += 1,
        }
    }
    summary.total_count = dose_logs.len() as u32;
    summary.adherence_percent =
        f64::from(summary.taken_count) / f64::from(summary.total_count) * 100.0;

    summary
}
