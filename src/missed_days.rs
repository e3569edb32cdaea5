//! Missed-day analysis: joins treatment schedules with dose logs per medication.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{DoseLogRecord, DoseStatus, ScheduleDay, TreatmentRecord};

/// A calendar day on which a medication was reported missed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissedDay {
    pub date: NaiveDate,
    pub medication: String,
}

/// Per-medication breakdown of scheduled vs missed days.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MissedDayReport {
    /// Union of schedule days across every treatment for the medication,
    /// Monday first.
    pub scheduled_days: Vec<ScheduleDay>,
    /// Most recent first.
    pub missed_days: Vec<MissedDay>,
    pub total_missed: u32,
}

/// Analyzer switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerOptions {
    /// Also report medications that have treatments but no dose logs.
    /// Off by default: whether those belong in the report is undecided.
    pub include_unlogged_treatments: bool,
}

/// Build the missed-day report, one entry per medication present in the logs.
pub fn analyze(
    dose_logs: &[DoseLogRecord],
    treatments: &[TreatmentRecord],
) -> BTreeMap<String, MissedDayReport> {
    analyze_with(dose_logs, treatments, AnalyzerOptions::default())
}

/// [`analyze`] with explicit options.
pub fn analyze_with(
    dose_logs: &[DoseLogRecord],
    treatments: &[TreatmentRecord],
    options: AnalyzerOptions,
) -> BTreeMap<String, MissedDayReport> {
    let schedules = schedules_by_medication(treatments);

    // medication -> date -> any Missed on that date
    let mut days_by_medication: BTreeMap<&str, BTreeMap<NaiveDate, bool>> = BTreeMap::new();
    for log in dose_logs {
        let missed = days_by_medication
            .entry(log.medication.as_str())
            .or_default()
            .entry(log.date)
            .or_insert(false);
        *missed |= log.status == DoseStatus::Missed;
    }

    let mut reports: BTreeMap<String, MissedDayReport> = days_by_medication
        .into_iter()
        .map(|(medication, days)| {
            let missed_days: Vec<MissedDay> = days
                .into_iter()
                .rev()
                .filter(|(_, missed)| *missed)
                .map(|(date, _)| MissedDay {
                    date,
                    medication: medication.to_string(),
                })
                .collect();

            let report = MissedDayReport {
                scheduled_days: scheduled_for(&schedules, medication),
                total_missed: missed_days.len() as u32,
                missed_days,
            };
            (medication.to_string(), report)
        })
        .collect();

    if options.include_unlogged_treatments {
        for medication in schedules.keys() {
            reports
                .entry((*medication).to_string())
                .or_insert_with(|| MissedDayReport {
                    scheduled_days: scheduled_for(&schedules, medication),
                    ..MissedDayReport::default()
                });
        }
    }

    tracing::debug!(
        medications = reports.len(),
        total_missed = reports.values().map(|r| r.total_missed).sum::<u32>(),
        "Missed-day analysis complete"
    );

    reports
}

/// Union of schedule days per medication across all its treatments.
fn schedules_by_medication(treatments: &[TreatmentRecord]) -> BTreeMap<&str, BTreeSet<ScheduleDay>> {
    let mut schedules: BTreeMap<&str, BTreeSet<ScheduleDay>> = BTreeMap::new();
    for treatment in treatments {
        schedules
            .entry(treatment.medication.as_str())
            .or_default()
            .extend(treatment.schedule_days.iter().copied());
    }
    schedules
}

fn scheduled_for(schedules: &BTreeMap<&str, BTreeSet<ScheduleDay>>, medication: &str) -> Vec<ScheduleDay> {
    schedules
        .get(medication)
        .map(|days| days.iter().copied().collect())
        .unwrap_or_default()
}
