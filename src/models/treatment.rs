use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::ScheduleDay;
use super::DATE_FORMAT;
use crate::db::DatabaseError;
use crate::schedule;

/// A prescription. `frequency` is the base label only; the weekday schedule
/// lives in `schedule_days`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentRecord {
    pub medication: String,
    pub dosage: String,
    pub frequency: String,
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub schedule_days: BTreeSet<ScheduleDay>,
    /// Day names exactly as read from legacy text, in stored order.
    /// Empty for records built in code.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stored_days: Vec<String>,
}

/// Treatment as stored in the legacy schema: schedule embedded in `frequency`.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredTreatment {
    pub medication: String,
    pub dosage: String,
    pub frequency: String,
    #[serde(default)]
    pub start_date: Option<String>,
}

impl TreatmentRecord {
    pub fn new(
        medication: impl Into<String>,
        dosage: impl Into<String>,
        frequency: impl Into<String>,
        start_date: Option<NaiveDate>,
        schedule_days: impl IntoIterator<Item = ScheduleDay>,
    ) -> Self {
        Self {
            medication: medication.into(),
            dosage: dosage.into(),
            frequency: frequency.into(),
            start_date,
            schedule_days: schedule_days.into_iter().collect(),
            stored_days: Vec::new(),
        }
    }

    /// Read a legacy row, decoding any schedule suffix from `frequency`.
    ///
    /// Unrecognised day names are left out of `schedule_days` with a warning
    /// but kept in `stored_days`.
    pub fn from_stored(stored: &StoredTreatment) -> Result<Self, DatabaseError> {
        let decoded = schedule::decode(&stored.frequency);

        let mut schedule_days = BTreeSet::new();
        for name in &decoded.days {
            match ScheduleDay::from_str(name.trim()) {
                Ok(day) => {
                    schedule_days.insert(day);
                }
                Err(_) => tracing::warn!(
                    medication = %stored.medication,
                    day = %name,
                    "Skipping unrecognised schedule day"
                ),
            }
        }

        let start_date = match stored.start_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
                DatabaseError::InvalidDate {
                    field: "start_date".into(),
                    value: raw.into(),
                }
            })?),
        };

        Ok(Self {
            medication: stored.medication.clone(),
            dosage: stored.dosage.clone(),
            frequency: decoded.frequency,
            start_date,
            schedule_days,
            stored_days: decoded.days,
        })
    }

    /// Frequency text in the legacy encoding.
    ///
    /// A record read with [`TreatmentRecord::from_stored`] writes back its
    /// original day text unchanged while `schedule_days` still matches it.
    /// Otherwise the days are written Monday-first.
    pub fn stored_frequency(&self) -> String {
        if !self.stored_days.is_empty() && self.stored_days_match() {
            return schedule::encode(&self.frequency, &self.stored_days);
        }
        let names: Vec<&str> = self.schedule_days.iter().map(ScheduleDay::as_str).collect();
        schedule::encode(&self.frequency, &names)
    }

    fn stored_days_match(&self) -> bool {
        let parsed: BTreeSet<ScheduleDay> = self
            .stored_days
            .iter()
            .filter_map(|name| ScheduleDay::from_str(name.trim()).ok())
            .collect();
        parsed == self.schedule_days
    }
}
