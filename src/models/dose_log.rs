use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::DoseStatus;
use super::DATE_FORMAT;
use crate::db::DatabaseError;

/// One observed dose event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoseLogRecord {
    pub medication: String,
    pub status: DoseStatus,
    pub date: NaiveDate,
}

/// Dose log as stored and transported: plain strings, optional date.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredDoseLog {
    pub medication: String,
    pub status: String,
    #[serde(default)]
    pub date: Option<String>,
}

impl DoseLogRecord {
    /// Build a record; a missing date means "logged today".
    pub fn new(medication: impl Into<String>, status: DoseStatus, date: Option<NaiveDate>) -> Self {
        Self {
            medication: medication.into(),
            status,
            date: date.unwrap_or_else(|| chrono::Local::now().date_naive()),
        }
    }

    /// Parse the stored string form.
    pub fn from_stored(stored: &StoredDoseLog) -> Result<Self, DatabaseError> {
        let status = DoseStatus::from_str(&stored.status)?;
        let date = match stored.date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
                DatabaseError::InvalidDate {
                    field: "date".into(),
                    value: raw.into(),
                }
            })?),
        };
        Ok(Self::new(stored.medication.clone(), status, date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(status: &str, date: Option<&str>) -> StoredDoseLog {
        StoredDoseLog {
            medication: "Metformin".into(),
            status: status.into(),
            date: date.map(String::from),
        }
    }

    #[test]
    fn from_stored_parses_date_and_status() {
        let record = DoseLogRecord::from_stored(&stored("Missed", Some("2025-01-15"))).unwrap();
        assert_eq!(record.medication, "Metformin");
        assert_eq!(record.status, DoseStatus::Missed);
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
    }

    #[test]
    fn missing_date_defaults_to_today() {
        let today = chrono::Local::now().date_naive();
        let record = DoseLogRecord::from_stored(&stored("Taken", None)).unwrap();
        // Allow for a midnight rollover between the two clock reads
        assert!(record.date >= today);
        assert!(record.date <= today + chrono::Duration::days(1));

        let blank = DoseLogRecord::from_stored(&stored("Taken", Some("  "))).unwrap();
        assert!(blank.date >= today);
    }

    #[test]
    fn unknown_status_rejected() {
        let err = DoseLogRecord::from_stored(&stored("Skipped", None)).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidEnum { .. }));
    }

    #[test]
    fn malformed_date_rejected() {
        let err = DoseLogRecord::from_stored(&stored("Taken", Some("15/01/2025"))).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidDate { .. }));
    }

    #[test]
    fn record_serializes_iso_date() {
        let record = DoseLogRecord::new(
            "Lisinopril",
            DoseStatus::Taken,
            NaiveDate::from_ymd_opt(2025, 3, 9),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["date"], "2025-03-09");
        assert_eq!(json["status"], "Taken");
    }
}
