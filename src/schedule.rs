//! Schedule codec: packs a weekday list into a treatment's frequency text.
//!
//! Legacy treatment rows have no schedule column, so the days were appended
//! to the free-text frequency label:
//!
//! ```text
//! 2x daily (Schedule: Monday, Wednesday, Friday)
//! ```
//!
//! `TreatmentRecord` now carries the days as a structured set; this codec is
//! kept so existing stored text reads and writes back byte-for-byte.
//! Day names are opaque here: validation happens in `TreatmentRecord`.

use serde::{Deserialize, Serialize};

/// Literal marker separating the base frequency from the day list.
pub const SCHEDULE_MARKER: &str = " (Schedule: ";

const DAY_SEPARATOR: &str = ", ";

/// Result of splitting a stored frequency string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedFrequency {
    pub frequency: String,
    pub days: Vec<String>,
}

/// Append the schedule suffix to `frequency`.
/// An empty day list returns the frequency unchanged.
pub fn encode<S: AsRef<str>>(frequency: &str, days: &[S]) -> String {
    if days.is_empty() {
        return frequency.to_string();
    }

    let joined = days
        .iter()
        .map(|d| d.as_ref())
        .collect::<Vec<_>>()
        .join(DAY_SEPARATOR);

    format!("{frequency}{SCHEDULE_MARKER}{joined})")
}

/// Split a stored frequency back into base label and day names.
///
/// Left inverse of [`encode`] for any frequency that does not itself contain
/// the marker. Without a marker the input is returned with no days.
pub fn decode(encoded: &str) -> DecodedFrequency {
    let Some((frequency, rest)) = encoded.split_once(SCHEDULE_MARKER) else {
        return DecodedFrequency {
            frequency: encoded.to_string(),
            days: Vec::new(),
        };
    };

    let list = rest.strip_suffix(')').unwrap_or(rest);
    let days = list.split(DAY_SEPARATOR).map(String::from).collect();

    DecodedFrequency {
        frequency: frequency.to_string(),
        days,
    }
}
