use std::collections::BTreeMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::adherence::{aggregate, AdherenceSummary};
use crate::feedback::{feedback_or_default, FeedbackGenerator};
use crate::missed_days::{analyze_with, AnalyzerOptions, MissedDayReport};
use crate::models::{DoseLogRecord, RiskLabel, TreatmentRecord};
use crate::risk::{RiskAssessment, RiskClassifier};

/// Everything derived for one patient from their full record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSnapshot {
    pub summary: AdherenceSummary,
    pub risk: RiskAssessment,
    pub missed_days: BTreeMap<String, MissedDayReport>,
}

/// Fields the caller writes back onto the patient record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatientUpdate {
    pub adherence_percent: f64,
    pub risk_label: RiskLabel,
}

impl PatientSnapshot {
    pub fn patient_update(&self) -> PatientUpdate {
        PatientUpdate {
            adherence_percent: self.summary.adherence_percent,
            risk_label: self.risk.label,
        }
    }
}

/// Runs aggregation, classification and missed-day analysis for a patient.
///
/// Holds the classifier for its whole lifetime; evaluations share no other
/// state, so one engine can serve concurrent callers.
pub struct AdherenceEngine<C: RiskClassifier> {
    classifier: C,
    options: AnalyzerOptions,
}

impl<C: RiskClassifier> AdherenceEngine<C> {
    pub fn new(classifier: C) -> Self {
        Self {
            classifier,
            options: AnalyzerOptions::default(),
        }
    }

    pub fn with_options(classifier: C, options: AnalyzerOptions) -> Self {
        Self {
            classifier,
            options,
        }
    }

    /// Recompute every metric from the complete dose history.
    pub fn evaluate(
        &self,
        dose_logs: &[DoseLogRecord],
        treatments: &[TreatmentRecord],
    ) -> PatientSnapshot {
        let start = Instant::now();

        let summary = aggregate(dose_logs);
        let risk = self
            .classifier
            .classify(summary.adherence_percent, summary.missed_count);
        let missed_days = analyze_with(dose_logs, treatments, self.options);

        tracing::info!(
            logs = dose_logs.len(),
            treatments = treatments.len(),
            adherence = summary.rounded_percent(),
            missed = summary.missed_count,
            risk = risk.label.as_str(),
            source = ?risk.source,
            processing_us = start.elapsed().as_micros() as u64,
            "Patient evaluated"
        );

        PatientSnapshot {
            summary,
            risk,
            missed_days,
        }
    }

    /// [`AdherenceEngine::evaluate`] plus a motivational message.
    pub fn evaluate_with_feedback<G: FeedbackGenerator + ?Sized>(
        &self,
        dose_logs: &[DoseLogRecord],
        treatments: &[TreatmentRecord],
        generator: Option<&G>,
    ) -> (PatientSnapshot, String) {
        let snapshot = self.evaluate(dose_logs, treatments);
        let message = feedback_or_default(
            generator,
            snapshot.summary.adherence_percent,
            snapshot.risk.label,
        );
        (snapshot, message)
    }
}
