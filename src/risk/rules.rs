use crate::models::RiskLabel;

/// Adherence at or above this is Low risk under the fallback rule.
pub const LOW_RISK_MIN_ADHERENCE: f64 = 80.0;
/// Adherence at or above this (and below the Low cut) is Medium risk.
pub const MEDIUM_RISK_MIN_ADHERENCE: f64 = 60.0;

/// Fallback rule. Ignores the missed-dose count.
/// Non-finite input falls through to High.
pub fn threshold_label(adherence_percent: f64) -> RiskLabel {
    if adherence_percent >= LOW_RISK_MIN_ADHERENCE {
        RiskLabel::Low
    } else if adherence_percent >= MEDIUM_RISK_MIN_ADHERENCE {
        RiskLabel::Medium
    } else {
        RiskLabel::High
    }
}
