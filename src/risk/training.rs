use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Poisson};
use serde::{Deserialize, Serialize};

use super::model::{RiskModel, FEATURE_COUNT};
use super::RiskError;
use crate::config::ClassifierConfig;
use crate::models::RiskLabel;

/// One synthetic training row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledExample {
    pub adherence_percent: f64,
    pub missed_count: u32,
    pub label: RiskLabel,
}

impl LabeledExample {
    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [self.adherence_percent, f64::from(self.missed_count)]
    }
}

/// Labelling rule for synthetic data. Uses both features, unlike the
/// threshold fallback.
pub fn synthetic_label(adherence_percent: f64, missed_count: u32) -> RiskLabel {
    if adherence_percent >= 80.0 && missed_count <= 1 {
        RiskLabel::Low
    } else if adherence_percent >= 60.0 && missed_count <= 3 {
        RiskLabel::Medium
    } else {
        RiskLabel::High
    }
}

/// Draw the synthetic set: adherence uniform in [0, 100), missed doses
/// Poisson-distributed. Same config, same examples.
pub fn generate_examples(config: &ClassifierConfig) -> Result<Vec<LabeledExample>, RiskError> {
    let missed = Poisson::new(config.missed_dose_mean).map_err(|e| {
        RiskError::Training(format!(
            "invalid missed dose mean {}: {e}",
            config.missed_dose_mean
        ))
    })?;
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    let examples = (0..config.sample_count)
        .map(|_| {
            let adherence_percent = rng.gen_range(0.0..100.0);
            let draw: f64 = missed.sample(&mut rng);
            let missed_count = draw as u32;
            LabeledExample {
                adherence_percent,
                missed_count,
                label: synthetic_label(adherence_percent, missed_count),
            }
        })
        .collect();
    Ok(examples)
}

/// Generate the synthetic set and fit a model on it.
pub fn train(config: &ClassifierConfig) -> Result<RiskModel, RiskError> {
    let examples = generate_examples(config)?;
    tracing::info!(
        seed = config.seed,
        samples = examples.len(),
        epochs = config.epochs,
        "Training risk model on synthetic data"
    );
    RiskModel::fit(&examples, config.learning_rate, config.epochs, config.seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_rule_uses_both_features() {
        assert_eq!(synthetic_label(90.0, 0), RiskLabel::Low);
        assert_eq!(synthetic_label(90.0, 2), RiskLabel::Medium);
        assert_eq!(synthetic_label(90.0, 4), RiskLabel::High);
        assert_eq!(synthetic_label(70.0, 3), RiskLabel::Medium);
        assert_eq!(synthetic_label(59.0, 0), RiskLabel::High);
    }

    #[test]
    fn same_seed_same_examples() {
        let config = ClassifierConfig::default();
        assert_eq!(generate_examples(&config).unwrap(), generate_examples(&config).unwrap());
    }

    #[test]
    fn different_seed_different_examples() {
        let a = generate_examples(&ClassifierConfig::default()).unwrap();
        let b = generate_examples(&ClassifierConfig {
            seed: 7,
            ..ClassifierConfig::default()
        })
        .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn examples_within_feature_ranges() {
        let config = ClassifierConfig::default();
        let examples = generate_examples(&config).unwrap();
        assert_eq!(examples.len(), config.sample_count);
        assert!(examples
            .iter()
            .all(|e| (0.0..100.0).contains(&e.adherence_percent)));
        assert!(examples
            .iter()
            .all(|e| e.label == synthetic_label(e.adherence_percent, e.missed_count)));
    }

    #[test]
    fn missed_counts_follow_configured_mean() {
        let config = ClassifierConfig {
            sample_count: 20_000,
            ..ClassifierConfig::default()
        };
        let examples = generate_examples(&config).unwrap();
        let total: u64 = examples.iter().map(|e| u64::from(e.missed_count)).sum();
        let mean = total as f64 / examples.len() as f64;
        assert!((mean - 2.0).abs() < 0.1, "sample mean {mean}");
    }

    #[test]
    fn non_positive_mean_is_rejected() {
        let config = ClassifierConfig {
            missed_dose_mean: 0.0,
            ..ClassifierConfig::default()
        };
        assert!(matches!(generate_examples(&config), Err(RiskError::Training(_))));
        assert!(train(&config).is_err());
    }

    #[test]
    fn every_class_is_represented() {
        let examples = generate_examples(&ClassifierConfig::default()).unwrap();
        for label in RiskLabel::ALL {
            assert!(examples.iter().any(|e| e.label == label), "no {label} examples");
        }
    }
}
