use serde::{Deserialize, Serialize};

use super::training::LabeledExample;
use super::RiskError;
use crate::models::RiskLabel;

/// Bumped whenever the serialized layout changes.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

pub const FEATURE_COUNT: usize = 2;
pub const CLASS_COUNT: usize = 3;

/// Per-feature standardisation fitted on the training set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub means: [f64; FEATURE_COUNT],
    pub stds: [f64; FEATURE_COUNT],
}

impl FeatureScaler {
    pub fn fit(rows: &[[f64; FEATURE_COUNT]]) -> Self {
        let mut means = [0.0; FEATURE_COUNT];
        let mut stds = [0.0; FEATURE_COUNT];
        if rows.is_empty() {
            return Self { means, stds };
        }

        let n = rows.len() as f64;
        for j in 0..FEATURE_COUNT {
            let mean = rows.iter().map(|r| r[j]).sum::<f64>() / n;
            let var = rows.iter().map(|r| (r[j] - mean).powi(2)).sum::<f64>() / n;
            means[j] = mean;
            stds[j] = var.sqrt();
        }
        Self { means, stds }
    }

    /// Zero-variance features map to 0.
    pub fn transform(&self, row: [f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut out = [0.0; FEATURE_COUNT];
        for j in 0..FEATURE_COUNT {
            out[j] = if self.stds[j] == 0.0 {
                0.0
            } else {
                (row[j] - self.means[j]) / self.stds[j]
            };
        }
        out
    }
}

/// Multinomial logistic regression over (adherence percent, missed count).
///
/// Class `k` scores `weights[k] · scaled(x) + biases[k]`; class order follows
/// [`RiskLabel::ALL`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskModel {
    pub format_version: u32,
    pub scaler: FeatureScaler,
    pub weights: [[f64; FEATURE_COUNT]; CLASS_COUNT],
    pub biases: [f64; CLASS_COUNT],
    /// Seed and size of the synthetic set this model was fitted on.
    pub training_seed: u64,
    pub training_samples: usize,
}

impl RiskModel {
    /// Fit by full-batch gradient descent on the softmax cross-entropy.
    /// Deterministic: no randomness beyond the examples themselves.
    pub fn fit(
        examples: &[LabeledExample],
        learning_rate: f64,
        epochs: usize,
        training_seed: u64,
    ) -> Result<Self, RiskError> {
        if examples.is_empty() {
            return Err(RiskError::Training("no training examples".into()));
        }
        if !(learning_rate.is_finite() && learning_rate > 0.0) || epochs == 0 {
            return Err(RiskError::Training(format!(
                "invalid optimiser settings: learning_rate={learning_rate}, epochs={epochs}"
            )));
        }

        let raw: Vec<[f64; FEATURE_COUNT]> = examples.iter().map(|e| e.features()).collect();
        let scaler = FeatureScaler::fit(&raw);
        let scaled: Vec<[f64; FEATURE_COUNT]> = raw.iter().map(|r| scaler.transform(*r)).collect();
        let targets: Vec<usize> = examples.iter().map(|e| e.label.index()).collect();

        let n = examples.len() as f64;
        let mut weights = [[0.0; FEATURE_COUNT]; CLASS_COUNT];
        let mut biases = [0.0; CLASS_COUNT];

        for _ in 0..epochs {
            let mut grad_w = [[0.0; FEATURE_COUNT]; CLASS_COUNT];
            let mut grad_b = [0.0; CLASS_COUNT];

            for (x, &target) in scaled.iter().zip(targets.iter()) {
                let probs = softmax(logits(&weights, &biases, x));
                for k in 0..CLASS_COUNT {
                    let diff = probs[k] - if k == target { 1.0 } else { 0.0 };
                    for j in 0..FEATURE_COUNT {
                        grad_w[k][j] += diff * x[j];
                    }
                    grad_b[k] += diff;
                }
            }

            for k in 0..CLASS_COUNT {
                for j in 0..FEATURE_COUNT {
                    weights[k][j] -= learning_rate * grad_w[k][j] / n;
                }
                biases[k] -= learning_rate * grad_b[k] / n;
            }
        }

        let model = Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            scaler,
            weights,
            biases,
            training_seed,
            training_samples: examples.len(),
        };
        model.validate().map_err(|e| RiskError::Training(e.to_string()))?;
        Ok(model)
    }

    /// Class probabilities in [`RiskLabel::ALL`] order.
    pub fn probabilities(&self, adherence_percent: f64, missed_count: u32) -> [f64; CLASS_COUNT] {
        let x = self
            .scaler
            .transform([adherence_percent, f64::from(missed_count)]);
        softmax(logits(&self.weights, &self.biases, &x))
    }

    /// Most probable label. Ties resolve to the lower-risk class.
    pub fn predict(&self, adherence_percent: f64, missed_count: u32) -> Result<RiskLabel, RiskError> {
        if !adherence_percent.is_finite() {
            return Err(RiskError::InvalidFeatures {
                adherence_percent,
                missed_count,
            });
        }

        let probs = self.probabilities(adherence_percent, missed_count);
        let mut best = 0;
        for k in 1..CLASS_COUNT {
            if probs[k] > probs[best] {
                best = k;
            }
        }
        if !probs[best].is_finite() {
            return Err(RiskError::InvalidFeatures {
                adherence_percent,
                missed_count,
            });
        }
        Ok(RiskLabel::ALL[best])
    }

    /// Serialize to the persisted artifact form.
    pub fn to_artifact(&self) -> Result<String, RiskError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and validate a persisted artifact.
    pub fn from_artifact(payload: &str) -> Result<Self, RiskError> {
        let model: Self = serde_json::from_str(payload)?;
        if model.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(RiskError::IncompatibleArtifact {
                found: model.format_version,
                expected: ARTIFACT_FORMAT_VERSION,
            });
        }
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), RiskError> {
        let finite = self.scaler.means.iter().all(|v| v.is_finite())
            && self.scaler.stds.iter().all(|v| v.is_finite() && *v >= 0.0)
            && self.weights.iter().flatten().all(|v| v.is_finite())
            && self.biases.iter().all(|v| v.is_finite());
        if finite {
            Ok(())
        } else {
            Err(RiskError::MalformedArtifact(
                "non-finite or negative parameters".into(),
            ))
        }
    }
}

fn logits(
    weights: &[[f64; FEATURE_COUNT]; CLASS_COUNT],
    biases: &[f64; CLASS_COUNT],
    x: &[f64; FEATURE_COUNT],
) -> [f64; CLASS_COUNT] {
    let mut out = *biases;
    for k in 0..CLASS_COUNT {
        for j in 0..FEATURE_COUNT {
            out[k] += weights[k][j] * x[j];
        }
    }
    out
}

fn softmax(z: [f64; CLASS_COUNT]) -> [f64; CLASS_COUNT] {
    let max = z.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut exp = [0.0; CLASS_COUNT];
    for k in 0..CLASS_COUNT {
        exp[k] = (z[k] - max).exp();
    }
    let sum: f64 = exp.iter().sum();
    for v in exp.iter_mut() {
        *v /= sum;
    }
    exp
}
