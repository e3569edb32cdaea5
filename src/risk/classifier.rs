use serde::{Deserialize, Serialize};

use super::model::RiskModel;
use super::rules::threshold_label;
use super::store::ModelStore;
use super::{training, RiskError};
use crate::config::ClassifierConfig;
use crate::models::RiskLabel;

/// Which path produced a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSource {
    Model,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub label: RiskLabel,
    pub source: RiskSource,
}

impl RiskAssessment {
    pub fn fallback(adherence_percent: f64) -> Self {
        Self {
            label: threshold_label(adherence_percent),
            source: RiskSource::Fallback,
        }
    }
}

/// Maps adherence metrics to a risk label. Never fails.
pub trait RiskClassifier: Send + Sync {
    fn classify(&self, adherence_percent: f64, missed_count: u32) -> RiskAssessment;
}

/// The threshold rule on its own, with no model behind it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdClassifier;

impl RiskClassifier for ThresholdClassifier {
    fn classify(&self, adherence_percent: f64, _missed_count: u32) -> RiskAssessment {
        RiskAssessment::fallback(adherence_percent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierState {
    ModelReady,
    FallbackActive,
}

/// Load the named artifact, or train and persist one if none exists.
///
/// A failed save is logged and the freshly trained model is still returned.
/// A present-but-unreadable artifact is an error; it is not overwritten.
pub fn load_or_train<S: ModelStore + ?Sized>(
    store: &S,
    config: &ClassifierConfig,
) -> Result<RiskModel, RiskError> {
    if let Some(payload) = store.load(&config.artifact_name)? {
        let model = RiskModel::from_artifact(&payload)?;
        tracing::info!(
            artifact = %config.artifact_name,
            training_seed = model.training_seed,
            "Loaded risk model artifact"
        );
        return Ok(model);
    }

    tracing::info!(artifact = %config.artifact_name, "No risk model artifact, training");
    let model = training::train(config)?;

    let saved = model
        .to_artifact()
        .and_then(|payload| {
            store
                .save(&config.artifact_name, &payload)
                .map_err(RiskError::from)
        });
    if let Err(e) = saved {
        tracing::warn!(
            artifact = %config.artifact_name,
            error = %e,
            "Could not persist trained risk model; using in-memory copy"
        );
    }

    Ok(model)
}

/// Model-backed classifier with the threshold rule as its fallback.
///
/// The model is loaded (or trained) once in [`ModelRiskClassifier::initialize`]
/// and held for the classifier's lifetime. A failed prediction falls back for
/// that call only and leaves the model in place.
pub struct ModelRiskClassifier<S: ModelStore> {
    store: S,
    config: ClassifierConfig,
    model: Option<RiskModel>,
}

impl<S: ModelStore> ModelRiskClassifier<S> {
    /// Load-or-train against `store`. Failure leaves the classifier in
    /// fallback mode rather than erroring.
    pub fn initialize(store: S, config: ClassifierConfig) -> Self {
        let model = match load_or_train(&store, &config) {
            Ok(model) => Some(model),
            Err(e) => {
                tracing::warn!(
                    artifact = %config.artifact_name,
                    error = %e,
                    "Risk model unavailable, threshold fallback active"
                );
                None
            }
        };
        Self {
            store,
            config,
            model,
        }
    }

    /// Retry load-or-train. The current model is kept if this fails.
    pub fn reload(&mut self) -> Result<(), RiskError> {
        let model = load_or_train(&self.store, &self.config)?;
        self.model = Some(model);
        Ok(())
    }

    pub fn state(&self) -> ClassifierState {
        if self.model.is_some() {
            ClassifierState::ModelReady
        } else {
            ClassifierState::FallbackActive
        }
    }

    pub fn model(&self) -> Option<&RiskModel> {
        self.model.as_ref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: ModelStore> RiskClassifier for ModelRiskClassifier<S> {
    fn classify(&self, adherence_percent: f64, missed_count: u32) -> RiskAssessment {
        let Some(model) = &self.model else {
            return RiskAssessment::fallback(adherence_percent);
        };

        match model.predict(adherence_percent, missed_count) {
            Ok(label) => RiskAssessment {
                label,
                source: RiskSource::Model,
            },
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Risk prediction failed, using threshold fallback"
                );
                RiskAssessment::fallback(adherence_percent)
            }
        }
    }
}
