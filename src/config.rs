use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "TheraLink";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the persisted risk model artifact.
pub const RISK_MODEL_ARTIFACT: &str = "risk_model";

/// Overrides the data directory (tests, containers).
pub const DATA_DIR_ENV: &str = "THERALINK_DATA_DIR";

/// Overrides the synthetic-training seed.
pub const MODEL_SEED_ENV: &str = "THERALINK_MODEL_SEED";

/// Get the application data directory.
/// `~/TheraLink/` unless `THERALINK_DATA_DIR` is set.
pub fn app_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Get the models directory (risk model artifacts)
pub fn models_dir() -> PathBuf {
    app_data_dir().join("models")
}

/// Path of the artifact database used by the SQLite model store.
pub fn artifact_db_path() -> PathBuf {
    models_dir().join("artifacts.db")
}

/// Default `tracing` filter when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "theralink=info,theralink_lib=info"
}

// ═══════════════════════════════════════════
// Classifier training parameters
// ═══════════════════════════════════════════

/// Parameters for the synthetic training run of the risk model.
///
/// Training is fully determined by these values: the same config always
/// produces the same artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Artifact name inside the model store.
    pub artifact_name: String,
    /// RNG seed for the synthetic examples.
    pub seed: u64,
    /// Number of synthetic examples.
    pub sample_count: usize,
    /// Mean of the Poisson draw for missed doses.
    pub missed_dose_mean: f64,
    /// Gradient descent step size (standardised feature space).
    pub learning_rate: f64,
    /// Full-batch gradient descent iterations.
    pub epochs: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            artifact_name: RISK_MODEL_ARTIFACT.into(),
            seed: 42,
            sample_count: 1000,
            missed_dose_mean: 2.0,
            learning_rate: 0.5,
            epochs: 800,
        }
    }
}

impl ClassifierConfig {
    /// Default config with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var(MODEL_SEED_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(seed) => config.seed = seed,
                Err(_) => tracing::warn!(
                    value = %raw,
                    "Ignoring unparseable {MODEL_SEED_ENV}"
                ),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn models_dir_under_app_data() {
        let models = models_dir();
        let app = app_data_dir();
        assert!(models.starts_with(app));
        assert!(models.ends_with("models"));
    }

    #[test]
    fn artifact_db_in_models_dir() {
        let db = artifact_db_path();
        assert!(db.starts_with(models_dir()));
        assert!(db.ends_with("artifacts.db"));
    }

    #[test]
    fn app_name_is_theralink() {
        assert_eq!(APP_NAME, "TheraLink");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn classifier_defaults() {
        let config = ClassifierConfig::default();
        assert_eq!(config.artifact_name, "risk_model");
        assert_eq!(config.seed, 42);
        assert_eq!(config.sample_count, 1000);
        assert!((config.missed_dose_mean - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn classifier_config_partial_json_uses_defaults() {
        let config: ClassifierConfig = serde_json::from_str(r#"{"seed": 7}"#).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.sample_count, 1000);
        assert_eq!(config.artifact_name, RISK_MODEL_ARTIFACT);
    }
}
