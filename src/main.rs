//! TheraLink command line
//!
//! Evaluates one patient file and prints the derived metrics as JSON.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use theralink_lib::config::{self, ClassifierConfig};
use theralink_lib::db::DatabaseError;
use theralink_lib::engine::{AdherenceEngine, PatientSnapshot, PatientUpdate};
use theralink_lib::models::{DoseLogRecord, StoredDoseLog, StoredTreatment, TreatmentRecord};
use theralink_lib::risk::{
    ClassifierState, FileModelStore, ModelRiskClassifier, ModelStore, RiskClassifier,
    SqliteModelStore, ThresholdClassifier,
};

#[derive(Parser)]
#[command(name = "theralink")]
#[command(version = config::APP_VERSION)]
#[command(about = "Medication adherence metrics and risk classification")]
struct Cli {
    /// Patient file: { "dose_logs": [...], "treatments": [...] }
    patient: PathBuf,

    /// Directory holding the risk model artifact (default: ~/TheraLink/models)
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Keep the artifact in an SQLite database inside the model directory
    #[arg(long)]
    sqlite: bool,
}

#[derive(Debug, Deserialize)]
struct PatientFile {
    #[serde(default)]
    dose_logs: Vec<StoredDoseLog>,
    #[serde(default)]
    treatments: Vec<StoredTreatment>,
}

#[derive(Debug, Serialize)]
struct Output {
    snapshot: PatientSnapshot,
    update: PatientUpdate,
    classifier: ClassifierState,
}

#[derive(Error, Debug)]
enum CliError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed patient file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid record: {0}")]
    Record(#[from] DatabaseError),
}

fn read_patient(path: &Path) -> Result<(Vec<DoseLogRecord>, Vec<TreatmentRecord>), CliError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file: PatientFile = serde_json::from_str(&raw)?;

    let logs = file
        .dose_logs
        .iter()
        .map(DoseLogRecord::from_stored)
        .collect::<Result<Vec<_>, _>>()?;
    let treatments = file
        .treatments
        .iter()
        .map(TreatmentRecord::from_stored)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((logs, treatments))
}

fn render<C: RiskClassifier>(
    classifier: C,
    state: ClassifierState,
    logs: &[DoseLogRecord],
    treatments: &[TreatmentRecord],
) -> Result<String, CliError> {
    let engine = AdherenceEngine::new(classifier);
    let snapshot = engine.evaluate(logs, treatments);

    let output = Output {
        update: snapshot.patient_update(),
        snapshot,
        classifier: state,
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

fn evaluate<S: ModelStore>(
    store: S,
    logs: &[DoseLogRecord],
    treatments: &[TreatmentRecord],
) -> Result<String, CliError> {
    let classifier = ModelRiskClassifier::initialize(store, ClassifierConfig::from_env());
    let state = classifier.state();
    render(classifier, state, logs, treatments)
}

fn run(cli: &Cli) -> Result<String, CliError> {
    let (logs, treatments) = read_patient(&cli.patient)?;
    let model_dir = cli.model_dir.clone().unwrap_or_else(config::models_dir);

    if !cli.sqlite {
        return evaluate(FileModelStore::new(model_dir), &logs, &treatments);
    }

    let path = match &cli.model_dir {
        Some(dir) => dir.join("artifacts.db"),
        None => config::artifact_db_path(),
    };
    match SqliteModelStore::open(&path) {
        Ok(store) => evaluate(store, &logs, &treatments),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Artifact database unavailable, threshold fallback active"
            );
            render(
                ThresholdClassifier,
                ClassifierState::FallbackActive,
                &logs,
                &treatments,
            )
        }
    }
}

fn main() -> ExitCode {
    theralink_lib::init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(patient = %cli.patient.display(), error = %e, "Evaluation failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATIENT: &str = r#"{
        "dose_logs": [
            {"medication": "Metformin", "status": "Taken", "date": "2025-01-06"},
            {"medication": "Metformin", "status": "Missed", "date": "2025-01-08"},
            {"medication": "Metformin", "status": "Taken", "date": "2025-01-10"},
            {"medication": "Metformin", "status": "Taken", "date": "2025-01-13"}
        ],
        "treatments": [
            {"medication": "Metformin", "dosage": "500mg",
             "frequency": "2x daily (Schedule: Monday, Wednesday, Friday)"}
        ]
    }"#;

    fn cli(dir: &Path, model_dir: PathBuf, sqlite: bool) -> Cli {
        let patient = dir.join("patient.json");
        std::fs::write(&patient, PATIENT).unwrap();
        Cli {
            patient,
            model_dir: Some(model_dir),
            sqlite,
        }
    }

    #[test]
    fn unopenable_sqlite_store_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the model directory should be
        let not_a_dir = dir.path().join("models");
        std::fs::write(&not_a_dir, "").unwrap();

        let json = run(&cli(dir.path(), not_a_dir, true)).unwrap();
        let out: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(out["classifier"], "fallback_active");
        assert_eq!(out["snapshot"]["risk"]["source"], "fallback");
        assert_eq!(out["snapshot"]["risk"]["label"], "Medium");
        assert_eq!(out["update"]["adherence_percent"], 75.0);
    }

    #[test]
    fn unusable_file_store_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("models");
        std::fs::write(&not_a_dir, "").unwrap();

        let json = run(&cli(dir.path(), not_a_dir, false)).unwrap();
        let out: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(out["classifier"], "fallback_active");
        assert_eq!(out["snapshot"]["risk"]["source"], "fallback");
    }

    #[test]
    fn sqlite_store_trains_model() {
        let dir = tempfile::tempdir().unwrap();
        let json = run(&cli(dir.path(), dir.path().join("models"), true)).unwrap();
        let out: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(out["classifier"], "model_ready");
        assert_eq!(out["snapshot"]["risk"]["source"], "model");
        assert!(dir.path().join("models/artifacts.db").exists());
    }

    #[test]
    fn missing_patient_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli {
            patient: dir.path().join("absent.json"),
            model_dir: Some(dir.path().to_path_buf()),
            sqlite: false,
        };
        assert!(matches!(run(&cli), Err(CliError::Read { .. })));
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from(["theralink", "p.json", "--model-dir", "/m", "--sqlite"]).unwrap();
        assert_eq!(cli.patient, PathBuf::from("p.json"));
        assert_eq!(cli.model_dir, Some(PathBuf::from("/m")));
        assert!(cli.sqlite);
    }
}
