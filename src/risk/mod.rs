//! Risk classification: adherence metrics to a Low / Medium / High label.
//!
//! Two paths:
//! 1. Model: softmax regression trained once on seeded synthetic data and
//!    persisted as a named artifact
//! 2. Fallback: fixed adherence thresholds, used whenever the model is
//!    unavailable or a prediction fails
//!
//! The paths disagree at the margins: synthetic labels use both features,
//! the fallback looks at adherence only. Both are kept as-is.

mod classifier;
mod model;
mod rules;
mod store;
mod training;

use thiserror::Error;

use crate::db::DatabaseError;

// ═══════════════════════════════════════════════════════════════════════════
// Error types
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Artifact store lock poisoned")]
    LockFailed,
}

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Artifact store error: {0}")]
    Store(#[from] StoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Incompatible model artifact: format v{found}, expected v{expected}")]
    IncompatibleArtifact { found: u32, expected: u32 },

    #[error("Malformed model artifact: {0}")]
    MalformedArtifact(String),

    #[error("Invalid features: adherence={adherence_percent}, missed={missed_count}")]
    InvalidFeatures {
        adherence_percent: f64,
        missed_count: u32,
    },

    #[error("Training failed: {0}")]
    Training(String),
}

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports
// ═══════════════════════════════════════════════════════════════════════════

pub use classifier::*;
pub use model::*;
pub use rules::*;
pub use store::*;
pub use training::*;
