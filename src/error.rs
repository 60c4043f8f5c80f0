//! Error types for phrase synthesis.

use std::path::PathBuf;

use crate::pipeline::JobStage;

/// Result type for phrase synthesis operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("Audio too short for F0 estimation: need {required} samples, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Analysis segment is silent")]
    SilentSegment,

    #[error("No significant fundamental frequency detected in the range {min_hz:.1}-{max_hz:.1} Hz")]
    NoPitchDetected { min_hz: f64, max_hz: f64 },

    #[error("Pitch estimate unavailable: {0}")]
    EstimationUnavailable(#[source] Box<Error>),

    #[error("{tool} not found. Install it or pass an explicit binary path.")]
    ToolNotFound { tool: String },

    #[error("Failed to spawn {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with code {exit_code:?}: {stderr}")]
    ExternalProcess {
        tool: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Workspace error: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("Phrase assembly failed: {reason}")]
    Assembly {
        reason: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Phrase synthesis timed out after {:.1}s", timeout.as_secs_f64())]
    Timeout { timeout: std::time::Duration },

    #[error("Cancelled")]
    Cancelled,

    #[error("Syllable {slot} failed while {stage}: {source}")]
    Job {
        slot: usize,
        stage: JobStage,
        #[source]
        source: Box<Error>,
    },

    #[error("Phrase has no syllables")]
    EmptyPhrase,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid phrase script: {0}")]
    Script(#[from] serde_json::Error),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for the estimator failures that mean "no usable pitch estimate".
    pub fn is_estimate_missing(&self) -> bool {
        matches!(
            self,
            Error::InsufficientData { .. } | Error::SilentSegment | Error::NoPitchDetected { .. }
        )
    }

    /// Strips `Job` wrappers and returns the underlying failure.
    pub fn root(&self) -> &Error {
        match self {
            Error::Job { source, .. } => source.root(),
            other => other,
        }
    }
}
