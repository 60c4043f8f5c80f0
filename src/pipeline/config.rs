use std::path::PathBuf;
use std::time::Duration;

use derive_builder::Builder;

use crate::analysis::{EstimatorConfig, UnavailableEstimatePolicy};
use crate::error::Error;

/// Deadline for a whole phrase when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Settings shared by every phrase a [`PhraseSynthesizer`](super::PhraseSynthesizer) renders.
///
/// ```
/// use std::time::Duration;
/// use syllable_tts::{PipelineConfigBuilder, UnavailableEstimatePolicy};
///
/// let config = PipelineConfigBuilder::default()
///     .timeout(Some(Duration::from_secs(60)))
///     .unavailable_estimate(UnavailableEstimatePolicy::Neutral)
///     .build()?;
/// assert_eq!(config.timeout, Some(Duration::from_secs(60)));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Builder)]
#[builder(default, build_fn(validate = "Self::validate"))]
pub struct PipelineConfig {
    /// F0 estimator parameters.
    pub estimator: EstimatorConfig,
    /// What to do with syllables whose pitch cannot be estimated.
    pub unavailable_estimate: UnavailableEstimatePolicy,
    /// Deadline for one phrase. `None` disables it.
    pub timeout: Option<Duration>,
    /// Parent of the scratch directories. `None` uses the system temp dir.
    #[builder(setter(into, strip_option))]
    pub scratch_root: Option<PathBuf>,
    /// Concurrency used when a request does not set one.
    pub default_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            estimator: EstimatorConfig::default(),
            unavailable_estimate: UnavailableEstimatePolicy::default(),
            timeout: Some(DEFAULT_TIMEOUT),
            scratch_root: None,
            default_concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.estimator.validate()?;
        if self.default_concurrency == 0 {
            return Err("default_concurrency must be at least 1".to_string());
        }
        Ok(())
    }
}

impl PipelineConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(estimator) = &self.estimator {
            estimator.validate()?;
        }
        if self.default_concurrency == Some(0) {
            return Err("default_concurrency must be at least 1".to_string());
        }
        Ok(())
    }
}

impl From<PipelineConfigBuilderError> for Error {
    fn from(err: PipelineConfigBuilderError) -> Self {
        Error::Config(err.to_string())
    }
}
