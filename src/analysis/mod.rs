//! Pitch analysis of synthesized syllables.
//!
//! - [`pcm`] decodes a WAV file into normalized mono samples
//! - [`f0`] estimates the fundamental frequency from the autocorrelation
//! - [`ratio`] turns an estimate and a target pitch into a correction ratio

pub mod f0;
pub mod pcm;
pub mod ratio;

pub use f0::{EstimatorConfig, F0Estimator, FrequencyEstimate};
pub use pcm::{read_pcm, PcmBuffer};
pub use ratio::{pitch_ratio, resolve_ratio, PitchRatio, UnavailableEstimatePolicy};
