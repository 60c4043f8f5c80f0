//! # syllable-tts
//!
//! Sung phrase synthesis: every syllable is spoken by an external TTS engine,
//! its pitch is measured and corrected to a target note, and the corrected
//! syllables are concatenated into one WAV file.
//!
//! ## Features
//!
//! - **F0 estimation**: FFT-based autocorrelation pitch detector
//! - **Bounded parallelism**: syllables are processed on a fixed-size worker
//!   pool, fail fast, and are always assembled in phrase order
//! - **Replaceable engines**: espeak-ng, Praat and SoX adapters out of the box,
//!   any of which can be swapped for your own implementation
//!
//! ## Quick Start
//!
//! ```no_run
//! use syllable_tts::{Engines, PhraseRequest, PhraseSynthesizer, PipelineConfig, SyllableSpec};
//!
//! let synthesizer = PhraseSynthesizer::new(Engines::system()?, PipelineConfig::default())?;
//!
//! let syllables = vec![
//!     SyllableSpec::new("ad", 261.63, "he"),
//!     SyllableSpec::new("on", 293.66, "he").with_rate(100),
//! ];
//! let out = std::fs::File::create("phrase.wav")?;
//! synthesizer.synthesize(PhraseRequest::new(syllables, out).with_concurrency(4))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod analysis;
pub mod engines;
pub mod error;
pub mod pipeline;
pub mod script;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testing;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use analysis::{EstimatorConfig, FrequencyEstimate, PitchRatio, UnavailableEstimatePolicy};
pub use engines::Engines;
pub use error::{Error, Result};
pub use pipeline::{
    CancelToken, PhraseRequest, PhraseSummary, PhraseSynthesizer, PipelineConfig,
    PipelineConfigBuilder, RunControl, SyllableAnalysis,
};
pub use script::PhraseScript;

/// One syllable of a phrase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyllableSpec {
    /// Phoneme string passed to the TTS engine (espeak-ng phoneme mnemonics
    /// for the default adapter).
    pub phonemes: String,
    /// Pitch the syllable is corrected to, in Hz.
    pub target_hz: f64,
    /// TTS voice identifier (e.g. `"he"`, `"en-us"`).
    pub voice: String,
    /// Speaking rate in words per minute. `None` uses the engine default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<u32>,
}

impl SyllableSpec {
    pub fn new(phonemes: impl Into<String>, target_hz: f64, voice: impl Into<String>) -> Self {
        Self {
            phonemes: phonemes.into(),
            target_hz,
            voice: voice.into(),
            rate: None,
        }
    }

    pub fn with_rate(mut self, wpm: u32) -> Self {
        self.rate = Some(wpm);
        self
    }
}

/// Correction handed to a [`PitchCorrector`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchCorrection {
    /// `target_hz / estimated_hz`, or neutral when no estimate was made.
    pub ratio: PitchRatio,
    pub target_hz: f64,
    pub estimated_hz: Option<f64>,
}

/// Turns one syllable into a waveform file.
///
/// Engines are shared by all worker threads of a phrase. Implementations that
/// spawn processes should poll `control` and stop when it is cancelled.
pub trait SynthesisEngine: Send + Sync {
    fn synthesize_to_file(
        &self,
        syllable: &SyllableSpec,
        wav_path: &Path,
        control: &RunControl,
    ) -> Result<()>;
}

/// Resynthesizes a waveform at a new pitch.
pub trait PitchCorrector: Send + Sync {
    /// Correct `wav_path` and return the path of the corrected waveform, which
    /// may be `wav_path` itself.
    fn correct(
        &self,
        wav_path: &Path,
        correction: &PitchCorrection,
        control: &RunControl,
    ) -> Result<PathBuf>;
}

/// Merges waveforms, in the given order, into `output`.
pub trait ConcatEngine: Send + Sync {
    fn concatenate(&self, inputs: &[PathBuf], output: &Path, control: &RunControl) -> Result<()>;
}
