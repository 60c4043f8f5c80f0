//! External engine adapters.
//!
//! Each adapter drives one command-line tool and implements one of the engine
//! traits from the crate root:
//! - [`espeak::EspeakSynthesizer`] - [`SynthesisEngine`](crate::SynthesisEngine) via espeak-ng
//! - [`praat::PraatCorrector`] - [`PitchCorrector`](crate::PitchCorrector) via Praat
//! - [`sox::SoxConcatenator`] - [`ConcatEngine`](crate::ConcatEngine) via SoX
//!
//! # System Requirements
//!
//! - **Linux**: `sudo apt-get install espeak-ng praat sox`
//! - **macOS**: `brew install espeak-ng sox` and Praat from <https://www.fon.hum.uva.nl/praat/>

pub mod espeak;
pub mod praat;
pub mod process;
pub mod sox;

use std::sync::Arc;

pub use espeak::{EspeakConfig, EspeakSynthesizer};
pub use praat::PraatCorrector;
pub use sox::SoxConcatenator;

use crate::error::Result;
use crate::{ConcatEngine, PitchCorrector, SynthesisEngine};

/// The three engines a phrase needs.
#[derive(Clone)]
pub struct Engines {
    pub synthesizer: Arc<dyn SynthesisEngine>,
    pub corrector: Arc<dyn PitchCorrector>,
    pub concatenator: Arc<dyn ConcatEngine>,
}

impl Engines {
    pub fn new(
        synthesizer: impl SynthesisEngine + 'static,
        corrector: impl PitchCorrector + 'static,
        concatenator: impl ConcatEngine + 'static,
    ) -> Self {
        Self {
            synthesizer: Arc::new(synthesizer),
            corrector: Arc::new(corrector),
            concatenator: Arc::new(concatenator),
        }
    }

    /// espeak-ng, Praat and SoX, all resolved from `PATH`.
    pub fn system() -> Result<Self> {
        Ok(Self::new(
            EspeakSynthesizer::new()?,
            PraatCorrector::new()?,
            SoxConcatenator::new()?,
        ))
    }
}

impl std::fmt::Debug for Engines {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engines").finish_non_exhaustive()
    }
}
