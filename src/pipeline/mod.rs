//! Phrase synthesis pipeline.
//!
//! A [`PhraseSynthesizer`] renders one [`PhraseRequest`] at a time:
//!
//! 1. allocate a [`Workspace`] with one artifact path per syllable slot
//! 2. run a [`SyllableJob`] per syllable on the bounded [`Scheduler`]
//! 3. once every job is done, concatenate the corrected syllables in slot
//!    order with the [`PhraseAssembler`]
//! 4. remove the workspace
//! 5. write the merged phrase to the request's sink
//!
//! Any failure aborts the phrase and leaves the sink untouched.

pub mod assembler;
pub mod config;
pub mod control;
pub mod job;
pub mod scheduler;

use std::io::Write;
use std::num::NonZeroUsize;
use std::time::Instant;

pub use assembler::PhraseAssembler;
pub use config::{
    PipelineConfig, PipelineConfigBuilder, PipelineConfigBuilderError, DEFAULT_TIMEOUT,
};
pub use control::{CancelToken, RunControl};
pub use job::{JobContext, JobOutcome, JobReport, JobResult, JobStage, SyllableJob};
pub use scheduler::{ScheduleReport, Scheduler};

use crate::analysis::{F0Estimator, FrequencyEstimate, PitchRatio};
use crate::engines::Engines;
use crate::error::{Error, Result};
use crate::workspace::Workspace;
use crate::SyllableSpec;

/// One phrase to render.
pub struct PhraseRequest<W: Write> {
    pub syllables: Vec<SyllableSpec>,
    /// Receives the merged WAV bytes on success, nothing otherwise.
    pub sink: W,
    /// Worker count. `None` uses [`PipelineConfig::default_concurrency`].
    pub concurrency: Option<usize>,
}

impl<W: Write> PhraseRequest<W> {
    pub fn new(syllables: Vec<SyllableSpec>, sink: W) -> Self {
        Self {
            syllables,
            sink,
            concurrency: None,
        }
    }

    pub fn with_concurrency(mut self, workers: usize) -> Self {
        self.concurrency = Some(workers);
        self
    }
}

/// Per-syllable analysis of a rendered phrase.
#[derive(Debug, Clone, PartialEq)]
pub struct SyllableAnalysis {
    pub slot: usize,
    pub estimate: Option<FrequencyEstimate>,
    pub ratio: PitchRatio,
}

/// What a successful render produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PhraseSummary {
    pub bytes_written: usize,
    /// In slot order.
    pub syllables: Vec<SyllableAnalysis>,
}

/// Renders phrases with a fixed set of engines and settings.
pub struct PhraseSynthesizer {
    engines: Engines,
    config: PipelineConfig,
    estimator: F0Estimator,
    interrupt: CancelToken,
}

impl PhraseSynthesizer {
    pub fn new(engines: Engines, config: PipelineConfig) -> Result<Self> {
        config.validate().map_err(Error::Config)?;
        let estimator = F0Estimator::new(config.estimator)?;
        Ok(Self {
            engines,
            config,
            estimator,
            interrupt: CancelToken::new(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Token that cancels whatever phrase is currently rendering, e.g. from a
    /// signal handler. The interrupted render unwinds normally, so its
    /// workspace is still removed. Call [`CancelToken::reset`] to render again.
    pub fn interrupt_token(&self) -> CancelToken {
        self.interrupt.clone()
    }

    /// Render `request` and write the merged waveform to its sink.
    pub fn synthesize<W: Write>(&self, request: PhraseRequest<W>) -> Result<PhraseSummary> {
        let PhraseRequest {
            syllables,
            mut sink,
            concurrency,
        } = request;

        validate_syllables(&syllables)?;
        let workers = concurrency.unwrap_or(self.config.default_concurrency);
        let workers = NonZeroUsize::new(workers)
            .ok_or_else(|| Error::Config("concurrency must be at least 1".to_string()))?;

        let started = Instant::now();
        log::info!(
            "Synthesizing {} syllables with {} workers",
            syllables.len(),
            workers
        );

        let control = RunControl::new(Some(self.interrupt.clone()), self.config.timeout);
        let workspace = Workspace::create(self.config.scratch_root.as_deref())?;

        let jobs: Vec<SyllableJob> = syllables
            .into_iter()
            .enumerate()
            .map(|(slot, spec)| SyllableJob::new(slot, spec, workspace.slot_path(slot)))
            .collect();

        let ctx = JobContext {
            engines: &self.engines,
            estimator: &self.estimator,
            policy: self.config.unavailable_estimate,
        };
        let reports = Scheduler::new(workers)
            .run(&jobs, &control, |job, control| job.run(&ctx, control))?
            .into_result()?;

        let outputs: Vec<_> = reports.iter().map(|r| r.output.clone()).collect();
        let merged = PhraseAssembler::new(self.engines.concatenator.as_ref()).assemble(
            &outputs,
            &workspace.phrase_path(),
            &control,
        )?;

        // Cleanup can still fail, so the sink is only touched afterwards.
        workspace.close()?;
        let bytes_written = assembler::deliver(&merged, &control, &mut sink)?;

        log::info!(
            "Synthesized {} syllables ({} bytes) in {:.2?}",
            reports.len(),
            bytes_written,
            started.elapsed()
        );

        Ok(PhraseSummary {
            bytes_written,
            syllables: reports
                .into_iter()
                .map(|r| SyllableAnalysis {
                    slot: r.slot,
                    estimate: r.estimate,
                    ratio: r.ratio,
                })
                .collect(),
        })
    }
}

fn validate_syllables(syllables: &[SyllableSpec]) -> Result<()> {
    if syllables.is_empty() {
        return Err(Error::EmptyPhrase);
    }
    for (slot, syllable) in syllables.iter().enumerate() {
        if !(syllable.target_hz.is_finite() && syllable.target_hz > 0.0) {
            return Err(Error::Config(format!(
                "syllable {slot} has invalid target pitch {}",
                syllable.target_hz
            )));
        }
        if syllable.phonemes.trim().is_empty() {
            return Err(Error::Config(format!("syllable {slot} has no phonemes")));
        }
    }
    Ok(())
}
