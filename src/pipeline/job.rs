use std::path::PathBuf;

use crate::analysis::{
    read_pcm, resolve_ratio, F0Estimator, FrequencyEstimate, PitchRatio, UnavailableEstimatePolicy,
};
use crate::engines::Engines;
use crate::error::{Error, Result};
use crate::{PitchCorrection, SyllableSpec};

use super::RunControl;

/// Progress of a syllable job. Stages advance strictly in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum JobStage {
    Pending,
    Synthesizing,
    Decoding,
    Estimating,
    Correcting,
    Done,
}

impl std::fmt::Display for JobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            JobStage::Pending => "waiting to start",
            JobStage::Synthesizing => "synthesizing",
            JobStage::Decoding => "decoding",
            JobStage::Estimating => "estimating pitch",
            JobStage::Correcting => "correcting pitch",
            JobStage::Done => "finishing",
        })
    }
}

/// Shared, read-only inputs of every job in a phrase.
pub struct JobContext<'a> {
    pub engines: &'a Engines,
    pub estimator: &'a F0Estimator,
    pub policy: UnavailableEstimatePolicy,
}

/// One syllable's unit of work. The job owns `artifact` exclusively.
#[derive(Debug, Clone)]
pub struct SyllableJob {
    pub slot: usize,
    pub spec: SyllableSpec,
    pub artifact: PathBuf,
}

/// What a finished job produced.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub slot: usize,
    /// Pitch-corrected waveform.
    pub output: PathBuf,
    /// `None` when the neutral ratio was applied for lack of an estimate.
    pub estimate: Option<FrequencyEstimate>,
    pub ratio: PitchRatio,
}

#[derive(Debug)]
pub struct JobFailure {
    pub slot: usize,
    /// Stage that was running when the job failed.
    pub stage: JobStage,
    pub error: Error,
}

impl JobFailure {
    pub fn into_error(self) -> Error {
        Error::Job {
            slot: self.slot,
            stage: self.stage,
            source: Box::new(self.error),
        }
    }
}

#[derive(Debug)]
pub enum JobOutcome {
    Done(JobReport),
    Failed(JobFailure),
    /// Stopped, or never started, because the run was cancelled.
    Cancelled,
}

#[derive(Debug)]
pub struct JobResult {
    pub slot: usize,
    pub outcome: JobOutcome,
}

impl JobResult {
    pub fn cancelled(slot: usize) -> Self {
        Self {
            slot,
            outcome: JobOutcome::Cancelled,
        }
    }

    pub fn failed(slot: usize, stage: JobStage, error: Error) -> Self {
        Self {
            slot,
            outcome: JobOutcome::Failed(JobFailure { slot, stage, error }),
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.outcome, JobOutcome::Done(_))
    }
}

impl SyllableJob {
    pub fn new(slot: usize, spec: SyllableSpec, artifact: PathBuf) -> Self {
        Self {
            slot,
            spec,
            artifact,
        }
    }

    /// Synthesize, analyse and correct this syllable. Never retries.
    pub fn run(&self, ctx: &JobContext<'_>, control: &RunControl) -> JobResult {
        let mut stage = JobStage::Pending;
        match self.execute(ctx, control, &mut stage) {
            Ok(report) => JobResult {
                slot: self.slot,
                outcome: JobOutcome::Done(report),
            },
            Err(Error::Cancelled) => {
                log::debug!("Syllable {} cancelled while {stage}", self.slot);
                JobResult::cancelled(self.slot)
            }
            Err(error) => JobResult::failed(self.slot, stage, error),
        }
    }

    fn execute(
        &self,
        ctx: &JobContext<'_>,
        control: &RunControl,
        stage: &mut JobStage,
    ) -> Result<JobReport> {
        self.advance(stage, JobStage::Synthesizing, control)?;
        ctx.engines
            .synthesizer
            .synthesize_to_file(&self.spec, &self.artifact, control)?;

        self.advance(stage, JobStage::Decoding, control)?;
        let pcm = read_pcm(&self.artifact)?;

        self.advance(stage, JobStage::Estimating, control)?;
        let (estimate, ratio) =
            resolve_ratio(self.spec.target_hz, ctx.estimator.estimate(&pcm), ctx.policy)?;

        self.advance(stage, JobStage::Correcting, control)?;
        let correction = PitchCorrection {
            ratio,
            target_hz: self.spec.target_hz,
            estimated_hz: estimate.map(|e| e.hz),
        };
        let output = ctx
            .engines
            .corrector
            .correct(&self.artifact, &correction, control)?;

        *stage = JobStage::Done;
        log::debug!(
            "Syllable {} done: {:?} Hz -> {} Hz (ratio {ratio})",
            self.slot,
            correction.estimated_hz,
            self.spec.target_hz
        );

        Ok(JobReport {
            slot: self.slot,
            output,
            estimate,
            ratio,
        })
    }

    fn advance(&self, stage: &mut JobStage, next: JobStage, control: &RunControl) -> Result<()> {
        control.check()?;
        debug_assert!(next > *stage);
        log::debug!("Syllable {} ({}): {next}", self.slot, self.spec.phonemes);
        *stage = next;
        Ok(())
    }
}
