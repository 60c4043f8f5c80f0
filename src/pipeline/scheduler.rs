//! Bounded-concurrency execution of syllable jobs.
//!
//! Jobs run on a dedicated rayon pool with exactly `concurrency` threads, so
//! no more than that many jobs are ever in flight. The first failure to be
//! observed trips the run's cancellation token: jobs that have not started yet
//! report [`JobOutcome::Cancelled`] without doing any work and running jobs
//! stop at their next checkpoint. Results are written into a slot-indexed
//! table, so completion order never affects the order they are reported in.

use std::num::NonZeroUsize;

use parking_lot::Mutex;

use super::job::{JobOutcome, JobReport, JobResult, JobStage, SyllableJob};
use super::RunControl;
use crate::error::{Error, Result};

pub struct Scheduler {
    concurrency: NonZeroUsize,
}

/// Every job's result, in slot order, plus the first failure observed.
#[derive(Debug)]
pub struct ScheduleReport {
    pub results: Vec<JobResult>,
    /// Index of the job whose failure was recorded first, by completion order.
    pub first_failure: Option<usize>,
}

impl Scheduler {
    pub fn new(concurrency: NonZeroUsize) -> Self {
        Self { concurrency }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency.get()
    }

    /// Run `work` for every job and wait for all of them to reach a terminal
    /// state.
    pub fn run<F>(&self, jobs: &[SyllableJob], control: &RunControl, work: F) -> Result<ScheduleReport>
    where
        F: Fn(&SyllableJob, &RunControl) -> JobResult + Sync,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.concurrency.get())
            .thread_name(|i| format!("syllable-worker-{i}"))
            .build()?;

        let slots: Vec<Mutex<Option<JobResult>>> = jobs.iter().map(|_| Mutex::new(None)).collect();
        let first_failure: Mutex<Option<usize>> = Mutex::new(None);

        log::debug!(
            "Scheduling {} syllable jobs on {} workers",
            jobs.len(),
            self.concurrency
        );

        pool.scope(|scope| {
            for (index, job) in jobs.iter().enumerate() {
                let slots = &slots;
                let first_failure = &first_failure;
                let work = &work;
                scope.spawn(move |_| {
                    let result = match control.check() {
                        Ok(()) => work(job, control),
                        Err(Error::Cancelled) => JobResult::cancelled(job.slot),
                        Err(stop) => JobResult::failed(job.slot, JobStage::Pending, stop),
                    };

                    if let JobOutcome::Failed(failure) = &result.outcome {
                        let mut first = first_failure.lock();
                        if first.is_none() {
                            *first = Some(index);
                            log::warn!(
                                "Syllable {} failed while {}: {}; cancelling remaining jobs",
                                failure.slot,
                                failure.stage,
                                failure.error
                            );
                        } else {
                            log::warn!(
                                "Syllable {} also failed while {}: {}",
                                failure.slot,
                                failure.stage,
                                failure.error
                            );
                        }
                        control.token().cancel();
                    }

                    *slots[index].lock() = Some(result);
                });
            }
        });

        let results = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.into_inner()
                    .unwrap_or_else(|| JobResult::cancelled(jobs[index].slot))
            })
            .collect();

        Ok(ScheduleReport {
            results,
            first_failure: first_failure.into_inner(),
        })
    }
}

impl ScheduleReport {
    pub fn done_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_done()).count()
    }

    /// Reports of every job in slot order, or the first failure.
    ///
    /// With no failure recorded but some job cancelled (an external
    /// interrupt), the run fails with [`Error::Cancelled`].
    pub fn into_result(self) -> Result<Vec<JobReport>> {
        let mut results = self.results;

        if let Some(index) = self.first_failure {
            let result = results.swap_remove(index);
            if let JobOutcome::Failed(failure) = result.outcome {
                return Err(failure.into_error());
            }
            return Err(Error::Cancelled);
        }

        results
            .into_iter()
            .map(|result| match result.outcome {
                JobOutcome::Done(report) => Ok(report),
                JobOutcome::Failed(failure) => Err(failure.into_error()),
                JobOutcome::Cancelled => Err(Error::Cancelled),
            })
            .collect()
    }
}
