//! Fundamental-frequency estimation from the autocorrelation function.
//!
//! The estimator analyses a single frame taken from the middle of the
//! waveform, away from onset and release transients:
//!
//! 1. Apply a Hann window to the frame.
//! 2. Forward FFT, then build the full Hermitian power spectrum from the
//!    positive-frequency bins.
//! 3. Inverse FFT of the power spectrum gives the (circular, biased)
//!    autocorrelation by Wiener–Khinchin.
//! 4. Normalize by lag 0 and pick the strongest lag inside the vocal range.
//!
//! The lag with the maximum correlation wins, so for fundamentals far below
//! `max_f0_hz` the short-lag shoulder of the ACF can outrank the true period.
//! Narrow `max_f0_hz` when analysing low voices.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};

use super::pcm::PcmBuffer;
use crate::error::{Error, Result};

/// Default analysis frame length in samples.
pub const DEFAULT_FRAME_SIZE: usize = 2048;

/// Lowest fundamental searched by default (bass voice).
pub const DEFAULT_MIN_F0_HZ: f64 = 50.0;

/// Highest fundamental searched by default (soprano).
pub const DEFAULT_MAX_F0_HZ: f64 = 1000.0;

/// Normalized ACF value a peak must exceed to count as periodic.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.1;

/// Parameters for the F0 estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Analysis frame length. Must be a power of two.
    pub frame_size: usize,
    pub min_f0_hz: f64,
    pub max_f0_hz: f64,
    /// Peaks at or below this normalized correlation are rejected.
    pub confidence_threshold: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            frame_size: DEFAULT_FRAME_SIZE,
            min_f0_hz: DEFAULT_MIN_F0_HZ,
            max_f0_hz: DEFAULT_MAX_F0_HZ,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

impl EstimatorConfig {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.frame_size < 2 || !self.frame_size.is_power_of_two() {
            return Err(format!(
                "frame_size must be a power of two >= 2, got {}",
                self.frame_size
            ));
        }
        if !(self.min_f0_hz > 0.0 && self.min_f0_hz < self.max_f0_hz) {
            return Err(format!(
                "F0 range must satisfy 0 < min < max, got {}..{}",
                self.min_f0_hz, self.max_f0_hz
            ));
        }
        if !(0.0..1.0).contains(&self.confidence_threshold) {
            return Err(format!(
                "confidence_threshold must be in [0, 1), got {}",
                self.confidence_threshold
            ));
        }
        Ok(())
    }

    /// Lag search window `[min_lag, max_lag]` in samples for a sample rate.
    pub fn lag_range(&self, sample_rate: u32) -> (usize, usize) {
        let sr = f64::from(sample_rate);
        let min_lag = ((sr / self.max_f0_hz) as usize).max(1);
        let max_lag = ((sr / self.min_f0_hz) as usize).min(self.frame_size - 1);
        (min_lag, max_lag)
    }
}

/// A detected fundamental frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyEstimate {
    /// Estimated F0, always positive.
    pub hz: f64,
    /// Period of the accepted ACF peak, in samples.
    pub lag: usize,
    /// Normalized ACF value at `lag`.
    pub confidence: f64,
}

/// Autocorrelation-based F0 estimator.
///
/// FFT plans are built once and shared, so one estimator can serve every
/// worker thread.
pub struct F0Estimator {
    config: EstimatorConfig,
    window: Vec<f64>,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl std::fmt::Debug for F0Estimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("F0Estimator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl F0Estimator {
    pub fn new(config: EstimatorConfig) -> Result<Self> {
        config.validate().map_err(Error::Config)?;

        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(config.frame_size);
        let inverse = planner.plan_fft_inverse(config.frame_size);

        Ok(Self {
            config,
            window: hann_window(config.frame_size),
            forward,
            inverse,
        })
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Estimate the fundamental frequency of `pcm`.
    pub fn estimate(&self, pcm: &PcmBuffer) -> Result<FrequencyEstimate> {
        let frame = self.config.frame_size;
        if pcm.samples.len() < frame {
            return Err(Error::InsufficientData {
                required: frame,
                available: pcm.samples.len(),
            });
        }

        let start = (pcm.samples.len() / 2).saturating_sub(frame / 2);
        let segment = &pcm.samples[start..start + frame];

        let acf = self.autocorrelation(segment)?;
        let (min_lag, max_lag) = self.config.lag_range(pcm.sample_rate);

        let (lag, confidence) =
            pick_peak(&acf, min_lag, max_lag, self.config.confidence_threshold).ok_or(
                Error::NoPitchDetected {
                    min_hz: self.config.min_f0_hz,
                    max_hz: self.config.max_f0_hz,
                },
            )?;

        let hz = f64::from(pcm.sample_rate) / lag as f64;
        log::debug!("Estimated F0 {hz:.2} Hz (lag {lag}, confidence {confidence:.3})");

        Ok(FrequencyEstimate {
            hz,
            lag,
            confidence,
        })
    }

    /// Normalized autocorrelation of one Hann-windowed frame.
    ///
    /// `segment` must be exactly `frame_size` long. Fails with
    /// [`Error::SilentSegment`] when the zero-lag energy is zero.
    pub fn autocorrelation(&self, segment: &[f64]) -> Result<Vec<f64>> {
        let n = self.config.frame_size;
        debug_assert_eq!(segment.len(), n);

        let mut spectrum: Vec<Complex<f64>> = segment
            .iter()
            .zip(&self.window)
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();
        self.forward.process(&mut spectrum);

        // Power spectrum from DC..Nyquist, mirrored onto the negative bins.
        let mut psd = vec![Complex::new(0.0, 0.0); n];
        psd[0] = Complex::new(spectrum[0].norm_sqr(), 0.0);
        for i in 1..n / 2 {
            let power = Complex::new(spectrum[i].norm_sqr(), 0.0);
            psd[i] = power;
            psd[n - i] = power;
        }
        if n % 2 == 0 {
            psd[n / 2] = Complex::new(spectrum[n / 2].norm_sqr(), 0.0);
        }

        self.inverse.process(&mut psd);

        let zero_lag = psd[0].re;
        if zero_lag == 0.0 {
            return Err(Error::SilentSegment);
        }

        Ok(psd.iter().map(|c| c.re / zero_lag).collect())
    }
}

/// Symmetric Hann window of length `len`.
pub fn hann_window(len: usize) -> Vec<f64> {
    if len == 1 {
        return vec![1.0];
    }
    let denom = (len - 1) as f64;
    (0..len)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / denom).cos()))
        .collect()
}

/// Strongest ACF lag in `[min_lag, max_lag]` whose value exceeds `threshold`.
///
/// Only strictly greater values replace the running best, so ties resolve to
/// the shortest lag.
pub fn pick_peak(
    acf: &[f64],
    min_lag: usize,
    max_lag: usize,
    threshold: f64,
) -> Option<(usize, f64)> {
    let max_lag = max_lag.min(acf.len().saturating_sub(1));
    let mut best: Option<(usize, f64)> = None;

    for lag in min_lag..=max_lag {
        let value = acf[lag];
        if value <= threshold {
            continue;
        }
        if best.map_or(true, |(_, v)| value > v) {
            best = Some((lag, value));
        }
    }

    best
}
