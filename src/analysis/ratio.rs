use serde::{Deserialize, Serialize};

use super::f0::FrequencyEstimate;
use crate::error::{Error, Result};

/// Multiplicative pitch correction, `target / estimate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchRatio(f64);

impl PitchRatio {
    /// The no-op correction.
    pub const NEUTRAL: PitchRatio = PitchRatio(1.0);

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_neutral(self) -> bool {
        self.0 == 1.0
    }
}

impl std::fmt::Display for PitchRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

/// What a syllable job does when no pitch estimate could be made.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableEstimatePolicy {
    /// Fail the syllable, and with it the whole phrase.
    #[default]
    Abort,
    /// Run the correction engine with [`PitchRatio::NEUTRAL`].
    Neutral,
}

/// Ratio that moves `estimate` onto `target_hz`.
pub fn pitch_ratio(target_hz: f64, estimate: Option<&FrequencyEstimate>) -> Result<PitchRatio> {
    if !(target_hz.is_finite() && target_hz > 0.0) {
        return Err(Error::Config(format!(
            "target pitch must be a positive frequency, got {target_hz}"
        )));
    }
    let estimate = estimate.ok_or_else(|| {
        Error::EstimationUnavailable(Box::new(Error::Config(
            "no frequency estimate was produced".to_string(),
        )))
    })?;
    Ok(PitchRatio(target_hz / estimate.hz))
}

/// Turns the outcome of F0 estimation into a ratio under `policy`.
///
/// Estimator failures that only mean "no pitch found" are wrapped in
/// [`Error::EstimationUnavailable`] under [`UnavailableEstimatePolicy::Abort`]
/// and replaced by the neutral ratio under
/// [`UnavailableEstimatePolicy::Neutral`]. Other errors pass through.
pub fn resolve_ratio(
    target_hz: f64,
    estimate: Result<FrequencyEstimate>,
    policy: UnavailableEstimatePolicy,
) -> Result<(Option<FrequencyEstimate>, PitchRatio)> {
    match estimate {
        Ok(estimate) => Ok((Some(estimate), pitch_ratio(target_hz, Some(&estimate))?)),
        Err(err) if err.is_estimate_missing() => match policy {
            UnavailableEstimatePolicy::Abort => Err(Error::EstimationUnavailable(Box::new(err))),
            UnavailableEstimatePolicy::Neutral => {
                log::warn!("{err}; applying neutral pitch ratio");
                Ok((None, PitchRatio::NEUTRAL))
            }
        },
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimate(hz: f64) -> FrequencyEstimate {
        FrequencyEstimate {
            hz,
            lag: 100,
            confidence: 0.9,
        }
    }

    #[test]
    fn ratio_times_estimate_recovers_target() {
        for &(target, est) in &[(261.63, 200.0), (440.0, 441.0), (98.0, 302.5)] {
            let ratio = pitch_ratio(target, Some(&estimate(est))).unwrap();
            assert!((ratio.value() * est - target).abs() < 1e-9);
        }
    }

    #[test]
    fn matching_pitch_is_neutral() {
        let ratio = pitch_ratio(440.0, Some(&estimate(440.0))).unwrap();
        assert!(ratio.is_neutral());
    }

    #[test]
    fn missing_estimate_is_unavailable() {
        let err = pitch_ratio(440.0, None).unwrap_err();
        assert!(matches!(err, Error::EstimationUnavailable(_)));
    }

    #[test]
    fn rejects_nonpositive_target() {
        assert!(matches!(
            pitch_ratio(0.0, Some(&estimate(100.0))),
            Err(Error::Config(_))
        ));
        assert!(pitch_ratio(f64::NAN, Some(&estimate(100.0))).is_err());
    }

    #[test]
    fn abort_policy_wraps_missing_pitch() {
        let err = resolve_ratio(
            440.0,
            Err(Error::SilentSegment),
            UnavailableEstimatePolicy::Abort,
        )
        .unwrap_err();
        match err {
            Error::EstimationUnavailable(inner) => assert!(matches!(*inner, Error::SilentSegment)),
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn neutral_policy_skips_correction() {
        let (est, ratio) = resolve_ratio(
            440.0,
            Err(Error::NoPitchDetected {
                min_hz: 50.0,
                max_hz: 1000.0,
            }),
            UnavailableEstimatePolicy::Neutral,
        )
        .unwrap();
        assert!(est.is_none());
        assert_eq!(ratio, PitchRatio::NEUTRAL);
    }

    #[test]
    fn unrelated_errors_pass_through_either_policy() {
        let err = resolve_ratio(
            440.0,
            Err(Error::Cancelled),
            UnavailableEstimatePolicy::Neutral,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
