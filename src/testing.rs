//! Fixtures and stand-in engines for tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::engines::praat::corrected_path;
use crate::error::{Error, Result};
use crate::pipeline::RunControl;
use crate::{ConcatEngine, PitchCorrection, PitchCorrector, SyllableSpec, SynthesisEngine};

pub const FIXTURE_RATE: u32 = 44100;

/// Write a 16-bit mono sine wave.
pub fn write_sine_wav(path: &Path, freq: f64, sample_rate: u32, len: usize) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for i in 0..len {
        let t = i as f64 / sample_rate as f64;
        let v = 0.6 * (2.0 * std::f64::consts::PI * freq * t).sin();
        writer.write_sample((v * 32767.0) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

/// Writes a sine at a fixed pitch for every syllable.
///
/// Sleeps for the delay registered for a syllable's phonemes, fails for
/// syllables whose phonemes equal `fail_on`, and writes silence for
/// phonemes equal to `silent_on`.
#[derive(Default)]
pub struct FakeSynth {
    pub pitch_hz: f64,
    pub fail_on: Option<String>,
    pub silent_on: Option<String>,
    pub delays: HashMap<String, Duration>,
    active: AtomicUsize,
    pub peak: AtomicUsize,
    pub calls: AtomicUsize,
}

impl FakeSynth {
    pub fn new(pitch_hz: f64) -> Self {
        Self {
            pitch_hz,
            ..Default::default()
        }
    }

    pub fn failing_on(mut self, phonemes: &str) -> Self {
        self.fail_on = Some(phonemes.to_string());
        self
    }

    pub fn silent_on(mut self, phonemes: &str) -> Self {
        self.silent_on = Some(phonemes.to_string());
        self
    }

    pub fn with_delay(mut self, phonemes: &str, millis: u64) -> Self {
        self.delays
            .insert(phonemes.to_string(), Duration::from_millis(millis));
        self
    }
}

impl SynthesisEngine for FakeSynth {
    fn synthesize_to_file(
        &self,
        syllable: &SyllableSpec,
        wav_path: &Path,
        control: &RunControl,
    ) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(&syllable.phonemes) {
            std::thread::sleep(*delay);
        }

        let result = if self.fail_on.as_deref() == Some(syllable.phonemes.as_str()) {
            Err(Error::ExternalProcess {
                tool: "fake-tts".to_string(),
                exit_code: Some(1),
                stderr: format!("cannot speak {}", syllable.phonemes),
            })
        } else if self.silent_on.as_deref() == Some(syllable.phonemes.as_str()) {
            write_silence(wav_path, 8192);
            Ok(())
        } else {
            write_sine_wav(wav_path, self.pitch_hz, FIXTURE_RATE, 8192);
            control.check()
        };

        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn write_silence(path: &Path, len: usize) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: FIXTURE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for _ in 0..len {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
}

/// Copies the input to the derived corrected path and records each call.
#[derive(Default)]
pub struct FakeCorrector {
    pub calls: Mutex<Vec<(PathBuf, PitchCorrection)>>,
}

impl PitchCorrector for FakeCorrector {
    fn correct(
        &self,
        wav_path: &Path,
        correction: &PitchCorrection,
        _control: &RunControl,
    ) -> Result<PathBuf> {
        let out = corrected_path(wav_path);
        std::fs::copy(wav_path, &out)?;
        self.calls.lock().push((wav_path.to_path_buf(), *correction));
        Ok(out)
    }
}

/// Writes the byte concatenation of its inputs and records the input order.
#[derive(Default)]
pub struct FakeConcat {
    pub fail: bool,
    pub inputs: Mutex<Vec<PathBuf>>,
}

impl ConcatEngine for FakeConcat {
    fn concatenate(&self, inputs: &[PathBuf], output: &Path, _control: &RunControl) -> Result<()> {
        *self.inputs.lock() = inputs.to_vec();
        if self.fail {
            return Err(Error::ExternalProcess {
                tool: "fake-concat".to_string(),
                exit_code: Some(2),
                stderr: "merge failed".to_string(),
            });
        }
        let mut merged = Vec::new();
        for input in inputs {
            merged.extend(std::fs::read(input)?);
        }
        std::fs::write(output, merged)?;
        Ok(())
    }
}
