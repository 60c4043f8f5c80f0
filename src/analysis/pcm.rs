use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

/// Mono analysis samples decoded from a waveform file.
#[derive(Debug, Clone)]
pub struct PcmBuffer {
    /// Samples normalized to roughly `[-1, 1]`.
    pub samples: Vec<f64>,
    /// Sample rate of the source waveform.
    pub sample_rate: u32,
}

impl PcmBuffer {
    pub fn new(samples: Vec<f64>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode the first channel of a WAV file into normalized samples.
///
/// Integer samples are divided by `2^(bits - 1) - 1`; 32-bit float samples are
/// kept as they are. Any further channels are discarded.
pub fn read_pcm(path: &Path) -> Result<PcmBuffer> {
    let reader = hound::WavReader::open(path).map_err(|e| decode_error(path, e))?;
    decode(reader, path)
}

/// Same as [`read_pcm`] but from an in-memory or streaming source.
///
/// `origin` is only used for error messages.
pub fn read_pcm_from<R: Read>(source: R, origin: &Path) -> Result<PcmBuffer> {
    let reader = hound::WavReader::new(source).map_err(|e| decode_error(origin, e))?;
    decode(reader, origin)
}

fn decode<R: Read>(mut reader: hound::WavReader<R>, path: &Path) -> Result<PcmBuffer> {
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let samples: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => {
            if spec.bits_per_sample != 32 {
                return Err(Error::Decode {
                    path: path.to_path_buf(),
                    reason: format!("unsupported float bit depth {}", spec.bits_per_sample),
                });
            }
            reader
                .samples::<f32>()
                .step_by(channels)
                .map(|s| s.map(f64::from))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| decode_error(path, e))?
        }
        hound::SampleFormat::Int => {
            let bits = spec.bits_per_sample;
            if !(2..=32).contains(&bits) {
                return Err(Error::Decode {
                    path: path.to_path_buf(),
                    reason: format!("cannot normalize {bits}-bit samples"),
                });
            }
            let full_scale = ((1u64 << (bits - 1)) - 1) as f64;
            reader
                .samples::<i32>()
                .step_by(channels)
                .map(|s| s.map(|v| f64::from(v) / full_scale))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| decode_error(path, e))?
        }
    };

    if samples.is_empty() {
        return Err(Error::Decode {
            path: path.to_path_buf(),
            reason: "no samples".to_string(),
        });
    }

    log::debug!(
        "Decoded {} samples at {} Hz from {} ({} channel(s), {}-bit)",
        samples.len(),
        spec.sample_rate,
        path.display(),
        spec.channels,
        spec.bits_per_sample
    );

    Ok(PcmBuffer::new(samples, spec.sample_rate))
}

fn decode_error(path: &Path, err: hound::Error) -> Error {
    Error::Decode {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
