use std::path::{Path, PathBuf};
use std::process::Command;

use super::process::{locate_tool, run_tool};
use crate::error::Result;
use crate::pipeline::RunControl;
use crate::{SyllableSpec, SynthesisEngine};

const TOOL: &str = "espeak-ng";

/// Locations of the espeak-ng binary and its voice data.
#[derive(Debug, Clone, Default)]
pub struct EspeakConfig {
    /// Explicit binary. `None` searches `PATH`.
    pub bin_path: Option<PathBuf>,
    /// Directory containing `espeak-ng-data`. `None` uses the compiled-in default.
    pub data_path: Option<PathBuf>,
}

/// Speaks phoneme strings with espeak-ng.
///
/// Phonemes are wrapped in `[[...]]` so espeak-ng reads them as phoneme
/// mnemonics rather than text. Each call writes one WAV file:
///
/// ```text
/// espeak-ng -v VOICE -w OUT.wav -z [[PHONEMES]] [-s WPM]
/// ```
#[derive(Debug, Clone)]
pub struct EspeakSynthesizer {
    binary: PathBuf,
    data_path: Option<PathBuf>,
}

impl EspeakSynthesizer {
    /// Use `espeak-ng` from `PATH`.
    pub fn new() -> Result<Self> {
        Self::with_config(EspeakConfig::default())
    }

    pub fn with_config(config: EspeakConfig) -> Result<Self> {
        let binary = locate_tool(TOOL, config.bin_path.as_deref())?;
        log::info!("Using espeak-ng at {}", binary.display());
        Ok(Self {
            binary,
            data_path: config.data_path,
        })
    }

    fn command(&self, syllable: &SyllableSpec, wav_path: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        if let Some(data) = &self.data_path {
            cmd.arg(format!("--path={}", data.display()));
        }
        cmd.arg("-v")
            .arg(&syllable.voice)
            .arg("-w")
            .arg(wav_path)
            .arg("-z")
            .arg(phoneme_input(&syllable.phonemes));
        if let Some(wpm) = syllable.rate {
            cmd.arg("-s").arg(wpm.to_string());
        }
        cmd
    }
}

impl SynthesisEngine for EspeakSynthesizer {
    fn synthesize_to_file(
        &self,
        syllable: &SyllableSpec,
        wav_path: &Path,
        control: &RunControl,
    ) -> Result<()> {
        run_tool(TOOL, self.command(syllable, wav_path), control)
    }
}

fn phoneme_input(phonemes: &str) -> String {
    format!("[[{}]]", phonemes.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synth() -> EspeakSynthesizer {
        EspeakSynthesizer {
            binary: PathBuf::from("espeak-ng"),
            data_path: None,
        }
    }

    fn args(cmd: &Command) -> Vec<String> {
        cmd.get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn wraps_phonemes_in_brackets() {
        assert_eq!(phoneme_input(" aS "), "[[aS]]");
    }

    #[test]
    fn builds_command_without_rate() {
        let cmd = synth().command(&SyllableSpec::new("ad", 261.63, "he"), Path::new("/tmp/0.wav"));
        assert_eq!(args(&cmd), ["-v", "he", "-w", "/tmp/0.wav", "-z", "[[ad]]"]);
    }

    #[test]
    fn builds_command_with_rate_and_data_path() {
        let engine = EspeakSynthesizer {
            data_path: Some(PathBuf::from("/opt/espeak")),
            ..synth()
        };
        let spec = SyllableSpec::new("@m", 329.63, "he").with_rate(40);
        let cmd = engine.command(&spec, Path::new("/tmp/3.wav"));
        assert_eq!(
            args(&cmd),
            [
                "--path=/opt/espeak",
                "-v",
                "he",
                "-w",
                "/tmp/3.wav",
                "-z",
                "[[@m]]",
                "-s",
                "40"
            ]
        );
    }

    #[test]
    fn synthesizes_real_syllable_when_available() {
        // Skip when espeak-ng is unavailable in the execution environment.
        let Ok(engine) = EspeakSynthesizer::new() else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("0.wav");
        engine
            .synthesize_to_file(
                &SyllableSpec::new("ma", 220.0, "en"),
                &out,
                &RunControl::unbounded(),
            )
            .expect("espeak-ng should succeed");
        let pcm = crate::analysis::read_pcm(&out).unwrap();
        assert!(!pcm.samples.is_empty());
    }
}
