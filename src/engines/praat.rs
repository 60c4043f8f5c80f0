use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::process::{locate_tool, run_tool};
use crate::error::{Error, Result};
use crate::pipeline::RunControl;
use crate::{PitchCorrection, PitchCorrector};

const TOOL: &str = "praat";

const PITCH_SHIFT_SCRIPT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/scripts/pitch_shift.praat"
));

/// Pitch correction through Praat's PSOLA resynthesis.
///
/// The bundled script multiplies the pitch contour by the correction ratio
/// and writes the result next to the input as `<stem>_corrected.wav`.
#[derive(Debug, Clone)]
pub struct PraatCorrector {
    binary: PathBuf,
    script: Option<PathBuf>,
}

impl PraatCorrector {
    /// Use `praat` from `PATH` with the bundled script.
    pub fn new() -> Result<Self> {
        Self::with_binary(None)
    }

    pub fn with_binary(binary: Option<&Path>) -> Result<Self> {
        let binary = locate_tool(TOOL, binary)?;
        log::info!("Using Praat at {}", binary.display());
        Ok(Self {
            binary,
            script: None,
        })
    }

    /// Run a custom script instead of the bundled one. It receives the same
    /// arguments: input path, ratio, output path.
    pub fn script(mut self, path: impl Into<PathBuf>) -> Self {
        self.script = Some(path.into());
        self
    }

    fn command(&self, script: &Path, input: &Path, ratio: f64, output: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["--run", "--no-pref-files", "--no-plugins"])
            .arg(script)
            .arg(input)
            .arg(ratio.to_string())
            .arg(output);
        cmd
    }
}

impl PitchCorrector for PraatCorrector {
    fn correct(
        &self,
        wav_path: &Path,
        correction: &PitchCorrection,
        control: &RunControl,
    ) -> Result<PathBuf> {
        let output = corrected_path(wav_path);

        // The bundled script lives in a temp file for the duration of the call.
        let bundled;
        let script = match &self.script {
            Some(path) => path.as_path(),
            None => {
                bundled = write_bundled_script()?;
                bundled.path()
            }
        };

        let cmd = self.command(script, wav_path, correction.ratio.value(), &output);
        run_tool(TOOL, cmd, control)?;

        if !output.exists() {
            return Err(Error::ExternalProcess {
                tool: TOOL.to_string(),
                exit_code: Some(0),
                stderr: format!("no corrected waveform at {}", output.display()),
            });
        }
        Ok(output)
    }
}

fn write_bundled_script() -> Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("pitch_shift_")
        .suffix(".praat")
        .tempfile()?;
    file.write_all(PITCH_SHIFT_SCRIPT.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// `dir/3.wav` -> `dir/3_corrected.wav`
pub fn corrected_path(wav_path: &Path) -> PathBuf {
    let stem = wav_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    wav_path.with_file_name(format!("{stem}_corrected.wav"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::PitchRatio;

    #[test]
    fn derives_corrected_path_next_to_input() {
        assert_eq!(
            corrected_path(Path::new("/scratch/12.wav")),
            PathBuf::from("/scratch/12_corrected.wav")
        );
    }

    #[test]
    fn bundled_script_takes_three_arguments() {
        assert!(PITCH_SHIFT_SCRIPT.contains("sentence Input_file"));
        assert!(PITCH_SHIFT_SCRIPT.contains("positive Ratio"));
        assert!(PITCH_SHIFT_SCRIPT.contains("sentence Output_file"));
        let file = write_bundled_script().unwrap();
        assert_eq!(
            std::fs::read_to_string(file.path()).unwrap(),
            PITCH_SHIFT_SCRIPT
        );
    }

    #[test]
    fn builds_batch_command() {
        let corrector = PraatCorrector {
            binary: PathBuf::from("praat"),
            script: None,
        };
        let cmd = corrector.command(
            Path::new("s.praat"),
            Path::new("0.wav"),
            1.5,
            Path::new("0_corrected.wav"),
        );
        let args: Vec<_> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            [
                "--run",
                "--no-pref-files",
                "--no-plugins",
                "s.praat",
                "0.wav",
                "1.5",
                "0_corrected.wav"
            ]
        );
    }

    #[test]
    fn tiny_ratios_survive_formatting() {
        let corrector = PraatCorrector {
            binary: PathBuf::from("praat"),
            script: None,
        };
        for ratio in [1e-7, 0.987654321, 3.0] {
            let cmd = corrector.command(
                Path::new("s.praat"),
                Path::new("0.wav"),
                ratio,
                Path::new("o.wav"),
            );
            let arg = cmd.get_args().nth(5).unwrap().to_string_lossy().into_owned();
            assert!(!arg.contains('e'), "{arg}");
            assert_eq!(arg.parse::<f64>().unwrap(), ratio);
        }
    }

    fn corrector_for(tool: &str) -> Option<PraatCorrector> {
        let binary = locate_tool(tool, None).ok()?;
        Some(PraatCorrector {
            binary,
            script: None,
        })
    }

    fn neutral() -> PitchCorrection {
        PitchCorrection {
            ratio: PitchRatio::NEUTRAL,
            target_hz: 220.0,
            estimated_hz: Some(220.0),
        }
    }

    #[test]
    fn silent_success_without_output_is_an_error() {
        // `true` accepts any arguments and writes nothing.
        let Some(corrector) = corrector_for("true") else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("0.wav");
        let err = corrector
            .correct(&input, &neutral(), &RunControl::unbounded())
            .unwrap_err();
        assert!(
            matches!(err, Error::ExternalProcess { ref stderr, .. } if stderr.contains("0_corrected.wav")),
            "{err}"
        );
    }

    #[test]
    fn failing_tool_is_an_external_process_error() {
        let Some(corrector) = corrector_for("false") else {
            return;
        };
        let corrector = corrector.script("/nonexistent/custom.praat");
        let err = corrector
            .correct(Path::new("0.wav"), &neutral(), &RunControl::unbounded())
            .unwrap_err();
        assert!(matches!(err, Error::ExternalProcess { exit_code: Some(1), .. }), "{err}");
    }
}
