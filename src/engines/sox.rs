use std::path::{Path, PathBuf};
use std::process::Command;

use super::process::{locate_tool, run_tool};
use crate::error::{Error, Result};
use crate::pipeline::RunControl;
use crate::ConcatEngine;

const TOOL: &str = "sox";

/// Concatenates waveforms with SoX (`sox IN... OUT`).
#[derive(Debug, Clone)]
pub struct SoxConcatenator {
    binary: PathBuf,
}

impl SoxConcatenator {
    pub fn new() -> Result<Self> {
        Self::with_binary(None)
    }

    pub fn with_binary(binary: Option<&Path>) -> Result<Self> {
        let binary = locate_tool(TOOL, binary)?;
        log::info!("Using SoX at {}", binary.display());
        Ok(Self { binary })
    }

    fn command(&self, inputs: &[PathBuf], output: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(inputs).arg(output);
        cmd
    }
}

impl ConcatEngine for SoxConcatenator {
    fn concatenate(&self, inputs: &[PathBuf], output: &Path, control: &RunControl) -> Result<()> {
        if inputs.is_empty() {
            return Err(Error::EmptyPhrase);
        }
        run_tool(TOOL, self.command(inputs, output), control)
    }
}
