use std::io::Write;
use std::path::{Path, PathBuf};

use super::RunControl;
use crate::error::{Error, Result};
use crate::ConcatEngine;

/// Merges the corrected syllables of a phrase and hands the bytes to the caller.
pub struct PhraseAssembler<'a> {
    concatenator: &'a dyn ConcatEngine,
}

impl<'a> PhraseAssembler<'a> {
    pub fn new(concatenator: &'a dyn ConcatEngine) -> Self {
        Self { concatenator }
    }

    /// Concatenate `inputs` in the given order into `destination` and return
    /// the merged file's bytes.
    pub fn assemble(
        &self,
        inputs: &[PathBuf],
        destination: &Path,
        control: &RunControl,
    ) -> Result<Vec<u8>> {
        self.concatenator
            .concatenate(inputs, destination, control)
            .map_err(|e| match e {
                Error::Cancelled | Error::Timeout { .. } => e,
                other => Error::Assembly {
                    reason: "concatenation failed".to_string(),
                    source: Box::new(other),
                },
            })?;

        std::fs::read(destination).map_err(|e| Error::Assembly {
            reason: format!("cannot read merged phrase {}", destination.display()),
            source: Box::new(e),
        })
    }
}

/// Write a merged phrase to `sink` in one `write_all`, unless the run was
/// stopped first. Returns the number of bytes written.
pub fn deliver<W: Write>(bytes: &[u8], control: &RunControl, sink: &mut W) -> Result<usize> {
    control.check()?;
    sink.write_all(bytes)?;
    sink.flush()?;
    log::debug!("Wrote {} byte phrase", bytes.len());
    Ok(bytes.len())
}
