//! Scratch directories for one phrase request.
//!
//! Both directories are [`tempfile::TempDir`]s, so they are removed when the
//! [`Workspace`] is dropped on any exit path, including unwinding.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{Error, Result};

pub struct Workspace {
    syllables: TempDir,
    finished: TempDir,
}

impl Workspace {
    /// Create the syllable and finished-phrase directories, under `root` if
    /// given, otherwise under the system temp directory.
    pub fn create(root: Option<&Path>) -> Result<Self> {
        let syllables = make_dir("syllables-", root)?;
        let finished = make_dir("finished-", root)?;
        log::debug!(
            "Created workspace {} / {}",
            syllables.path().display(),
            finished.path().display()
        );
        Ok(Self {
            syllables,
            finished,
        })
    }

    pub fn syllable_dir(&self) -> &Path {
        self.syllables.path()
    }

    pub fn finished_dir(&self) -> &Path {
        self.finished.path()
    }

    /// Artifact path owned by the job in `slot`.
    pub fn slot_path(&self, slot: usize) -> PathBuf {
        self.syllables.path().join(format!("{slot}.wav"))
    }

    /// Destination of the assembled phrase.
    pub fn phrase_path(&self) -> PathBuf {
        self.finished.path().join("phrase.wav")
    }

    /// Remove both directories, reporting failures instead of ignoring them.
    pub fn close(self) -> Result<()> {
        let syllables = self.syllables.close();
        let finished = self.finished.close();
        syllables.map_err(Error::Workspace)?;
        finished.map_err(Error::Workspace)
    }
}

fn make_dir(prefix: &str, root: Option<&Path>) -> Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(prefix);
    match root {
        Some(root) => builder.tempdir_in(root),
        None => builder.tempdir(),
    }
    .map_err(Error::Workspace)
}
