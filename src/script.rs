use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::SyllableSpec;

/// A phrase described as JSON.
///
/// ```json
/// {
///   "concurrency": 4,
///   "syllables": [
///     { "phonemes": "ad", "target_hz": 261.63, "voice": "he", "rate": 160 },
///     { "phonemes": "on", "target_hz": 261.63, "voice": "he" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseScript {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
    pub syllables: Vec<SyllableSpec>,
}

impl PhraseScript {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
