use crate::error::CoreError;
use serde::Deserialize;
use std::str::FromStr;

/// What the decoder does with a row that cannot be turned into a `StudentRecord`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedRowPolicy {
    /// Drop the row, keep it in the failure list and continue.
    #[default]
    Skip,
    /// Stop decoding at the first bad row.
    Abort,
}

impl MalformedRowPolicy {
    /// Returns true if a malformed row should end the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, MalformedRowPolicy::Abort)
    }
}

impl FromStr for MalformedRowPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(MalformedRowPolicy::Skip),
            "abort" => Ok(MalformedRowPolicy::Abort),
            other => Err(CoreError::InvalidInput(
                "malformed row policy".to_string(),
                format!("expected 'skip' or 'abort', got '{other}'"),
            )),
        }
    }
}
