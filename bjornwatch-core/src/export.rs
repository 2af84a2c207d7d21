//! Transcript export
//!
//! Writes the pretty-printed message array to `session_{id}.json`. The
//! dashboard's export key and the `bjornwatch-export` binary both produce
//! this artifact.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::LogItem;

/// Write `messages` to `session_{code}.json` under `dir`.
///
/// Returns the path of the written file.
pub fn write_transcript(dir: &Path, session_code: &str, messages: &[LogItem]) -> Result<PathBuf> {
    let path = dir.join(format!("session_{}.json", session_code));
    let json = serde_json::to_string_pretty(messages)?;
    std::fs::write(&path, json)?;

    tracing::info!(
        path = %path.display(),
        messages = messages.len(),
        "transcript exported"
    );
    Ok(path)
}
