//! Append-only run log: one timestamped line per phase status or error,
//! alongside the structured tracing output. Best effort; a failed append is
//! reported to tracing and otherwise swallowed so it can never fail a run.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use tracing::error;

pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Append `[timestamp] message` to the log file, creating it if needed.
    pub fn append(&self, message: &str) {
        let line = format!(
            "[{}] {}\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            message
        );
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()));
        if let Err(e) = result {
            error!(error = ?e, path = %self.path.display(), "Failed to append to run log");
        }
    }
}
