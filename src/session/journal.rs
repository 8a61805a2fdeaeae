//! Feeling journal: answers to check-in questions, kept for after the run.
//!
//! [`JsonlFeelingJournal`] appends one JSON object per line to
//! `feelings.jsonl` in the data directory. Writes are blocking file I/O, so
//! the session calls [`FeelingJournal::record`] from `spawn_blocking`.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::voice::{QuestionCategory, Sentiment};

// ---------------------------------------------------------------------------
// FeelingEntry
// ---------------------------------------------------------------------------

/// One recorded answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeelingEntry {
    pub recorded_at: DateTime<Utc>,
    /// Run time at which the answer was given.
    pub elapsed_secs: f64,
    pub distance_meters: f64,
    pub sentiment: Sentiment,
    /// Raw transcript as recognised.
    pub transcript: String,
    /// The question being answered; `None` for a follow-up in the grace
    /// window.
    pub question: Option<QuestionCategory>,
}

// ---------------------------------------------------------------------------
// JournalError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("journal encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// FeelingJournal trait
// ---------------------------------------------------------------------------

pub trait FeelingJournal: Send + Sync {
    fn record(&self, entry: &FeelingEntry) -> Result<(), JournalError>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn FeelingJournal>) {}
};

// ---------------------------------------------------------------------------
// JsonlFeelingJournal
// ---------------------------------------------------------------------------

/// Append-only JSON-lines journal.
#[derive(Debug)]
pub struct JsonlFeelingJournal {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlFeelingJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every entry back. A missing file is an empty journal.
    pub fn read_all(&self) -> Result<Vec<FeelingEntry>, JournalError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        let mut entries = Vec::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            entries.push(serde_json::from_str(line)?);
        }
        Ok(entries)
    }
}

impl FeelingJournal for JsonlFeelingJournal {
    fn record(&self, entry: &FeelingEntry) -> Result<(), JournalError> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryJournal (test only)
// ---------------------------------------------------------------------------

#[cfg(test)]
#[derive(Default)]
pub struct MemoryJournal {
    entries: Mutex<Vec<FeelingEntry>>,
}

#[cfg(test)]
impl MemoryJournal {
    pub fn entries(&self) -> Vec<FeelingEntry> {
        self.entries.lock().expect("journal lock").clone()
    }
}

#[cfg(test)]
impl FeelingJournal for MemoryJournal {
    fn record(&self, entry: &FeelingEntry) -> Result<(), JournalError> {
        self.entries.lock().expect("journal lock").push(entry.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
