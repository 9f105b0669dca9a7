//! Persisted processing queue.
//!
//! Each pending date is one JSON document in a queue directory. A scheduling
//! tick claims the earliest unprocessed date, marking it in-progress with a
//! claim token in the same write, so a restart never loses a pending date
//! and two ticks never pick up the same one.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

/// Token identifying the pass that claimed a queue entry.
pub type ClaimToken = Uuid;

/// Errors that can occur during queue operations.
#[derive(Error, Debug)]
pub enum QueueError {
    /// Failed to create a directory.
    #[error("Failed to create directory '{path}': {source}")]
    CreateDir {
        /// The path that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to read a file.
    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to write a file.
    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        /// The path that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to delete a file.
    #[error("Failed to delete file '{path}': {source}")]
    DeleteFile {
        /// The path that could not be deleted.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to read the queue directory.
    #[error("Failed to read directory '{path}': {source}")]
    ReadDir {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse a queue entry.
    #[error("Failed to parse queue entry '{path}': {source}")]
    ParseJson {
        /// The path that could not be parsed.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// Failed to serialize a queue entry.
    #[error("Failed to serialize queue entry: {0}")]
    SerializeJson(#[from] serde_json::Error),

    /// No entry exists for the date.
    #[error("No queue entry for date {0}")]
    EntryNotFound(NaiveDate),

    /// The entry is claimed by another pass.
    #[error("Queue entry for {date} is already claimed")]
    AlreadyClaimed {
        /// The contested date.
        date: NaiveDate,
    },

    /// The supplied claim token does not match the entry's claim.
    #[error("Claim token mismatch for queue entry {date}")]
    ClaimMismatch {
        /// The contested date.
        date: NaiveDate,
    },
}

/// Result type for queue operations.
pub(crate) type Result<T> = std::result::Result<T, QueueError>;

/// Progress of one date through the processing pipeline.
///
/// States are ordered: a pass resumes at the first stage after the entry's
/// current state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum PassState {
    /// No stage has completed yet.
    #[default]
    Pending,
    /// Daily factors have been reconciled.
    DailyComputed,
    /// Weekly rolling factors have been reconciled.
    WeeklyComputed,
    /// Monthly rolling factors have been reconciled.
    MonthlyComputed,
    /// All stages completed; the date needs no further processing.
    Processed,
}

impl PassState {
    /// Returns true if the date has completed all stages.
    #[must_use]
    pub const fn is_processed(&self) -> bool {
        matches!(self, Self::Processed)
    }

    /// Returns the state as a string identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::DailyComputed => "daily_computed",
            Self::WeeklyComputed => "weekly_computed",
            Self::MonthlyComputed => "monthly_computed",
            Self::Processed => "processed",
        }
    }
}

impl std::fmt::Display for PassState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One date's entry in the processing queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    /// The date awaiting processing.
    pub date: NaiveDate,
    /// Progress through the pipeline stages.
    pub state: PassState,
    /// Claim token of the in-flight pass, if any.
    pub claim: Option<ClaimToken>,
    /// Process ID that holds the claim.
    pub pid: Option<u32>,
    /// Number of passes that have claimed this entry.
    pub attempts: u32,
    /// Error message from the most recent failed pass.
    pub last_error: Option<String>,
    /// Timestamp when the entry was enqueued.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last state change.
    pub updated_at: DateTime<Utc>,
}

impl QueueEntry {
    /// Creates a pending entry for the given date.
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            date,
            state: PassState::Pending,
            claim: None,
            pid: None,
            attempts: 0,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if a pass currently holds this entry.
    #[must_use]
    pub const fn is_claimed(&self) -> bool {
        self.claim.is_some()
    }
}

/// Persisted queue of dates awaiting a processing pass.
///
/// Entries are stored as JSON files in `<base>/queue/` and consumed in date
/// order, earliest first. Claim decisions are serialized by an in-process
/// lock; the claim itself is persisted so a crashed pass is visible (and
/// recoverable) after a restart.
#[derive(Debug)]
pub struct ProcessingQueue {
    queue_path: PathBuf,
    claim_lock: Mutex<()>,
}

impl ProcessingQueue {
    /// Creates a queue under the given base path, creating the `queue/`
    /// directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(base_path: &Path) -> Result<Self> {
        let queue_path = base_path.join("queue");
        if !queue_path.exists() {
            fs::create_dir_all(&queue_path).map_err(|e| QueueError::CreateDir {
                path: queue_path.clone(),
                source: e,
            })?;
        }
        Ok(Self {
            queue_path,
            claim_lock: Mutex::new(()),
        })
    }

    /// Creates a queue at the platform default data path.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn with_default_path() -> Result<Self> {
        Self::new(&garua_store::default_data_path())
    }

    /// Returns the path to a date's entry file.
    #[must_use]
    pub fn entry_path(&self, date: NaiveDate) -> PathBuf {
        self.queue_path.join(format!("{date}.json"))
    }

    /// Adds a date to the queue if it is not already present.
    ///
    /// Returns `true` when a new entry was created. Existing entries,
    /// processed or not, are left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be written.
    pub fn enqueue(&self, date: NaiveDate) -> Result<bool> {
        let _guard = self.claim_lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if self.entry_path(date).exists() {
            return Ok(false);
        }
        self.save(&QueueEntry::new(date))?;
        Ok(true)
    }

    /// Returns the entry for a date, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be read or parsed.
    pub fn entry(&self, date: NaiveDate) -> Result<Option<QueueEntry>> {
        let path = self.entry_path(date);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).map_err(|e| QueueError::ReadFile {
            path: path.clone(),
            source: e,
        })?;
        let entry =
            serde_json::from_str(&content).map_err(|e| QueueError::ParseJson { path, source: e })?;
        Ok(Some(entry))
    }

    /// Returns all entries in date order, earliest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue directory cannot be read.
    pub fn entries(&self) -> Result<Vec<QueueEntry>> {
        let dir = fs::read_dir(&self.queue_path).map_err(|e| QueueError::ReadDir {
            path: self.queue_path.clone(),
            source: e,
        })?;

        let mut entries = Vec::new();
        for dir_entry in dir {
            let dir_entry = dir_entry.map_err(|e| QueueError::ReadDir {
                path: self.queue_path.clone(),
                source: e,
            })?;
            let path = dir_entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let content = fs::read_to_string(&path).map_err(|e| QueueError::ReadFile {
                path: path.clone(),
                source: e,
            })?;
            match serde_json::from_str::<QueueEntry>(&content) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping corrupt queue entry");
                }
            }
        }

        entries.sort_by_key(|entry| entry.date);
        Ok(entries)
    }

    /// Returns all entries that still need processing, earliest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue directory cannot be read.
    pub fn pending(&self) -> Result<Vec<QueueEntry>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|entry| !entry.state.is_processed())
            .collect())
    }

    /// Claims the earliest unprocessed, unclaimed date.
    ///
    /// The claim token and the claiming process ID are persisted in the same
    /// write that marks the entry in-progress. Returns `None` when nothing is
    /// available.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be read or written.
    pub fn claim_next(&self) -> Result<Option<(QueueEntry, ClaimToken)>> {
        let _guard = self.claim_lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let candidate = self
            .entries()?
            .into_iter()
            .find(|entry| !entry.state.is_processed() && !entry.is_claimed());
        match candidate {
            Some(entry) => self.mark_claimed(entry).map(Some),
            None => Ok(None),
        }
    }

    /// Claims a specific date, enqueueing it first if absent.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::AlreadyClaimed`] if another pass holds the
    /// entry, or an I/O error if the queue cannot be read or written.
    pub fn claim(&self, date: NaiveDate) -> Result<(QueueEntry, ClaimToken)> {
        let _guard = self.claim_lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let entry = match self.entry(date)? {
            Some(entry) if entry.is_claimed() => {
                return Err(QueueError::AlreadyClaimed { date });
            }
            Some(entry) => entry,
            None => QueueEntry::new(date),
        };
        self.mark_claimed(entry)
    }

    /// Moves a claimed entry to a new state, keeping the claim.
    ///
    /// # Errors
    ///
    /// Returns an error if the claim token does not match or the entry
    /// cannot be written.
    pub fn advance(&self, date: NaiveDate, token: ClaimToken, state: PassState) -> Result<()> {
        let mut entry = self.claimed_entry(date, token)?;
        entry.state = state;
        entry.updated_at = Utc::now();
        self.save(&entry)
    }

    /// Marks a claimed entry fully processed and releases the claim.
    ///
    /// # Errors
    ///
    /// Returns an error if the claim token does not match or the entry
    /// cannot be written.
    pub fn complete(&self, date: NaiveDate, token: ClaimToken) -> Result<()> {
        let mut entry = self.claimed_entry(date, token)?;
        entry.state = PassState::Processed;
        entry.claim = None;
        entry.pid = None;
        entry.last_error = None;
        entry.updated_at = Utc::now();
        self.save(&entry)
    }

    /// Releases a claimed entry after a failed pass, recording the error and
    /// keeping the last successful state for retry.
    ///
    /// # Errors
    ///
    /// Returns an error if the claim token does not match or the entry
    /// cannot be written.
    pub fn release(&self, date: NaiveDate, token: ClaimToken, error: Option<String>) -> Result<()> {
        let mut entry = self.claimed_entry(date, token)?;
        entry.claim = None;
        entry.pid = None;
        entry.last_error = error;
        entry.updated_at = Utc::now();
        self.save(&entry)
    }

    /// Clears claims held by processes that are no longer running.
    ///
    /// Returns the dates that were recovered.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be read or written.
    pub fn recover_stale_claims(&self) -> Result<Vec<NaiveDate>> {
        let _guard = self.claim_lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut recovered = Vec::new();
        for mut entry in self.entries()? {
            if !entry.is_claimed() {
                continue;
            }
            let is_stale = entry.pid.is_none_or(|pid| !is_process_running(pid));
            if is_stale {
                entry.claim = None;
                entry.pid = None;
                entry.last_error = Some("processing pass died unexpectedly".to_string());
                entry.updated_at = Utc::now();
                self.save(&entry)?;
                recovered.push(entry.date);
            }
        }
        Ok(recovered)
    }

    /// Removes all entries from the queue.
    ///
    /// Returns the number of entries removed.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry cannot be deleted.
    pub fn clear(&self) -> Result<usize> {
        let _guard = self.claim_lock.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let entries = self.entries()?;
        for entry in &entries {
            let path = self.entry_path(entry.date);
            fs::remove_file(&path).map_err(|e| QueueError::DeleteFile { path, source: e })?;
        }
        Ok(entries.len())
    }

    fn mark_claimed(&self, mut entry: QueueEntry) -> Result<(QueueEntry, ClaimToken)> {
        let token = Uuid::new_v4();
        entry.claim = Some(token);
        entry.pid = Some(std::process::id());
        entry.attempts += 1;
        entry.updated_at = Utc::now();
        self.save(&entry)?;
        Ok((entry, token))
    }

    fn claimed_entry(&self, date: NaiveDate, token: ClaimToken) -> Result<QueueEntry> {
        let entry = self.entry(date)?.ok_or(QueueError::EntryNotFound(date))?;
        if entry.claim != Some(token) {
            return Err(QueueError::ClaimMismatch { date });
        }
        Ok(entry)
    }

    fn save(&self, entry: &QueueEntry) -> Result<()> {
        let path = self.entry_path(entry.date);
        let json = serde_json::to_string_pretty(entry)?;
        fs::write(&path, json).map_err(|e| QueueError::WriteFile { path, source: e })
    }
}

/// Checks if a process with the given PID is still running.
#[must_use]
fn is_process_running(pid: u32) -> bool {
    // Signal 0 probes for existence without delivering anything.
    #[cfg(unix)]
    {
        use std::process::Command;
        Command::new("kill")
            .args(["-0", &pid.to_string()])
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    #[cfg(windows)]
    {
        use std::process::Command;
        Command::new("tasklist")
            .args(["/FI", &format!("PID eq {}", pid)])
            .output()
            .map(|output| {
                let stdout = String::from_utf8_lossy(&output.stdout);
                stdout.contains(&pid.to_string())
            })
            .unwrap_or(false)
    }

    #[cfg(not(any(unix, windows)))]
    {
        false
    }
}
