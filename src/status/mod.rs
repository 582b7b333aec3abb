//! Per-file processing status
//!
//! A [`StatusRecord`] tracks one file's processing outcome: its state, the
//! recorded filename, and the time of the last status write. Records read
//! and write themselves through a [`JsonStore`] under a content-derived key
//! (see [`crate::naming::status_key`]); the key never changes after
//! creation.

use crate::error::StoreError;
use crate::naming;
use crate::store::JsonStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Name of the backing file inside a working directory.
pub const STATUS_STORE_NAME: &str = "pmstatus.json";

/// Processing outcome of a single file.
///
/// The wire strings are fixed by the backing-file format; in particular
/// `Ongoing` persists as `"tmp"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessState {
    Done,
    Ignore,
    #[serde(rename = "tmp")]
    Ongoing,
    Error,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProcessState::Done => "done",
            ProcessState::Ignore => "ignore",
            ProcessState::Ongoing => "tmp",
            ProcessState::Error => "error",
        };
        f.write_str(s)
    }
}

/// Serialized form of one status record in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub state: ProcessState,
    pub filename: String,
    pub time: f64,
}

/// The store type holding status entries.
pub type StatusStore = JsonStore<StatusEntry>;

/// One file's processing status with write-through discipline.
///
/// Records track whether they are new (never persisted) or dirty (mutated
/// since load); `update` writes to the store only in those cases, so calling
/// it on an unmodified loaded record is a guaranteed no-op.
#[derive(Debug, Clone)]
pub struct StatusRecord {
    key: String,
    filename: String,
    state: ProcessState,
    time: f64,
    is_new: bool,
    is_dirty: bool,
}

/// Unix seconds, as stored in the `time` field.
pub(crate) fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1e6
}

impl StatusRecord {
    /// Create a record that has never been persisted. Time defaults to now.
    ///
    /// The filename is stored in forward-slash form.
    pub fn new(key: &str, state: ProcessState, filename: &Path) -> Self {
        Self::with_time(key, state, filename, now_secs())
    }

    /// Create a never-persisted record with an explicit time.
    pub fn with_time(key: &str, state: ProcessState, filename: &Path, time: f64) -> Self {
        Self {
            key: key.to_string(),
            filename: naming::to_slash(filename),
            state,
            time,
            is_new: true,
            is_dirty: false,
        }
    }

    /// Read one record from the store; `None` if the key is absent.
    pub fn load_one(store: &StatusStore, key: &str) -> Result<Option<Self>, StoreError> {
        Ok(store.get(key)?.map(|entry| Self::from_entry(key, entry)))
    }

    /// Lazily iterate over every record in the store.
    ///
    /// Finite, one record per stored entry; restart by calling again.
    pub fn load_all(
        store: &StatusStore,
    ) -> Result<impl Iterator<Item = StatusRecord> + '_, StoreError> {
        Ok(store
            .items()?
            .map(|(key, entry)| Self::from_entry(key, entry)))
    }

    /// Remove every record from the store.
    pub fn purge_all(store: &mut StatusStore) -> Result<(), StoreError> {
        store.clear()
    }

    fn from_entry(key: &str, entry: &StatusEntry) -> Self {
        Self {
            key: key.to_string(),
            filename: entry.filename.clone(),
            state: entry.state,
            time: entry.time,
            is_new: false,
            is_dirty: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// The recorded filename, in forward-slash form.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Change the in-memory state and mark the record dirty.
    ///
    /// Nothing reaches the store until `update` is called.
    pub fn set_state(&mut self, state: ProcessState) {
        self.state = state;
        self.is_dirty = true;
    }

    /// Write through to the store iff the record is new or dirty.
    ///
    /// On write, `time` is refreshed to now before the entry is stored.
    /// An unmodified loaded record is untouched: no store mutation, no
    /// time change.
    pub fn update(&mut self, store: &mut StatusStore) -> Result<(), StoreError> {
        if self.is_new || self.is_dirty {
            self.time = now_secs();
            store.set(
                &self.key,
                StatusEntry {
                    state: self.state,
                    filename: self.filename.clone(),
                    time: self.time,
                },
            )?;
            self.is_new = false;
            self.is_dirty = false;
        }
        Ok(())
    }

    /// Remove the record from the store iff it was previously persisted.
    ///
    /// Consumes the record, so a deleted record can never be written again.
    /// Deleting a never-persisted record is a no-op.
    pub fn delete(self, store: &mut StatusStore) -> Result<(), StoreError> {
        if !self.is_new {
            store.pop(&self.key)?;
        }
        Ok(())
    }
}
