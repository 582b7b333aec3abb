//! Persistent key/value store
//!
//! A flat `key -> value` map durable to a single JSON file. The store tracks
//! an explicit dirtiness state so that an unmodified store is never
//! rewritten on close.

use crate::error::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Flush tracking: `sync()` writes the backing file only from `Dirty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dirtiness {
    Clean,
    Dirty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreState {
    Closed,
    Open(Dirtiness),
}

/// A persistent dictionary backed by one JSON file.
///
/// All accessors except `open`/`close` require the store to be open.
/// Mutations mark the store dirty only when they actually change content;
/// in particular `set` with a structurally equal value is a no-op, which is
/// what keeps unchanged data from producing spurious disk writes.
pub struct JsonStore<V> {
    path: PathBuf,
    map: HashMap<String, V>,
    state: StoreState,
}

impl<V> JsonStore<V>
where
    V: Serialize + DeserializeOwned + PartialEq,
{
    /// Create a store backed by `store_dir/store_name`.
    ///
    /// The directory must already exist; the backing file may not.
    pub fn new(store_dir: &Path, store_name: &str) -> Result<Self, StoreError> {
        if !store_dir.is_dir() {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("store directory '{}' does not exist", store_dir.display()),
            )));
        }
        Ok(Self {
            path: store_dir.join(store_name),
            map: HashMap::new(),
            state: StoreState::Closed,
        })
    }

    /// Load the backing file into memory, or start empty if it is absent.
    ///
    /// Idempotent: opening an already-open store changes nothing. A backing
    /// file that exists but cannot be parsed fails with
    /// [`StoreError::Corrupt`] and is left untouched on disk.
    pub fn open(&mut self) -> Result<(), StoreError> {
        if matches!(self.state, StoreState::Open(_)) {
            return Ok(());
        }
        self.map = if self.path.exists() {
            let content = fs::read_to_string(&self.path)?;
            serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?
        } else {
            HashMap::new()
        };
        self.state = StoreState::Open(Dirtiness::Clean);
        debug!(path = %self.path.display(), entries = self.map.len(), "store opened");
        Ok(())
    }

    /// Flush to disk if dirty, then release in-memory state.
    pub fn close(&mut self) -> Result<(), StoreError> {
        if self.state == StoreState::Closed {
            return Ok(());
        }
        self.sync()?;
        self.map = HashMap::new();
        self.state = StoreState::Closed;
        Ok(())
    }

    /// Write the full map to the backing file iff the store is dirty.
    ///
    /// The body is serialized first and written in a single call, so the
    /// file never holds a partially-built map.
    pub fn sync(&mut self) -> Result<(), StoreError> {
        match self.state {
            StoreState::Closed => Err(StoreError::NotOpen),
            StoreState::Open(Dirtiness::Clean) => Ok(()),
            StoreState::Open(Dirtiness::Dirty) => {
                let body =
                    serde_json::to_string_pretty(&self.map).map_err(StoreError::Serialize)?;
                fs::write(&self.path, body)?;
                self.state = StoreState::Open(Dirtiness::Clean);
                debug!(path = %self.path.display(), entries = self.map.len(), "store flushed");
                Ok(())
            }
        }
    }

    pub fn get(&self, key: &str) -> Result<Option<&V>, StoreError> {
        self.ensure_open()?;
        Ok(self.map.get(key))
    }

    /// Insert or replace a value. Equal values leave the store clean.
    pub fn set(&mut self, key: &str, value: V) -> Result<(), StoreError> {
        self.ensure_open()?;
        if self.map.get(key) == Some(&value) {
            return Ok(());
        }
        self.map.insert(key.to_string(), value);
        self.state = StoreState::Open(Dirtiness::Dirty);
        Ok(())
    }

    /// Remove and return a value; `None` if the key is absent.
    pub fn pop(&mut self, key: &str) -> Result<Option<V>, StoreError> {
        self.ensure_open()?;
        let value = self.map.remove(key);
        if value.is_some() {
            self.state = StoreState::Open(Dirtiness::Dirty);
        }
        Ok(value)
    }

    /// Remove every entry. An already-empty store stays clean.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.ensure_open()?;
        if !self.map.is_empty() {
            self.map.clear();
            self.state = StoreState::Open(Dirtiness::Dirty);
        }
        Ok(())
    }

    pub fn contains(&self, key: &str) -> Result<bool, StoreError> {
        self.ensure_open()?;
        Ok(self.map.contains_key(key))
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        self.ensure_open()?;
        Ok(self.map.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        self.ensure_open()?;
        Ok(self.map.is_empty())
    }

    /// Iterate over all entries. Iteration order is arbitrary, but the
    /// snapshot is consistent: the borrow prevents mutation mid-iteration.
    pub fn items(&self) -> Result<impl Iterator<Item = (&String, &V)>, StoreError> {
        self.ensure_open()?;
        Ok(self.map.iter())
    }

    pub fn keys(&self) -> Result<impl Iterator<Item = &String>, StoreError> {
        self.ensure_open()?;
        Ok(self.map.keys())
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, StoreState::Open(_))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        match self.state {
            StoreState::Open(_) => Ok(()),
            StoreState::Closed => Err(StoreError::NotOpen),
        }
    }
}
