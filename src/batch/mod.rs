//! Batch orchestration
//!
//! The [`BatchController`] drives incremental processing: for each candidate
//! file it loads or creates a [`StatusRecord`], applies the staleness/force
//! policy to decide whether the configured [`Action`] must run, interprets
//! the action's result code, and tallies counters. The status store is
//! opened at construction and flushed on every exit path.

pub mod action;

use crate::error::BatchError;
use crate::naming;
use crate::status::{ProcessState, StatusRecord, StatusStore, STATUS_STORE_NAME};
use crate::walker::mtime_secs;
use action::Action;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// The counters a controller maintains across its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    /// Records present in the store at open time.
    Recovered,
    /// Candidates presented to `process`.
    Received,
    /// Brand-new records created.
    Recorded,
    /// Records found in error state and retried.
    Repaired,
    /// Times the action was actually invoked.
    Processed,
    /// Action outcomes.
    Succeeded,
    Ignored,
    Failed,
    /// Records removed by the orphan sweep.
    Deleted,
    /// Records present in the store at close time.
    Saved,
}

impl CounterKind {
    pub const ALL: [CounterKind; 10] = [
        CounterKind::Recovered,
        CounterKind::Received,
        CounterKind::Recorded,
        CounterKind::Repaired,
        CounterKind::Processed,
        CounterKind::Succeeded,
        CounterKind::Ignored,
        CounterKind::Failed,
        CounterKind::Deleted,
        CounterKind::Saved,
    ];

    /// Reporting name of this counter.
    pub fn name(self) -> &'static str {
        match self {
            CounterKind::Recovered => "recovered",
            CounterKind::Received => "received",
            CounterKind::Recorded => "recorded",
            CounterKind::Repaired => "repaired",
            CounterKind::Processed => "processed",
            CounterKind::Succeeded => "succeeded",
            CounterKind::Ignored => "ignored",
            CounterKind::Failed => "failed",
            CounterKind::Deleted => "deleted",
            CounterKind::Saved => "saved",
        }
    }
}

/// Fixed-size counter set indexed by [`CounterKind`]; zeroed at
/// construction, incremented only by the controller, read-only to callers.
#[derive(Debug, Clone, Default)]
pub struct Counters([u64; CounterKind::ALL.len()]);

impl Counters {
    pub fn get(&self, kind: CounterKind) -> u64 {
        self.0[kind as usize]
    }

    /// Flat name -> count view for reporting.
    pub fn snapshot(&self) -> BTreeMap<&'static str, u64> {
        CounterKind::ALL
            .iter()
            .map(|&kind| (kind.name(), self.get(kind)))
            .collect()
    }

    fn incr(&mut self, kind: CounterKind) {
        self.0[kind as usize] += 1;
    }

    fn put(&mut self, kind: CounterKind, value: u64) {
        self.0[kind as usize] = value;
    }
}

/// Incremental batch processor bound to one working directory.
///
/// Construction opens the status store immediately; dropping the controller
/// (or calling [`close`](Self::close)) records the final store size and
/// flushes it, including when an action panic unwinds through `process`.
pub struct BatchController<A: Action> {
    working_directory: PathBuf,
    store: StatusStore,
    action: A,
    force: bool,
    counters: Counters,
}

impl<A: Action> BatchController<A> {
    /// Bind a controller to `working_directory`, creating it if absent.
    ///
    /// `force` makes `process` run the action even for up-to-date files.
    pub fn new(working_directory: &Path, action: A, force: bool) -> Result<Self, BatchError> {
        if !working_directory.exists() {
            fs::create_dir_all(working_directory)?;
        }
        let working_directory = dunce::canonicalize(working_directory)?;
        let mut store = StatusStore::new(&working_directory, STATUS_STORE_NAME)?;
        store.open()?;

        let mut counters = Counters::default();
        counters.put(CounterKind::Recovered, store.len()? as u64);
        debug!(
            dir = %working_directory.display(),
            recovered = counters.get(CounterKind::Recovered),
            "controller ready"
        );

        Ok(Self {
            working_directory,
            store,
            action,
            force,
            counters,
        })
    }

    /// Process one candidate file.
    ///
    /// Decides per the recorded state whether the action runs:
    /// no record = run (and record), done = run iff forced or the file is
    /// newer than its record, error and ongoing = run, ignore = never run.
    /// The action's code maps to the new state: `0` done, `> 9` error,
    /// anything else ignore. An `Err` from the action propagates unchanged
    /// and leaves the record as it was before the call.
    pub fn process(&mut self, path: &Path) -> Result<(), BatchError> {
        self.counters.incr(CounterKind::Received);

        let key = naming::status_key(path);
        let (mut record, run) = match StatusRecord::load_one(&self.store, &key)? {
            None => {
                self.counters.incr(CounterKind::Recorded);
                (
                    StatusRecord::new(&key, ProcessState::Ongoing, path),
                    true,
                )
            }
            Some(record) => {
                let run = match record.state() {
                    ProcessState::Done => {
                        self.force || self.file_mtime(path)? > record.time()
                    }
                    ProcessState::Error => {
                        self.counters.incr(CounterKind::Repaired);
                        true
                    }
                    ProcessState::Ongoing => true,
                    ProcessState::Ignore => false,
                };
                (record, run)
            }
        };

        if !run {
            debug!(path = %path.display(), state = %record.state(), "up to date, skipping");
            return Ok(());
        }

        self.counters.incr(CounterKind::Processed);
        let code = self.action.invoke(path, &key)?;

        let (state, outcome) = if code > 9 {
            (ProcessState::Error, CounterKind::Failed)
        } else if code == 0 {
            (ProcessState::Done, CounterKind::Succeeded)
        } else {
            (ProcessState::Ignore, CounterKind::Ignored)
        };
        record.set_state(state);
        self.counters.incr(outcome);
        record.update(&mut self.store)?;
        debug!(path = %path.display(), code, state = %state, "processed");
        Ok(())
    }

    /// Orphan sweep: delete every record whose file no longer exists.
    ///
    /// No action is invoked; each removal bumps the deleted counter.
    pub fn clean(&mut self) -> Result<(), BatchError> {
        let orphans: Vec<StatusRecord> = StatusRecord::load_all(&self.store)?
            .filter(|record| !Path::new(record.filename()).is_file())
            .collect();
        for record in orphans {
            debug!(file = record.filename(), "removing orphaned status");
            record.delete(&mut self.store)?;
            self.counters.incr(CounterKind::Deleted);
        }
        Ok(())
    }

    /// Full reset: remove every record, without per-record bookkeeping.
    pub fn reset(&mut self) -> Result<(), BatchError> {
        StatusRecord::purge_all(&mut self.store)?;
        Ok(())
    }

    /// Current counter values.
    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// The canonicalized working directory this controller is bound to.
    pub fn working_directory(&self) -> &Path {
        &self.working_directory
    }

    /// Record the final store size and flush.
    ///
    /// Dropping the controller does the same; `close` surfaces flush
    /// failures and hands back the final counters.
    pub fn close(mut self) -> Result<Counters, BatchError> {
        self.finalize()?;
        Ok(self.counters.clone())
    }

    fn file_mtime(&self, path: &Path) -> Result<f64, BatchError> {
        Ok(mtime_secs(&fs::metadata(path)?))
    }

    fn finalize(&mut self) -> Result<(), BatchError> {
        if self.store.is_open() {
            self.counters.put(CounterKind::Saved, self.store.len()? as u64);
            self.store.close()?;
        }
        Ok(())
    }
}

impl<A: Action> Drop for BatchController<A> {
    fn drop(&mut self) {
        if let Err(err) = self.finalize() {
            error!(%err, "failed to flush status store");
        }
    }
}
