//! Filemem: Incremental File Batch Processing
//!
//! A batch-processing engine that remembers per-file outcomes: candidates
//! are hashed to stable keys, an action runs against each, and results are
//! persisted so later runs skip finished files, retry failed ones, and
//! force-refresh on demand.

pub mod batch;
pub mod config;
pub mod error;
pub mod logging;
pub mod naming;
pub mod status;
pub mod store;
pub mod walker;
