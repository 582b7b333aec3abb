//! End-to-end batch processing scenarios: a walker feeding a controller,
//! counter bookkeeping across runs, and orphan cleanup.

use filemem::batch::{BatchController, CounterKind};
use filemem::naming;
use filemem::status::{ProcessState, StatusEntry, STATUS_STORE_NAME};
use filemem::walker::{FileWalker, WalkerConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Action used throughout: the file stem encodes the result code, e.g.
/// `ongoing_11.dat` returns 11.
fn coded_action(path: &Path, _key: &str) -> anyhow::Result<i32> {
    let stem = path.file_stem().unwrap().to_string_lossy();
    let code = stem.rsplit('_').next().unwrap().parse::<i32>()?;
    Ok(code)
}

fn seed_store(memory_dir: &Path, entries: &[(&Path, ProcessState, f64)]) {
    let mut map = serde_json::Map::new();
    for (path, state, time) in entries {
        let entry = StatusEntry {
            state: *state,
            filename: naming::to_slash(path),
            time: *time,
        };
        map.insert(
            naming::status_key(path),
            serde_json::to_value(&entry).unwrap(),
        );
    }
    fs::write(
        memory_dir.join(STATUS_STORE_NAME),
        serde_json::to_string_pretty(&serde_json::Value::Object(map)).unwrap(),
    )
    .unwrap();
}

/// Build the 15-file fixture: five prior states times three action codes.
///
/// Returns (files_dir, memory_dir).
fn build_cross_product(dir: &TempDir) -> (PathBuf, PathBuf) {
    let files = dir.path().join("files");
    let memory = dir.path().join("memory");
    fs::create_dir(&files).unwrap();
    fs::create_dir(&memory).unwrap();

    let mut seeds: Vec<(PathBuf, ProcessState, f64)> = Vec::new();
    for state in ["new", "done", "ongoing", "ignore", "error"] {
        for code in [0, 1, 11] {
            let path = files.join(format!("{}_{}.dat", state, code));
            fs::write(&path, state).unwrap();
            let seed = match state {
                "new" => None,
                // Recorded after the file's mtime: not stale.
                "done" => Some((ProcessState::Done, 4e10)),
                "ongoing" => Some((ProcessState::Ongoing, 1.0)),
                "ignore" => Some((ProcessState::Ignore, 1.0)),
                "error" => Some((ProcessState::Error, 1.0)),
                _ => unreachable!(),
            };
            if let Some((state, time)) = seed {
                seeds.push((path.clone(), state, time));
            }
        }
    }
    let refs: Vec<(&Path, ProcessState, f64)> = seeds
        .iter()
        .map(|(p, s, t)| (p.as_path(), *s, *t))
        .collect();
    seed_store(&memory, &refs);
    (files, memory)
}

fn run_batch(files: &Path, memory: &Path) -> filemem::batch::Counters {
    let config = WalkerConfig {
        extensions: vec![".dat".to_string()],
        ..Default::default()
    };
    let mut walker = FileWalker::new(files, config).unwrap();
    let mut controller = BatchController::new(memory, coded_action, false).unwrap();
    let candidates: Vec<PathBuf> = walker.find().collect();
    for path in &candidates {
        controller.process(path).unwrap();
    }
    controller.close().unwrap()
}

#[test]
fn test_counter_exactness_across_states_and_outcomes() {
    let dir = TempDir::new().unwrap();
    let (files, memory) = build_cross_product(&dir);

    let counters = run_batch(&files, &memory);

    assert_eq!(counters.get(CounterKind::Recovered), 12);
    assert_eq!(counters.get(CounterKind::Received), 15);
    assert_eq!(counters.get(CounterKind::Recorded), 3);
    assert_eq!(counters.get(CounterKind::Repaired), 3);
    assert_eq!(counters.get(CounterKind::Processed), 9);
    assert_eq!(counters.get(CounterKind::Succeeded), 3);
    assert_eq!(counters.get(CounterKind::Ignored), 3);
    assert_eq!(counters.get(CounterKind::Failed), 3);
    assert_eq!(counters.get(CounterKind::Deleted), 0);
    assert_eq!(counters.get(CounterKind::Saved), 15);
}

#[test]
fn test_second_run_only_retries_failures() {
    let dir = TempDir::new().unwrap();
    let (files, memory) = build_cross_product(&dir);

    run_batch(&files, &memory);
    let counters = run_batch(&files, &memory);

    // Everything that ended done or ignore is skipped; the three files
    // whose action keeps failing (code 11) are repaired and fail again.
    assert_eq!(counters.get(CounterKind::Recovered), 15);
    assert_eq!(counters.get(CounterKind::Received), 15);
    assert_eq!(counters.get(CounterKind::Recorded), 0);
    assert_eq!(counters.get(CounterKind::Repaired), 3);
    assert_eq!(counters.get(CounterKind::Processed), 3);
    assert_eq!(counters.get(CounterKind::Succeeded), 0);
    assert_eq!(counters.get(CounterKind::Ignored), 0);
    assert_eq!(counters.get(CounterKind::Failed), 3);
}

#[test]
fn test_rewriting_a_done_record_as_stale_triggers_reprocessing() {
    let dir = TempDir::new().unwrap();
    let files = dir.path().join("files");
    let memory = dir.path().join("memory");
    fs::create_dir(&files).unwrap();
    let file = files.join("photo_0.dat");
    fs::write(&file, "x").unwrap();

    let mut controller = BatchController::new(&memory, coded_action, false).unwrap();
    controller.process(&file).unwrap();
    let counters = controller.close().unwrap();
    assert_eq!(counters.get(CounterKind::Processed), 1);

    // Age the persisted record below the file's mtime, as if the file had
    // been modified since the last run.
    seed_store(&memory, &[(&file, ProcessState::Done, 1.0)]);

    let mut controller = BatchController::new(&memory, coded_action, false).unwrap();
    controller.process(&file).unwrap();
    let counters = controller.close().unwrap();
    assert_eq!(counters.get(CounterKind::Processed), 1);
    assert_eq!(counters.get(CounterKind::Succeeded), 1);
}

#[test]
fn test_orphan_sweep_after_files_disappear() {
    let dir = TempDir::new().unwrap();
    let (files, memory) = build_cross_product(&dir);
    run_batch(&files, &memory);

    fs::remove_file(files.join("done_0.dat")).unwrap();
    fs::remove_file(files.join("new_1.dat")).unwrap();

    let mut controller = BatchController::new(&memory, coded_action, false).unwrap();
    controller.clean().unwrap();
    let counters = controller.close().unwrap();
    assert_eq!(counters.get(CounterKind::Deleted), 2);
    assert_eq!(counters.get(CounterKind::Saved), 13);
}

#[test]
fn test_reset_then_full_reprocess() {
    let dir = TempDir::new().unwrap();
    let (files, memory) = build_cross_product(&dir);
    run_batch(&files, &memory);

    let mut controller = BatchController::new(&memory, coded_action, false).unwrap();
    controller.reset().unwrap();
    controller.close().unwrap();

    // With no memory left, every candidate is brand new again.
    let counters = run_batch(&files, &memory);
    assert_eq!(counters.get(CounterKind::Recovered), 0);
    assert_eq!(counters.get(CounterKind::Recorded), 15);
    assert_eq!(counters.get(CounterKind::Processed), 15);
}
