//! Integration tests for the worker pool.

use clutch::adapter::{ProcessError, Processor};
use clutch::engine::{Pool, PoolConfig, progress};
use clutch::{ledger, sink};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Instrumented processor: records every call, fails a configured subset.
#[derive(Clone, Default)]
struct Recording {
    calls: Arc<Mutex<Vec<String>>>,
    fail: Arc<HashSet<String>>,
}

impl Recording {
    fn failing(items: &[&str]) -> Self {
        Self {
            calls: Arc::default(),
            fail: Arc::new(items.iter().map(|s| s.to_string()).collect()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Processor for Recording {
    async fn process(&self, item: &str) -> Result<String, ProcessError> {
        self.calls.lock().unwrap().push(item.to_string());
        // Yield so concurrent workers actually interleave.
        tokio::time::sleep(Duration::from_millis(1)).await;
        if self.fail.contains(item) {
            Err(ProcessError::Empty)
        } else {
            Ok(format!("description of {item}"))
        }
    }
}

fn items(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("src/file_{i:03}.rs")).collect()
}

fn test_config(workers: usize) -> PoolConfig {
    PoolConfig {
        workers,
        poll_interval: Duration::from_millis(50),
    }
}

struct Paths {
    _dir: TempDir,
    ledger: PathBuf,
    sink: PathBuf,
}

fn paths() -> Paths {
    let dir = TempDir::new().unwrap();
    let ledger = dir.path().join("completed.txt");
    let sink = dir.path().join("descriptions.jsonl");
    Paths {
        _dir: dir,
        ledger,
        sink,
    }
}

// ---------------------------------------------------------------------------
// Exhaustion and claim discipline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn clean_run_exhausts_all_items() {
    let p = paths();
    let source = items(25);
    let recording = Recording::default();
    let pool = Pool::new(recording.clone(), test_config(4)).unwrap();

    let summary = pool.run(&source, &p.ledger, &p.sink).await.unwrap();

    assert_eq!(summary.processed, 25);
    assert_eq!(summary.errors, 0);
    assert_eq!(summary.remaining, 0);

    let snap = progress::observe(&p.ledger, source.len()).await.unwrap();
    assert_eq!(snap.completed, 25);
    assert_eq!(snap.remaining, 0);
    assert_eq!(snap.percentage, 100);
}

#[tokio::test]
async fn each_item_claimed_at_most_once() {
    let p = paths();
    let source = items(100);
    let recording = Recording::default();
    let pool = Pool::new(recording.clone(), test_config(8)).unwrap();

    pool.run(&source, &p.ledger, &p.sink).await.unwrap();

    let calls = recording.calls();
    assert_eq!(calls.len(), 100);
    let distinct: HashSet<&String> = calls.iter().collect();
    assert_eq!(distinct.len(), 100, "an item was claimed twice");
}

#[tokio::test]
async fn single_worker_processes_in_source_order() {
    let p = paths();
    let source = items(20);
    let recording = Recording::default();
    let pool = Pool::new(recording.clone(), test_config(1)).unwrap();

    pool.run(&source, &p.ledger, &p.sink).await.unwrap();

    assert_eq!(recording.calls(), source);
}

#[tokio::test]
async fn empty_source_invokes_no_workers() {
    let p = paths();
    let recording = Recording::default();
    let pool = Pool::new(recording.clone(), test_config(3)).unwrap();

    let summary = pool.run(&[], &p.ledger, &p.sink).await.unwrap();

    assert_eq!(summary.processed, 0);
    assert_eq!(summary.remaining, 0);
    assert!(recording.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Resume
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resume_never_reprocesses_completed_items() {
    let p = paths();
    let source = items(10);

    // First five already completed by an earlier run.
    let done = source[..5].join("\n") + "\n";
    std::fs::write(&p.ledger, done).unwrap();

    let recording = Recording::default();
    let pool = Pool::new(recording.clone(), test_config(3)).unwrap();
    let summary = pool.run(&source, &p.ledger, &p.sink).await.unwrap();

    assert_eq!(summary.processed, 5);
    let calls = recording.calls();
    assert_eq!(calls.len(), 5);
    for item in &source[..5] {
        assert!(!calls.contains(item), "reprocessed completed item {item}");
    }
}

#[tokio::test]
async fn failed_items_stay_pending_and_retry_on_next_run() {
    let p = paths();
    let source = items(10);
    let failing = [source[2].as_str(), source[7].as_str()];

    let recording = Recording::failing(&failing);
    let pool = Pool::new(recording.clone(), test_config(3)).unwrap();
    let summary = pool.run(&source, &p.ledger, &p.sink).await.unwrap();

    assert_eq!(summary.processed, 8);
    assert_eq!(summary.errors, 2);
    assert_eq!(summary.remaining, 2);

    let snap = progress::observe(&p.ledger, source.len()).await.unwrap();
    assert_eq!(snap.completed, 8);
    assert_eq!(snap.remaining, 2);

    // Second run, failures cleared: only the two pending items run.
    let recording = Recording::default();
    let pool = Pool::new(recording.clone(), test_config(3)).unwrap();
    let summary = pool.run(&source, &p.ledger, &p.sink).await.unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.remaining, 0);
    let mut calls = recording.calls();
    calls.sort();
    assert_eq!(calls, vec![source[2].clone(), source[7].clone()]);
}

#[tokio::test]
async fn fully_completed_project_runs_nothing() {
    let p = paths();
    let source = items(6);
    std::fs::write(&p.ledger, source.join("\n")).unwrap();

    let recording = Recording::default();
    let pool = Pool::new(recording.clone(), test_config(2)).unwrap();
    let summary = pool.run(&source, &p.ledger, &p.sink).await.unwrap();

    assert_eq!(summary.processed, 0);
    assert_eq!(summary.remaining, 0);
    assert!(recording.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Writer discipline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn every_ledger_entry_has_a_sink_record() {
    let p = paths();
    let source = items(30);
    let recording = Recording::default();
    let pool = Pool::new(recording, test_config(5)).unwrap();

    pool.run(&source, &p.ledger, &p.sink).await.unwrap();

    let completed = ledger::load(&p.ledger).await.unwrap();
    let records = sink::load(&p.sink).await.unwrap();
    let described: HashSet<&str> = records.iter().map(|r| r.file.as_str()).collect();
    for item in &completed {
        assert!(described.contains(item.as_str()), "no description for {item}");
    }
    assert_eq!(completed.len(), 30);
}

// ---------------------------------------------------------------------------
// Configuration bounds
// ---------------------------------------------------------------------------

#[tokio::test]
async fn worker_count_out_of_range_is_rejected() {
    assert!(Pool::new(Recording::default(), test_config(0)).is_err());
    assert!(Pool::new(Recording::default(), test_config(501)).is_err());
    assert!(Pool::new(Recording::default(), test_config(1)).is_ok());
    assert!(Pool::new(Recording::default(), test_config(500)).is_ok());
}
