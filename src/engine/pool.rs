//! Worker pool: bounded-concurrency processing of the pending set.
//!
//! The pending sequence is computed once at run start (source order minus
//! ledger) and never recomputed mid-run. `W` workers share an atomic claim
//! cursor over it: each worker claims the next unclaimed index, drives the
//! item through the processor, and loops until the cursor is exhausted, so
//! a slow item never stalls unrelated workers the way fixed-size batching
//! would.
//!
//! Workers never touch storage. Successes flow over a channel to a single
//! writer task that owns both append handles, writing the sink record
//! before the ledger record. Failures are counted and logged; the item
//! stays pending and is retried by the next run, not this one.

use crate::adapter::Processor;
use crate::config::{MAX_WORKERS, MIN_WORKERS};
use crate::engine::progress;
use crate::error::{Error, Result};
use crate::ledger::{self, LedgerWriter};
use crate::sink::{ResultRecord, SinkWriter};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Operator-facing pool settings.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Concurrently active workers, 1–500.
    pub workers: usize,
    /// Interval between live progress reports.
    pub poll_interval: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 20,
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Final counts for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Items completed and recorded by this run.
    pub processed: usize,
    /// Items that failed transiently and stay pending.
    pub errors: usize,
    /// Items still pending after this run.
    pub remaining: usize,
}

/// The worker pool. Generic over the processor so tests can instrument it.
pub struct Pool<P> {
    processor: Arc<P>,
    config: PoolConfig,
}

impl<P> Pool<P>
where
    P: Processor + 'static,
{
    pub fn new(processor: P, config: PoolConfig) -> Result<Self> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&config.workers) {
            return Err(Error::Config(format!(
                "worker count must be between {MIN_WORKERS} and {MAX_WORKERS}, got {}",
                config.workers
            )));
        }
        Ok(Self {
            processor: Arc::new(processor),
            config,
        })
    }

    /// Process every pending item in `items`, resuming from the ledger.
    ///
    /// Per-item failures never fail the run; only setup errors (unreadable
    /// ledger, unopenable sinks) do.
    pub async fn run(
        &self,
        items: &[String],
        ledger_path: &Path,
        sink_path: &Path,
    ) -> Result<RunSummary> {
        let total = items.len();
        let completed = ledger::load(ledger_path).await?;
        let pending: Vec<String> = items
            .iter()
            .filter(|item| !completed.contains(item.as_str()))
            .cloned()
            .collect();

        if pending.is_empty() {
            return Ok(RunSummary {
                processed: 0,
                errors: 0,
                remaining: 0,
            });
        }

        let mut ledger_writer = LedgerWriter::open(ledger_path).await?;
        let mut sink_writer = SinkWriter::open(sink_path).await?;

        info!(
            pending = pending.len(),
            total,
            workers = self.config.workers,
            "run started"
        );

        // Single writer task owns both append handles. Sink record lands
        // before the ledger record: a ledger entry always has a matching
        // description, while the reverse gap (crash between the two) just
        // means the item is reprocessed next run.
        let processed = Arc::new(AtomicUsize::new(0));
        let errors = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = mpsc::channel::<ResultRecord>(self.config.workers);
        let writer = {
            let processed = Arc::clone(&processed);
            let errors = Arc::clone(&errors);
            tokio::spawn(async move {
                while let Some(record) = rx.recv().await {
                    if let Err(e) = sink_writer.record(&record).await {
                        warn!(file = %record.file, "sink append failed: {e}");
                        errors.fetch_add(1, Ordering::Relaxed);
                        continue;
                    }
                    if let Err(e) = ledger_writer.record(&record.file).await {
                        warn!(file = %record.file, "ledger append failed: {e}");
                        errors.fetch_add(1, Ordering::Relaxed);
                        continue;
                    }
                    processed.fetch_add(1, Ordering::Relaxed);
                }
            })
        };

        // Live progress reporter, shut down once the pool drains.
        let shutdown = Arc::new(Notify::new());
        let reporter = {
            let shutdown = Arc::clone(&shutdown);
            let ledger_path = ledger_path.to_path_buf();
            let poll_interval = self.config.poll_interval;
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = shutdown.notified() => break,
                        _ = tokio::time::sleep(poll_interval) => {
                            match progress::observe(&ledger_path, total).await {
                                Ok(snap) => info!(
                                    completed = snap.completed,
                                    total = snap.total,
                                    remaining = snap.remaining,
                                    percent = snap.percentage,
                                    "progress"
                                ),
                                Err(e) => warn!("progress snapshot failed: {e}"),
                            }
                        }
                    }
                }
            })
        };

        let pending = Arc::new(pending);
        let cursor = Arc::new(AtomicUsize::new(0));
        let mut workers = JoinSet::new();
        for worker_id in 0..self.config.workers.min(pending.len()) {
            let pending = Arc::clone(&pending);
            let cursor = Arc::clone(&cursor);
            let errors = Arc::clone(&errors);
            let processor = Arc::clone(&self.processor);
            let tx = tx.clone();
            workers.spawn(async move {
                loop {
                    // Atomic claim: exactly one worker sees each index.
                    let idx = cursor.fetch_add(1, Ordering::Relaxed);
                    let Some(item) = pending.get(idx) else {
                        break;
                    };
                    match processor.process(item).await {
                        Ok(desc) => {
                            let record = ResultRecord {
                                file: item.clone(),
                                desc,
                            };
                            if tx.send(record).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!(worker_id, item = %item, "unit of work failed: {e}");
                            errors.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            });
        }
        drop(tx);

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                warn!("worker task failed: {e}");
            }
        }
        if let Err(e) = writer.await {
            warn!("writer task failed: {e}");
        }
        shutdown.notify_one();
        if let Err(e) = reporter.await {
            warn!("reporter task failed: {e}");
        }

        let processed = processed.load(Ordering::Relaxed);
        let errors = errors.load(Ordering::Relaxed);
        let summary = RunSummary {
            processed,
            errors,
            remaining: pending.len() - processed,
        };
        info!(
            processed = summary.processed,
            errors = summary.errors,
            remaining = summary.remaining,
            "run finished"
        );
        Ok(summary)
    }
}
