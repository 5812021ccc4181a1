//! Progress aggregation: completed/total/remaining/percentage.
//!
//! Read-only over the ledger. Used once before a run (is there work left?)
//! and repeatedly during a run for live counts.

use crate::error::Result;
use crate::ledger;
use std::path::Path;

/// A point-in-time view of project progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub completed: usize,
    pub total: usize,
    pub remaining: usize,
    pub percentage: u8,
}

impl Snapshot {
    /// Derive a snapshot from raw counts.
    ///
    /// `percentage` is the rounded share of completed items, 0 when the
    /// project is empty. Completed is clamped to total so a ledger with
    /// stray entries cannot report more than 100%.
    pub fn new(completed: usize, total: usize) -> Self {
        let completed = completed.min(total);
        let percentage = if total == 0 {
            0
        } else {
            (completed as f64 / total as f64 * 100.0).round() as u8
        };
        Self {
            completed,
            total,
            remaining: total - completed,
            percentage,
        }
    }

    pub fn is_done(&self) -> bool {
        self.remaining == 0
    }
}

/// Reload the ledger and derive the current snapshot.
pub async fn observe(ledger_path: &Path, total: usize) -> Result<Snapshot> {
    let completed = ledger::load(ledger_path).await?;
    Ok(Snapshot::new(completed.len(), total))
}
