//! Completion ledger: the durable record of finished work items.
//!
//! Persisted as a newline-delimited list of item identifiers, append-only
//! across runs. The ledger is the source of truth for resume: an item is
//! done if and only if its identifier appears here. Loading collapses
//! duplicate lines, so a record retried after an ambiguous failure cannot
//! corrupt the set.

use crate::error::Result;
use std::collections::HashSet;
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Reconstruct the completed set from the ledger file.
///
/// A missing or empty ledger is an empty set, not an error — a freshly
/// initialized project starts with nothing completed.
pub async fn load(path: &Path) -> Result<HashSet<String>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
        Err(e) => return Err(e.into()),
    };

    Ok(content
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Append-only writer for the ledger.
///
/// One instance exists per run, owned by the engine's writer task. Each
/// record is a single line, flushed before `record` returns, so a crash
/// loses at most the record being written.
pub struct LedgerWriter {
    file: File,
}

impl LedgerWriter {
    /// Open the ledger for appending, creating it if absent.
    pub async fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .await?;
        Ok(Self { file })
    }

    /// Durably append one completion record.
    pub async fn record(&mut self, item: &str) -> Result<()> {
        self.file.write_all(item.as_bytes()).await?;
        self.file.write_all(b"\n").await?;
        self.file.flush().await?;
        Ok(())
    }
}
