//! Result sink: one JSON record per completed item.
//!
//! Persisted as JSONL (`descriptions.jsonl`), append-only. A crash between
//! the sink append and the ledger append means the item is reprocessed on
//! the next run, so duplicate records for the same file are possible by
//! design; [`load`] keeps the latest record per file.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Longest description stored. Anything beyond this is truncated.
pub const MAX_DESC_LEN: usize = 400;

/// One produced output: a file identifier and its description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultRecord {
    pub file: String,
    pub desc: String,
}

/// Collapse a raw model reply into a storable description: whitespace
/// around the reply dropped, embedded newlines flattened to single spaces,
/// truncated to [`MAX_DESC_LEN`] on a char boundary.
pub fn normalize_desc(raw: &str) -> String {
    let mut desc: String = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if desc.chars().count() > MAX_DESC_LEN {
        desc = desc.chars().take(MAX_DESC_LEN).collect();
    }
    desc
}

/// Load all records, deduplicating by file and keeping the latest.
///
/// Malformed lines (torn writes from a crashed run) are skipped rather
/// than failing the load. Missing file is an empty result set.
pub async fn load(path: &Path) -> Result<Vec<ResultRecord>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut records: Vec<ResultRecord> = Vec::new();
    for line in content.lines().filter(|l| !l.is_empty()) {
        let Ok(record) = serde_json::from_str::<ResultRecord>(line) else {
            tracing::warn!("skipping malformed sink record");
            continue;
        };
        // Latest record wins
        if let Some(existing) = records.iter_mut().find(|r| r.file == record.file) {
            *existing = record;
        } else {
            records.push(record);
        }
    }
    Ok(records)
}

/// Append-only writer for the sink, owned by the engine's writer task.
pub struct SinkWriter {
    file: File,
}

impl SinkWriter {
    /// Open the sink for appending, creating it if absent.
    pub async fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .await?;
        Ok(Self { file })
    }

    /// Append one record as a single JSONL line.
    pub async fn record(&mut self, record: &ResultRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;
        self.file.write_all(line.as_bytes()).await?;
        self.file.write_all(b"\n").await?;
        self.file.flush().await?;
        Ok(())
    }
}
