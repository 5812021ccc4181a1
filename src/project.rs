//! Project layout, metadata, and the item source.
//!
//! A project is a directory under `projects/<name>/` created once at init:
//!
//! - `metadata.json`       descriptive record, read-only after init
//! - `all_files.txt`       the ordered item source, never recomputed mid-run
//! - `file_stats.txt`      per-file line counts (`path|lines`)
//! - `completed.txt`       the completion ledger
//! - `descriptions.jsonl`  the result sink
//! - `PROJECT_CONTEXT.md`  optional AI-generated repo overview
//!
//! Identifiers added to the repository after init are invisible until the
//! project is re-initialized.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Descriptive record written once at initialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub repo_name: String,
    pub repo_url: String,
    pub total_files: usize,
    pub total_loc: u64,
    pub init_date: DateTime<Utc>,
}

/// Handle to one project directory.
#[derive(Debug, Clone)]
pub struct Project {
    pub name: String,
    dir: PathBuf,
}

impl Project {
    pub fn new(projects_dir: &Path, name: &str) -> Self {
        Self {
            name: name.to_string(),
            dir: projects_dir.join(name),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join("metadata.json")
    }

    pub fn items_path(&self) -> PathBuf {
        self.dir.join("all_files.txt")
    }

    pub fn stats_path(&self) -> PathBuf {
        self.dir.join("file_stats.txt")
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.dir.join("completed.txt")
    }

    pub fn sink_path(&self) -> PathBuf {
        self.dir.join("descriptions.jsonl")
    }

    pub fn context_path(&self) -> PathBuf {
        self.dir.join("PROJECT_CONTEXT.md")
    }

    pub fn exists(&self) -> bool {
        self.metadata_path().is_file()
    }

    /// Read the metadata record. Unreadable metadata is a fatal setup error.
    pub async fn load_metadata(&self) -> Result<ProjectMetadata> {
        let raw = tokio::fs::read_to_string(self.metadata_path())
            .await
            .map_err(|e| Error::Setup(format!("cannot read metadata for {}: {e}", self.name)))?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub async fn write_metadata(&self, metadata: &ProjectMetadata) -> Result<()> {
        let json = serde_json::to_string_pretty(metadata)?;
        tokio::fs::write(self.metadata_path(), json).await?;
        Ok(())
    }

    /// Read the ordered item source, as persisted at init.
    ///
    /// An unreadable item source fails the whole run — there is nothing
    /// sensible to process without it.
    pub async fn load_items(&self) -> Result<Vec<String>> {
        let raw = tokio::fs::read_to_string(self.items_path())
            .await
            .map_err(|e| Error::Setup(format!("cannot read file list for {}: {e}", self.name)))?;
        Ok(raw
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub async fn write_items(&self, items: &[String]) -> Result<()> {
        tokio::fs::write(self.items_path(), items.join("\n")).await?;
        Ok(())
    }
}

/// List all initialized projects, sorted by name.
pub async fn list_projects(projects_dir: &Path) -> Result<Vec<Project>> {
    let mut entries = match tokio::fs::read_dir(projects_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut projects = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            let name = entry.file_name().to_string_lossy().to_string();
            let project = Project::new(projects_dir, &name);
            if project.exists() {
                projects.push(project);
            }
        }
    }
    projects.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(projects)
}

/// Derive a project name from a repository URL (`.git` suffix stripped).
pub fn repo_name_from_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let base = trimmed.rsplit('/').next().unwrap_or(trimmed);
    base.strip_suffix(".git").unwrap_or(base).to_string()
}

const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    ".next",
    "coverage",
    "__pycache__",
    ".cache",
    "vendor",
];

const EXCLUDED_FILES: &[&str] = &["package-lock.json", "yarn.lock"];

const EXCLUDED_SUFFIXES: &[&str] = &[".min.js", ".map", ".log"];

/// Walk a cloned repository and produce the ordered item source.
///
/// Paths are absolute and sorted, so the sequence is stable across
/// re-initializations of an unchanged clone.
pub fn discover_files(repo_dir: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();

    let walker = WalkDir::new(repo_dir).into_iter().filter_entry(|entry| {
        if entry.file_type().is_dir() {
            let name = entry.file_name().to_string_lossy();
            !EXCLUDED_DIRS.contains(&name.as_ref())
        } else {
            true
        }
    });

    for entry in walker {
        let entry = entry.map_err(|e| Error::Setup(format!("walk {}: {e}", repo_dir.display())))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if EXCLUDED_FILES.contains(&name.as_ref())
            || EXCLUDED_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
        {
            continue;
        }
        files.push(entry.path().to_string_lossy().to_string());
    }

    files.sort();
    Ok(files)
}

/// Count lines per file, returning `(total, per-file stats lines)`.
///
/// Unreadable files are skipped: the list may contain binaries or files
/// deleted since discovery, and stats are informational only.
pub async fn count_lines(items: &[String]) -> (u64, Vec<String>) {
    let mut total: u64 = 0;
    let mut stats = Vec::with_capacity(items.len());

    for item in items {
        let Ok(bytes) = tokio::fs::read(item).await else {
            continue;
        };
        let lines = if bytes.is_empty() {
            0
        } else {
            bytes.iter().filter(|&&b| b == b'\n').count() as u64 + 1
        };
        total += lines;
        stats.push(format!("{item}|{lines}"));
    }

    (total, stats)
}
