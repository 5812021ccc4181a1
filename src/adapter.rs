//! Unit-of-work adapter: the external AI call applied to each item.
//!
//! The engine only sees the [`Processor`] trait. The production
//! implementation, [`ClaudeCli`], shells out to the `claude` CLI once per
//! file, headless, with a hard wall-clock timeout. Calls share no mutable
//! state and may run fully in parallel.

use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::sink::normalize_desc;

/// Why one unit-of-work call produced no output.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn worker process: {0}")]
    Spawn(std::io::Error),

    #[error("worker timed out after {0:?}")]
    Timeout(Duration),

    #[error("worker exited with status {code}: {stderr}")]
    Exit { code: i32, stderr: String },

    #[error("worker produced no output")]
    Empty,
}

/// One blocking, independent unit-of-work call per item.
///
/// Implementations must be safe to invoke concurrently from many workers.
pub trait Processor: Send + Sync {
    fn process(&self, item: &str) -> impl Future<Output = Result<String, ProcessError>> + Send;
}

/// Production adapter: one `claude -p <prompt>` subprocess per item.
pub struct ClaudeCli {
    bin: String,
    timeout: Duration,
    context_note: Option<String>,
}

impl ClaudeCli {
    pub fn new(bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            timeout,
            context_note: None,
        }
    }

    /// Point prompts at a project context document, if one was generated
    /// at init time.
    pub fn with_context(mut self, context_path: &Path) -> Self {
        if context_path.is_file() {
            self.context_note = Some(format!(
                " For background on the project, see {}.",
                context_path.display()
            ));
        }
        self
    }

    fn prompt_for(&self, item: &str) -> String {
        format!(
            "Read the file at {item} and describe its purpose in one sentence \
             of at most 400 characters.{} Reply with only the description.",
            self.context_note.as_deref().unwrap_or("")
        )
    }
}

impl Processor for ClaudeCli {
    async fn process(&self, item: &str) -> Result<String, ProcessError> {
        let prompt = self.prompt_for(item);
        debug!(item, "spawning worker process");

        // stdin is closed: the worker runs headless and must never wait
        // on an interactive channel.
        let child = Command::new(&self.bin)
            .arg("--dangerously-skip-permissions")
            .arg("-p")
            .arg(&prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(ProcessError::Spawn)?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ProcessError::Timeout(self.timeout))?
            .map_err(ProcessError::Spawn)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProcessError::Exit {
                code: output.status.code().unwrap_or(-1),
                stderr: normalize_desc(&stderr),
            });
        }

        let desc = normalize_desc(&String::from_utf8_lossy(&output.stdout));
        if desc.is_empty() {
            return Err(ProcessError::Empty);
        }
        Ok(desc)
    }
}
