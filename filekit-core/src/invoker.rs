//! External tool invocation.
//!
//! Spawns an `ffmpeg`-compatible binary as
//! `[-y, -i, <input>, ...flags, <output>]`, collects its diagnostic stream and
//! turns the exit status into a result. The number of concurrently running
//! processes is bounded by a semaphore shared by every clone of the invoker.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ToolExecutionError {
    #[error("external tool '{program}' was not found")]
    NotFound { program: String },

    #[error("external tool exited with {}: {diagnostics}", describe_code(.code))]
    Failed {
        code: Option<i32>,
        diagnostics: String,
    },

    #[error("external tool did not finish within {seconds}s")]
    TimedOut { seconds: u64 },

    #[error("all {limit} tool slots are busy")]
    Saturated { limit: usize },

    #[error("failed to run external tool: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct InvokerConfig {
    /// Program to spawn, looked up on `PATH` when not absolute.
    pub program: PathBuf,
    /// Maximum number of processes running at the same time.
    pub max_concurrent_jobs: usize,
    /// Fail with [`ToolExecutionError::Saturated`] instead of waiting for a slot.
    pub reject_when_saturated: bool,
    /// Kill the process after this long. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            max_concurrent_jobs: 4,
            reject_when_saturated: false,
            timeout: None,
        }
    }
}

/// Captured result of a successful run.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub diagnostics: String,
}

#[derive(Debug, Clone)]
pub struct ToolInvoker {
    config: InvokerConfig,
    permits: Arc<Semaphore>,
}

impl ToolInvoker {
    pub fn new(config: InvokerConfig) -> Self {
        let limit = config.max_concurrent_jobs.max(1);
        Self {
            config: InvokerConfig {
                max_concurrent_jobs: limit,
                ..config
            },
            permits: Arc::new(Semaphore::new(limit)),
        }
    }

    pub fn config(&self) -> &InvokerConfig {
        &self.config
    }

    /// Number of slots currently free.
    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }

    /// Full argument list passed to the program.
    pub fn arguments(input: &Path, output: &Path, flags: &[String]) -> Vec<OsString> {
        let mut args = Vec::with_capacity(flags.len() + 4);
        args.push(OsString::from("-y"));
        args.push(OsString::from("-i"));
        args.push(input.as_os_str().to_os_string());
        args.extend(flags.iter().map(OsString::from));
        args.push(output.as_os_str().to_os_string());
        args
    }

    pub async fn run(
        &self,
        input: &Path,
        output: &Path,
        flags: &[String],
    ) -> Result<ToolOutput, ToolExecutionError> {
        let _permit = self.acquire().await?;
        let args = Self::arguments(input, output, flags);
        debug!(program = %self.config.program.display(), ?args, "spawning external tool");

        let child = Command::new(&self.config.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    ToolExecutionError::NotFound {
                        program: self.config.program.display().to_string(),
                    }
                } else {
                    ToolExecutionError::Io(err)
                }
            })?;

        let finished = child.wait_with_output();
        let result = match self.config.timeout {
            Some(limit) => match tokio::time::timeout(limit, finished).await {
                Ok(result) => result?,
                Err(_) => {
                    warn!(seconds = limit.as_secs(), "external tool timed out");
                    return Err(ToolExecutionError::TimedOut {
                        seconds: limit.as_secs(),
                    });
                }
            },
            None => finished.await?,
        };

        let diagnostics = String::from_utf8_lossy(&result.stderr).into_owned();
        if result.status.success() {
            Ok(ToolOutput { diagnostics })
        } else {
            let code = result.status.code();
            warn!(?code, %diagnostics, "external tool failed");
            Err(ToolExecutionError::Failed { code, diagnostics })
        }
    }

    async fn acquire(&self) -> Result<OwnedSemaphorePermit, ToolExecutionError> {
        let limit = self.config.max_concurrent_jobs;
        if self.config.reject_when_saturated {
            return match self.permits.clone().try_acquire_owned() {
                Ok(permit) => Ok(permit),
                Err(TryAcquireError::NoPermits) | Err(TryAcquireError::Closed) => {
                    Err(ToolExecutionError::Saturated { limit })
                }
            };
        }
        self.permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ToolExecutionError::Saturated { limit })
    }
}
