//! External tool invocation.
//!
//! All subprocess calls go through the [`ToolRunner`] trait so the engine
//! and fetcher can be exercised in tests without the real binaries.
//! Commands are always built as argument lists, never shell strings, so
//! untrusted titles and URLs cannot inject anything.

use std::ffi::OsString;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

/// How often a cancellable or timed invocation polls the child process.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Shared cancellation flag.
///
/// A running invocation that carries the handle observes the flag while
/// polling and kills its child process as soon as the flag is set, so no
/// external tool outlives a cancelled session.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// A fully-described tool invocation: program, argument list, deadline,
/// cancellation flag.
#[derive(Debug, Clone)]
pub struct ToolRequest {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Kill the process and fail the invocation past this bound.
    pub timeout: Option<Duration>,
    /// Kill the process as soon as this handle is cancelled.
    pub cancel: Option<CancelHandle>,
}

impl ToolRequest {
    pub fn new(program: impl Into<PathBuf>, args: Vec<OsString>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: None,
            cancel: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Lossy single-line rendering for logs.
    pub fn display_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

/// Captured output of a successful (exit code 0) invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Failure of a tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The process could not be started at all.
    #[error("failed to spawn {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The process exited non-zero. Carries the tool's own diagnostics.
    #[error("{program} failed with exit code {exit_code}: {stderr}")]
    NonZeroExit {
        program: String,
        exit_code: i32,
        stderr: String,
    },

    /// The process exceeded its deadline and was killed.
    #[error("{program} timed out after {seconds}s")]
    TimedOut { program: String, seconds: u64 },

    /// The process was killed because its cancel handle fired.
    #[error("{program} killed after cancellation")]
    Cancelled { program: String },
}

impl ToolError {
    /// Exit code to report upstream; killed/unspawned processes map to -1.
    pub fn exit_code(&self) -> i32 {
        match self {
            ToolError::NonZeroExit { exit_code, .. } => *exit_code,
            _ => -1,
        }
    }

    /// Diagnostic text suitable for surfacing to the user.
    pub fn diagnostic(&self) -> String {
        match self {
            ToolError::NonZeroExit { stderr, .. } => stderr.clone(),
            other => other.to_string(),
        }
    }
}

/// Seam for running external tools.
pub trait ToolRunner: Send + Sync {
    /// Run to completion, capturing output.
    ///
    /// Returns `Ok` only for a zero exit code. A zero exit code does not
    /// guarantee the tool wrote its output; callers verify expected paths
    /// themselves.
    fn run(&self, request: &ToolRequest) -> Result<ToolOutput, ToolError>;
}

/// Production runner backed by `std::process`.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ToolRunner for SystemRunner {
    fn run(&self, request: &ToolRequest) -> Result<ToolOutput, ToolError> {
        let program = request.program.display().to_string();

        tracing::debug!("Running: {}", request.display_line());

        let mut child = Command::new(&request.program)
            .args(&request.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ToolError::SpawnFailed {
                program: program.clone(),
                source,
            })?;

        // Drain both pipes on threads so a chatty tool can't deadlock
        // against a full pipe buffer while we poll for exit.
        let stdout_reader = spawn_pipe_reader(child.stdout.take());
        let stderr_reader = spawn_pipe_reader(child.stderr.take());

        let status = if request.timeout.is_none() && request.cancel.is_none() {
            child.wait().map_err(|source| ToolError::SpawnFailed {
                program: program.clone(),
                source,
            })?
        } else {
            let deadline = request.timeout.map(|limit| (Instant::now() + limit, limit));
            loop {
                match child.try_wait() {
                    Ok(Some(status)) => break status,
                    Ok(None) => {
                        if request.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
                            let _ = child.kill();
                            let _ = child.wait();
                            // Let the readers observe EOF before returning.
                            let _ = stdout_reader.join();
                            let _ = stderr_reader.join();
                            return Err(ToolError::Cancelled { program });
                        }
                        if let Some((deadline, limit)) = deadline {
                            if Instant::now() >= deadline {
                                let _ = child.kill();
                                let _ = child.wait();
                                let _ = stdout_reader.join();
                                let _ = stderr_reader.join();
                                return Err(ToolError::TimedOut {
                                    program,
                                    seconds: limit.as_secs(),
                                });
                            }
                        }
                        std::thread::sleep(POLL_INTERVAL);
                    }
                    Err(source) => {
                        return Err(ToolError::SpawnFailed { program, source });
                    }
                }
            }
        };

        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();

        if !status.success() {
            return Err(ToolError::NonZeroExit {
                program,
                exit_code: status.code().unwrap_or(-1),
                stderr,
            });
        }

        Ok(ToolOutput { stdout, stderr })
    }
}

fn spawn_pipe_reader<R: Read + Send + 'static>(
    pipe: Option<R>,
) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Convenience for building an `OsString` argument list from mixed parts.
pub fn arg(value: impl Into<OsString>) -> OsString {
    value.into()
}

/// Path argument helper.
pub fn path_arg(value: &Path) -> OsString {
    value.as_os_str().to_os_string()
}
