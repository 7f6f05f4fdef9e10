//! Extraction engine: runs jobs against the source media.
//!
//! Each job maps to one transcoder invocation with a distinct output path
//! derived from the job's logical name, so jobs never contend on disk. Jobs
//! run sequentially in plan order (each invocation is CPU/IO heavy). A zero
//! exit code is never trusted on its own: the engine verifies the expected
//! output exists, and for frame jobs that the numbering is contiguous from
//! `0001`.
//!
//! The failure policy is best-effort by default: a failing job is recorded
//! and its siblings still run, so the caller gets every artifact that did
//! succeed alongside a structured failure list. All-or-nothing is available
//! for callers that prefer aborting the whole request on first failure.

mod ffmpeg;
mod probe;

pub use ffmpeg::FfmpegInvocation;
pub use probe::probe_duration;

pub use crate::tools::CancelHandle;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::Settings;
use crate::models::{Artifact, ArtifactSet, ExtractionJob, SourceMedia};
use crate::tools::{ToolError, ToolRunner};

/// Frame files are named `frame_0001.jpg`, `frame_0002.jpg`, ...
const FRAME_PREFIX: &str = "frame_";
const FRAME_EXT: &str = "jpg";
const FRAME_PATTERN: &str = "frame_%04d.jpg";

/// Failure of a single extraction job.
#[derive(Debug, Error)]
pub enum JobError {
    /// The external tool returned non-zero (or was killed on timeout).
    /// Carries the tool's own diagnostic output.
    #[error("transcoder failed with exit code {exit_code}: {diagnostic}")]
    ToolInvocationFailed { exit_code: i32, diagnostic: String },

    /// The tool reported success but the expected output is absent.
    #[error("transcoder reported success but produced no output at {path}")]
    OutputNotProduced { path: PathBuf },

    /// Filesystem error while preparing or inspecting job output.
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl From<ToolError> for JobError {
    fn from(err: ToolError) -> Self {
        JobError::ToolInvocationFailed {
            exit_code: err.exit_code(),
            diagnostic: err.diagnostic(),
        }
    }
}

/// One recorded job failure, surfaced alongside successful siblings.
#[derive(Debug)]
pub struct JobFailure {
    /// Logical name of the failed job.
    pub label: String,
    pub error: JobError,
}

/// Engine-level failure that aborts the whole request.
#[derive(Debug, Error)]
pub enum EngineError {
    /// All-or-nothing policy: the first job failure aborts the request.
    #[error("job '{label}' failed: {source}")]
    JobFailed {
        label: String,
        #[source]
        source: JobError,
    },

    /// The session was cancelled; any in-flight tool process was killed.
    #[error("extraction cancelled")]
    Cancelled,
}

/// How the engine reacts to a job failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Run every job, collect failures, return whatever succeeded.
    #[default]
    BestEffort,
    /// Abort the request on the first failure.
    AllOrNothing,
}

/// Result of an engine run: artifacts that succeeded plus any failures
/// (always empty under all-or-nothing).
#[derive(Debug, Default)]
pub struct EngineReport {
    pub artifacts: ArtifactSet,
    pub failures: Vec<JobFailure>,
}

/// Executes extraction jobs through a [`ToolRunner`].
pub struct ExtractionEngine {
    runner: Arc<dyn ToolRunner>,
    ffmpeg: String,
    timeout: Option<Duration>,
    jpeg_quality: u32,
    policy: FailurePolicy,
}

impl ExtractionEngine {
    /// Build an engine from settings.
    pub fn new(runner: Arc<dyn ToolRunner>, settings: &Settings) -> Self {
        let policy = if settings.extraction.all_or_nothing {
            FailurePolicy::AllOrNothing
        } else {
            FailurePolicy::BestEffort
        };

        Self {
            runner,
            ffmpeg: settings.tools.ffmpeg.clone(),
            timeout: settings.tools.timeout(),
            jpeg_quality: settings.extraction.jpeg_quality,
            policy,
        }
    }

    /// Override the failure policy.
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Run all jobs against the source inside the workspace.
    ///
    /// Jobs only read the immutable source and write to distinct paths, so
    /// execution order cannot change the outcome, only which failures are
    /// observed first.
    pub fn run(
        &self,
        source: &SourceMedia,
        jobs: &[ExtractionJob],
        workspace: &Path,
        cancel: &CancelHandle,
    ) -> Result<EngineReport, EngineError> {
        let mut report = EngineReport::default();

        for job in jobs {
            if cancel.is_cancelled() {
                tracing::warn!("Extraction cancelled before job '{}'", job.label());
                return Err(EngineError::Cancelled);
            }

            let label = job.label();
            tracing::info!("Running {} job '{}'", job.kind(), label);

            match self.run_job(source, job, workspace, cancel) {
                Ok(artifact) => {
                    report.artifacts.insert(label, artifact);
                }
                Err(error) => {
                    // A cancelled handle kills the in-flight tool process;
                    // that is a session abort, not a job failure.
                    if cancel.is_cancelled() {
                        tracing::warn!("Job '{}' terminated by cancellation", label);
                        return Err(EngineError::Cancelled);
                    }
                    tracing::error!("Job '{}' failed: {}", label, error);
                    match self.policy {
                        FailurePolicy::AllOrNothing => {
                            return Err(EngineError::JobFailed {
                                label,
                                source: error,
                            });
                        }
                        FailurePolicy::BestEffort => {
                            report.failures.push(JobFailure { label, error });
                        }
                    }
                }
            }
        }

        Ok(report)
    }

    fn run_job(
        &self,
        source: &SourceMedia,
        job: &ExtractionJob,
        workspace: &Path,
        cancel: &CancelHandle,
    ) -> Result<Artifact, JobError> {
        let title = source.safe_title();

        match job {
            ExtractionJob::FrameSample { span, rate, scale } => {
                let frames_dir = workspace.join(format!(
                    "frames_{}fps_{}_{}",
                    rate.tag(),
                    span.tag(),
                    title
                ));
                std::fs::create_dir_all(&frames_dir).map_err(|source| JobError::Io {
                    operation: format!("create {}", frames_dir.display()),
                    source,
                })?;

                let pattern = frames_dir.join(FRAME_PATTERN);
                let request = FfmpegInvocation::frame_sample(
                    &source.path,
                    *span,
                    *rate,
                    *scale,
                    self.jpeg_quality,
                    &pattern,
                )
                .into_request(&self.ffmpeg, self.timeout)
                .with_cancel(cancel.clone());

                self.runner.run(&request)?;

                let frame_count = verify_frame_sequence(&frames_dir)?;
                tracing::info!(
                    "Sampled {} frames into {}",
                    frame_count,
                    frames_dir.display()
                );
                Ok(Artifact::frame_directory(frames_dir, frame_count))
            }

            ExtractionJob::AudioExtract { span, codec } => {
                let output = workspace.join(format!(
                    "{}_{}.{}",
                    title,
                    span.tag(),
                    codec.extension()
                ));
                let request =
                    FfmpegInvocation::audio_extract(&source.path, *span, *codec, &output)
                        .into_request(&self.ffmpeg, self.timeout)
                        .with_cancel(cancel.clone());

                self.runner.run(&request)?;
                verify_file(&output)?;
                Ok(Artifact::file(output))
            }

            ExtractionJob::ClipCut { interval, exact } => {
                let output = workspace.join(format!("{}_clip_{}.mp4", title, interval.tag()));
                let request =
                    FfmpegInvocation::clip_cut(&source.path, *interval, *exact, &output)
                        .into_request(&self.ffmpeg, self.timeout)
                        .with_cancel(cancel.clone());

                self.runner.run(&request)?;
                verify_file(&output)?;
                Ok(Artifact::file(output))
            }
        }
    }
}

fn verify_file(path: &Path) -> Result<(), JobError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(JobError::OutputNotProduced {
            path: path.to_path_buf(),
        })
    }
}

/// Check the frame directory holds `frame_0001.jpg .. frame_NNNN.jpg` with
/// no gaps, returning the count.
fn verify_frame_sequence(dir: &Path) -> Result<usize, JobError> {
    let entries = std::fs::read_dir(dir).map_err(|source| JobError::Io {
        operation: format!("read {}", dir.display()),
        source,
    })?;

    let mut indices = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| JobError::Io {
            operation: format!("read {}", dir.display()),
            source,
        })?;
        if let Some(index) = parse_frame_index(&entry.file_name().to_string_lossy()) {
            indices.push(index);
        }
    }

    if indices.is_empty() {
        return Err(JobError::OutputNotProduced {
            path: dir.to_path_buf(),
        });
    }

    indices.sort_unstable();
    for (position, index) in indices.iter().enumerate() {
        let expected = position as u32 + 1;
        if *index != expected {
            return Err(JobError::OutputNotProduced {
                path: dir.join(format!("{}{:04}.{}", FRAME_PREFIX, expected, FRAME_EXT)),
            });
        }
    }

    Ok(indices.len())
}

fn parse_frame_index(file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix(FRAME_PREFIX)?
        .strip_suffix(&format!(".{}", FRAME_EXT))?
        .parse()
        .ok()
}
