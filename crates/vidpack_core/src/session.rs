//! Session orchestration: fetch, plan, extract, archive, assemble.
//!
//! One session = one URL = one workspace = one deliverable. The stages run
//! strictly in order and the error policy is explicit:
//!
//! - fetch and validation failures are fatal, nothing downstream runs;
//! - per-job tool failures are collected under the best-effort policy and
//!   surfaced next to the artifacts that did succeed;
//! - if every job failed there is nothing to deliver, which is fatal;
//! - archiving failures are fatal, since a partial archive is worse than
//!   none.
//!
//! The source media is threaded through the stages as an explicit value;
//! there is no ambient session state.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::archive::{self, ArchiveError};
use crate::assemble;
use crate::config::Settings;
use crate::engine::{
    probe_duration, CancelHandle, EngineError, ExtractionEngine, JobFailure,
};
use crate::fetch::{FetchError, FetchRequest, MediaFetcher, YtDlpFetcher};
use crate::models::Deliverable;
use crate::plan::{self, ExtractionRequest, ValidationError};
use crate::tools::{SystemRunner, ToolRunner};
use crate::workspace::Workspace;

/// Everything needed to run one session.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    /// Video URL.
    pub url: String,
    /// Opaque credential blob for the fetcher.
    pub credentials: Option<Vec<u8>>,
    /// What to extract.
    pub extraction: ExtractionRequest,
}

/// Successful session result.
#[derive(Debug)]
pub struct SessionOutcome {
    pub deliverable: Deliverable,
    /// Jobs that failed under the best-effort policy. Empty on full success.
    pub job_failures: Vec<JobFailure>,
    /// Human-readable success/failure summary for the user-facing layer.
    pub summary: String,
}

/// Fatal session failure.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to provision workspace: {0}")]
    Workspace(#[source] std::io::Error),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// All-or-nothing abort from the engine.
    #[error(transparent)]
    Extraction(EngineError),

    /// Best-effort run in which no job produced anything archivable.
    #[error("all {} extraction jobs failed", failures.len())]
    AllJobsFailed { failures: Vec<JobFailure> },

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error("failed to prepare output folder {path}: {source}")]
    OutputFolder {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("session cancelled")]
    Cancelled,
}

/// Runs the whole pipeline for one URL.
pub struct Session {
    settings: Settings,
    fetcher: Box<dyn MediaFetcher>,
    runner: Arc<dyn ToolRunner>,
    cancel: CancelHandle,
}

impl Session {
    /// Production wiring: system subprocesses and yt-dlp, all observing the
    /// session's cancel handle.
    pub fn new(settings: Settings) -> Self {
        let runner: Arc<dyn ToolRunner> = Arc::new(SystemRunner::new());
        let cancel = CancelHandle::new();
        let fetcher = Box::new(
            YtDlpFetcher::new(
                Arc::clone(&runner),
                settings.tools.ytdlp.clone(),
                settings.tools.timeout(),
            )
            .with_cancel(cancel.clone()),
        );
        Self {
            settings,
            fetcher,
            runner,
            cancel,
        }
    }

    /// Explicit wiring, used by tests and embedding applications.
    pub fn with_parts(
        settings: Settings,
        fetcher: Box<dyn MediaFetcher>,
        runner: Arc<dyn ToolRunner>,
    ) -> Self {
        Self {
            settings,
            fetcher,
            runner,
            cancel: CancelHandle::new(),
        }
    }

    /// Handle for aborting this session from another thread.
    ///
    /// Cancellation kills any in-flight external tool process and aborts
    /// the session at the next check; the workspace and any partial output
    /// are removed, and no archive is exposed.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Run the session to completion.
    pub fn run(&self, request: &SessionRequest) -> Result<SessionOutcome, SessionError> {
        let temp_root = match self.settings.paths.temp_root.as_str() {
            "" => None,
            root => Some(PathBuf::from(root)),
        };
        let workspace =
            Workspace::create(temp_root.as_deref()).map_err(SessionError::Workspace)?;

        if self.cancel.is_cancelled() {
            return Err(SessionError::Cancelled);
        }

        // Fetch. Fatal on failure: nothing downstream can run. A download
        // killed by cancellation is reported as the cancellation, not as a
        // fetch failure.
        let fetch_request =
            FetchRequest::new(request.url.clone()).with_credentials(request.credentials.clone());
        let media = match self.fetcher.fetch(&fetch_request, workspace.path()) {
            Ok(media) => media,
            Err(_) if self.cancel.is_cancelled() => return Err(SessionError::Cancelled),
            Err(e) => return Err(e.into()),
        };

        if self.cancel.is_cancelled() {
            return Err(SessionError::Cancelled);
        }

        // Probe is advisory; an unknown duration defers the end-bound check
        // to the transcoder.
        let duration = probe_duration(
            self.runner.as_ref(),
            &self.settings.tools.ffprobe,
            &media.path,
            self.settings.tools.timeout(),
            &self.cancel,
        );
        let media = media.with_duration(duration);

        // Configured defaults fill in what the request left open, then
        // validation runs before any transcoder invocation.
        let mut extraction = request.extraction.clone();
        if extraction.scale.is_none() {
            extraction.scale = Some(self.settings.extraction.frame_scale());
        }
        extraction.exact_cut = extraction.exact_cut || self.settings.extraction.exact_cut;
        let jobs = plan::plan(&extraction, media.duration_secs)?;

        let engine = ExtractionEngine::new(Arc::clone(&self.runner), &self.settings);
        let report = engine
            .run(&media, &jobs, workspace.path(), &self.cancel)
            .map_err(|e| match e {
                EngineError::Cancelled => SessionError::Cancelled,
                other => SessionError::Extraction(other),
            })?;

        if report.artifacts.is_empty() {
            return Err(SessionError::AllJobsFailed {
                failures: report.failures,
            });
        }

        if self.cancel.is_cancelled() {
            return Err(SessionError::Cancelled);
        }

        // Archive outside the workspace so the zip outlives it.
        let output_folder = PathBuf::from(&self.settings.paths.output_folder);
        std::fs::create_dir_all(&output_folder).map_err(|source| SessionError::OutputFolder {
            path: output_folder.display().to_string(),
            source,
        })?;
        let archive_path = output_folder.join(format!("{}_assets.zip", media.safe_title()));
        let archive = archive::archive(&report.artifacts, &archive_path)?;

        let deliverable = assemble::assemble(&report.artifacts, archive);
        let summary = render_summary(&media.title, &deliverable, &report.failures);
        tracing::info!("{}", summary.lines().next().unwrap_or_default());

        Ok(SessionOutcome {
            deliverable,
            job_failures: report.failures,
            summary,
        })
        // Workspace drops here; all intermediate artifacts are discarded.
    }
}

/// Multi-line summary for the user-facing layer.
fn render_summary(title: &str, deliverable: &Deliverable, failures: &[JobFailure]) -> String {
    let mut lines = vec![format!(
        "'{}': {} artifact(s) archived to {}{}",
        title,
        deliverable.manifest.len(),
        deliverable.archive_path.display(),
        if failures.is_empty() {
            String::new()
        } else {
            format!(", {} job(s) failed", failures.len())
        }
    )];

    for entry in &deliverable.manifest {
        lines.push(format!(
            "  {}: {} file(s), {} bytes",
            entry.logical_name, entry.entry_count, entry.size_bytes
        ));
    }

    for failure in failures {
        lines.push(format!("  FAILED {}: {}", failure.label, failure.error));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::JobError;
    use crate::models::ManifestEntry;

    #[test]
    fn summary_lists_artifacts_and_failures() {
        let deliverable = Deliverable {
            archive_path: PathBuf::from("/out/demo_assets.zip"),
            manifest: vec![ManifestEntry {
                logical_name: "frames_25fps".into(),
                source_path: PathBuf::from("/w/frames"),
                entry_count: 250,
                size_bytes: 1024,
            }],
            created_at: "2026-01-01T00:00:00+00:00".into(),
        };
        let failures = vec![JobFailure {
            label: "audio_mp3_full".into(),
            error: JobError::ToolInvocationFailed {
                exit_code: 1,
                diagnostic: "no audio stream".into(),
            },
        }];

        let summary = render_summary("Demo", &deliverable, &failures);
        assert!(summary.contains("1 artifact(s)"));
        assert!(summary.contains("1 job(s) failed"));
        assert!(summary.contains("frames_25fps: 250 file(s)"));
        assert!(summary.contains("FAILED audio_mp3_full"));
        assert!(summary.contains("no audio stream"));
    }
}
