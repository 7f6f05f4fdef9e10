//! Source media fetching.
//!
//! The fetcher is a collaborator boundary: the pipeline only needs a local
//! file and a title back. The production implementation shells out to
//! yt-dlp; tests substitute the trait.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::models::SourceMedia;
use crate::tools::{arg, path_arg, CancelHandle, ToolError, ToolRequest, ToolRunner};

/// What to fetch.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Video URL.
    pub url: String,
    /// Opaque credential blob, passed through to the downloader as a
    /// cookies file. The pipeline never interprets it.
    pub credentials: Option<Vec<u8>>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, credentials: Option<Vec<u8>>) -> Self {
        self.credentials = credentials;
        self
    }
}

/// Fetch failure. Fatal to the session: nothing downstream runs.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The downloader itself failed (network, auth, unavailable media).
    /// Carries the tool's own diagnostics.
    #[error("download failed: {0}")]
    Tool(#[from] ToolError),

    /// The downloader succeeded but the reported file is absent.
    #[error("downloader reported success but {path} does not exist")]
    MissingOutput { path: PathBuf },

    /// The downloader's output could not be interpreted.
    #[error("unexpected downloader output: {message}")]
    MalformedOutput { message: String },

    /// The credential blob could not be materialized.
    #[error("failed to write credential file: {source}")]
    CredentialWrite {
        #[source]
        source: std::io::Error,
    },
}

/// Boundary trait: URL in, local media + title out.
pub trait MediaFetcher: Send + Sync {
    /// Download into the workspace and describe the result.
    ///
    /// The returned media has an unknown duration; probing happens later.
    fn fetch(&self, request: &FetchRequest, workspace: &Path) -> Result<SourceMedia, FetchError>;
}

/// Production fetcher backed by yt-dlp.
///
/// Downloads best mp4 video + m4a audio merged into mp4, single video only
/// (no playlists), into a title-templated path inside the workspace. Title
/// and final path are read back from yt-dlp's `--print` output.
pub struct YtDlpFetcher {
    runner: std::sync::Arc<dyn ToolRunner>,
    program: String,
    timeout: Option<Duration>,
    cancel: Option<CancelHandle>,
}

impl YtDlpFetcher {
    pub fn new(
        runner: std::sync::Arc<dyn ToolRunner>,
        program: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            runner,
            program: program.into(),
            timeout,
            cancel: None,
        }
    }

    /// Kill an in-flight download when this handle is cancelled.
    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

impl MediaFetcher for YtDlpFetcher {
    fn fetch(&self, request: &FetchRequest, workspace: &Path) -> Result<SourceMedia, FetchError> {
        let mut args = vec![
            arg("--no-playlist"),
            arg("-f"),
            arg("bestvideo[ext=mp4]+bestaudio[ext=m4a]/mp4"),
            arg("--merge-output-format"),
            arg("mp4"),
            arg("--no-simulate"),
            arg("--print"),
            arg("title"),
            arg("--print"),
            arg("after_move:filepath"),
            arg("-o"),
            path_arg(&workspace.join("%(title)s.%(ext)s")),
        ];

        if let Some(blob) = &request.credentials {
            let cookies_path = workspace.join("cookies.txt");
            std::fs::write(&cookies_path, blob)
                .map_err(|source| FetchError::CredentialWrite { source })?;
            args.push(arg("--cookies"));
            args.push(path_arg(&cookies_path));
        }

        args.push(arg(request.url.clone()));

        tracing::info!("Downloading {}", request.url);
        let mut tool_request = ToolRequest::new(&self.program, args).with_timeout(self.timeout);
        if let Some(cancel) = &self.cancel {
            tool_request = tool_request.with_cancel(cancel.clone());
        }
        let output = self.runner.run(&tool_request)?;

        let (title, path) = parse_print_output(&output.stdout)?;

        if !path.is_file() {
            return Err(FetchError::MissingOutput { path });
        }

        tracing::info!("Downloaded '{}' to {}", title, path.display());
        Ok(SourceMedia::new(path, title))
    }
}

/// The two `--print` directives emit one line each: title, then the final
/// file path after merge/move.
fn parse_print_output(stdout: &str) -> Result<(String, PathBuf), FetchError> {
    let mut lines = stdout.lines().filter(|l| !l.trim().is_empty());

    let title = lines.next().ok_or_else(|| FetchError::MalformedOutput {
        message: "no title line".to_string(),
    })?;
    let path = lines.next().ok_or_else(|| FetchError::MalformedOutput {
        message: "no filepath line".to_string(),
    })?;

    Ok((title.trim().to_string(), PathBuf::from(path.trim())))
}
