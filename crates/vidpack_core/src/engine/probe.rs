//! Duration probing via ffprobe.

use std::path::Path;
use std::time::Duration;

use serde_json::Value;

use crate::tools::{arg, path_arg, CancelHandle, ToolRequest, ToolRunner};

/// Probe the source duration in seconds.
///
/// Probing is advisory: the planner only uses the duration for an upfront
/// bound check, and an unknown duration defers that check to the transcoder.
/// Failures are therefore logged and swallowed rather than propagated.
pub fn probe_duration(
    runner: &dyn ToolRunner,
    ffprobe: &str,
    media: &Path,
    timeout: Option<Duration>,
    cancel: &CancelHandle,
) -> Option<f64> {
    let request = ToolRequest::new(
        ffprobe,
        vec![
            arg("-v"),
            arg("error"),
            arg("-show_entries"),
            arg("format=duration"),
            arg("-of"),
            arg("json"),
            path_arg(media),
        ],
    )
    .with_timeout(timeout)
    .with_cancel(cancel.clone());

    let output = match runner.run(&request) {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!("Duration probe failed for {}: {}", media.display(), e);
            return None;
        }
    };

    let duration = parse_duration_json(&output.stdout);
    if duration.is_none() {
        tracing::warn!("Duration probe returned no duration for {}", media.display());
    }
    duration
}

/// Parse `{"format": {"duration": "123.456"}}`.
fn parse_duration_json(stdout: &str) -> Option<f64> {
    let json: Value = serde_json::from_str(stdout).ok()?;
    json.get("format")?
        .get("duration")?
        .as_str()?
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
}
