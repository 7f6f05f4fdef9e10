//! vidpack core - fetch a video, extract derivative assets, package them.
//!
//! The pipeline takes a video URL, downloads the media through an external
//! fetcher (yt-dlp), runs one or more extraction jobs against it (frame
//! sampling, audio transcode, sub-clip cuts) by shelling out to ffmpeg, and
//! bundles everything that succeeded into a single deterministic zip archive
//! with a manifest.
//!
//! Stages are independent and explicitly wired:
//!
//! 1. [`workspace`] - disposable per-session directory
//! 2. [`fetch`] - URL -> local file + title
//! 3. [`plan`] - interval/rate validation and job construction (no I/O)
//! 4. [`engine`] - job execution against the external transcoder
//! 5. [`archive`] - deterministic zip of all produced artifacts
//! 6. [`assemble`] - final deliverable + manifest (no I/O)
//!
//! [`session`] ties the stages together and owns the error propagation
//! policy: fetch and validation failures are fatal, per-job tool failures
//! are collected (best-effort by default), and archiving failures abort the
//! deliverable entirely.
//!
//! # Known limitation
//!
//! Sub-clip cuts use stream copy by default, which snaps cut boundaries to
//! the nearest preceding keyframe. Frame-exact cuts are available via
//! re-encoding (`ClipCut { exact: true }`) at the cost of speed.

pub mod archive;
pub mod assemble;
pub mod config;
pub mod engine;
pub mod fetch;
pub mod logging;
pub mod models;
pub mod plan;
pub mod session;
pub mod tools;
pub mod workspace;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
