//! Extraction planning.
//!
//! The planner turns a user request into a validated list of
//! [`ExtractionJob`]s. It is pure: no filesystem access and no tool
//! invocation, so every validation path is unit-testable without I/O.
//! Validation always runs before the engine sees anything.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{AudioCodec, ExtractionJob, FrameScale, Interval, SamplingRate, Span};

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    /// Explicit `[start, end)` interval, if any.
    pub interval: Option<Interval>,

    /// Sample frames over the whole source regardless of `interval`.
    ///
    /// Independent of the interval toggle: a whole-video frame pass can be
    /// combined with an interval-bounded clip or audio extraction.
    pub whole_video: bool,

    /// Frame sampling rate.
    pub rate: SamplingRate,

    /// Frame output scale. `None` falls back to the configured scale.
    #[serde(default)]
    pub scale: Option<FrameScale>,

    /// Audio codecs to extract, one job per codec. Empty for none.
    #[serde(default)]
    pub audio_codecs: Vec<AudioCodec>,

    /// Cut a sub-clip covering the explicit interval.
    #[serde(default)]
    pub cut_clip: bool,

    /// Re-encode the clip for frame-exact boundaries.
    #[serde(default)]
    pub exact_cut: bool,
}

impl ExtractionRequest {
    /// A frames-only request over an explicit interval.
    pub fn frames(interval: Interval, rate: SamplingRate) -> Self {
        Self {
            interval: Some(interval),
            whole_video: false,
            rate,
            scale: None,
            audio_codecs: Vec::new(),
            cut_clip: false,
            exact_cut: false,
        }
    }

    /// A frames-only request over the whole source.
    pub fn whole_video(rate: SamplingRate) -> Self {
        Self {
            interval: None,
            whole_video: true,
            rate,
            scale: None,
            audio_codecs: Vec::new(),
            cut_clip: false,
            exact_cut: false,
        }
    }
}

/// Rejected request. Cheap to produce, always raised before any tool runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("interval bounds must be finite numbers (got {start}s to {end}s)")]
    NonFiniteInterval { start: f64, end: f64 },

    #[error("interval start ({start}s) must be before end ({end}s)")]
    InvertedInterval { start: f64, end: f64 },

    #[error("interval start must not be negative (got {start}s)")]
    NegativeStart { start: f64 },

    #[error("interval end ({end}s) is past the source duration ({duration}s)")]
    IntervalOutOfBounds { end: f64, duration: f64 },

    #[error("sampling rate must be positive (got {rate})")]
    NonPositiveRate { rate: f64 },

    #[error("an explicit interval is required unless whole_video is set")]
    MissingInterval,
}

/// Validate a request and build the job list.
///
/// `media_duration` is the probed source duration, when known. With an
/// unknown duration the end bound is not checked here; range clamping is
/// deferred to the transcoder and its failure surfaced per job.
pub fn plan(
    request: &ExtractionRequest,
    media_duration: Option<f64>,
) -> Result<Vec<ExtractionJob>, ValidationError> {
    if let Some(interval) = request.interval {
        validate_interval(&interval, media_duration)?;
    }

    if !(request.rate.fps() > 0.0) {
        return Err(ValidationError::NonPositiveRate {
            rate: request.rate.fps(),
        });
    }

    let frame_span = if request.whole_video {
        Span::Whole
    } else {
        let interval = request.interval.ok_or(ValidationError::MissingInterval)?;
        Span::Interval(interval)
    };

    // Audio follows the explicit interval when one is given, even for a
    // whole-video frame pass; the toggles are independent.
    let audio_span = match request.interval {
        Some(interval) => Span::Interval(interval),
        None => Span::Whole,
    };

    let mut jobs = vec![ExtractionJob::FrameSample {
        span: frame_span,
        rate: request.rate,
        scale: request.scale.unwrap_or_default(),
    }];

    for codec in &request.audio_codecs {
        jobs.push(ExtractionJob::AudioExtract {
            span: audio_span,
            codec: *codec,
        });
    }

    if request.cut_clip {
        let interval = request.interval.ok_or(ValidationError::MissingInterval)?;
        jobs.push(ExtractionJob::ClipCut {
            interval,
            exact: request.exact_cut,
        });
    }

    Ok(jobs)
}

fn validate_interval(
    interval: &Interval,
    media_duration: Option<f64>,
) -> Result<(), ValidationError> {
    // NaN slips past every ordered comparison below, so finiteness comes
    // first.
    if !interval.start.is_finite() || !interval.end.is_finite() {
        return Err(ValidationError::NonFiniteInterval {
            start: interval.start,
            end: interval.end,
        });
    }

    if interval.start < 0.0 {
        return Err(ValidationError::NegativeStart {
            start: interval.start,
        });
    }

    if interval.start >= interval.end {
        return Err(ValidationError::InvertedInterval {
            start: interval.start,
            end: interval.end,
        });
    }

    if let Some(duration) = media_duration {
        if interval.end > duration {
            return Err(ValidationError::IntervalOutOfBounds {
                end: interval.end,
                duration,
            });
        }
    }

    Ok(())
}
