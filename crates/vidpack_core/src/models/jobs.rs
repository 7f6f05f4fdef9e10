//! Extraction job descriptions.
//!
//! A job is a closed-set description of one external transcoder invocation.
//! Jobs are independently addressable, independently failable, and share no
//! mutable state: they all read the same immutable [`SourceMedia`] and write
//! to distinct output paths. Logical names are namespaced by rate, codec and
//! interval tag upfront so that archive entries can never collide.
//!
//! [`SourceMedia`]: super::SourceMedia

use serde::{Deserialize, Serialize};

use super::media::{AudioCodec, FrameScale, Interval, SamplingRate};

/// The portion of the source a job operates on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Span {
    /// The full source, no trim.
    Whole,
    /// An explicit `[start, end)` interval.
    Interval(Interval),
}

impl Span {
    /// Tag for logical names: `full` or the interval tag.
    pub fn tag(&self) -> String {
        match self {
            Span::Whole => "full".to_string(),
            Span::Interval(iv) => iv.tag(),
        }
    }

    /// The explicit interval, if any.
    pub fn interval(&self) -> Option<Interval> {
        match self {
            Span::Whole => None,
            Span::Interval(iv) => Some(*iv),
        }
    }
}

/// One extraction job against the source media.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionJob {
    /// Sample still frames at `rate` into a dedicated directory.
    ///
    /// Output files are zero-padded, sequentially numbered from `0001`
    /// with no gaps.
    FrameSample {
        span: Span,
        rate: SamplingRate,
        scale: FrameScale,
    },

    /// Transcode the audio track to a single file.
    AudioExtract { span: Span, codec: AudioCodec },

    /// Cut a sub-clip covering exactly `[start, end)`.
    ///
    /// With `exact: false` the clip is stream-copied: fast, but cut
    /// boundaries snap to the nearest preceding keyframe. `exact: true`
    /// re-encodes for frame-accurate boundaries.
    ClipCut { interval: Interval, exact: bool },
}

impl ExtractionJob {
    /// Stable logical name for this job's artifact.
    ///
    /// Names embed rate, codec, and span tag, which makes them (and the
    /// archive entries derived from them) collision-free by construction.
    pub fn label(&self) -> String {
        match self {
            ExtractionJob::FrameSample { span, rate, .. } => {
                format!("frames_{}fps_{}", rate.tag(), span.tag())
            }
            ExtractionJob::AudioExtract { span, codec } => {
                format!("audio_{}_{}", codec.extension(), span.tag())
            }
            ExtractionJob::ClipCut { interval, .. } => format!("clip_{}", interval.tag()),
        }
    }

    /// Short kind name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractionJob::FrameSample { .. } => "frame_sample",
            ExtractionJob::AudioExtract { .. } => "audio_extract",
            ExtractionJob::ClipCut { .. } => "clip_cut",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_namespaced() {
        let frames = ExtractionJob::FrameSample {
            span: Span::Whole,
            rate: SamplingRate::new(25.0),
            scale: FrameScale::default(),
        };
        assert_eq!(frames.label(), "frames_25fps_full");

        let audio = ExtractionJob::AudioExtract {
            span: Span::Interval(Interval::new(10.0, 20.0)),
            codec: AudioCodec::Mp3,
        };
        assert_eq!(audio.label(), "audio_mp3_10-20");

        let clip = ExtractionJob::ClipCut {
            interval: Interval::new(0.0, 5.0),
            exact: false,
        };
        assert_eq!(clip.label(), "clip_0-5");
    }

    #[test]
    fn labels_distinct_across_rates_and_codecs() {
        let a = ExtractionJob::FrameSample {
            span: Span::Whole,
            rate: SamplingRate::new(1.0),
            scale: FrameScale::default(),
        };
        let b = ExtractionJob::FrameSample {
            span: Span::Whole,
            rate: SamplingRate::new(25.0),
            scale: FrameScale::default(),
        };
        assert_ne!(a.label(), b.label());

        // Same rate, different span: still no collision.
        let c = ExtractionJob::FrameSample {
            span: Span::Interval(Interval::new(0.0, 5.0)),
            rate: SamplingRate::new(1.0),
            scale: FrameScale::default(),
        };
        assert_ne!(a.label(), c.label());

        let mp3 = ExtractionJob::AudioExtract {
            span: Span::Whole,
            codec: AudioCodec::Mp3,
        };
        let wav = ExtractionJob::AudioExtract {
            span: Span::Whole,
            codec: AudioCodec::Wav,
        };
        assert_ne!(mp3.label(), wav.label());
    }

    #[test]
    fn job_serializes_with_kind_tag() {
        let job = ExtractionJob::ClipCut {
            interval: Interval::new(1.0, 2.0),
            exact: true,
        };
        let json = serde_json::to_string(&job).unwrap();
        assert!(json.contains("\"kind\":\"clip_cut\""));
        assert!(json.contains("\"exact\":true"));
    }
}
