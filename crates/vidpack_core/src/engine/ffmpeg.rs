//! Typed ffmpeg argument builders.
//!
//! One constructor per job variant. Arguments are produced as a list, never
//! a shell string, so titles and URLs cannot inject options. The trim is
//! applied as input options (`-ss`/`-t` before `-i`), matching the reference
//! behavior of seeking before decode.

use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

use crate::models::{AudioCodec, FrameScale, Interval, SamplingRate, Span};
use crate::tools::{arg, path_arg, ToolRequest};

/// A fully-built ffmpeg invocation.
#[derive(Debug, Clone)]
pub struct FfmpegInvocation {
    args: Vec<OsString>,
}

impl FfmpegInvocation {
    /// Frame sampling: `fps=<rate>,scale=<w>:<h>` filter chain into a
    /// numbered JPEG pattern (`frame_%04d.jpg`, numbering from 0001).
    pub fn frame_sample(
        input: &Path,
        span: Span,
        rate: SamplingRate,
        scale: FrameScale,
        jpeg_quality: u32,
        output_pattern: &Path,
    ) -> Self {
        let mut args = base_args();
        push_trim(&mut args, span.interval());
        push_input(&mut args, input);

        args.push(arg("-vf"));
        args.push(arg(format!(
            "fps={},scale={}:{}",
            rate,
            scale.width,
            scale.height
        )));
        args.push(arg("-qscale:v"));
        args.push(arg(jpeg_quality.to_string()));
        args.push(path_arg(output_pattern));

        Self { args }
    }

    /// Audio extraction: drop video, encode with the codec's encoder.
    pub fn audio_extract(input: &Path, span: Span, codec: AudioCodec, output: &Path) -> Self {
        let mut args = base_args();
        push_trim(&mut args, span.interval());
        push_input(&mut args, input);

        args.push(arg("-vn"));
        args.push(arg("-codec:a"));
        args.push(arg(codec.encoder()));
        args.push(path_arg(output));

        Self { args }
    }

    /// Sub-clip cut over `[start, end)`.
    ///
    /// `exact: false` stream-copies (fast, keyframe-snapped boundaries);
    /// `exact: true` re-encodes for frame-accurate cuts.
    pub fn clip_cut(input: &Path, interval: Interval, exact: bool, output: &Path) -> Self {
        let mut args = base_args();
        push_trim(&mut args, Some(interval));
        push_input(&mut args, input);

        if exact {
            args.push(arg("-codec:v"));
            args.push(arg("libx264"));
            args.push(arg("-codec:a"));
            args.push(arg("aac"));
        } else {
            args.push(arg("-codec"));
            args.push(arg("copy"));
        }
        args.push(path_arg(output));

        Self { args }
    }

    /// Turn the invocation into a runnable request for the given binary.
    pub fn into_request(self, ffmpeg: &str, timeout: Option<Duration>) -> ToolRequest {
        ToolRequest::new(ffmpeg, self.args).with_timeout(timeout)
    }

    #[cfg(test)]
    fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

fn base_args() -> Vec<OsString> {
    vec![arg("-hide_banner"), arg("-nostdin"), arg("-y")]
}

fn push_trim(args: &mut Vec<OsString>, interval: Option<Interval>) {
    if let Some(iv) = interval {
        args.push(arg("-ss"));
        args.push(arg(format!("{}", iv.start)));
        args.push(arg("-t"));
        args.push(arg(format!("{}", iv.duration())));
    }
}

fn push_input(args: &mut Vec<OsString>, input: &Path) {
    args.push(arg("-i"));
    args.push(path_arg(input));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn frame_sample_args_with_interval() {
        let invocation = FfmpegInvocation::frame_sample(
            &PathBuf::from("/w/v.mp4"),
            Span::Interval(Interval::new(5.0, 15.0)),
            SamplingRate::new(25.0),
            FrameScale::default(),
            1,
            &PathBuf::from("/w/frames/frame_%04d.jpg"),
        );

        assert_eq!(
            invocation.args_lossy(),
            vec![
                "-hide_banner",
                "-nostdin",
                "-y",
                "-ss",
                "5",
                "-t",
                "10",
                "-i",
                "/w/v.mp4",
                "-vf",
                "fps=25,scale=1920:1080",
                "-qscale:v",
                "1",
                "/w/frames/frame_%04d.jpg",
            ]
        );
    }

    #[test]
    fn frame_sample_whole_video_has_no_trim() {
        let invocation = FfmpegInvocation::frame_sample(
            &PathBuf::from("/w/v.mp4"),
            Span::Whole,
            SamplingRate::new(1.0),
            FrameScale::new(640, 360),
            2,
            &PathBuf::from("/w/frames/frame_%04d.jpg"),
        );

        let args = invocation.args_lossy();
        assert!(!args.contains(&"-ss".to_string()));
        assert!(args.contains(&"fps=1,scale=640:360".to_string()));
    }

    #[test]
    fn audio_extract_selects_encoder() {
        let mp3 = FfmpegInvocation::audio_extract(
            &PathBuf::from("/w/v.mp4"),
            Span::Whole,
            AudioCodec::Mp3,
            &PathBuf::from("/w/a.mp3"),
        );
        assert!(mp3.args_lossy().contains(&"libmp3lame".to_string()));

        let wav = FfmpegInvocation::audio_extract(
            &PathBuf::from("/w/v.mp4"),
            Span::Interval(Interval::new(0.0, 3.0)),
            AudioCodec::Wav,
            &PathBuf::from("/w/a.wav"),
        );
        let args = wav.args_lossy();
        assert!(args.contains(&"pcm_s16le".to_string()));
        assert!(args.contains(&"-vn".to_string()));
        assert!(args.contains(&"-ss".to_string()));
    }

    #[test]
    fn clip_cut_stream_copies_by_default() {
        let copy = FfmpegInvocation::clip_cut(
            &PathBuf::from("/w/v.mp4"),
            Interval::new(10.0, 20.0),
            false,
            &PathBuf::from("/w/clip.mp4"),
        );
        let args = copy.args_lossy();
        assert!(args.contains(&"copy".to_string()));
        assert!(!args.contains(&"libx264".to_string()));
    }

    #[test]
    fn exact_clip_cut_reencodes() {
        let exact = FfmpegInvocation::clip_cut(
            &PathBuf::from("/w/v.mp4"),
            Interval::new(10.0, 20.0),
            true,
            &PathBuf::from("/w/clip.mp4"),
        );
        let args = exact.args_lossy();
        assert!(args.contains(&"libx264".to_string()));
        assert!(!args.contains(&"copy".to_string()));
    }
}
