//! Data model shared across the pipeline.
//!
//! Everything here is plain data: validation lives in [`crate::plan`] and
//! execution in [`crate::engine`].

mod jobs;
mod media;
mod results;

pub use jobs::{ExtractionJob, Span};
pub use media::{sanitize_title, AudioCodec, FrameScale, Interval, SamplingRate, SourceMedia};
pub use results::{
    Archive, ArchiveEntry, Artifact, ArtifactKind, ArtifactSet, Deliverable, ManifestEntry,
};
