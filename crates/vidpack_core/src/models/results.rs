//! Artifacts, archives and the final deliverable.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// What kind of thing an artifact is on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// A single output file.
    File,
    /// A flat directory of sequentially numbered frames.
    FrameDirectory { frame_count: usize },
}

/// One artifact produced by a successful extraction job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Path to the file or directory inside the workspace.
    pub path: PathBuf,
    pub kind: ArtifactKind,
}

impl Artifact {
    /// A single-file artifact.
    pub fn file(path: PathBuf) -> Self {
        Self {
            path,
            kind: ArtifactKind::File,
        }
    }

    /// A frame-directory artifact.
    pub fn frame_directory(path: PathBuf, frame_count: usize) -> Self {
        Self {
            path,
            kind: ArtifactKind::FrameDirectory { frame_count },
        }
    }
}

/// Mapping from logical name to artifact, built incrementally by the engine
/// and read-only once handed to the archiver.
///
/// Backed by a `BTreeMap` so iteration order is the sorted logical-name
/// order the archiver relies on for deterministic output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactSet {
    entries: BTreeMap<String, Artifact>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an artifact under its logical name.
    pub fn insert(&mut self, logical_name: impl Into<String>, artifact: Artifact) {
        self.entries.insert(logical_name.into(), artifact);
    }

    pub fn get(&self, logical_name: &str) -> Option<&Artifact> {
        self.entries.get(logical_name)
    }

    /// Iterate artifacts in sorted logical-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Artifact)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One entry written into the zip archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    /// Flat entry name inside the archive.
    pub name: String,
    /// Logical name of the artifact this entry came from.
    pub logical_name: String,
    /// Uncompressed size in bytes.
    pub size_bytes: u64,
}

/// A finished zip archive plus the metadata recorded while writing it.
///
/// Entry metadata is captured at archive time so downstream aggregation
/// needs no further filesystem access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archive {
    /// Path to the zip file.
    pub path: PathBuf,
    /// Entries in the order they were written.
    pub entries: Vec<ArchiveEntry>,
}

impl Archive {
    /// Total uncompressed payload size.
    pub fn total_size_bytes(&self) -> u64 {
        self.entries.iter().map(|e| e.size_bytes).sum()
    }
}

/// Per-artifact summary in the deliverable manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Logical artifact name (e.g. `frames_25fps_full`, `audio_mp3_full`).
    pub logical_name: String,
    /// Original path inside the workspace.
    pub source_path: PathBuf,
    /// Number of archive entries for this artifact (1 for files).
    pub entry_count: usize,
    /// Total uncompressed bytes for this artifact.
    pub size_bytes: u64,
}

/// The final user-facing handoff: one downloadable archive and its manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deliverable {
    /// Path to the single downloadable zip.
    pub archive_path: PathBuf,
    /// One entry per logical artifact, in archive order.
    pub manifest: Vec<ManifestEntry>,
    /// When the deliverable was assembled (RFC 3339).
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_set_iterates_sorted() {
        let mut set = ArtifactSet::new();
        set.insert("video_clip", Artifact::file(PathBuf::from("/w/clip.mp4")));
        set.insert("audio_mp3_full", Artifact::file(PathBuf::from("/w/a.mp3")));
        set.insert(
            "frames_25fps",
            Artifact::frame_directory(PathBuf::from("/w/frames"), 250),
        );

        let names: Vec<&str> = set.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["audio_mp3_full", "frames_25fps", "video_clip"]);
    }

    #[test]
    fn archive_totals_entry_sizes() {
        let archive = Archive {
            path: PathBuf::from("/out/a.zip"),
            entries: vec![
                ArchiveEntry {
                    name: "a.mp3".into(),
                    logical_name: "audio_mp3_full".into(),
                    size_bytes: 100,
                },
                ArchiveEntry {
                    name: "frame_0001.jpg".into(),
                    logical_name: "frames_25fps".into(),
                    size_bytes: 50,
                },
            ],
        };
        assert_eq!(archive.total_size_bytes(), 150);
    }
}
