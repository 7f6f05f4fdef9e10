//! Final deliverable assembly.
//!
//! Pure aggregation of the engine's artifact set and the finished archive
//! into a [`Deliverable`]. All sizes come from metadata the archiver
//! recorded while writing, so no further I/O happens here.

use crate::models::{Archive, ArtifactSet, Deliverable, ManifestEntry};

/// Build the deliverable: archive path plus a per-artifact manifest.
pub fn assemble(artifacts: &ArtifactSet, archive: Archive) -> Deliverable {
    let mut manifest = Vec::new();

    for (logical_name, artifact) in artifacts.iter() {
        let (entry_count, size_bytes) = archive
            .entries
            .iter()
            .filter(|e| e.logical_name == *logical_name)
            .fold((0usize, 0u64), |(count, size), e| {
                (count + 1, size + e.size_bytes)
            });

        manifest.push(ManifestEntry {
            logical_name: logical_name.clone(),
            source_path: artifact.path.clone(),
            entry_count,
            size_bytes,
        });
    }

    Deliverable {
        archive_path: archive.path,
        manifest,
        created_at: chrono::Local::now().to_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Archive, ArchiveEntry, Artifact};
    use std::path::PathBuf;

    #[test]
    fn manifest_aggregates_per_logical_name() {
        let mut artifacts = ArtifactSet::new();
        artifacts.insert(
            "frames_25fps",
            Artifact::frame_directory(PathBuf::from("/w/frames"), 2),
        );
        artifacts.insert("audio_mp3_full", Artifact::file(PathBuf::from("/w/a.mp3")));

        let archive = Archive {
            path: PathBuf::from("/out/demo.zip"),
            entries: vec![
                ArchiveEntry {
                    name: "a.mp3".into(),
                    logical_name: "audio_mp3_full".into(),
                    size_bytes: 1000,
                },
                ArchiveEntry {
                    name: "frame_0001.jpg".into(),
                    logical_name: "frames_25fps".into(),
                    size_bytes: 10,
                },
                ArchiveEntry {
                    name: "frame_0002.jpg".into(),
                    logical_name: "frames_25fps".into(),
                    size_bytes: 12,
                },
            ],
        };

        let deliverable = assemble(&artifacts, archive);

        assert_eq!(deliverable.archive_path, PathBuf::from("/out/demo.zip"));
        assert_eq!(deliverable.manifest.len(), 2);

        let audio = &deliverable.manifest[0];
        assert_eq!(audio.logical_name, "audio_mp3_full");
        assert_eq!(audio.entry_count, 1);
        assert_eq!(audio.size_bytes, 1000);

        let frames = &deliverable.manifest[1];
        assert_eq!(frames.logical_name, "frames_25fps");
        assert_eq!(frames.entry_count, 2);
        assert_eq!(frames.size_bytes, 22);
        assert!(!deliverable.created_at.is_empty());
    }
}
