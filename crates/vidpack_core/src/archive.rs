//! Deterministic zip archiving of an artifact set.
//!
//! Entries are written in sorted order (artifacts by logical name, files
//! within a frame directory by name) with a fixed modification timestamp,
//! so archiving the same artifact set twice produces byte-identical output.
//! Entry names are flat: a directory artifact contributes its contained
//! files by name, a file artifact contributes its base name. Collisions are
//! prevented upfront by the job naming scheme, not checked here.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::models::{Archive, ArchiveEntry, Artifact, ArtifactKind, ArtifactSet};

/// Archiving failure. Always fatal to the deliverable: a partial zip is
/// never exposed.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// An artifact path recorded by the engine no longer exists. This is
    /// surfaced rather than skipped, since it means an earlier reported
    /// success was wrong.
    #[error("artifact path missing at archive time: {path}")]
    SourceMissing { path: PathBuf },

    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl ArchiveError {
    fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// Write all artifacts into a single zip at `output_path`.
///
/// The zip is built at a sibling temp path and renamed into place only once
/// every entry was written, so a failed run leaves nothing at `output_path`.
pub fn archive(artifacts: &ArtifactSet, output_path: &Path) -> Result<Archive, ArchiveError> {
    let temp_path = output_path.with_extension("zip.tmp");

    let entries = match write_entries(artifacts, &temp_path) {
        Ok(entries) => entries,
        Err(e) => {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e);
        }
    };

    if let Err(e) = std::fs::rename(&temp_path, output_path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(ArchiveError::io(
            format!("rename to {}", output_path.display()),
            e,
        ));
    }

    tracing::info!(
        "Archived {} entries to {}",
        entries.len(),
        output_path.display()
    );

    Ok(Archive {
        path: output_path.to_path_buf(),
        entries,
    })
}

fn write_entries(
    artifacts: &ArtifactSet,
    path: &Path,
) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    let file = File::create(path)
        .map_err(|e| ArchiveError::io(format!("create {}", path.display()), e))?;
    let mut writer = ZipWriter::new(file);

    // Fixed timestamp (the zip epoch) keeps repeated runs byte-identical.
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    let mut entries = Vec::new();

    // ArtifactSet iterates in sorted logical-name order.
    for (logical_name, artifact) in artifacts.iter() {
        match &artifact.kind {
            ArtifactKind::File => {
                let entry = add_file(&mut writer, logical_name, &artifact.path, options)?;
                entries.push(entry);
            }
            ArtifactKind::FrameDirectory { .. } => {
                add_directory(&mut writer, logical_name, artifact, options, &mut entries)?;
            }
        }
    }

    writer.finish()?;
    Ok(entries)
}

fn add_file<W: Write + io::Seek>(
    writer: &mut ZipWriter<W>,
    logical_name: &str,
    path: &Path,
    options: SimpleFileOptions,
) -> Result<ArchiveEntry, ArchiveError> {
    if !path.is_file() {
        return Err(ArchiveError::SourceMissing {
            path: path.to_path_buf(),
        });
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| logical_name.to_string());

    writer.start_file(name.clone(), options)?;
    let mut source = File::open(path)
        .map_err(|e| ArchiveError::io(format!("open {}", path.display()), e))?;
    let size_bytes = io::copy(&mut source, writer)
        .map_err(|e| ArchiveError::io(format!("archive {}", path.display()), e))?;

    Ok(ArchiveEntry {
        name,
        logical_name: logical_name.to_string(),
        size_bytes,
    })
}

/// Add every file in a frame directory, flattened to its base name, in
/// sorted name order.
fn add_directory<W: Write + io::Seek>(
    writer: &mut ZipWriter<W>,
    logical_name: &str,
    artifact: &Artifact,
    options: SimpleFileOptions,
    entries: &mut Vec<ArchiveEntry>,
) -> Result<(), ArchiveError> {
    let dir = &artifact.path;
    if !dir.is_dir() {
        return Err(ArchiveError::SourceMissing {
            path: dir.clone(),
        });
    }

    let mut files: Vec<PathBuf> = Vec::new();
    let read = std::fs::read_dir(dir)
        .map_err(|e| ArchiveError::io(format!("read {}", dir.display()), e))?;
    for entry in read {
        let entry = entry.map_err(|e| ArchiveError::io(format!("read {}", dir.display()), e))?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    for path in files {
        let entry = add_file(writer, logical_name, &path, options)?;
        entries.push(entry);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn archives_files_by_base_name() {
        let dir = TempDir::new().unwrap();
        let mut set = ArtifactSet::new();
        set.insert(
            "audio_mp3_full",
            Artifact::file(make_file(dir.path(), "demo_full.mp3", b"mp3 bytes")),
        );
        set.insert(
            "clip_0-5",
            Artifact::file(make_file(dir.path(), "demo_clip_0-5.mp4", b"clip bytes")),
        );

        let out = dir.path().join("out.zip");
        let archive = archive(&set, &out).unwrap();

        let names: Vec<&str> = archive.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["demo_full.mp3", "demo_clip_0-5.mp4"]);
        assert_eq!(archive.entries[0].size_bytes, 9);
    }

    #[test]
    fn flattens_frame_directory_sorted() {
        let dir = TempDir::new().unwrap();
        let frames = dir.path().join("frames_1fps_demo");
        std::fs::create_dir(&frames).unwrap();
        // Created out of order; must come out sorted.
        make_file(&frames, "frame_0003.jpg", b"c");
        make_file(&frames, "frame_0001.jpg", b"a");
        make_file(&frames, "frame_0002.jpg", b"b");

        let mut set = ArtifactSet::new();
        set.insert("frames_1fps", Artifact::frame_directory(frames, 3));

        let out = dir.path().join("out.zip");
        let archive = archive(&set, &out).unwrap();

        let names: Vec<&str> = archive.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["frame_0001.jpg", "frame_0002.jpg", "frame_0003.jpg"]
        );
    }

    #[test]
    fn missing_source_is_an_error_not_a_skip() {
        let dir = TempDir::new().unwrap();
        let mut set = ArtifactSet::new();
        set.insert(
            "audio_mp3_full",
            Artifact::file(dir.path().join("vanished.mp3")),
        );

        let out = dir.path().join("out.zip");
        let err = archive(&set, &out).unwrap_err();
        assert!(matches!(err, ArchiveError::SourceMissing { .. }));
    }

    #[test]
    fn failed_archive_leaves_no_output() {
        let dir = TempDir::new().unwrap();
        let mut set = ArtifactSet::new();
        // One good artifact, then one whose path vanished: the good entry
        // is already written when the failure hits.
        set.insert(
            "audio_mp3_full",
            Artifact::file(make_file(dir.path(), "demo_full.mp3", b"mp3 bytes")),
        );
        set.insert(
            "clip_0-5",
            Artifact::file(dir.path().join("vanished.mp4")),
        );

        let out = dir.path().join("demo_assets.zip");
        let err = archive(&set, &out).unwrap_err();
        assert!(matches!(err, ArchiveError::SourceMissing { .. }));

        // Neither a partial zip nor the temp file may survive.
        assert!(!out.exists());
        assert!(!out.with_extension("zip.tmp").exists());
    }
}
