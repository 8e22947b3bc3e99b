//! Per-run scratch space with an explicit artifact registry.

use crate::{Error, Result};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Lifecycle class of an intermediate file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArtifactKind {
    /// Whole-file or clipped chapter metadata.
    Metadata,
    /// One trimmed segment of an episode.
    Segment,
    /// A processed episode awaiting the part merge.
    Episode,
    /// Concat list, part-level chapters, raw concatenation.
    Part,
    /// Extracted subtitle tracks.
    Subtitle,
}

/// Scratch directory for one processing run.
///
/// Intermediates live in a hidden temp directory inside the output folder so
/// renames into the final location stay on one filesystem. Every file handed
/// out is recorded; [`Workspace::discard`] removes them by kind at the points
/// the pipeline no longer needs them, and dropping the workspace removes the
/// directory with whatever is left.
///
/// # Example
///
/// ```no_run
/// use chaptercut_av::{ArtifactKind, Workspace};
///
/// let workspace = Workspace::new("/path/to/output")?;
/// let seg = workspace.file(ArtifactKind::Segment, "ep01_seg_0.mkv");
/// // ... produce the segment, concatenate it ...
/// workspace.discard(ArtifactKind::Segment);
/// # Ok::<(), chaptercut_av::Error>(())
/// ```
pub struct Workspace {
    temp_dir: TempDir,
    output_dir: PathBuf,
    registry: Mutex<BTreeMap<PathBuf, ArtifactKind>>,
}

impl Workspace {
    /// Create the workspace inside `output_dir`, creating that folder if
    /// needed.
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Result<Self> {
        let output_dir = output_dir.as_ref();
        std::fs::create_dir_all(output_dir).map_err(|e| {
            Error::Workspace(format!(
                "Failed to create output folder {}: {}",
                output_dir.display(),
                e
            ))
        })?;

        let temp_dir = tempfile::Builder::new()
            .prefix(".chaptercut-")
            .tempdir_in(output_dir)
            .map_err(|e| Error::Workspace(e.to_string()))?;

        Ok(Self {
            temp_dir,
            output_dir: output_dir.to_path_buf(),
            registry: Mutex::new(BTreeMap::new()),
        })
    }

    /// Get the temp directory path.
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the output folder.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of a final output file.
    pub fn output_file(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    /// Register and return the path of a new intermediate file.
    pub fn file(&self, kind: ArtifactKind, name: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        self.registry.lock().insert(path.clone(), kind);
        path
    }

    /// Register a path created elsewhere (for example by a fallback rename).
    pub fn adopt(&self, kind: ArtifactKind, path: &Path) {
        self.registry.lock().insert(path.to_path_buf(), kind);
    }

    /// Forget a path without deleting it (it became a final output).
    pub fn release(&self, path: &Path) {
        self.registry.lock().remove(path);
    }

    /// Number of registered artifacts of a kind.
    pub fn count(&self, kind: ArtifactKind) -> usize {
        self.registry.lock().values().filter(|k| **k == kind).count()
    }

    /// Delete one registered artifact.
    pub fn remove(&self, path: &Path) {
        if self.registry.lock().remove(path).is_some() {
            remove_quietly(path);
        }
    }

    /// Delete every artifact of the given kind, returning how many were
    /// registered.
    pub fn discard(&self, kind: ArtifactKind) -> usize {
        let doomed: Vec<PathBuf> = {
            let mut registry = self.registry.lock();
            let doomed: Vec<PathBuf> = registry
                .iter()
                .filter(|(_, k)| **k == kind)
                .map(|(p, _)| p.clone())
                .collect();
            for path in &doomed {
                registry.remove(path);
            }
            doomed
        };

        for path in &doomed {
            remove_quietly(path);
        }
        tracing::debug!("Discarded {} {:?} artifacts", doomed.len(), kind);
        doomed.len()
    }

    /// Delete every remaining artifact and the temp directory.
    pub fn finish(self) -> Result<()> {
        let remaining = std::mem::take(&mut *self.registry.lock());
        for path in remaining.keys() {
            remove_quietly(path);
        }
        self.temp_dir
            .close()
            .map_err(|e| Error::Workspace(format!("Failed to remove temp dir: {}", e)))
    }
}

fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_dir_is_hidden_inside_output() {
        let out = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(out.path()).unwrap();

        assert!(workspace.temp_dir().starts_with(out.path()));
        let name = workspace.temp_dir().file_name().unwrap().to_string_lossy();
        assert!(name.starts_with(".chaptercut-"));
    }

    #[test]
    fn test_creates_missing_output_folder() {
        let out = tempfile::tempdir().unwrap();
        let nested = out.path().join("a/b");
        let workspace = Workspace::new(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(workspace.output_file("Part1.mkv"), nested.join("Part1.mkv"));
    }

    #[test]
    fn test_discard_by_kind() {
        let out = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(out.path()).unwrap();

        let seg = workspace.file(ArtifactKind::Segment, "s.mkv");
        let ep = workspace.file(ArtifactKind::Episode, "e.mkv");
        std::fs::write(&seg, "x").unwrap();
        std::fs::write(&ep, "x").unwrap();

        assert_eq!(workspace.discard(ArtifactKind::Segment), 1);
        assert!(!seg.exists());
        assert!(ep.exists());
        assert_eq!(workspace.count(ArtifactKind::Episode), 1);
    }

    #[test]
    fn test_released_file_survives_discard() {
        let out = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(out.path()).unwrap();

        let kept = workspace.file(ArtifactKind::Part, "p.mkv");
        std::fs::write(&kept, "x").unwrap();
        workspace.release(&kept);

        assert_eq!(workspace.discard(ArtifactKind::Part), 0);
        assert!(kept.exists());
    }

    #[test]
    fn test_finish_removes_temp_dir() {
        let out = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(out.path()).unwrap();
        let dir = workspace.temp_dir().to_path_buf();
        std::fs::write(workspace.file(ArtifactKind::Metadata, "m.txt"), "x").unwrap();

        workspace.finish().unwrap();
        assert!(!dir.exists());
    }
}
