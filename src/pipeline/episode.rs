//! Per-episode work: probe, plan, trim with chapters, join segments.

use anyhow::{Context, Result};
use chaptercut_av::{ArtifactKind, MediaTool, Workspace};
use chaptercut_media::{clip, combine_files, compute_keep_segments, MetaFile, Segment, SkipRange};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A processed episode ready for the part merge.
#[derive(Debug, Clone)]
pub struct EpisodeOutput {
    /// Position in the input listing.
    pub index: usize,
    pub source: PathBuf,
    pub file: PathBuf,
    /// Chapters on the episode's own timeline, if any could be produced.
    pub metadata: Option<PathBuf>,
    /// Seconds.
    pub duration: f64,
}

struct TrimmedSegment {
    file: PathBuf,
    metadata: Option<PathBuf>,
    duration: f64,
}

/// Process one episode into a single trimmed file.
///
/// A failing segment only drops that segment. The episode fails when its
/// chapters cannot be probed, when no segment survives, or when the
/// segments cannot be joined.
pub async fn process_episode(
    tool: &dyn MediaTool,
    workspace: &Workspace,
    index: usize,
    source: &Path,
    skips: &[SkipRange],
    merge_segment_chapters: bool,
) -> Result<EpisodeOutput> {
    let label = format!("[{:02}]", index + 1);
    info!("{} Starting {:?}", label, source);

    let chapters = tool
        .probe_chapters(source)
        .await
        .context("chapter scan failed")?;
    let segments = compute_keep_segments(&chapters, skips);
    debug!("{} Keeping {} segment(s): {:?}", label, segments.len(), segments);

    let stem = format!("{:03}_{}", index + 1, file_stem(source));
    let original = extract_metadata(tool, workspace, source, &stem, &label).await;

    let mut trimmed = Vec::with_capacity(segments.len());
    for (i, segment) in segments.iter().enumerate() {
        if segment.is_empty() {
            continue;
        }
        match trim_segment(tool, workspace, source, &stem, i, *segment, original.as_ref()).await {
            Ok(seg) => trimmed.push(seg),
            Err(e) => warn!(
                "{} Segment {} ({:.3}-{:.3}) of {:?} failed: {:#}",
                label, i, segment.start, segment.end, source, e
            ),
        }
    }

    if trimmed.is_empty() {
        anyhow::bail!("no segments survived trimming");
    }

    let duration: f64 = trimmed.iter().map(|s| s.duration).sum();

    if trimmed.len() == 1 {
        let seg = trimmed.remove(0);
        workspace.adopt(ArtifactKind::Episode, &seg.file);
        info!("{} Trimmed to a single segment", label);
        return Ok(EpisodeOutput {
            index,
            source: source.to_path_buf(),
            file: seg.file,
            metadata: seg.metadata,
            duration,
        });
    }

    let files: Vec<PathBuf> = trimmed.iter().map(|s| s.file.clone()).collect();
    let list = workspace.file(ArtifactKind::Segment, &format!("{}_segments.txt", stem));
    let episode = workspace.file(ArtifactKind::Episode, &format!("{}_episode.mkv", stem));

    tool.concat_segments(&files, &list, &episode)
        .await
        .context("joining segments failed")?;

    let metadata = if merge_segment_chapters {
        let metas: Vec<Option<PathBuf>> = trimmed.iter().map(|s| s.metadata.clone()).collect();
        let durations: Vec<f64> = trimmed.iter().map(|s| s.duration).collect();
        let combined = combine_files(&metas, &durations);
        let path = workspace.file(ArtifactKind::Metadata, &format!("{}_episode_meta.txt", stem));
        match combined.write(&path) {
            Ok(()) => Some(path),
            Err(e) => {
                warn!("{} Failed to write episode chapters: {}", label, e);
                None
            }
        }
    } else {
        trimmed.first().and_then(|s| s.metadata.clone())
    };

    for path in files.iter().chain(std::iter::once(&list)) {
        workspace.remove(path);
    }

    info!("{} Joined {} segments", label, trimmed.len());
    Ok(EpisodeOutput {
        index,
        source: source.to_path_buf(),
        file: episode,
        metadata,
        duration,
    })
}

async fn extract_metadata(
    tool: &dyn MediaTool,
    workspace: &Workspace,
    source: &Path,
    stem: &str,
    label: &str,
) -> Option<MetaFile> {
    let path = workspace.file(ArtifactKind::Metadata, &format!("{}_full.txt", stem));
    if let Err(e) = tool.extract_metadata(source, &path).await {
        warn!("{} Metadata extraction failed, continuing without chapters: {}", label, e);
        return None;
    }

    let meta = MetaFile::read(&path);
    workspace.remove(&path);
    match meta {
        Ok(meta) => Some(meta),
        Err(e) => {
            warn!("{} Unreadable metadata, continuing without chapters: {}", label, e);
            None
        }
    }
}

async fn trim_segment(
    tool: &dyn MediaTool,
    workspace: &Workspace,
    source: &Path,
    stem: &str,
    ordinal: usize,
    segment: Segment,
    original: Option<&MetaFile>,
) -> Result<TrimmedSegment> {
    let name = format!(
        "{}_seg{}_{:.0}_{:.0}",
        stem, ordinal, segment.start, segment.end
    );

    let metadata = match original {
        Some(meta) => {
            let path = workspace.file(ArtifactKind::Metadata, &format!("{}.txt", name));
            match clip(meta, segment.start, segment.end).write(&path) {
                Ok(()) => Some(path),
                Err(e) => {
                    warn!("Failed to write chapters for {}: {}", name, e);
                    None
                }
            }
        }
        None => None,
    };

    let raw = workspace.file(ArtifactKind::Segment, &format!("{}_raw.mkv", name));
    tool.trim(source, segment, &raw).await.context("trim failed")?;

    let file = workspace.file(ArtifactKind::Segment, &format!("{}.mkv", name));
    let reapplied = match &metadata {
        Some(meta) => match tool.apply_segment_metadata(&raw, meta, &file).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Reapplying chapters to {} failed, keeping it without: {}", name, e);
                false
            }
        },
        None => false,
    };

    if reapplied {
        workspace.remove(&raw);
    } else {
        tokio::fs::rename(&raw, &file)
            .await
            .with_context(|| format!("failed to move {:?} into place", raw))?;
        workspace.release(&raw);
    }

    let duration = match tool.probe_duration(&file).await {
        Ok(d) if d > 0.0 => d,
        other => {
            debug!(
                "Using planned length for {}: probe gave {:?}",
                name,
                other.map_err(|e| e.to_string())
            );
            segment.duration()
        }
    };

    Ok(TrimmedSegment {
        file,
        metadata,
        duration,
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "episode".to_string())
}
