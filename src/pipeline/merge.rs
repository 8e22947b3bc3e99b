//! Grouping processed episodes into output parts.

use super::episode::EpisodeOutput;
use anyhow::{Context, Result};
use chaptercut_av::{ArtifactKind, MediaTool, Workspace};
use chaptercut_media::combine_files;
use std::path::PathBuf;
use tracing::{info, warn};

/// Split `items` into at most `parts` contiguous chunks of
/// `ceil(len / parts)` items, preserving order.
///
/// `parts` is clamped to `1..=len`. The last chunk may be shorter, and fewer
/// chunks than requested come back when the sizes do not divide evenly.
pub fn partition<T>(items: &[T], parts: usize) -> Vec<&[T]> {
    if items.is_empty() {
        return Vec::new();
    }
    let parts = parts.clamp(1, items.len());
    let size = items.len().div_ceil(parts);
    items.chunks(size).collect()
}

/// Output file name of a part (1-based).
pub fn part_file_name(part: usize) -> String {
    format!("Part{}.mkv", part)
}

/// Concatenate one chunk of episodes and finalize it as `Part<N>.mkv`.
///
/// Chapter combination and reapplication are best effort: when either
/// fails the part is kept without chapters. Only a failed concatenation
/// fails the part.
pub async fn merge_part(
    tool: &dyn MediaTool,
    workspace: &Workspace,
    part: usize,
    episodes: &[EpisodeOutput],
    audio_index: Option<usize>,
) -> Result<PathBuf> {
    let files: Vec<PathBuf> = episodes.iter().map(|e| e.file.clone()).collect();
    let list = workspace.file(ArtifactKind::Part, &format!("part{}_list.txt", part));
    let joined = workspace.file(ArtifactKind::Part, &format!("Part{}_tmp.mkv", part));

    info!("Part {}: joining {} episode(s)", part, files.len());
    tool.concat_episodes(&files, &list, &joined)
        .await
        .with_context(|| format!("joining episodes of part {} failed", part))?;
    workspace.remove(&list);

    let chapters = write_part_chapters(workspace, part, episodes);
    let audio_index = match audio_index {
        Some(idx) => check_audio_index(tool, &joined, idx).await,
        None => None,
    };

    let dest = workspace.output_file(&part_file_name(part));
    if let Err(e) = tool
        .finalize_part(&joined, chapters.as_deref(), &dest, audio_index)
        .await
    {
        warn!(
            "Part {}: finalizing failed, keeping it without chapters: {}",
            part, e
        );
        tokio::fs::rename(&joined, &dest)
            .await
            .with_context(|| format!("failed to move part {} into place", part))?;
    }

    workspace.remove(&joined);
    if let Some(path) = &chapters {
        workspace.remove(path);
    }

    info!("Part {}: wrote {:?}", part, dest);
    Ok(dest)
}

fn write_part_chapters(workspace: &Workspace, part: usize, episodes: &[EpisodeOutput]) -> Option<PathBuf> {
    let metas: Vec<Option<PathBuf>> = episodes.iter().map(|e| e.metadata.clone()).collect();
    let durations: Vec<f64> = episodes.iter().map(|e| e.duration).collect();
    let combined = combine_files(&metas, &durations);

    let path = workspace.file(ArtifactKind::Part, &format!("part_{}_chapters.txt", part));
    match combined.write(&path) {
        Ok(()) => Some(path),
        Err(e) => {
            warn!("Part {}: failed to write combined chapters: {}", part, e);
            workspace.remove(&path);
            None
        }
    }
}

async fn check_audio_index(tool: &dyn MediaTool, file: &std::path::Path, idx: usize) -> Option<usize> {
    match tool.probe_audio_tracks(file).await {
        Ok(tracks) if idx < tracks.len() => Some(idx),
        Ok(tracks) => {
            warn!(
                "Audio index {} out of range ({} track(s)), leaving defaults unchanged",
                idx,
                tracks.len()
            );
            None
        }
        Err(e) => {
            warn!("Could not list audio tracks, ignoring audio index {}: {}", idx, e);
            None
        }
    }
}
