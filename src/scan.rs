//! Chapter preview of an input folder.
//!
//! Probes the first two episodes and lays their chapters on one cumulative
//! timeline, so a user can pick skip ranges before processing.

use crate::library::list_episodes;
use anyhow::{Context, Result};
use chaptercut_av::{AudioTrack, MediaTool};
use chaptercut_media::END_CHAPTER;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Number of episodes probed for the preview.
const PREVIEW_EPISODES: usize = 2;

/// A chapter on the preview timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanChapter {
    pub title: String,
    /// Seconds from the start of the first previewed episode.
    pub start: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    /// Chapters of the previewed episodes in order, closed by `End`.
    pub chapters: Vec<ScanChapter>,
    /// Audio streams of the first episode.
    pub audio_tracks: Vec<AudioTrack>,
    pub first_file: String,
    pub episode_count: usize,
}

/// Build the preview of `folder`.
pub async fn scan_folder(
    tool: &dyn MediaTool,
    folder: &Path,
    extensions: &[String],
) -> Result<ScanResult> {
    let episodes = list_episodes(folder, extensions)?;
    let Some(first) = episodes.first() else {
        anyhow::bail!("No episode files found in {:?}", folder);
    };

    let mut chapters = Vec::new();
    let mut offset = 0.0;

    for episode in episodes.iter().take(PREVIEW_EPISODES) {
        let set = tool
            .probe_chapters(episode)
            .await
            .with_context(|| format!("Failed to probe chapters of {:?}", episode))?;

        chapters.extend(set.chapters().iter().map(|c| ScanChapter {
            title: c.title.clone(),
            start: offset + c.start,
        }));
        offset += set.duration();
    }

    chapters.push(ScanChapter {
        title: END_CHAPTER.to_string(),
        start: offset,
    });

    let audio_tracks = match tool.probe_audio_tracks(first).await {
        Ok(tracks) => tracks,
        Err(e) => {
            tracing::warn!("Failed to list audio tracks of {:?}: {}", first, e);
            Vec::new()
        }
    };

    Ok(ScanResult {
        chapters,
        audio_tracks,
        first_file: first.to_string_lossy().to_string(),
        episode_count: episodes.len(),
    })
}
