//! Per-part subtitle combination.
//!
//! Text subtitle tracks of every episode in a part are extracted to SRT,
//! grouped by language and concatenated on the part's timeline.

use super::episode::EpisodeOutput;
use anyhow::{Context, Result};
use chaptercut_av::{ArtifactKind, MediaTool, Workspace};
use chaptercut_media::combine_srt;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Folder under the output directory receiving combined subtitles.
pub const SUBTITLE_DIR: &str = "subtitles";

/// Combine the subtitles of one part into `subtitles/Part<N>_<lang>.srt`.
///
/// Returns the files written. An episode lacking a language still advances
/// that language's offset by its duration.
pub async fn combine_part_subtitles(
    tool: &dyn MediaTool,
    workspace: &Workspace,
    part: usize,
    episodes: &[EpisodeOutput],
) -> Result<Vec<PathBuf>> {
    let mut groups: BTreeMap<String, Vec<Option<String>>> = BTreeMap::new();

    for (i, episode) in episodes.iter().enumerate() {
        let tracks = match tool.probe_subtitle_tracks(&episode.file).await {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!("Part {}: listing subtitles of {:?} failed: {}", part, episode.file, e);
                continue;
            }
        };

        for track in tracks.iter().filter(|t| t.is_text()) {
            let lang = sanitize(track.language_or_unknown());
            let slot = groups
                .entry(lang.clone())
                .or_insert_with(|| vec![None; episodes.len()]);
            if slot[i].is_some() {
                debug!("Part {}: episode {} has several {} tracks, keeping the first", part, i, lang);
                continue;
            }

            let dest = workspace.file(
                ArtifactKind::Subtitle,
                &format!("part{}_ep{}_{}.srt", part, i, track.index),
            );
            if let Err(e) = tool.extract_subtitle(&episode.file, track.index, &dest).await {
                warn!(
                    "Part {}: extracting subtitle stream {} of {:?} failed: {}",
                    part, track.index, episode.file, e
                );
                continue;
            }
            match tokio::fs::read_to_string(&dest).await {
                Ok(text) => slot[i] = Some(text),
                Err(e) => warn!("Part {}: unreadable subtitle {:?}: {}", part, dest, e),
            }
            workspace.remove(&dest);
        }
    }

    if groups.is_empty() {
        debug!("Part {}: no text subtitles", part);
        return Ok(Vec::new());
    }

    let out_dir = workspace.output_dir().join(SUBTITLE_DIR);
    tokio::fs::create_dir_all(&out_dir)
        .await
        .with_context(|| format!("failed to create {:?}", out_dir))?;

    let durations: Vec<f64> = episodes.iter().map(|e| e.duration).collect();
    let mut written = Vec::with_capacity(groups.len());
    for (lang, docs) in groups {
        let path = out_dir.join(format!("Part{}_{}.srt", part, lang));
        let combined = combine_srt(&docs, &durations);
        match tokio::fs::write(&path, combined).await {
            Ok(()) => {
                info!("Part {}: combined {} subtitles", part, lang);
                written.push(path);
            }
            Err(e) => warn!("Part {}: failed to write {:?}: {}", part, path, e),
        }
    }

    Ok(written)
}

fn sanitize(lang: &str) -> String {
    lang.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}
