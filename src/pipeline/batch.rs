//! Batch orchestration: bounded per-episode fan-out on spawned tasks, a
//! barrier over every handle, then the sequential part merge.

use super::episode::{process_episode, EpisodeOutput};
use super::merge::{merge_part, partition};
use super::subtitles::combine_part_subtitles;
use crate::config::ProcessingConfig;
use crate::library::list_episodes;
use crate::state::{AppEvent, ProgressTracker};
use anyhow::{Context, Result};
use chaptercut_av::{ArtifactKind, MediaTool, Workspace};
use chaptercut_media::SkipRange;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

/// User options of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrimOptions {
    pub skip_ranges: Vec<SkipRange>,
    /// Number of output parts; 0 uses the configured default.
    pub parts: usize,
    /// Audio track (among audio streams) to mark as default.
    pub audio_index: Option<usize>,
}

/// A processing request: input folder, output folder and options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub options: TrimOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedEpisode {
    pub index: usize,
    pub file: PathBuf,
    pub error: String,
}

/// Outcome of a run that produced at least one part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub run_id: Uuid,
    pub parts: Vec<PathBuf>,
    pub subtitles: Vec<PathBuf>,
    pub failed_episodes: Vec<FailedEpisode>,
    /// 1-based numbers of parts that could not be produced.
    pub failed_parts: Vec<usize>,
}

/// Run one batch to completion.
///
/// The tracker always ends in `done`. A fatal failure (unreadable input,
/// no surviving episode, every part failing) is recorded on the tracker and
/// returned. An episode task that panics only excludes that episode.
pub async fn run_batch(
    tool: Arc<dyn MediaTool>,
    processing: &ProcessingConfig,
    request: &BatchRequest,
    tracker: Arc<ProgressTracker>,
) -> Result<BatchReport> {
    let result = execute(tool, processing, request, &tracker).await;
    if let Err(e) = &result {
        error!("Run {} aborted: {:#}", tracker.run_id(), e);
        tracker.fail(format!("{:#}", e));
    }
    tracker.finish();
    result
}

async fn execute(
    tool: Arc<dyn MediaTool>,
    processing: &ProcessingConfig,
    request: &BatchRequest,
    tracker: &Arc<ProgressTracker>,
) -> Result<BatchReport> {
    let run_id = tracker.run_id();
    let sources = list_episodes(&request.input, &processing.extensions)
        .context("input folder unreadable")?;
    if sources.is_empty() {
        anyhow::bail!("No episode files found in {:?}", request.input);
    }

    let workspace = Workspace::new(&request.output)
        .with_context(|| format!("failed to prepare output folder {:?}", request.output))?;
    let skips = &request.options.skip_ranges;
    let limit = processing.concurrency();

    info!(
        "Run {}: {} episode(s), {} skip range(s), up to {} at a time",
        run_id,
        sources.len(),
        skips.len(),
        limit
    );
    tracker.begin_processing(sources.len());

    let gate = Arc::new(Semaphore::new(limit));
    let workspace = Arc::new(workspace);
    let skips: Arc<[SkipRange]> = skips.clone().into();
    let merge_segment_chapters = processing.merge_segment_chapters;

    let handles: Vec<JoinHandle<Result<EpisodeOutput>>> = sources
        .iter()
        .enumerate()
        .map(|(index, source)| {
            let (tool, gate, workspace, skips, tracker) = (
                tool.clone(),
                gate.clone(),
                workspace.clone(),
                skips.clone(),
                tracker.clone(),
            );
            let source = source.clone();
            tokio::spawn(async move {
                let result = async {
                    let _permit = gate.acquire().await.context("episode pool closed")?;
                    process_episode(
                        tool.as_ref(),
                        &workspace,
                        index,
                        &source,
                        &skips,
                        merge_segment_chapters,
                    )
                    .await
                }
                .await;

                match &result {
                    Ok(_) => tracker.complete_unit(),
                    Err(e) => report_episode_failure(&tracker, index, &source, e),
                }
                result
            })
        })
        .collect();

    // Barrier: every episode finishes before any part is merged.
    let mut valid: Vec<EpisodeOutput> = Vec::with_capacity(sources.len());
    let mut failed_episodes = Vec::new();
    for (index, handle) in handles.into_iter().enumerate() {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => {
                let err = anyhow::anyhow!("episode task aborted: {}", e);
                report_episode_failure(tracker, index, &sources[index], &err);
                Err(err)
            }
        };
        match result {
            Ok(output) => valid.push(output),
            Err(e) => failed_episodes.push(FailedEpisode {
                index,
                file: sources[index].clone(),
                error: format!("{:#}", e),
            }),
        }
    }

    if valid.is_empty() {
        anyhow::bail!("No episode survived processing");
    }

    let requested = match request.options.parts {
        0 => processing.default_parts,
        n => n,
    };
    let chunks = partition(&valid, requested);
    info!(
        "Run {}: merging {} episode(s) into {} part(s)",
        run_id,
        valid.len(),
        chunks.len()
    );
    tracker.begin_merging();
    tracker.set_total(chunks.len());

    let mut parts = Vec::with_capacity(chunks.len());
    let mut subtitles = Vec::new();
    let mut failed_parts = Vec::new();

    for (n, chunk) in chunks.iter().enumerate() {
        let part = n + 1;
        match merge_part(tool.as_ref(), &workspace, part, chunk, request.options.audio_index).await {
            Ok(path) => {
                if processing.combine_subtitles {
                    match combine_part_subtitles(tool.as_ref(), &workspace, part, chunk).await {
                        Ok(files) => subtitles.extend(files),
                        Err(e) => warn!("Part {}: subtitle combination failed: {:#}", part, e),
                    }
                }
                tracker.emit(AppEvent::PartCompleted {
                    run_id,
                    part,
                    path: path.clone(),
                });
                parts.push(path);
            }
            Err(e) => {
                warn!("Part {} failed: {:#}", part, e);
                tracker.emit(AppEvent::PartFailed {
                    run_id,
                    part,
                    error: format!("{:#}", e),
                });
                failed_parts.push(part);
            }
        }
        tracker.complete_unit();
    }

    workspace.discard(ArtifactKind::Episode);
    workspace.discard(ArtifactKind::Metadata);
    match Arc::try_unwrap(workspace) {
        Ok(workspace) => {
            if let Err(e) = workspace.finish() {
                warn!("Run {}: cleanup incomplete: {}", run_id, e);
            }
        }
        Err(_) => warn!("Run {}: workspace still shared, temp dir removed on drop", run_id),
    }

    if parts.is_empty() {
        anyhow::bail!("Every output part failed");
    }

    info!("Run {}: wrote {} part(s)", run_id, parts.len());
    Ok(BatchReport {
        run_id,
        parts,
        subtitles,
        failed_episodes,
        failed_parts,
    })
}

fn report_episode_failure(
    tracker: &ProgressTracker,
    index: usize,
    source: &Path,
    error: &anyhow::Error,
) {
    warn!("[{:02}] Episode {:?} excluded: {:#}", index + 1, source, error);
    tracker.emit(AppEvent::EpisodeFailed {
        run_id: tracker.run_id(),
        index,
        file: source.to_path_buf(),
        error: format!("{:#}", error),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_deserializes_camel_case_options() {
        let json = r#"{
            "input": "/in",
            "output": "/out",
            "options": {
                "skipRanges": [{"start": "Intro", "end": "Episode"}],
                "parts": 2,
                "audioIndex": 1
            }
        }"#;
        let request: BatchRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.options.skip_ranges, vec![SkipRange::new("Intro", "Episode")]);
        assert_eq!(request.options.parts, 2);
        assert_eq!(request.options.audio_index, Some(1));
    }

    #[test]
    fn test_options_default_when_missing() {
        let request: BatchRequest =
            serde_json::from_str(r#"{"input": "/in", "output": "/out"}"#).unwrap();
        assert_eq!(request.options, TrimOptions::default());
        assert_eq!(request.options.parts, 0);
    }
}
