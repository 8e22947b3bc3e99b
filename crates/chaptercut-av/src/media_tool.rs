//! The media tool seam the pipeline talks to, and its ffmpeg implementation.

use crate::actions::{self, ConcatMode};
use crate::command::ToolCommand;
use crate::probe::{self, AudioTrack, SubtitleTrack};
use crate::tools::{check_tools, ToolInfo};
use crate::{Error, Result};
use async_trait::async_trait;
use chaptercut_media::{ChapterSet, Segment};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Per-operation deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub probe: Duration,
    pub extract_metadata: Duration,
    pub trim: Duration,
    pub episode_concat: Duration,
    pub part_concat: Duration,
    pub segment_metadata: Duration,
    pub part_metadata: Duration,
    pub subtitle_extract: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            probe: Duration::from_secs(30),
            extract_metadata: Duration::from_secs(20),
            trim: Duration::from_secs(300),
            episode_concat: Duration::from_secs(600),
            part_concat: Duration::from_secs(900),
            segment_metadata: Duration::from_secs(120),
            part_metadata: Duration::from_secs(300),
            subtitle_extract: Duration::from_secs(120),
        }
    }
}

/// Operations chaptercut needs from an external media tool.
///
/// Every call is one subprocess bound by its own deadline. Implementations
/// must be shareable across concurrently processed episodes.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Chapters of a file, with the container duration as `End`.
    async fn probe_chapters(&self, path: &Path) -> Result<ChapterSet>;

    /// Container duration in seconds.
    async fn probe_duration(&self, path: &Path) -> Result<f64>;

    async fn probe_audio_tracks(&self, path: &Path) -> Result<Vec<AudioTrack>>;

    async fn probe_subtitle_tracks(&self, path: &Path) -> Result<Vec<SubtitleTrack>>;

    /// Write the file's global and chapter metadata as ffmetadata.
    async fn extract_metadata(&self, input: &Path, dest: &Path) -> Result<()>;

    /// Stream-copy one segment with chapters stripped.
    async fn trim(&self, input: &Path, segment: Segment, dest: &Path) -> Result<()>;

    /// Concatenate the trimmed segments of one episode.
    async fn concat_segments(&self, inputs: &[PathBuf], list_file: &Path, dest: &Path)
        -> Result<()>;

    /// Concatenate whole episodes into one part.
    async fn concat_episodes(&self, inputs: &[PathBuf], list_file: &Path, dest: &Path)
        -> Result<()>;

    /// Reapply clipped chapters to a trimmed segment or episode.
    async fn apply_segment_metadata(&self, input: &Path, metadata: &Path, dest: &Path)
        -> Result<()>;

    /// Finalize a part: apply combined chapters (if any) and the default
    /// audio disposition (if any).
    async fn finalize_part(
        &self,
        input: &Path,
        metadata: Option<&Path>,
        dest: &Path,
        default_audio: Option<usize>,
    ) -> Result<()>;

    /// Extract one subtitle stream to SRT.
    async fn extract_subtitle(&self, input: &Path, stream_index: u32, dest: &Path) -> Result<()>;

    /// Availability of the underlying tools.
    fn check(&self) -> Vec<ToolInfo>;
}

/// [`MediaTool`] backed by the `ffmpeg` and `ffprobe` binaries.
#[derive(Debug, Clone)]
pub struct FfmpegTool {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    timeouts: Timeouts,
}

impl Default for FfmpegTool {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe", Timeouts::default())
    }
}

impl FfmpegTool {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>, timeouts: Timeouts) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            timeouts,
        }
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    async fn ffprobe(&self, args: Vec<String>, timeout: Duration) -> Result<String> {
        let output = ToolCommand::new(&self.ffprobe)
            .args(args)
            .timeout(timeout)
            .execute()
            .await?;
        Ok(output.stdout)
    }

    async fn ffmpeg(&self, args: Vec<String>, timeout: Duration) -> Result<()> {
        ToolCommand::new(&self.ffmpeg)
            .args(args)
            .timeout(timeout)
            .execute()
            .await?;
        Ok(())
    }

    async fn concat(
        &self,
        inputs: &[PathBuf],
        list_file: &Path,
        dest: &Path,
        mode: ConcatMode,
        timeout: Duration,
    ) -> Result<()> {
        if inputs.is_empty() {
            return Err(Error::InvalidInput("nothing to concatenate".into()));
        }
        actions::write_concat_list(inputs, list_file)?;
        self.ffmpeg(actions::concat_args(list_file, dest, mode), timeout)
            .await
    }
}

fn require_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::file_not_found(path));
    }
    Ok(())
}

#[async_trait]
impl MediaTool for FfmpegTool {
    async fn probe_chapters(&self, path: &Path) -> Result<ChapterSet> {
        require_file(path)?;
        let json = self
            .ffprobe(probe::chapters_args(path), self.timeouts.probe)
            .await?;
        let chapters = probe::parse_chapters(&json)?;

        let duration = match self.probe_duration(path).await {
            Ok(d) => Some(d),
            Err(e) => {
                tracing::debug!("No duration for {}: {}", path.display(), e);
                None
            }
        };

        Ok(probe::chapter_set(chapters, duration))
    }

    async fn probe_duration(&self, path: &Path) -> Result<f64> {
        let text = self
            .ffprobe(probe::duration_args(path), self.timeouts.probe)
            .await?;
        probe::parse_duration(&text)
    }

    async fn probe_audio_tracks(&self, path: &Path) -> Result<Vec<AudioTrack>> {
        let json = self
            .ffprobe(probe::audio_args(path), self.timeouts.probe)
            .await?;
        probe::parse_audio_tracks(&json)
    }

    async fn probe_subtitle_tracks(&self, path: &Path) -> Result<Vec<SubtitleTrack>> {
        let json = self
            .ffprobe(probe::subtitle_args(path), self.timeouts.probe)
            .await?;
        probe::parse_subtitle_tracks(&json)
    }

    async fn extract_metadata(&self, input: &Path, dest: &Path) -> Result<()> {
        self.ffmpeg(
            actions::extract_metadata_args(input, dest),
            self.timeouts.extract_metadata,
        )
        .await
    }

    async fn trim(&self, input: &Path, segment: Segment, dest: &Path) -> Result<()> {
        if segment.is_empty() {
            return Err(Error::InvalidInput(format!(
                "empty segment {:.3}-{:.3}",
                segment.start, segment.end
            )));
        }
        self.ffmpeg(actions::trim_args(input, segment, dest), self.timeouts.trim)
            .await
    }

    async fn concat_segments(
        &self,
        inputs: &[PathBuf],
        list_file: &Path,
        dest: &Path,
    ) -> Result<()> {
        self.concat(
            inputs,
            list_file,
            dest,
            ConcatMode::Segments,
            self.timeouts.episode_concat,
        )
        .await
    }

    async fn concat_episodes(
        &self,
        inputs: &[PathBuf],
        list_file: &Path,
        dest: &Path,
    ) -> Result<()> {
        self.concat(
            inputs,
            list_file,
            dest,
            ConcatMode::Episodes,
            self.timeouts.part_concat,
        )
        .await
    }

    async fn apply_segment_metadata(
        &self,
        input: &Path,
        metadata: &Path,
        dest: &Path,
    ) -> Result<()> {
        self.ffmpeg(
            actions::apply_metadata_args(input, metadata, dest, None),
            self.timeouts.segment_metadata,
        )
        .await
    }

    async fn finalize_part(
        &self,
        input: &Path,
        metadata: Option<&Path>,
        dest: &Path,
        default_audio: Option<usize>,
    ) -> Result<()> {
        let args = match (metadata, default_audio) {
            (Some(meta), audio) => actions::apply_metadata_args(input, meta, dest, audio),
            (None, Some(audio)) => actions::set_default_audio_args(input, dest, audio),
            (None, None) => {
                tokio::fs::rename(input, dest).await?;
                return Ok(());
            }
        };
        self.ffmpeg(args, self.timeouts.part_metadata).await
    }

    async fn extract_subtitle(&self, input: &Path, stream_index: u32, dest: &Path) -> Result<()> {
        self.ffmpeg(
            actions::extract_subtitle_args(input, stream_index, dest),
            self.timeouts.subtitle_extract,
        )
        .await
    }

    fn check(&self) -> Vec<ToolInfo> {
        check_tools(
            &self.ffmpeg.to_string_lossy(),
            &self.ffprobe.to_string_lossy(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let t = Timeouts::default();
        assert_eq!(t.trim, Duration::from_secs(300));
        assert_eq!(t.part_concat, Duration::from_secs(900));
        assert!(t.probe < t.trim);
    }

    #[tokio::test]
    async fn test_missing_tool_is_reported() {
        let tool = FfmpegTool::new(
            "nonexistent_ffmpeg_12345",
            "nonexistent_ffprobe_12345",
            Timeouts::default(),
        );
        let err = tool.probe_duration(Path::new("x.mkv")).await.unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { .. }));
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let err = FfmpegTool::default()
            .probe_chapters(Path::new("/no/such/episode.mkv"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_concat_without_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let err = FfmpegTool::default()
            .concat_segments(&[], &dir.path().join("l.txt"), &dir.path().join("o.mkv"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_check_reports_both_tools() {
        let tool = FfmpegTool::new("nope_ffmpeg_1", "nope_ffprobe_1", Timeouts::default());
        let infos = tool.check();
        assert_eq!(infos.len(), 2);
        assert!(infos.iter().all(|i| !i.available));
    }
}
