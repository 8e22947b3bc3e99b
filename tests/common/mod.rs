//! Shared test harness for integration tests.
//!
//! Provides [`FakeTool`], a [`MediaTool`] that works on small text files
//! instead of media. Every fake "video" is a file holding `duration=<secs>`,
//! so the whole pipeline runs without ffmpeg while durations still add up.

#![allow(dead_code)]

use async_trait::async_trait;
use chaptercut_av::{AudioTrack, Error, MediaTool, Result, SubtitleTrack, ToolInfo};
use chaptercut_media::{ffmetadata, ChapterSet, MetaChapter, MetaFile, Segment};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Chapters of a fake source episode: `(title, start)` plus total duration.
#[derive(Debug, Clone)]
pub struct FakeEpisode {
    pub chapters: Vec<(String, f64)>,
    pub duration: f64,
}

impl FakeEpisode {
    pub fn new(chapters: &[(&str, f64)], duration: f64) -> Self {
        Self {
            chapters: chapters
                .iter()
                .map(|(t, s)| (t.to_string(), *s))
                .collect(),
            duration,
        }
    }

    /// Intro 0-10, Episode 10-80, Preview 80-90.
    pub fn standard() -> Self {
        Self::new(&[("Intro", 0.0), ("Episode", 10.0), ("Preview", 80.0)], 90.0)
    }

    fn metadata(&self) -> MetaFile {
        let mut meta = MetaFile::default();
        for (i, (title, start)) in self.chapters.iter().enumerate() {
            let end = self
                .chapters
                .get(i + 1)
                .map(|(_, s)| *s)
                .unwrap_or(self.duration);
            meta.chapters.push(MetaChapter::new(
                (start * 1000.0).round() as i64,
                (end * 1000.0).round() as i64,
                title.clone(),
            ));
        }
        meta
    }
}

/// A part finalization seen by the fake.
#[derive(Debug, Clone)]
pub struct Finalized {
    pub dest: PathBuf,
    pub chapters: Option<MetaFile>,
    pub default_audio: Option<usize>,
}

#[derive(Default)]
pub struct FakeTool {
    episodes: HashMap<String, FakeEpisode>,
    fail_probe: HashSet<String>,
    panic_probe: HashSet<String>,
    fail_trim: Vec<(String, f64)>,
    fail_part_concat: bool,
    fail_finalize: bool,
    audio_tracks: usize,
    subtitles: bool,
    trim_delay: Duration,

    active_trims: AtomicUsize,
    max_active_trims: AtomicUsize,
    finalized: Mutex<Vec<Finalized>>,
}

impl FakeTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source episode under its file name.
    pub fn episode(mut self, name: &str, episode: FakeEpisode) -> Self {
        self.episodes.insert(name.to_string(), episode);
        self
    }

    pub fn fail_probe(mut self, name: &str) -> Self {
        self.fail_probe.insert(name.to_string());
        self
    }

    /// Panic inside the chapter probe of `name`.
    pub fn panic_probe(mut self, name: &str) -> Self {
        self.panic_probe.insert(name.to_string());
        self
    }

    /// Fail the trim of the segment of `name` starting at `start`.
    pub fn fail_trim(mut self, name: &str, start: f64) -> Self {
        self.fail_trim.push((name.to_string(), start));
        self
    }

    pub fn fail_part_concat(mut self) -> Self {
        self.fail_part_concat = true;
        self
    }

    pub fn fail_finalize(mut self) -> Self {
        self.fail_finalize = true;
        self
    }

    pub fn audio_tracks(mut self, count: usize) -> Self {
        self.audio_tracks = count;
        self
    }

    pub fn with_subtitles(mut self) -> Self {
        self.subtitles = true;
        self
    }

    pub fn trim_delay(mut self, delay: Duration) -> Self {
        self.trim_delay = delay;
        self
    }

    pub fn max_active_trims(&self) -> usize {
        self.max_active_trims.load(Ordering::SeqCst)
    }

    pub fn finalized(&self) -> Vec<Finalized> {
        self.finalized.lock().clone()
    }

    fn source(&self, path: &Path) -> Option<(&String, &FakeEpisode)> {
        let name = path.file_name()?.to_string_lossy().to_string();
        self.episodes.get_key_value(&name)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Write a fake video of the given duration.
pub fn write_video(path: &Path, duration: f64) {
    std::fs::write(path, format!("duration={}\n", duration)).unwrap();
}

/// Duration stored in a fake video.
pub fn video_duration(path: &Path) -> Option<f64> {
    let content = std::fs::read_to_string(path).ok()?;
    content
        .lines()
        .find_map(|l| l.strip_prefix("duration="))
        .and_then(|v| v.trim().parse().ok())
}

/// Create `dir/<name>` fake sources for every registered episode.
pub fn write_sources(dir: &Path, names: &[&str], episode: &FakeEpisode) {
    for name in names {
        write_video(&dir.join(name), episode.duration);
    }
}

async fn copy(input: &Path, dest: &Path) -> Result<()> {
    tokio::fs::copy(input, dest).await?;
    Ok(())
}

async fn concat(inputs: &[PathBuf], list_file: &Path, dest: &Path) -> Result<()> {
    if inputs.is_empty() {
        return Err(Error::InvalidInput("nothing to concatenate".into()));
    }
    let list: String = inputs
        .iter()
        .map(|p| format!("file '{}'\n", p.display()))
        .collect();
    tokio::fs::write(list_file, list).await?;

    let mut total = 0.0;
    for input in inputs {
        total += video_duration(input).ok_or_else(|| Error::file_not_found(input))?;
    }
    tokio::fs::write(dest, format!("duration={}\n", total)).await?;
    Ok(())
}

#[async_trait]
impl MediaTool for FakeTool {
    async fn probe_chapters(&self, path: &Path) -> Result<ChapterSet> {
        let name = file_name(path);
        if self.fail_probe.contains(&name) {
            return Err(Error::tool_failed("ffprobe", format!("{}: Invalid data", name)));
        }
        if self.panic_probe.contains(&name) {
            panic!("probe of {} blew up", name);
        }
        let (_, episode) = self
            .source(path)
            .ok_or_else(|| Error::file_not_found(path))?;
        Ok(ChapterSet::from_starts(
            episode.chapters.iter().map(|(t, s)| (Some(t.clone()), *s)),
            episode.duration,
        ))
    }

    async fn probe_duration(&self, path: &Path) -> Result<f64> {
        video_duration(path).ok_or_else(|| Error::parse_error("ffprobe", "no duration"))
    }

    async fn probe_audio_tracks(&self, _path: &Path) -> Result<Vec<AudioTrack>> {
        Ok((0..self.audio_tracks)
            .map(|i| AudioTrack {
                index: i,
                stream_index: i as u32 + 1,
                lang: if i == 0 { "jpn".into() } else { "eng".into() },
                title: String::new(),
            })
            .collect())
    }

    async fn probe_subtitle_tracks(&self, _path: &Path) -> Result<Vec<SubtitleTrack>> {
        if !self.subtitles {
            return Ok(Vec::new());
        }
        Ok(vec![
            SubtitleTrack {
                index: 2,
                language: "eng".into(),
                title: String::new(),
                codec: "subrip".into(),
            },
            SubtitleTrack {
                index: 3,
                language: "eng".into(),
                title: "Signs".into(),
                codec: "subrip".into(),
            },
            SubtitleTrack {
                index: 4,
                language: "eng".into(),
                title: String::new(),
                codec: "hdmv_pgs_subtitle".into(),
            },
        ])
    }

    async fn extract_metadata(&self, input: &Path, dest: &Path) -> Result<()> {
        let (_, episode) = self
            .source(input)
            .ok_or_else(|| Error::file_not_found(input))?;
        tokio::fs::write(dest, ffmetadata::serialize(&episode.metadata())).await?;
        Ok(())
    }

    async fn trim(&self, input: &Path, segment: Segment, dest: &Path) -> Result<()> {
        let active = self.active_trims.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active_trims.fetch_max(active, Ordering::SeqCst);
        if !self.trim_delay.is_zero() {
            tokio::time::sleep(self.trim_delay).await;
        }
        self.active_trims.fetch_sub(1, Ordering::SeqCst);

        let name = file_name(input);
        if self
            .fail_trim
            .iter()
            .any(|(n, s)| *n == name && (*s - segment.start).abs() < 1e-9)
        {
            return Err(Error::tool_failed("ffmpeg", "Conversion failed!"));
        }
        tokio::fs::write(dest, format!("duration={}\n", segment.duration())).await?;
        Ok(())
    }

    async fn concat_segments(&self, inputs: &[PathBuf], list_file: &Path, dest: &Path) -> Result<()> {
        concat(inputs, list_file, dest).await
    }

    async fn concat_episodes(&self, inputs: &[PathBuf], list_file: &Path, dest: &Path) -> Result<()> {
        if self.fail_part_concat {
            return Err(Error::tool_failed("ffmpeg", "concat: Invalid data"));
        }
        concat(inputs, list_file, dest).await
    }

    async fn apply_segment_metadata(&self, input: &Path, _metadata: &Path, dest: &Path) -> Result<()> {
        copy(input, dest).await
    }

    async fn finalize_part(
        &self,
        input: &Path,
        metadata: Option<&Path>,
        dest: &Path,
        default_audio: Option<usize>,
    ) -> Result<()> {
        let chapters = match metadata {
            Some(path) => Some(MetaFile::read(path)?),
            None => None,
        };
        self.finalized.lock().push(Finalized {
            dest: dest.to_path_buf(),
            chapters,
            default_audio,
        });
        if self.fail_finalize {
            return Err(Error::tool_failed("ffmpeg", "Error writing trailer"));
        }
        copy(input, dest).await
    }

    async fn extract_subtitle(&self, input: &Path, stream_index: u32, dest: &Path) -> Result<()> {
        let text = format!(
            "1\n00:00:01,000 --> 00:00:02,000\n{} stream {}\n\n",
            file_name(input),
            stream_index
        );
        tokio::fs::write(dest, text).await?;
        Ok(())
    }

    fn check(&self) -> Vec<ToolInfo> {
        ["ffmpeg", "ffprobe"]
            .iter()
            .map(|name| ToolInfo {
                name: name.to_string(),
                available: true,
                version: Some("fake".to_string()),
                path: None,
            })
            .collect()
    }
}
