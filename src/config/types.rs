use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub processing: ProcessingConfig,

    #[serde(default)]
    pub timeouts: TimeoutsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Media tool binaries, as names looked up on `PATH` or explicit paths.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}
fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProcessingConfig {
    /// Episodes processed at once; 0 means one per CPU.
    #[serde(default)]
    pub max_concurrent_episodes: usize,

    /// Episode file extensions, case-insensitive, without the dot.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Part count used when a request does not name one.
    #[serde(default = "default_parts")]
    pub default_parts: usize,

    /// Carry the chapters of every kept segment into the episode, not just
    /// the first segment's.
    #[serde(default = "default_true")]
    pub merge_segment_chapters: bool,

    /// Combine text subtitle tracks per part into `subtitles/`.
    #[serde(default)]
    pub combine_subtitles: bool,
}

fn default_extensions() -> Vec<String> {
    vec!["mkv".to_string()]
}
fn default_parts() -> usize {
    1
}
fn default_true() -> bool {
    true
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_concurrent_episodes: 0,
            extensions: default_extensions(),
            default_parts: default_parts(),
            merge_segment_chapters: true,
            combine_subtitles: false,
        }
    }
}

impl ProcessingConfig {
    /// Effective concurrency limit.
    pub fn concurrency(&self) -> usize {
        if self.max_concurrent_episodes == 0 {
            num_cpus::get().max(1)
        } else {
            self.max_concurrent_episodes
        }
    }
}

/// Per-operation deadlines in seconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimeoutsConfig {
    #[serde(default = "default_probe_secs")]
    pub probe: u64,
    #[serde(default = "default_extract_metadata_secs")]
    pub extract_metadata: u64,
    #[serde(default = "default_trim_secs")]
    pub trim: u64,
    #[serde(default = "default_episode_concat_secs")]
    pub episode_concat: u64,
    #[serde(default = "default_part_concat_secs")]
    pub part_concat: u64,
    #[serde(default = "default_segment_metadata_secs")]
    pub segment_metadata: u64,
    #[serde(default = "default_part_metadata_secs")]
    pub part_metadata: u64,
    #[serde(default = "default_subtitle_extract_secs")]
    pub subtitle_extract: u64,
}

fn default_probe_secs() -> u64 {
    30
}
fn default_extract_metadata_secs() -> u64 {
    20
}
fn default_trim_secs() -> u64 {
    300
}
fn default_episode_concat_secs() -> u64 {
    600
}
fn default_part_concat_secs() -> u64 {
    900
}
fn default_segment_metadata_secs() -> u64 {
    120
}
fn default_part_metadata_secs() -> u64 {
    300
}
fn default_subtitle_extract_secs() -> u64 {
    120
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            probe: default_probe_secs(),
            extract_metadata: default_extract_metadata_secs(),
            trim: default_trim_secs(),
            episode_concat: default_episode_concat_secs(),
            part_concat: default_part_concat_secs(),
            segment_metadata: default_segment_metadata_secs(),
            part_metadata: default_part_metadata_secs(),
            subtitle_extract: default_subtitle_extract_secs(),
        }
    }
}

impl TimeoutsConfig {
    pub(crate) fn entries(&self) -> [(&'static str, u64); 8] {
        [
            ("probe", self.probe),
            ("extract_metadata", self.extract_metadata),
            ("trim", self.trim),
            ("episode_concat", self.episode_concat),
            ("part_concat", self.part_concat),
            ("segment_metadata", self.segment_metadata),
            ("part_metadata", self.part_metadata),
            ("subtitle_extract", self.subtitle_extract),
        ]
    }
}

impl From<&TimeoutsConfig> for chaptercut_av::Timeouts {
    fn from(t: &TimeoutsConfig) -> Self {
        Self {
            probe: Duration::from_secs(t.probe),
            extract_metadata: Duration::from_secs(t.extract_metadata),
            trim: Duration::from_secs(t.trim),
            episode_concat: Duration::from_secs(t.episode_concat),
            part_concat: Duration::from_secs(t.part_concat),
            segment_metadata: Duration::from_secs(t.segment_metadata),
            part_metadata: Duration::from_secs(t.part_metadata),
            subtitle_extract: Duration::from_secs(t.subtitle_extract),
        }
    }
}
