//! ffprobe invocations and output parsing.
//!
//! Argument builders and parsers are kept apart from execution so the
//! parsing can be exercised on canned ffprobe output.

use crate::{Error, Result};
use chaptercut_media::ChapterSet;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
struct FfprobeChapters {
    #[serde(default)]
    chapters: Vec<FfprobeChapter>,
}

#[derive(Debug, Deserialize)]
struct FfprobeChapter {
    start_time: Option<String>,
    #[serde(default)]
    tags: FfprobeTags,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeStreams {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    index: u32,
    codec_name: Option<String>,
    #[serde(default)]
    tags: FfprobeTags,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeTags {
    language: Option<String>,
    title: Option<String>,
}

/// An audio stream as offered to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioTrack {
    /// Position among the file's audio streams (0-based), as used by
    /// `-disposition:a:N`.
    pub index: usize,
    /// Absolute stream index inside the container.
    #[serde(rename = "streamIndex")]
    pub stream_index: u32,
    pub lang: String,
    pub title: String,
}

/// A subtitle stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    /// Absolute stream index inside the container, as used by `-map 0:N`.
    pub index: u32,
    pub language: String,
    pub title: String,
    pub codec: String,
}

impl SubtitleTrack {
    /// Text-based codecs that can be converted to SRT.
    pub fn is_text(&self) -> bool {
        matches!(
            self.codec.as_str(),
            "subrip" | "srt" | "ass" | "ssa" | "webvtt" | "mov_text" | "text"
        )
    }

    /// Language tag, or `unknown` when the stream carries none.
    pub fn language_or_unknown(&self) -> &str {
        if self.language.is_empty() {
            "unknown"
        } else {
            &self.language
        }
    }
}

fn with_path(mut args: Vec<String>, path: &Path) -> Vec<String> {
    args.push(path.to_string_lossy().to_string());
    args
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

/// `ffprobe` arguments listing chapters as JSON.
pub fn chapters_args(path: &Path) -> Vec<String> {
    with_path(strings(&["-v", "error", "-show_chapters", "-of", "json"]), path)
}

/// `ffprobe` arguments printing the bare container duration.
pub fn duration_args(path: &Path) -> Vec<String> {
    with_path(
        strings(&[
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ]),
        path,
    )
}

/// `ffprobe` arguments listing audio streams with language and title tags.
pub fn audio_args(path: &Path) -> Vec<String> {
    with_path(
        strings(&[
            "-v",
            "error",
            "-select_streams",
            "a",
            "-show_entries",
            "stream=index,codec_name:stream_tags=language,title",
            "-of",
            "json",
        ]),
        path,
    )
}

/// `ffprobe` arguments listing subtitle streams.
pub fn subtitle_args(path: &Path) -> Vec<String> {
    with_path(
        strings(&[
            "-v",
            "error",
            "-select_streams",
            "s",
            "-show_entries",
            "stream=index,codec_name:stream_tags=language,title",
            "-of",
            "json",
        ]),
        path,
    )
}

/// Parse `-show_chapters` JSON into `(title, start seconds)` pairs.
pub fn parse_chapters(json: &str) -> Result<Vec<(Option<String>, f64)>> {
    let output: FfprobeChapters = serde_json::from_str(json)?;
    Ok(output
        .chapters
        .into_iter()
        .map(|c| {
            let start = c
                .start_time
                .and_then(|s| s.trim().parse::<f64>().ok())
                .unwrap_or(0.0);
            (c.tags.title, start)
        })
        .collect())
}

/// Parse the bare duration printed by [`duration_args`].
pub fn parse_duration(text: &str) -> Result<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::parse_error("ffprobe", "empty duration"));
    }
    text.parse::<f64>()
        .map_err(|e| Error::parse_error("ffprobe", format!("invalid duration {:?}: {}", text, e)))
}

/// Build the chapter set of a file.
///
/// Without a positive duration the end falls one second after the last
/// chapter start.
pub fn chapter_set(chapters: Vec<(Option<String>, f64)>, duration: Option<f64>) -> ChapterSet {
    let mut set = ChapterSet::from_starts(chapters, 0.0);
    let duration = match duration {
        Some(d) if d > 0.0 => d,
        _ => set.last_start().unwrap_or(0.0).max(0.0) + 1.0,
    };
    set.set_duration(duration);
    set
}

/// Parse audio stream JSON. Indices are renumbered from 0 in stream order.
pub fn parse_audio_tracks(json: &str) -> Result<Vec<AudioTrack>> {
    let output: FfprobeStreams = serde_json::from_str(json)?;
    Ok(output
        .streams
        .into_iter()
        .enumerate()
        .map(|(i, s)| AudioTrack {
            index: i,
            stream_index: s.index,
            lang: s.tags.language.unwrap_or_default(),
            title: s.tags.title.unwrap_or_default(),
        })
        .collect())
}

/// Parse subtitle stream JSON.
pub fn parse_subtitle_tracks(json: &str) -> Result<Vec<SubtitleTrack>> {
    let output: FfprobeStreams = serde_json::from_str(json)?;
    Ok(output
        .streams
        .into_iter()
        .map(|s| SubtitleTrack {
            index: s.index,
            language: s.tags.language.unwrap_or_default(),
            title: s.tags.title.unwrap_or_default(),
            codec: s.codec_name.unwrap_or_default(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAPTERS_JSON: &str = r#"{
        "chapters": [
            {"id": 0, "time_base": "1/1000000000", "start": 0, "start_time": "0.000000",
             "end_time": "90.000000", "tags": {"title": "Opening"}},
            {"id": 1, "time_base": "1/1000000000", "start_time": "90.000000",
             "end_time": "1300.000000", "tags": {}},
            {"id": 2, "time_base": "1/1000000000", "start_time": "1300.000000",
             "end_time": "1420.000000"}
        ]
    }"#;

    #[test]
    fn test_parse_chapters_synthesizes_titles() {
        let set = chapter_set(parse_chapters(CHAPTERS_JSON).unwrap(), Some(1420.0));
        assert_eq!(set.names(), vec!["Opening", "Chapter_02", "Chapter_03", "End"]);
        assert_eq!(set.resolve("Chapter_02"), Some(90.0));
        assert_eq!(set.resolve("End"), Some(1420.0));
    }

    #[test]
    fn test_duration_fallback_after_last_chapter() {
        let set = chapter_set(parse_chapters(CHAPTERS_JSON).unwrap(), None);
        assert_eq!(set.duration(), 1301.0);

        let set = chapter_set(parse_chapters(CHAPTERS_JSON).unwrap(), Some(0.0));
        assert_eq!(set.duration(), 1301.0);
    }

    #[test]
    fn test_no_chapters() {
        let set = chapter_set(parse_chapters("{}").unwrap(), None);
        assert!(set.is_empty());
        assert_eq!(set.duration(), 1.0);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("1420.032000\n").unwrap(), 1420.032);
        assert!(parse_duration("  ").is_err());
        assert!(parse_duration("N/A").is_err());
    }

    #[test]
    fn test_parse_audio_tracks() {
        let json = r#"{"streams": [
            {"index": 1, "codec_name": "aac", "tags": {"language": "jpn", "title": "Stereo"}},
            {"index": 2, "tags": {"language": "eng"}}
        ]}"#;
        let tracks = parse_audio_tracks(json).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].index, 0);
        assert_eq!(tracks[0].stream_index, 1);
        assert_eq!(tracks[0].lang, "jpn");
        assert_eq!(tracks[1].index, 1);
        assert_eq!(tracks[1].title, "");
    }

    #[test]
    fn test_parse_subtitle_tracks() {
        let json = r#"{"streams": [
            {"index": 3, "codec_name": "ass", "tags": {"language": "eng"}},
            {"index": 4, "codec_name": "hdmv_pgs_subtitle"}
        ]}"#;
        let tracks = parse_subtitle_tracks(json).unwrap();
        assert!(tracks[0].is_text());
        assert!(!tracks[1].is_text());
        assert_eq!(tracks[1].language_or_unknown(), "unknown");
    }

    #[test]
    fn test_args_end_with_path() {
        let args = chapters_args(Path::new("/tv/ep1.mkv"));
        assert_eq!(args.last().map(String::as_str), Some("/tv/ep1.mkv"));
        assert!(args.contains(&"-show_chapters".to_string()));
    }
}
