//! ffmpeg argument builders for the stream-copy operations.
//!
//! Every operation copies streams without re-encoding and maps all input
//! streams, ignoring stream types the muxer does not know.

use crate::Result;
use chaptercut_media::Segment;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

fn p(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Dump the whole-file chapter metadata as an ffmetadata document.
pub fn extract_metadata_args(input: &Path, dest: &Path) -> Vec<String> {
    vec![
        "-y".into(),
        "-i".into(),
        p(input),
        "-f".into(),
        "ffmetadata".into(),
        p(dest),
    ]
}

/// Cut `segment` out of `input` with chapters stripped.
///
/// Seeking happens before the input so the cut lands on a keyframe; with
/// `-copyts` the `-to` position stays on the source timeline.
pub fn trim_args(input: &Path, segment: Segment, dest: &Path) -> Vec<String> {
    vec![
        "-y".into(),
        "-ss".into(),
        format!("{:.3}", segment.start),
        "-i".into(),
        p(input),
        "-to".into(),
        format!("{:.3}", segment.end),
        "-map".into(),
        "0".into(),
        "-ignore_unknown".into(),
        "-c".into(),
        "copy".into(),
        "-copyts".into(),
        "-avoid_negative_ts".into(),
        "make_zero".into(),
        "-map_chapters".into(),
        "-1".into(),
        p(dest),
    ]
}

/// How a concat regenerates timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcatMode {
    /// Segments of one episode.
    Segments,
    /// Whole episodes into one part; timestamps are regenerated.
    Episodes,
}

/// Concatenate the files listed in a concat-demuxer list.
pub fn concat_args(list_file: &Path, dest: &Path, mode: ConcatMode) -> Vec<String> {
    let mut args: Vec<String> = vec!["-y".into()];
    if mode == ConcatMode::Episodes {
        args.extend(["-fflags".into(), "+genpts".into()]);
    }
    args.extend([
        "-f".into(),
        "concat".into(),
        "-safe".into(),
        "0".into(),
        "-i".into(),
        p(list_file),
        "-map".into(),
        "0".into(),
        "-ignore_unknown".into(),
        "-c".into(),
        "copy".into(),
    ]);
    if mode == ConcatMode::Episodes {
        args.extend(["-avoid_negative_ts".into(), "make_zero".into()]);
    }
    args.push(p(dest));
    args
}

/// Remux `input` taking global and chapter metadata from `metadata`.
///
/// With `default_audio`, that audio stream (0-based among audio streams)
/// becomes the only default one.
pub fn apply_metadata_args(
    input: &Path,
    metadata: &Path,
    dest: &Path,
    default_audio: Option<usize>,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-i".into(),
        p(input),
        "-i".into(),
        p(metadata),
        "-map".into(),
        "0".into(),
        "-ignore_unknown".into(),
        "-map_metadata".into(),
        "1".into(),
        "-map_chapters".into(),
        "1".into(),
        "-c".into(),
        "copy".into(),
    ];
    if let Some(idx) = default_audio {
        args.extend(default_audio_args(idx));
    }
    args.push(p(dest));
    args
}

/// Remux without chapter input, only changing the default audio stream.
pub fn set_default_audio_args(input: &Path, dest: &Path, default_audio: usize) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-y".into(),
        "-i".into(),
        p(input),
        "-map".into(),
        "0".into(),
        "-ignore_unknown".into(),
        "-c".into(),
        "copy".into(),
    ];
    args.extend(default_audio_args(default_audio));
    args.push(p(dest));
    args
}

fn default_audio_args(idx: usize) -> [String; 4] {
    [
        "-disposition:a".into(),
        "0".into(),
        format!("-disposition:a:{}", idx),
        "default".into(),
    ]
}

/// Extract one subtitle stream, converted to SRT.
pub fn extract_subtitle_args(input: &Path, stream_index: u32, dest: &Path) -> Vec<String> {
    vec![
        "-y".into(),
        "-i".into(),
        p(input),
        "-map".into(),
        format!("0:{}", stream_index),
        "-c:s".into(),
        "srt".into(),
        p(dest),
    ]
}

/// Render a concat-demuxer list with one `file '<absolute path>'` per input.
pub fn concat_list(inputs: &[PathBuf]) -> Result<String> {
    let mut out = String::new();
    for input in inputs {
        let abs = std::path::absolute(input)?;
        // Single quotes close, escape, reopen.
        let escaped = abs.to_string_lossy().replace('\'', r"'\''");
        let _ = writeln!(out, "file '{}'", escaped);
    }
    Ok(out)
}

/// Write a concat-demuxer list file.
pub fn write_concat_list(inputs: &[PathBuf], list_file: &Path) -> Result<()> {
    std::fs::write(list_file, concat_list(inputs)?)?;
    Ok(())
}
