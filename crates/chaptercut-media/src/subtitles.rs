//! Subtitle timestamp shifting for SRT and ASS/SSA text.
//!
//! Times are handled as integer milliseconds and clamped at zero after a
//! shift. SRT documents can also be concatenated across episodes, with cue
//! numbers rewritten to run sequentially through the combined output.

use crate::{Error, Result};
use std::fmt::Write as _;
use std::path::Path;

/// Text subtitle formats that can be shifted in-process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    Srt,
    Ass,
}

impl SubtitleFormat {
    /// Detect from file extension (`.srt`, `.ass`, `.ssa`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "srt" => Some(Self::Srt),
            "ass" | "ssa" => Some(Self::Ass),
            _ => None,
        }
    }
}

/// Parse `HH:MM:SS,mmm` into milliseconds.
pub fn parse_srt_timestamp(s: &str) -> Result<i64> {
    let s = s.trim();
    let (hms, millis) = s
        .split_once(',')
        .or_else(|| s.split_once('.'))
        .ok_or_else(|| Error::invalid_timestamp(s))?;
    let secs = parse_hms(hms).ok_or_else(|| Error::invalid_timestamp(s))?;
    let millis = fraction_millis(millis).ok_or_else(|| Error::invalid_timestamp(s))?;
    Ok(secs * 1000 + millis)
}

/// Format milliseconds as `HH:MM:SS,mmm`. Negative input is clamped to zero.
pub fn format_srt_timestamp(ms: i64) -> String {
    let ms = ms.max(0);
    format!(
        "{:02}:{:02}:{:02},{:03}",
        ms / 3_600_000,
        (ms / 60_000) % 60,
        (ms / 1000) % 60,
        ms % 1000
    )
}

/// Parse `H:MM:SS.cc` into milliseconds.
pub fn parse_ass_timestamp(s: &str) -> Result<i64> {
    let s = s.trim();
    let (hms, centis) = match s.split_once('.') {
        Some((hms, centis)) => (hms, Some(centis)),
        None => (s, None),
    };
    let secs = parse_hms(hms).ok_or_else(|| Error::invalid_timestamp(s))?;
    let millis = match centis {
        Some(c) => fraction_millis(c).ok_or_else(|| Error::invalid_timestamp(s))?,
        None => 0,
    };
    Ok(secs * 1000 + millis)
}

/// Decimal fraction of a second as milliseconds: `5` is 500, `05` is 50.
/// Digits past the third are truncated.
fn fraction_millis(digits: &str) -> Option<i64> {
    let digits = digits.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let padded = format!("{:0<3}", &digits[..digits.len().min(3)]);
    padded.parse().ok()
}

/// Format milliseconds as `H:MM:SS.cc`, truncating to centiseconds.
pub fn format_ass_timestamp(ms: i64) -> String {
    let ms = ms.max(0);
    format!(
        "{}:{:02}:{:02}.{:02}",
        ms / 3_600_000,
        (ms / 60_000) % 60,
        (ms / 1000) % 60,
        (ms % 1000) / 10
    )
}

fn parse_hms(s: &str) -> Option<i64> {
    let mut parts = s.trim().split(':');
    let h: i64 = parts.next()?.trim().parse().ok()?;
    let m: i64 = parts.next()?.trim().parse().ok()?;
    let sec: i64 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(h * 3600 + m * 60 + sec)
}

fn seconds_to_ms(seconds: f64) -> i64 {
    (seconds * 1000.0).round() as i64
}

/// One SRT cue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub start_ms: i64,
    pub end_ms: i64,
    pub lines: Vec<String>,
}

/// Parse SRT cues. Blocks without a timing line are dropped.
pub fn parse_srt(content: &str) -> Vec<Cue> {
    let content = content.trim_start_matches('\u{feff}');
    let mut cues = Vec::new();
    let mut block: Vec<&str> = Vec::new();

    for line in content.lines().chain(std::iter::once("")) {
        if !line.trim().is_empty() {
            block.push(line);
            continue;
        }
        if block.is_empty() {
            continue;
        }

        let timing = block.iter().position(|l| l.contains("-->"));
        match timing.and_then(|i| parse_timing(block[i]).map(|t| (i, t))) {
            Some((i, (start_ms, end_ms))) => cues.push(Cue {
                start_ms,
                end_ms,
                lines: block[i + 1..].iter().map(|l| l.to_string()).collect(),
            }),
            None => tracing::debug!("Dropping subtitle block without timing: {:?}", block),
        }
        block.clear();
    }

    cues
}

fn parse_timing(line: &str) -> Option<(i64, i64)> {
    let (start, end) = line.split_once("-->")?;
    // Trailing position hints ("X1:..") follow the end time.
    let end = end.split_whitespace().next()?;
    Some((
        parse_srt_timestamp(start).ok()?,
        parse_srt_timestamp(end).ok()?,
    ))
}

fn write_cue(out: &mut String, index: usize, cue: &Cue, offset_ms: i64) {
    let _ = writeln!(out, "{}", index);
    let _ = writeln!(
        out,
        "{} --> {}",
        format_srt_timestamp(cue.start_ms + offset_ms),
        format_srt_timestamp(cue.end_ms + offset_ms)
    );
    for line in &cue.lines {
        let _ = writeln!(out, "{}", line);
    }
    out.push('\n');
}

/// Shift every cue of an SRT document, renumbering from 1.
pub fn shift_srt(content: &str, offset_seconds: f64) -> String {
    let offset_ms = seconds_to_ms(offset_seconds);
    let mut out = String::new();
    for (i, cue) in parse_srt(content).iter().enumerate() {
        write_cue(&mut out, i + 1, cue, offset_ms);
    }
    out
}

/// Shift the start and end of every `Dialogue:` line of an ASS/SSA document.
///
/// Everything else, including the header sections, is passed through.
pub fn shift_ass(content: &str, offset_seconds: f64) -> String {
    let offset_ms = seconds_to_ms(offset_seconds);
    let mut out = String::with_capacity(content.len());

    for line in content.lines() {
        if line.starts_with("Dialogue:") {
            let mut fields: Vec<String> = line.splitn(10, ',').map(str::to_string).collect();
            if fields.len() >= 3 {
                for field in &mut fields[1..3] {
                    if let Ok(ms) = parse_ass_timestamp(field) {
                        *field = format_ass_timestamp(ms + offset_ms);
                    }
                }
                out.push_str(&fields.join(","));
                out.push('\n');
                continue;
            }
        }
        out.push_str(line);
        out.push('\n');
    }

    out
}

/// Shift a document in the given format.
pub fn shift_document(content: &str, format: SubtitleFormat, offset_seconds: f64) -> String {
    match format {
        SubtitleFormat::Srt => shift_srt(content, offset_seconds),
        SubtitleFormat::Ass => shift_ass(content, offset_seconds),
    }
}

/// Shift a subtitle file on disk, detecting the format from its extension.
pub fn shift_file(source: &Path, dest: &Path, offset_seconds: f64) -> Result<()> {
    let format = SubtitleFormat::from_path(source).ok_or_else(|| {
        Error::parse(0, format!("unsupported subtitle format: {}", source.display()))
    })?;
    let content = std::fs::read_to_string(source)?;
    std::fs::write(dest, shift_document(&content, format, offset_seconds))?;
    Ok(())
}

/// Concatenate SRT documents of consecutive episodes.
///
/// `inputs[i]` is the subtitle text of a file lasting `durations[i]`
/// seconds. A missing document still advances the offset. Cue numbers run
/// sequentially across the whole output.
pub fn combine_srt(inputs: &[Option<String>], durations: &[f64]) -> String {
    let mut out = String::new();
    let mut offset = 0.0;
    let mut index = 1;

    for (i, input) in inputs.iter().enumerate() {
        if let Some(content) = input {
            let offset_ms = seconds_to_ms(offset);
            for cue in parse_srt(content) {
                write_cue(&mut out, index, &cue, offset_ms);
                index += 1;
            }
        }
        offset += durations.get(i).copied().unwrap_or(0.0);
    }

    out
}
