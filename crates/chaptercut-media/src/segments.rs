//! Keep-segment planning.
//!
//! Subtracts chapter-anchored skip ranges from an episode's full timeline,
//! leaving the ascending, non-overlapping intervals that survive.

use crate::chapters::ChapterSet;

/// A pair of chapter names delimiting a range to remove.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SkipRange {
    pub start: String,
    pub end: String,
}

impl SkipRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Resolve both endpoints against a chapter set.
    ///
    /// Returns `None` when either name is unknown or the range is empty or
    /// inverted.
    pub fn resolve(&self, chapters: &ChapterSet) -> Option<(f64, f64)> {
        let start = chapters.resolve(&self.start)?;
        let end = chapters.resolve(&self.end)?;
        (end > start).then_some((start, end))
    }
}

impl std::str::FromStr for SkipRange {
    type Err = String;

    /// Parses `START:END`. The last unescaped `:` separates the names, so a
    /// colon inside START needs no escaping; `\:` puts a literal colon in
    /// either name and `\\` a literal backslash.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut names = vec![String::new()];
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(next @ (':' | '\\')) => push_char(&mut names, next),
                    Some(other) => {
                        push_char(&mut names, '\\');
                        push_char(&mut names, other);
                    }
                    None => push_char(&mut names, '\\'),
                },
                ':' => names.push(String::new()),
                c => push_char(&mut names, c),
            }
        }

        if names.len() < 2 {
            return Err(format!("Skip range must be START:END, got {:?}", s));
        }
        // Every piece but the last belongs to START, rejoined with ':'.
        let end = names.pop().unwrap_or_default();
        let start = names.join(":");
        if start.is_empty() || end.is_empty() {
            return Err(format!("Skip range must be START:END, got {:?}", s));
        }
        Ok(SkipRange::new(start, end))
    }
}

fn push_char(names: &mut [String], c: char) {
    if let Some(last) = names.last_mut() {
        last.push(c);
    }
}

/// Half-open `[start, end)` interval in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Segment {
    pub start: f64,
    pub end: f64,
}

impl Segment {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    fn overlaps(&self, start: f64, end: f64) -> bool {
        !(self.end <= start || self.start >= end)
    }
}

/// Compute the segments of an episode that survive the skip ranges.
///
/// Ranges that do not resolve are ignored. If every second of the episode is
/// skipped, the full-duration segment is returned instead of nothing.
pub fn compute_keep_segments(chapters: &ChapterSet, skips: &[SkipRange]) -> Vec<Segment> {
    let full = Segment::new(0.0, chapters.duration());
    let mut segments = vec![full];

    for skip in skips {
        let Some((start, end)) = skip.resolve(chapters) else {
            tracing::debug!(
                "Ignoring skip range {} -> {}: unresolved or empty",
                skip.start,
                skip.end
            );
            continue;
        };
        segments = subtract(&segments, start, end);
    }

    if segments.is_empty() {
        tracing::warn!("Skip ranges cover the whole episode, keeping it in full");
        segments.push(full);
    }

    segments
}

fn subtract(segments: &[Segment], start: f64, end: f64) -> Vec<Segment> {
    let mut out = Vec::with_capacity(segments.len() + 1);

    for seg in segments {
        if !seg.overlaps(start, end) {
            out.push(*seg);
            continue;
        }
        if seg.start < start {
            out.push(Segment::new(seg.start, start));
        }
        if seg.end > end {
            out.push(Segment::new(end, seg.end));
        }
    }

    out
}
