//! FFmetadata chapter document reader and writer.
//!
//! The format is line oriented:
//!
//! ```text
//! ;FFMETADATA1
//! [CHAPTER]
//! TIMEBASE=1/1000
//! START=0
//! END=90000
//! title=Opening
//! ```
//!
//! Lines starting with `;` are comments. `[CHAPTER]` opens a chapter block and
//! any other `[SECTION]` closes it. A `TIMEBASE` line, wherever it appears,
//! replaces the timebase of the whole document, including chapters already
//! read. Per-chapter timebases are therefore not representable, and the
//! writer emits the document timebase on every chapter.

use crate::timebase::Timebase;
use crate::Result;
use std::fmt::Write as _;
use std::path::Path;

/// Header line emitted at the top of every written document.
pub const HEADER: &str = ";FFMETADATA1";

/// One chapter in integer units of the owning [`MetaFile`] timebase.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct MetaChapter {
    pub start: i64,
    pub end: i64,
    pub title: String,
}

impl MetaChapter {
    pub fn new(start: i64, end: i64, title: impl Into<String>) -> Self {
        Self {
            start,
            end,
            title: title.into(),
        }
    }
}

/// Parsed chapter document.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct MetaFile {
    pub timebase: Timebase,
    pub chapters: Vec<MetaChapter>,
}

impl Default for MetaFile {
    fn default() -> Self {
        Self::with_timebase(Timebase::MILLIS)
    }
}

impl MetaFile {
    pub fn with_timebase(timebase: Timebase) -> Self {
        Self {
            timebase,
            chapters: Vec::new(),
        }
    }

    /// Chapter start/end in seconds.
    pub fn chapter_seconds(&self, chapter: &MetaChapter) -> (f64, f64) {
        (
            self.timebase.units_to_seconds(chapter.start),
            self.timebase.units_to_seconds(chapter.end),
        )
    }

    /// Read and parse a document from disk.
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(parse(&content))
    }

    /// Serialize and write to disk, replacing any existing file.
    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serialize(self))?;
        Ok(())
    }
}

/// Parse a document. Unknown keys and malformed values are ignored.
pub fn parse(content: &str) -> MetaFile {
    let mut file = MetaFile::default();
    let mut current: Option<MetaChapter> = None;

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        if line == "[CHAPTER]" {
            if let Some(chapter) = current.take() {
                file.chapters.push(chapter);
            }
            current = Some(MetaChapter::default());
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            if let Some(chapter) = current.take() {
                file.chapters.push(chapter);
            }
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        if key == "TIMEBASE" {
            match value.parse::<Timebase>() {
                Ok(tb) => file.timebase = tb,
                Err(e) => tracing::debug!("Ignoring TIMEBASE line: {}", e),
            }
            continue;
        }

        let Some(chapter) = current.as_mut() else {
            continue;
        };
        match key {
            "START" => chapter.start = value.parse().unwrap_or(0),
            "END" => chapter.end = value.parse().unwrap_or(0),
            "title" => chapter.title = unescape_title(value),
            _ => {}
        }
    }

    if let Some(chapter) = current {
        file.chapters.push(chapter);
    }

    file
}

/// Serialize a document with the header and one block per chapter.
pub fn serialize(file: &MetaFile) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');

    for chapter in &file.chapters {
        out.push_str("[CHAPTER]\n");
        let _ = writeln!(out, "TIMEBASE={}", file.timebase);
        let _ = writeln!(out, "START={}", chapter.start);
        let _ = writeln!(out, "END={}", chapter.end);
        if !chapter.title.is_empty() {
            let _ = writeln!(out, "title={}", escape_title(&chapter.title));
        }
    }

    out
}

fn unescape_title(value: &str) -> String {
    value.replace("\\n", "\n")
}

fn escape_title(title: &str) -> String {
    title.replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = ";FFMETADATA1
title=Some Show
encoder=Lavf60.3.100
[CHAPTER]
TIMEBASE=1/1000
START=0
END=90000
title=Opening
[CHAPTER]
TIMEBASE=1/1000
START=90000
END=1300000
title=Episode
[CHAPTER]
TIMEBASE=1/1000
START=1300000
END=1420000
title=Ending\\nCredits
";

    #[test]
    fn test_parse_chapters() {
        let file = parse(SAMPLE);
        assert_eq!(file.timebase, Timebase::MILLIS);
        assert_eq!(file.chapters.len(), 3);
        assert_eq!(file.chapters[0], MetaChapter::new(0, 90000, "Opening"));
        assert_eq!(file.chapters[2].title, "Ending\nCredits");
    }

    #[test]
    fn test_global_keys_are_not_chapter_titles() {
        let file = parse(SAMPLE);
        assert!(file.chapters.iter().all(|c| c.title != "Some Show"));
    }

    #[test]
    fn test_default_timebase_is_millis() {
        let file = parse("[CHAPTER]\nSTART=5\nEND=10\n");
        assert_eq!(file.timebase, Timebase::MILLIS);
        assert_eq!(file.chapter_seconds(&file.chapters[0]), (0.005, 0.01));
    }

    #[test]
    fn test_timebase_inside_block_applies_to_whole_file() {
        let content = "[CHAPTER]
START=1000
END=2000
[CHAPTER]
TIMEBASE=1/90000
START=90000
END=180000
";
        let file = parse(content);
        assert_eq!(file.timebase, Timebase::new(1, 90000));
        // The first chapter is re-scaled too.
        let (start, _) = file.chapter_seconds(&file.chapters[0]);
        assert!((start - 1000.0 / 90000.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_timebase_is_ignored() {
        let file = parse("[CHAPTER]\nTIMEBASE=0/1000\nSTART=1\nEND=2\n");
        assert_eq!(file.timebase, Timebase::MILLIS);
    }

    #[test]
    fn test_other_section_closes_chapter() {
        let content = "[CHAPTER]
START=0
END=10
title=One
[STREAM]
title=not a chapter
START=99
";
        let file = parse(content);
        assert_eq!(file.chapters.len(), 1);
        assert_eq!(file.chapters[0].title, "One");
        assert_eq!(file.chapters[0].start, 0);
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let file = parse("; comment\n\n[CHAPTER]\n;START=5\nSTART=7\nEND=9\n");
        assert_eq!(file.chapters[0].start, 7);
    }

    #[test]
    fn test_serialize_layout() {
        let mut file = MetaFile::with_timebase(Timebase::new(1, 1000));
        file.chapters.push(MetaChapter::new(0, 1500, "Part\nOne"));
        file.chapters.push(MetaChapter::new(1500, 3000, ""));

        let text = serialize(&file);
        let expected = ";FFMETADATA1
[CHAPTER]
TIMEBASE=1/1000
START=0
END=1500
title=Part\\nOne
[CHAPTER]
TIMEBASE=1/1000
START=1500
END=3000
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_serialized_document_parses_back() {
        let file = parse(SAMPLE);
        assert_eq!(parse(&serialize(&file)), file);
    }

    #[test]
    fn test_read_write_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.txt");

        let file = parse(SAMPLE);
        file.write(&path).unwrap();
        assert_eq!(MetaFile::read(&path).unwrap(), file);
    }
}
