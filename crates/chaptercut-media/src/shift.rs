//! Moving chapter metadata between timelines.
//!
//! [`clip`] cuts a whole-file document down to one kept segment and re-zeroes
//! it. [`combine`] lays several documents end to end using the durations of
//! the files they belong to.

use crate::ffmetadata::{MetaChapter, MetaFile};
use crate::timebase::Timebase;
use std::path::{Path, PathBuf};

/// Clip chapters to `[seg_start, seg_end)` and shift them so the segment
/// starts at zero.
///
/// Chapters with no overlap are dropped. A chapter crossing a boundary is
/// truncated to the segment. Units stay in the source timebase.
pub fn clip(original: &MetaFile, seg_start: f64, seg_end: f64) -> MetaFile {
    let tb = original.timebase;
    let mut out = MetaFile::with_timebase(tb);

    for chapter in &original.chapters {
        let (ch_start, ch_end) = original.chapter_seconds(chapter);
        if ch_end <= seg_start || ch_start >= seg_end {
            continue;
        }

        let start = ch_start.max(seg_start) - seg_start;
        let end = ch_end.min(seg_end) - seg_start;
        out.chapters.push(MetaChapter::new(
            tb.seconds_to_units(start),
            tb.seconds_to_units(end),
            chapter.title.clone(),
        ));
    }

    out
}

/// [`clip`] a document read from disk and write the result.
pub fn clip_file(source: &Path, dest: &Path, seg_start: f64, seg_end: f64) -> crate::Result<()> {
    let original = MetaFile::read(source)?;
    clip(&original, seg_start, seg_end).write(dest)
}

/// Concatenate chapter documents onto one millisecond timeline.
///
/// `inputs[i]` belongs to a file lasting `durations[i]` seconds. A missing
/// document contributes no chapters but its duration still advances the
/// offset. Durations beyond the end of `inputs` are ignored and missing
/// durations count as zero.
pub fn combine(inputs: &[Option<MetaFile>], durations: &[f64]) -> MetaFile {
    let unified = Timebase::MILLIS;
    let mut out = MetaFile::with_timebase(unified);
    let mut offset = 0.0;

    for (i, input) in inputs.iter().enumerate() {
        if let Some(meta) = input {
            for chapter in &meta.chapters {
                let (start, end) = meta.chapter_seconds(chapter);
                out.chapters.push(MetaChapter::new(
                    unified.seconds_to_units(start + offset),
                    unified.seconds_to_units(end + offset),
                    chapter.title.clone(),
                ));
            }
        }
        offset += durations.get(i).copied().unwrap_or(0.0);
    }

    out
}

/// [`combine`] over metadata files on disk.
///
/// Unreadable files are logged and treated as missing.
pub fn combine_files(paths: &[Option<PathBuf>], durations: &[f64]) -> MetaFile {
    let inputs: Vec<Option<MetaFile>> = paths
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let path = path.as_deref()?;
            match MetaFile::read(path) {
                Ok(meta) => Some(meta),
                Err(e) => {
                    tracing::warn!(
                        "Skipping chapters of input {} ({}): {}",
                        i,
                        path.display(),
                        e
                    );
                    None
                }
            }
        })
        .collect();

    combine(&inputs, durations)
}
