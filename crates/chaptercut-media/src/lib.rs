//! Chaptercut-Media: chapter, timebase and subtitle timing algebra
//!
//! This crate holds everything chaptercut does to timestamps without touching
//! a media file. Reading and writing files is limited to the small text
//! documents (ffmetadata chapter files and subtitles) that the media tool
//! produces and consumes.
//!
//! # Modules
//!
//! - `timebase` - Integer metadata units to and from seconds
//! - `chapters` - Ordered chapter markers with the `End` sentinel
//! - `ffmetadata` - `;FFMETADATA1` chapter document codec
//! - `segments` - Keep-segment planning from chapter-named skip ranges
//! - `shift` - Clipping chapters to a segment, combining across files
//! - `subtitles` - SRT/ASS timestamp shifting and SRT concatenation
//!
//! # Example
//!
//! ```
//! use chaptercut_media::{compute_keep_segments, ChapterSet, Segment, SkipRange};
//!
//! let chapters = ChapterSet::from_starts(
//!     vec![(Some("Opening"), 0.0), (Some("Episode"), 90.0)],
//!     1400.0,
//! );
//! let keep = compute_keep_segments(&chapters, &[SkipRange::new("Opening", "Episode")]);
//! assert_eq!(keep, vec![Segment::new(90.0, 1400.0)]);
//! ```

pub mod chapters;
pub mod error;
pub mod ffmetadata;
pub mod segments;
pub mod shift;
pub mod subtitles;
pub mod timebase;

pub use chapters::{synthesized_title, Chapter, ChapterId, ChapterSet, END_CHAPTER};
pub use error::{Error, Result};
pub use ffmetadata::{MetaChapter, MetaFile};
pub use segments::{compute_keep_segments, Segment, SkipRange};
pub use shift::{clip, clip_file, combine, combine_files};
pub use subtitles::{combine_srt, shift_document, SubtitleFormat};
pub use timebase::{seconds_to_units, units_to_seconds, Timebase};
