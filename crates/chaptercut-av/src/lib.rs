//! # chaptercut-av
//!
//! The external media tool boundary of chaptercut.
//!
//! This crate provides:
//! - [`ToolCommand`], an async subprocess builder with a deadline that kills
//!   the child on expiry and reports the tool's combined output on failure
//! - ffprobe parsing into chapter sets, durations and stream lists
//! - ffmpeg stream-copy operations: metadata extraction, trimming,
//!   concatenation, metadata reapplication, subtitle extraction
//! - the [`MediaTool`] trait the processing pipeline is written against, with
//!   [`FfmpegTool`] as the real implementation
//! - [`Workspace`], the per-run registry of intermediate files
//!
//! ## Example
//!
//! ```no_run
//! use chaptercut_av::{FfmpegTool, MediaTool};
//! use std::path::Path;
//!
//! # async fn example() -> chaptercut_av::Result<()> {
//! let tool = FfmpegTool::default();
//! let chapters = tool.probe_chapters(Path::new("/tv/Show/ep01.mkv")).await?;
//! for name in chapters.names() {
//!     println!("{}", name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod command;
mod error;
pub mod media_tool;
pub mod probe;
pub mod tools;
pub mod workspace;

// Re-exports
pub use command::{ToolCommand, ToolOutput};
pub use error::{Error, Result};
pub use media_tool::{FfmpegTool, MediaTool, Timeouts};
pub use probe::{AudioTrack, SubtitleTrack};
pub use tools::{check_tool, check_tools, require_tool, resolve_tool, ToolInfo};
pub use workspace::{ArtifactKind, Workspace};
