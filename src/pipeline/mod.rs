//! Processing pipeline: per-episode trimming, part merging and the batch
//! run that drives both.

pub mod batch;
pub mod episode;
pub mod merge;
pub mod subtitles;

pub use batch::{run_batch, BatchReport, BatchRequest, FailedEpisode, TrimOptions};
pub use episode::{process_episode, EpisodeOutput};
pub use merge::{merge_part, partition};
pub use subtitles::combine_part_subtitles;
