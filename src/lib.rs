//! chaptercut - remove chapter-anchored ranges from a folder of episodes and
//! merge what survives into a number of parts.
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod library;
pub mod pipeline;
pub mod scan;
pub mod server;
pub mod state;
