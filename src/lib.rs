//! # Open Jukebox
//!
//! Playback orchestration for a Discord voice bot: per-guild sessions and
//! queues, one command surface for slash commands and prefixed messages, and
//! dispatch of asynchronous track resolution results.

pub mod audio;
pub mod bot;
pub mod config;
pub mod error;
pub mod sources;
pub mod ui;

#[cfg(test)]
pub(crate) mod testing;
