use anyhow::Result;
use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use std::sync::Arc;

use super::queue::QueueEntry;

/// Per-guild audio output owned by the playback engine.
///
/// The sink never decides what plays next; it reports the end of every
/// track it was asked to play as a [`TrackFinished`] carrying the
/// generation passed to [`AudioSink::play`].
#[async_trait]
pub trait AudioSink: Send + Sync {
    async fn is_connected(&self) -> bool;

    async fn connect(&self, channel_id: ChannelId) -> Result<()>;

    /// Releases the voice connection. No-op when not connected.
    async fn disconnect(&self) -> Result<()>;

    async fn play(&self, entry: &QueueEntry, generation: u64, volume: u8) -> Result<()>;

    /// Stops the current track, which must produce its `TrackFinished`.
    async fn stop(&self) -> Result<()>;

    async fn set_paused(&self, paused: bool) -> Result<()>;

    async fn set_volume(&self, volume: u8) -> Result<()>;
}

/// Creates a fresh sink for a guild's first session.
pub trait SinkFactory: Send + Sync {
    fn create(&self, guild_id: GuildId) -> Arc<dyn AudioSink>;
}

/// "Track finished" notification from the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackFinished {
    pub guild_id: GuildId,
    pub generation: u64,
}
