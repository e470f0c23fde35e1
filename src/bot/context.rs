use std::sync::Arc;

use crate::{audio::registry::SessionRegistry, config::PlaybackConfig, sources::TrackResolver};

/// Everything a handler needs, handed over explicitly at construction.
#[derive(Clone)]
pub struct BotContext {
    pub registry: Arc<SessionRegistry>,
    pub resolver: Arc<dyn TrackResolver>,
    pub config: Arc<PlaybackConfig>,
}

impl BotContext {
    pub fn new(
        registry: Arc<SessionRegistry>,
        resolver: Arc<dyn TrackResolver>,
        config: Arc<PlaybackConfig>,
    ) -> Self {
        Self {
            registry,
            resolver,
            config,
        }
    }
}
