use dashmap::DashMap;
use serenity::model::id::GuildId;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::{
    session::PlaybackSession,
    sink::{SinkFactory, TrackFinished},
};

pub type SharedSession = Arc<Mutex<PlaybackSession>>;

/// Guild → session map. Sessions are independent, so each has its own lock.
pub struct SessionRegistry {
    sessions: DashMap<GuildId, SharedSession>,
    sinks: Arc<dyn SinkFactory>,
    default_volume: u8,
}

impl SessionRegistry {
    pub fn new(sinks: Arc<dyn SinkFactory>, default_volume: u8) -> Self {
        Self {
            sessions: DashMap::new(),
            sinks,
            default_volume,
        }
    }

    /// Returns the guild's session, creating it (and its sink) on first use.
    ///
    /// The shard lock held by `entry` makes concurrent first calls for the
    /// same guild construct exactly one session.
    pub fn get_or_create(&self, guild_id: GuildId) -> SharedSession {
        self.sessions
            .entry(guild_id)
            .or_insert_with(|| {
                info!("🎛️ Nueva sesión de reproducción para guild {}", guild_id);
                let sink = self.sinks.create(guild_id);
                Arc::new(Mutex::new(PlaybackSession::new(
                    guild_id,
                    sink,
                    self.default_volume,
                )))
            })
            .clone()
    }

    pub fn get(&self, guild_id: GuildId) -> Option<SharedSession> {
        self.sessions.get(&guild_id).map(|s| s.clone())
    }

    pub fn exists(&self, guild_id: GuildId) -> bool {
        self.sessions.contains_key(&guild_id)
    }

    /// Drops the guild's session, e.g. after the bot left the voice channel.
    pub fn remove(&self, guild_id: GuildId) -> Option<SharedSession> {
        let removed = self.sessions.remove(&guild_id).map(|(_, s)| s);
        if removed.is_some() {
            info!("🧹 Sesión eliminada para guild {}", guild_id);
        }
        removed
    }

    /// Drops and stops the guild's session after a voice leave event.
    ///
    /// A leave event can arrive after the session already rejoined a channel;
    /// a session whose sink is still connected is kept. Returns whether the
    /// session was released.
    pub async fn release_disconnected(&self, guild_id: GuildId) -> bool {
        let Some(shared) = self.get(guild_id) else {
            return false;
        };

        let mut session = shared.lock().await;
        if session.sink().is_connected().await {
            debug!("Aviso de salida ignorado: guild {} sigue conectada", guild_id);
            return false;
        }

        let removed = self
            .sessions
            .remove_if(&guild_id, |_, current| Arc::ptr_eq(current, &shared))
            .is_some();
        if !removed {
            return false;
        }
        info!("🧹 Sesión eliminada para guild {}", guild_id);

        if let Err(e) = session.stop().await {
            warn!("Error al detener reproducción en guild {}: {:?}", guild_id, e);
        }
        true
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Routes an engine "track finished" notification to its session.
    pub async fn track_finished(&self, event: TrackFinished) {
        let Some(session) = self.get(event.guild_id) else {
            debug!("Fin de track para guild {} sin sesión", event.guild_id);
            return;
        };

        let mut session = session.lock().await;
        if let Err(e) = session.track_finished(event.generation).await {
            error!(
                "Error al reproducir siguiente track en guild {}: {:?}",
                event.guild_id, e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        audio::session::PlaybackState,
        testing::{entry, FakeSinkFactory},
    };
    use serenity::model::id::ChannelId;
    use pretty_assertions::assert_eq;

    fn registry() -> (Arc<SessionRegistry>, Arc<FakeSinkFactory>) {
        let factory = Arc::new(FakeSinkFactory::default());
        (Arc::new(SessionRegistry::new(factory.clone(), 100)), factory)
    }

    #[test]
    fn get_or_create_is_idempotent() {
        let (registry, factory) = registry();
        let guild = GuildId::new(10);

        assert!(!registry.exists(guild));
        let first = registry.get_or_create(guild);
        let second = registry.get_or_create(guild);

        assert!(Arc::ptr_eq(&first, &second));
        assert!(registry.exists(guild));
        assert_eq!(factory.created(), 1);
    }

    #[test]
    fn guilds_are_isolated() {
        let (registry, factory) = registry();
        let a = registry.get_or_create(GuildId::new(1));
        let b = registry.get_or_create(GuildId::new(2));

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 2);
        assert_eq!(factory.created(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_use_builds_one_session() {
        let (registry, factory) = registry();
        let guild = GuildId::new(42);

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..32 {
            let registry = registry.clone();
            tasks.spawn(async move { registry.get_or_create(guild) });
        }

        let mut sessions = Vec::new();
        while let Some(session) = tasks.join_next().await {
            sessions.push(session.unwrap());
        }

        assert_eq!(factory.created(), 1);
        assert!(sessions.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn get_does_not_create() {
        let (registry, factory) = registry();
        assert!(registry.get(GuildId::new(5)).is_none());
        assert!(registry.is_empty());
        assert_eq!(factory.created(), 0);
    }

    #[tokio::test]
    async fn routes_track_finished_to_the_session() {
        let (registry, _factory) = registry();
        let guild = GuildId::new(3);
        let session = registry.get_or_create(guild);
        {
            let mut session = session.lock().await;
            session.enqueue(entry("A")).await.unwrap();
            session.enqueue(entry("B")).await.unwrap();
        }

        let generation = session.lock().await.generation();
        registry
            .track_finished(TrackFinished { guild_id: guild, generation })
            .await;

        let session = session.lock().await;
        assert_eq!(session.current().map(|e| e.title()), Some("B"));
    }

    #[tokio::test]
    async fn remove_forgets_the_session() {
        let (registry, factory) = registry();
        let guild = GuildId::new(9);
        registry.get_or_create(guild);

        assert!(registry.remove(guild).is_some());
        assert!(!registry.exists(guild));

        registry.get_or_create(guild);
        assert_eq!(factory.created(), 2);
    }

    #[tokio::test]
    async fn leave_event_releases_a_disconnected_session() {
        let (registry, _factory) = registry();
        let guild = GuildId::new(11);
        let session = registry.get_or_create(guild);
        session.lock().await.enqueue(entry("A")).await.unwrap();

        assert!(registry.release_disconnected(guild).await);
        assert!(!registry.exists(guild));
        let session = session.lock().await;
        assert_eq!(session.state(), PlaybackState::Idle);
        assert!(session.current().is_none());
    }

    #[tokio::test]
    async fn late_leave_event_keeps_a_reconnected_session() {
        let (registry, _factory) = registry();
        let guild = GuildId::new(12);
        let session = registry.get_or_create(guild);
        {
            let mut session = session.lock().await;
            session.sink().connect(ChannelId::new(7)).await.unwrap();
            session.enqueue(entry("A")).await.unwrap();
        }

        assert!(!registry.release_disconnected(guild).await);
        assert!(registry.exists(guild));
        assert_eq!(
            session.lock().await.current().map(|e| e.title()),
            Some("A")
        );
    }

    #[tokio::test]
    async fn leave_event_without_a_session_is_a_no_op() {
        let (registry, factory) = registry();
        assert!(!registry.release_disconnected(GuildId::new(13)).await);
        assert_eq!(factory.created(), 0);
    }
}
