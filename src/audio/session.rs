use anyhow::Result;
use chrono::Utc;
use serenity::model::id::GuildId;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{
    queue::{MusicQueue, QueueEntry},
    sink::AudioSink,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
}

/// Result of appending to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    /// The session was idle and the entry started playing right away.
    Started,
    /// 1-based position in the queue.
    Queued(usize),
}

/// Playback state of a single guild.
///
/// `current` is `Some` exactly when the state is `Playing` or `Paused`, and
/// the current entry is never also in `queue`.
pub struct PlaybackSession {
    guild_id: GuildId,
    queue: MusicQueue,
    current: Option<QueueEntry>,
    state: PlaybackState,
    sink: Arc<dyn AudioSink>,
    volume: u8,
    /// Incrementa con cada track iniciado o detenido; descarta avisos viejos.
    generation: u64,
}

impl PlaybackSession {
    pub fn new(guild_id: GuildId, sink: Arc<dyn AudioSink>, volume: u8) -> Self {
        Self {
            guild_id,
            queue: MusicQueue::new(),
            current: None,
            state: PlaybackState::Idle,
            sink,
            volume,
            generation: 0,
        }
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }
    pub fn state(&self) -> PlaybackState {
        self.state
    }
    pub fn current(&self) -> Option<&QueueEntry> {
        self.current.as_ref()
    }
    pub fn queue(&self) -> &MusicQueue {
        &self.queue
    }
    pub fn volume(&self) -> u8 {
        self.volume
    }
    pub fn generation(&self) -> u64 {
        self.generation
    }
    pub fn sink(&self) -> &Arc<dyn AudioSink> {
        &self.sink
    }

    /// Appends to the tail; an idle session starts playing immediately.
    pub async fn enqueue(&mut self, entry: QueueEntry) -> Result<Enqueued> {
        self.queue.add(entry);

        if self.current.is_none() {
            self.start_next().await?;
            if self.current.is_some() && self.queue.is_empty() {
                return Ok(Enqueued::Started);
            }
        }

        Ok(Enqueued::Queued(self.queue.len()))
    }

    /// Appends at most `limit` entries in order and returns how many went in.
    pub async fn enqueue_all(&mut self, entries: Vec<QueueEntry>, limit: usize) -> Result<usize> {
        let added = self.queue.add_bounded(entries, limit);

        if added > 0 && self.current.is_none() {
            self.start_next().await?;
        }

        Ok(added)
    }

    /// Engine hook: the track started with `generation` has ended.
    pub async fn track_finished(&mut self, generation: u64) -> Result<()> {
        if generation != self.generation || self.current.is_none() {
            debug!(
                "Aviso de fin ignorado en guild {} (gen {} != {})",
                self.guild_id, generation, self.generation
            );
            return Ok(());
        }

        if let Some(finished) = self.current.take() {
            debug!("🎵 Track terminado: {}", finished.title());
        }
        self.state = PlaybackState::Idle;

        // Nadie espera esta respuesta: una entrada que no arranca se descarta
        // para que el resto de la cola siga sonando.
        loop {
            let Err(e) = self.start_next().await else {
                return Ok(());
            };
            if let Some(failed) = self.queue.pop() {
                warn!(
                    "🗑️ Descartada '{}' en guild {}, quedan {} en cola",
                    failed.title(),
                    self.guild_id,
                    self.queue.len()
                );
            }
            if self.queue.is_empty() {
                return Err(e);
            }
        }
    }

    /// Stops the current track. The queue advances once the engine reports
    /// the end of that track.
    pub async fn skip(&mut self) -> Result<Option<QueueEntry>> {
        let skipped = self.current.clone();
        if skipped.is_some() {
            self.sink.stop().await?;
            info!("⏭️ Canción saltada en guild {}", self.guild_id);
        }
        Ok(skipped)
    }

    /// Flips between playing and paused and returns the new state.
    pub async fn toggle_pause(&mut self) -> Result<PlaybackState> {
        let next = match self.state {
            PlaybackState::Playing => PlaybackState::Paused,
            PlaybackState::Paused => PlaybackState::Playing,
            PlaybackState::Idle => anyhow::bail!("No hay ninguna canción reproduciéndose"),
        };

        self.sink.set_paused(next == PlaybackState::Paused).await?;
        self.state = next;

        match next {
            PlaybackState::Paused => info!("⏸️ Reproducción pausada en guild {}", self.guild_id),
            _ => info!("▶️ Reproducción reanudada en guild {}", self.guild_id),
        }
        Ok(next)
    }

    /// Detiene la reproducción, limpia la cola y libera la conexión de voz
    pub async fn stop(&mut self) -> Result<()> {
        self.queue.clear();
        let had_track = self.current.take().is_some();
        self.state = PlaybackState::Idle;
        self.generation += 1;

        if had_track {
            self.sink.stop().await?;
        }
        self.sink.disconnect().await?;

        info!("⏹️ Reproducción detenida en guild {}", self.guild_id);
        Ok(())
    }

    /// Stores an already-clamped volume and applies it to a live track.
    pub async fn set_volume(&mut self, volume: u8) -> Result<()> {
        self.volume = volume;
        if self.current.is_some() {
            self.sink.set_volume(volume).await?;
        }
        info!("🔊 Volumen ajustado a {}% en guild {}", volume, self.guild_id);
        Ok(())
    }

    async fn start_next(&mut self) -> Result<()> {
        let Some(entry) = self.queue.pop() else {
            self.current = None;
            self.state = PlaybackState::Idle;
            info!("📭 Cola vacía en guild {}", self.guild_id);
            return Ok(());
        };

        self.generation += 1;
        match self.sink.play(&entry, self.generation, self.volume).await {
            Ok(()) => {
                info!(
                    "🎵 Reproduciendo: {} (esperó {}s en cola)",
                    entry.title(),
                    entry.waited(Utc::now()).num_seconds()
                );
                self.current = Some(entry);
                self.state = PlaybackState::Playing;
                Ok(())
            }
            Err(e) => {
                warn!("❌ No se pudo iniciar '{}': {:?}", entry.title(), e);
                self.queue.requeue_front(entry);
                self.current = None;
                self.state = PlaybackState::Idle;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{entry, FakeSink, SinkCall};
    use pretty_assertions::assert_eq;

    fn session() -> (PlaybackSession, Arc<FakeSink>) {
        let sink = Arc::new(FakeSink::default());
        let session = PlaybackSession::new(GuildId::new(1), sink.clone(), 100);
        (session, sink)
    }

    fn queued_titles(session: &PlaybackSession) -> Vec<String> {
        session.queue().iter().map(|e| e.title().to_string()).collect()
    }

    #[tokio::test]
    async fn first_entry_starts_playback() {
        let (mut session, sink) = session();

        assert_eq!(session.enqueue(entry("A")).await.unwrap(), Enqueued::Started);
        assert_eq!(session.state(), PlaybackState::Playing);
        assert_eq!(session.current().map(QueueEntry::title), Some("A"));
        assert!(session.queue().is_empty());
        assert_eq!(
            sink.calls(),
            vec![SinkCall::Play { title: "A".into(), generation: 1, volume: 100 }]
        );
    }

    #[tokio::test]
    async fn later_entries_wait_in_fifo_order() {
        let (mut session, _sink) = session();
        session.enqueue(entry("A")).await.unwrap();

        assert_eq!(session.enqueue(entry("B")).await.unwrap(), Enqueued::Queued(1));
        assert_eq!(session.enqueue(entry("C")).await.unwrap(), Enqueued::Queued(2));
        assert_eq!(queued_titles(&session), vec!["B", "C"]);
    }

    #[tokio::test]
    async fn track_finished_advances_the_queue() {
        let (mut session, _sink) = session();
        session.enqueue(entry("A")).await.unwrap();
        session.enqueue(entry("B")).await.unwrap();

        let generation = session.generation();
        session.track_finished(generation).await.unwrap();
        assert_eq!(session.current().map(QueueEntry::title), Some("B"));
        assert!(session.queue().is_empty());

        let generation = session.generation();
        session.track_finished(generation).await.unwrap();
        assert_eq!(session.state(), PlaybackState::Idle);
        assert!(session.current().is_none());
    }

    #[tokio::test]
    async fn stale_track_finished_is_ignored() {
        let (mut session, _sink) = session();
        session.enqueue(entry("A")).await.unwrap();
        session.enqueue(entry("B")).await.unwrap();

        session.track_finished(session.generation() - 1).await.unwrap();
        assert_eq!(session.current().map(QueueEntry::title), Some("A"));
        assert_eq!(queued_titles(&session), vec!["B"]);
    }

    #[tokio::test]
    async fn pause_twice_restores_state() {
        let (mut session, sink) = session();
        session.enqueue(entry("A")).await.unwrap();

        assert_eq!(session.toggle_pause().await.unwrap(), PlaybackState::Paused);
        assert_eq!(session.toggle_pause().await.unwrap(), PlaybackState::Playing);
        assert!(sink.calls().ends_with(&[SinkCall::Paused(true), SinkCall::Paused(false)]));
    }

    #[tokio::test]
    async fn pause_when_idle_fails_without_change() {
        let (mut session, sink) = session();
        assert!(session.toggle_pause().await.is_err());
        assert_eq!(session.state(), PlaybackState::Idle);
        assert!(sink.calls().is_empty());
    }

    #[tokio::test]
    async fn skip_stops_without_advancing() {
        let (mut session, sink) = session();
        session.enqueue(entry("A")).await.unwrap();
        session.enqueue(entry("B")).await.unwrap();

        let skipped = session.skip().await.unwrap();
        assert_eq!(skipped.as_ref().map(QueueEntry::title), Some("A"));
        assert_eq!(sink.calls().last(), Some(&SinkCall::Stop));
        assert_eq!(queued_titles(&session), vec!["B"]);
    }

    #[tokio::test]
    async fn stop_clears_everything_and_disconnects() {
        let (mut session, sink) = session();
        session.enqueue(entry("A")).await.unwrap();
        session.enqueue(entry("B")).await.unwrap();
        let before = session.generation();

        session.stop().await.unwrap();
        assert_eq!(session.state(), PlaybackState::Idle);
        assert!(session.current().is_none());
        assert!(session.queue().is_empty());
        assert!(session.generation() > before);
        assert!(sink.calls().ends_with(&[SinkCall::Stop, SinkCall::Disconnect]));

        // El aviso del track detenido llega tarde y no debe hacer nada
        session.track_finished(before).await.unwrap();
        assert_eq!(session.state(), PlaybackState::Idle);
    }

    #[tokio::test]
    async fn failed_start_keeps_the_entry() {
        let (mut session, sink) = session();
        sink.fail_play(true);

        assert!(session.enqueue(entry("A")).await.is_err());
        assert_eq!(session.state(), PlaybackState::Idle);
        assert!(session.current().is_none());
        assert_eq!(queued_titles(&session), vec!["A"]);
    }

    #[tokio::test]
    async fn unplayable_next_entry_is_skipped() {
        let (mut session, sink) = session();
        session.enqueue(entry("A")).await.unwrap();
        session.enqueue(entry("B")).await.unwrap();
        session.enqueue(entry("C")).await.unwrap();
        sink.fail_on("B");

        session.track_finished(session.generation()).await.unwrap();
        assert_eq!(session.current().map(QueueEntry::title), Some("C"));
        assert_eq!(session.state(), PlaybackState::Playing);
        assert!(session.queue().is_empty());
    }

    #[tokio::test]
    async fn queue_drains_when_nothing_can_play() {
        let (mut session, sink) = session();
        session.enqueue(entry("A")).await.unwrap();
        session.enqueue(entry("B")).await.unwrap();
        session.enqueue(entry("C")).await.unwrap();
        sink.fail_play(true);

        assert!(session.track_finished(session.generation()).await.is_err());
        assert_eq!(session.state(), PlaybackState::Idle);
        assert!(session.current().is_none());
        assert!(session.queue().is_empty());
    }

    #[tokio::test]
    async fn enqueue_all_respects_limit_and_starts() {
        let (mut session, _sink) = session();
        let entries = (0..75).map(|i| entry(&format!("T{i}"))).collect();

        assert_eq!(session.enqueue_all(entries, 50).await.unwrap(), 50);
        assert_eq!(session.current().map(QueueEntry::title), Some("T0"));
        assert_eq!(session.queue().len(), 49);
    }

    #[tokio::test]
    async fn volume_reaches_a_live_track() {
        let (mut session, sink) = session();
        session.set_volume(40).await.unwrap();
        assert!(sink.calls().is_empty());

        session.enqueue(entry("A")).await.unwrap();
        session.set_volume(120).await.unwrap();
        assert_eq!(session.volume(), 120);
        assert_eq!(sink.calls().last(), Some(&SinkCall::Volume(120)));
    }
}
