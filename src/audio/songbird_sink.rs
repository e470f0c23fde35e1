use anyhow::Result;
use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use songbird::{
    input::{Input, YoutubeDl},
    tracks::TrackHandle,
    Event, EventContext, EventHandler as VoiceEventHandler, Songbird, TrackEvent,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use super::{
    queue::QueueEntry,
    registry::SessionRegistry,
    sink::{AudioSink, SinkFactory, TrackFinished},
};

/// Crea un [`SongbirdSink`] por guild compartiendo el manager de voz.
pub struct SongbirdSinkFactory {
    manager: Arc<Songbird>,
    http: reqwest::Client,
    program: &'static str,
    finished: flume::Sender<TrackFinished>,
}

impl SongbirdSinkFactory {
    /// `program` is the yt-dlp compatible binary songbird spawns to stream audio.
    pub fn new(
        manager: Arc<Songbird>,
        http: reqwest::Client,
        program: &'static str,
        finished: flume::Sender<TrackFinished>,
    ) -> Self {
        Self {
            manager,
            http,
            program,
            finished,
        }
    }

    fn build(&self, guild_id: GuildId) -> SongbirdSink {
        SongbirdSink {
            guild_id,
            manager: self.manager.clone(),
            http: self.http.clone(),
            program: self.program,
            finished: self.finished.clone(),
            current: Mutex::new(None),
        }
    }
}

impl SinkFactory for SongbirdSinkFactory {
    fn create(&self, guild_id: GuildId) -> Arc<dyn AudioSink> {
        Arc::new(self.build(guild_id))
    }
}

/// Voice connection and current track handle of one guild.
pub struct SongbirdSink {
    guild_id: GuildId,
    manager: Arc<Songbird>,
    http: reqwest::Client,
    program: &'static str,
    finished: flume::Sender<TrackFinished>,
    current: Mutex<Option<TrackHandle>>,
}

fn gain(volume: u8) -> f32 {
    f32::from(volume) / 100.0
}

#[async_trait]
impl AudioSink for SongbirdSink {
    async fn is_connected(&self) -> bool {
        match self.manager.get(self.guild_id) {
            Some(call) => call.lock().await.current_channel().is_some(),
            None => false,
        }
    }

    async fn connect(&self, channel_id: ChannelId) -> Result<()> {
        self.manager
            .join(self.guild_id, channel_id)
            .await
            .map_err(|e| anyhow::anyhow!("Error al unirse al canal: {:?}", e))?;

        info!("🔊 Conectado al canal {} en guild {}", channel_id, self.guild_id);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.current.lock().await.take();

        if self.manager.get(self.guild_id).is_some() {
            self.manager
                .remove(self.guild_id)
                .await
                .map_err(|e| anyhow::anyhow!("Error al salir del canal: {:?}", e))?;
            info!("👋 Desconectado del guild {}", self.guild_id);
        }
        Ok(())
    }

    async fn play(&self, entry: &QueueEntry, generation: u64, volume: u8) -> Result<()> {
        let call = self
            .manager
            .get(self.guild_id)
            .ok_or_else(|| anyhow::anyhow!("No hay conexión de voz para este guild"))?;

        let input: Input = YoutubeDl::new_ytdl_like(
            self.program,
            self.http.clone(),
            entry.resolved_uri().to_string(),
        )
        .into();
        let handle = call.lock().await.play_input(input);

        handle
            .set_volume(gain(volume))
            .map_err(|e| anyhow::anyhow!("Error al ajustar volumen: {:?}", e))?;

        for event in [TrackEvent::End, TrackEvent::Error] {
            handle
                .add_event(
                    Event::Track(event),
                    TrackEndNotifier {
                        finished: self.finished.clone(),
                        event: TrackFinished {
                            guild_id: self.guild_id,
                            generation,
                        },
                    },
                )
                .map_err(|e| anyhow::anyhow!("Error al agregar event handler: {}", e))?;
        }

        *self.current.lock().await = Some(handle);
        debug!("🎵 Track en songbird: {} (gen {})", entry.title(), generation);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        if let Some(handle) = self.current.lock().await.take() {
            handle
                .stop()
                .map_err(|e| anyhow::anyhow!("Error al detener: {:?}", e))?;
        }
        Ok(())
    }

    async fn set_paused(&self, paused: bool) -> Result<()> {
        let current = self.current.lock().await;
        let handle = current
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("No hay ninguna canción reproduciéndose"))?;

        let result = if paused { handle.pause() } else { handle.play() };
        result.map_err(|e| anyhow::anyhow!("Error al pausar/reanudar: {:?}", e))
    }

    async fn set_volume(&self, volume: u8) -> Result<()> {
        if let Some(handle) = self.current.lock().await.as_ref() {
            handle
                .set_volume(gain(volume))
                .map_err(|e| anyhow::anyhow!("Error al ajustar volumen: {:?}", e))?;
        }
        Ok(())
    }
}

/// Handler para cuando termina (o falla) un track
struct TrackEndNotifier {
    finished: flume::Sender<TrackFinished>,
    event: TrackFinished,
}

#[async_trait]
impl VoiceEventHandler for TrackEndNotifier {
    async fn act(&self, _ctx: &EventContext<'_>) -> Option<Event> {
        debug!("Track terminado en guild {}", self.event.guild_id);

        if let Err(e) = self.finished.send_async(self.event).await {
            warn!("No se pudo notificar fin de track: {:?}", e);
        }

        None
    }
}

/// Consume los avisos de fin de track y avanza la cola correspondiente.
pub async fn forward_track_events(
    registry: Arc<SessionRegistry>,
    events: flume::Receiver<TrackFinished>,
) {
    while let Ok(event) = events.recv_async().await {
        registry.track_finished(event).await;
    }
    error!("Canal de eventos de audio cerrado");
}
