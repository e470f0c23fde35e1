//! Recording fakes shared by the unit tests.

use anyhow::Result;
use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId, UserId};
use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use crate::{
    audio::{
        queue::QueueEntry,
        sink::{AudioSink, SinkFactory},
    },
    bot::platform::{Invocation, MockVoiceDirectory, Responder, VoiceDirectory},
    sources::Track,
};

pub fn track(title: &str) -> Track {
    Track::new(title, format!("https://example.com/{title}"))
}

pub fn entry(title: &str) -> QueueEntry {
    QueueEntry::new(track(title), UserId::new(1), title)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Connect(ChannelId),
    Disconnect,
    Play {
        title: String,
        generation: u64,
        volume: u8,
    },
    Stop,
    Paused(bool),
    Volume(u8),
}

#[derive(Default)]
pub struct FakeSink {
    calls: Mutex<Vec<SinkCall>>,
    connected: AtomicBool,
    fail_play: AtomicBool,
    refused: Mutex<HashSet<String>>,
}

impl FakeSink {
    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_play(&self, fail: bool) {
        self.fail_play.store(fail, Ordering::SeqCst);
    }

    /// Refuses to play the entry with this title.
    pub fn fail_on(&self, title: &str) {
        self.refused.lock().unwrap().insert(title.to_string());
    }

    fn record(&self, call: SinkCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl AudioSink for FakeSink {
    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self, channel_id: ChannelId) -> Result<()> {
        self.connected.store(true, Ordering::SeqCst);
        self.record(SinkCall::Connect(channel_id));
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        self.record(SinkCall::Disconnect);
        Ok(())
    }

    async fn play(&self, entry: &QueueEntry, generation: u64, volume: u8) -> Result<()> {
        if self.fail_play.load(Ordering::SeqCst)
            || self.refused.lock().unwrap().contains(entry.title())
        {
            anyhow::bail!("playback refused");
        }
        self.record(SinkCall::Play {
            title: entry.title().to_string(),
            generation,
            volume,
        });
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.record(SinkCall::Stop);
        Ok(())
    }

    async fn set_paused(&self, paused: bool) -> Result<()> {
        self.record(SinkCall::Paused(paused));
        Ok(())
    }

    async fn set_volume(&self, volume: u8) -> Result<()> {
        self.record(SinkCall::Volume(volume));
        Ok(())
    }
}

/// Hands out one [`FakeSink`] per guild and remembers it.
#[derive(Default)]
pub struct FakeSinkFactory {
    sinks: Mutex<HashMap<GuildId, Arc<FakeSink>>>,
    created: Mutex<usize>,
}

impl FakeSinkFactory {
    pub fn created(&self) -> usize {
        *self.created.lock().unwrap()
    }

    pub fn sink(&self, guild_id: GuildId) -> Option<Arc<FakeSink>> {
        self.sinks.lock().unwrap().get(&guild_id).cloned()
    }
}

impl SinkFactory for FakeSinkFactory {
    fn create(&self, guild_id: GuildId) -> Arc<dyn AudioSink> {
        *self.created.lock().unwrap() += 1;
        let sink = Arc::new(FakeSink::default());
        self.sinks.lock().unwrap().insert(guild_id, sink.clone());
        sink
    }
}

#[derive(Default)]
pub struct RecordingResponder {
    responses: Mutex<Vec<String>>,
}

impl RecordingResponder {
    pub fn responses(&self) -> Vec<String> {
        self.responses.lock().unwrap().clone()
    }
}

#[async_trait]
impl Responder for RecordingResponder {
    async fn respond(&self, content: &str) -> Result<()> {
        self.responses.lock().unwrap().push(content.to_string());
        Ok(())
    }
}

/// Voice directory where every user sits in `channel`.
pub fn voice_in(channel: Option<ChannelId>) -> Arc<dyn VoiceDirectory> {
    let mut voice = MockVoiceDirectory::new();
    voice
        .expect_voice_channel_of()
        .returning(move |_, _| channel);
    Arc::new(voice)
}

pub fn invocation(
    guild_id: GuildId,
    channel: Option<ChannelId>,
    responder: Arc<RecordingResponder>,
) -> Invocation {
    Invocation {
        guild_id,
        user_id: UserId::new(5),
        user_name: "tester".to_string(),
        voice: voice_in(channel),
        responder,
    }
}
