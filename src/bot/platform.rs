use anyhow::Result;
use async_trait::async_trait;
use serenity::{
    all::{Cache, CommandInteraction, Http},
    builder::{EditInteractionResponse, EditMessage},
    model::id::{ChannelId, GuildId, MessageId, UserId},
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Who invoked a command, where, and how to answer them.
#[derive(Clone)]
pub struct Invocation {
    pub guild_id: GuildId,
    pub user_id: UserId,
    pub user_name: String,
    pub voice: Arc<dyn VoiceDirectory>,
    pub responder: Arc<dyn Responder>,
}

impl Invocation {
    /// Voice channel the invoking user is connected to right now.
    pub fn voice_channel(&self) -> Option<ChannelId> {
        self.voice.voice_channel_of(self.guild_id, self.user_id)
    }
}

/// Answers "which voice channel is this user in".
#[cfg_attr(test, mockall::automock)]
pub trait VoiceDirectory: Send + Sync {
    fn voice_channel_of(&self, guild_id: GuildId, user_id: UserId) -> Option<ChannelId>;
}

/// Reads voice states from the gateway cache.
pub struct CacheVoiceDirectory {
    cache: Arc<Cache>,
}

impl CacheVoiceDirectory {
    pub fn new(cache: Arc<Cache>) -> Self {
        Self { cache }
    }
}

impl VoiceDirectory for CacheVoiceDirectory {
    fn voice_channel_of(&self, guild_id: GuildId, user_id: UserId) -> Option<ChannelId> {
        let guild = self.cache.guild(guild_id)?;
        guild
            .voice_states
            .get(&user_id)
            .and_then(|voice_state| voice_state.channel_id)
    }
}

/// Delivers text back through the surface a command arrived on.
///
/// Every call after the first replaces the previous response, so the last
/// call is the one the user ends up seeing.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, content: &str) -> Result<()>;
}

/// Edits the deferred response of a slash command.
pub struct InteractionResponder {
    http: Arc<Http>,
    interaction: CommandInteraction,
}

impl InteractionResponder {
    pub fn new(http: Arc<Http>, interaction: CommandInteraction) -> Self {
        Self { http, interaction }
    }
}

#[async_trait]
impl Responder for InteractionResponder {
    async fn respond(&self, content: &str) -> Result<()> {
        self.interaction
            .edit_response(
                self.http.as_ref(),
                EditInteractionResponse::new().content(content),
            )
            .await?;
        Ok(())
    }
}

/// Mensaje de texto: el primero se envía, los siguientes lo editan.
pub struct MessageResponder {
    http: Arc<Http>,
    channel_id: ChannelId,
    sent: Mutex<Option<MessageId>>,
}

impl MessageResponder {
    pub fn new(http: Arc<Http>, channel_id: ChannelId) -> Self {
        Self {
            http,
            channel_id,
            sent: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Responder for MessageResponder {
    async fn respond(&self, content: &str) -> Result<()> {
        let mut sent = self.sent.lock().await;

        match *sent {
            Some(message_id) => {
                self.channel_id
                    .edit_message(
                        self.http.as_ref(),
                        message_id,
                        EditMessage::new().content(content),
                    )
                    .await?;
                debug!("✏️ Respuesta editada en canal {}", self.channel_id);
            }
            None => {
                let message = self.channel_id.say(self.http.as_ref(), content).await?;
                *sent = Some(message.id);
            }
        }

        Ok(())
    }
}
