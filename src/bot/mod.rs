//! # Bot Module
//!
//! Discord surface of Open Jukebox.
//!
//! ## Architecture
//!
//! The [`JukeboxBot`] struct implements Serenity's [`EventHandler`] trait and
//! turns gateway events into normalized commands:
//!
//! - Slash commands are deferred, then routed through the [`bridge::CommandBridge`]
//! - Prefixed text messages take the same route
//! - [`handlers`] run each verb against the guild's playback session
//! - [`dispatcher`] applies the outcome of an asynchronous track resolution
//! - When the bot leaves a voice channel its session is dropped
//!
//! ## Example
//!
//! ```rust,ignore
//! let ctx = Arc::new(BotContext::new(registry, resolver, playback));
//! let bot = JukeboxBot::new(config, ctx);
//! let client = Client::builder(&token, intents).event_handler(bot).await?;
//! ```

use anyhow::Result;
use serenity::{
    all::{Context, EventHandler, GuildId, Interaction, Message, Ready, UserId, VoiceState},
    async_trait,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub mod bridge;
pub mod commands;
pub mod context;
pub mod dispatcher;
pub mod handlers;
pub mod platform;

use self::{
    bridge::{CommandBridge, Dispatch, NormalizedCommand},
    context::BotContext,
    platform::{
        CacheVoiceDirectory, InteractionResponder, Invocation, MessageResponder, Responder,
    },
};
use crate::{audio::registry::SessionRegistry, config::Config, ui::replies};

/// Serenity event handler that feeds both command surfaces into one bridge.
pub struct JukeboxBot {
    config: Arc<Config>,
    bridge: CommandBridge,
    registry: Arc<SessionRegistry>,
}

impl JukeboxBot {
    pub fn new(config: Arc<Config>, ctx: Arc<BotContext>) -> Self {
        Self {
            config,
            registry: ctx.registry.clone(),
            bridge: CommandBridge::new(ctx),
        }
    }

    /// Registers slash commands with Discord.
    ///
    /// With `GUILD_ID` set they are registered on that guild only, which
    /// propagates in seconds instead of up to an hour.
    async fn register_commands(&self, ctx: &Context) -> Result<()> {
        info!("📝 Registrando comandos slash...");

        match self.config.guild_id {
            Some(guild_id) => {
                let guild_id = GuildId::from(guild_id);

                if !ctx.cache.guilds().contains(&guild_id) {
                    warn!("⚠️ El bot no está en la guild especificada: {}", guild_id);
                    return Ok(());
                }

                commands::register_guild_commands(ctx, guild_id)
                    .await
                    .map_err(|e| {
                        error!("❌ Error registrando comandos de guild: {:?}", e);
                        anyhow::anyhow!("No se pudieron registrar comandos de guild. Verifica que el bot tenga permisos de 'applications.commands' en la guild.")
                    })?;
                info!("✅ Comandos de guild registrados para: {}", guild_id);
            }
            None => {
                commands::register_global_commands(ctx).await.map_err(|e| {
                    error!("❌ Error registrando comandos globales: {:?}", e);
                    anyhow::anyhow!("No se pudieron registrar comandos globales. Verifica que el bot tenga permisos de 'applications.commands'.")
                })?;
                info!("✅ Comandos globales registrados");
            }
        }

        Ok(())
    }

    fn invocation(
        &self,
        ctx: &Context,
        guild_id: GuildId,
        user_id: UserId,
        user_name: &str,
        responder: Arc<dyn Responder>,
    ) -> Invocation {
        Invocation {
            guild_id,
            user_id,
            user_name: user_name.to_string(),
            voice: Arc::new(CacheVoiceDirectory::new(ctx.cache.clone())),
            responder,
        }
    }

    fn note_pending(name: &str, dispatch: &Dispatch) {
        if dispatch.is_pending() {
            debug!("⏳ {} sigue resolviendo en segundo plano", name);
        }
    }
}

#[async_trait]
impl EventHandler for JukeboxBot {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🤖 {} está en línea!", ready.user.name);
        info!("📊 Conectado a {} servidores", ready.guilds.len());

        if let Err(e) = self.register_commands(&ctx).await {
            error!("Error al registrar comandos: {:?}", e);
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };

        // Discord exige respuesta en 3 segundos: se difiere antes de todo
        if let Err(e) = command.defer(&ctx.http).await {
            error!("Error al diferir interacción /{}: {:?}", command.data.name, e);
            return;
        }

        let normalized = NormalizedCommand::from_interaction(
            &command.data.name,
            bridge::option_values(&command.data.options),
        );
        let user_id = command.user.id;
        let user_name = command.user.name.clone();
        let guild_id = command.guild_id;
        let responder: Arc<dyn Responder> =
            Arc::new(InteractionResponder::new(ctx.http.clone(), command));

        let Some(guild_id) = guild_id else {
            if let Err(e) = responder.respond(&replies::guild_only()).await {
                error!("Error al responder fuera de servidor: {:?}", e);
            }
            return;
        };

        let invocation = self.invocation(&ctx, guild_id, user_id, &user_name, responder);
        let name = normalized.name.clone();
        let dispatch = self.bridge.dispatch(normalized, invocation).await;
        Self::note_pending(&name, &dispatch);
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let Some(guild_id) = msg.guild_id else {
            return;
        };
        let Some(command) = NormalizedCommand::from_text(&msg.content, &self.config.command_prefix)
        else {
            return;
        };

        let responder = Arc::new(MessageResponder::new(ctx.http.clone(), msg.channel_id));
        let invocation = self.invocation(&ctx, guild_id, msg.author.id, &msg.author.name, responder);
        let name = command.name.clone();
        if let Some(dispatch) = self.bridge.dispatch_text(command, invocation).await {
            Self::note_pending(&name, &dispatch);
        }
    }

    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        let current_user_id = ctx.cache.current_user().id;
        if new.user_id != current_user_id || old.is_none() || new.channel_id.is_some() {
            return;
        }
        let Some(guild_id) = new.guild_id else {
            return;
        };

        info!("🔌 Bot desconectado en guild {}", guild_id);
        if !self.registry.release_disconnected(guild_id).await {
            debug!("Sesión de guild {} conservada tras la salida", guild_id);
        }
    }
}
