use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{
    bridge::CommandKind,
    context::BotContext,
    dispatcher::{self, LoadRequest},
    platform::Invocation,
};
use crate::{
    audio::queue::QueueEntry, error::CommandError, sources::resolve_identifier, ui::replies,
};

/// What a handler leaves behind once it returns.
pub enum Outcome {
    /// Final text for the invocation.
    Reply(String),
    /// A resolve request that will send the final text itself.
    Pending(JoinHandle<()>),
}

/// Runs one command against its guild's session.
pub async fn run(
    kind: CommandKind,
    ctx: Arc<BotContext>,
    invocation: Invocation,
    args: String,
) -> Result<Outcome, CommandError> {
    match kind {
        CommandKind::Play => handle_play(&ctx, &invocation, &args).await,
        CommandKind::Skip => handle_skip(&ctx, &invocation).await.map(Outcome::Reply),
        CommandKind::Queue => handle_queue(&ctx, &invocation).await.map(Outcome::Reply),
        CommandKind::NowPlaying => handle_nowplaying(&ctx, &invocation)
            .await
            .map(Outcome::Reply),
        CommandKind::Stop => handle_stop(&ctx, &invocation).await.map(Outcome::Reply),
        CommandKind::Pause => handle_pause(&ctx, &invocation).await.map(Outcome::Reply),
        CommandKind::Volume => handle_volume(&ctx, &invocation, &args)
            .await
            .map(Outcome::Reply),
    }
}

async fn handle_play(
    ctx: &BotContext,
    invocation: &Invocation,
    args: &str,
) -> Result<Outcome, CommandError> {
    let query = args.trim();
    if query.is_empty() {
        return Err(CommandError::EmptyQuery);
    }

    if invocation.voice_channel().is_none() {
        return Err(CommandError::NotInVoiceChannel);
    }

    ctx.registry.get_or_create(invocation.guild_id);
    let identifier = resolve_identifier(query, &ctx.config);
    debug!("🔍 '{}' se resolverá como '{}'", query, identifier);

    invocation
        .responder
        .respond(&replies::loading(query))
        .await
        .map_err(|e| CommandError::internal("sending response", e))?;

    let request = LoadRequest {
        registry: ctx.registry.clone(),
        guild_id: invocation.guild_id,
        requester: invocation.user_id,
        query: query.to_string(),
        identifier,
        voice: invocation.voice.clone(),
        responder: invocation.responder.clone(),
        playlist_limit: ctx.config.max_playlist_size,
    };

    let pending = tokio::spawn(dispatcher::resolve_and_dispatch(
        ctx.resolver.clone(),
        request,
    ));
    Ok(Outcome::Pending(pending))
}

async fn handle_skip(ctx: &BotContext, invocation: &Invocation) -> Result<String, CommandError> {
    let session = ctx
        .registry
        .get(invocation.guild_id)
        .ok_or(CommandError::NoActiveSession)?;
    let mut session = session.lock().await;

    let skipped = session
        .skip()
        .await
        .map_err(|e| CommandError::internal("skipping track", e))?
        .ok_or(CommandError::NoActiveSession)?;

    Ok(replies::skipped(skipped.title()))
}

async fn handle_queue(ctx: &BotContext, invocation: &Invocation) -> Result<String, CommandError> {
    let Some(session) = ctx.registry.get(invocation.guild_id) else {
        return Ok(replies::queue_empty());
    };
    let session = session.lock().await;

    let preview = session.queue().preview(ctx.config.queue_display_limit);
    Ok(replies::queue_listing(
        session.current().map(QueueEntry::track),
        &preview,
    ))
}

async fn handle_nowplaying(
    ctx: &BotContext,
    invocation: &Invocation,
) -> Result<String, CommandError> {
    let session = ctx
        .registry
        .get(invocation.guild_id)
        .ok_or(CommandError::NothingPlaying)?;
    let session = session.lock().await;

    let current = session.current().ok_or(CommandError::NothingPlaying)?;
    Ok(replies::now_playing(current.track()))
}

async fn handle_stop(ctx: &BotContext, invocation: &Invocation) -> Result<String, CommandError> {
    let session = ctx
        .registry
        .get(invocation.guild_id)
        .ok_or(CommandError::NoSession)?;
    let mut session = session.lock().await;

    session
        .stop()
        .await
        .map_err(|e| CommandError::internal("stopping playback", e))?;

    Ok(replies::stopped())
}

async fn handle_pause(ctx: &BotContext, invocation: &Invocation) -> Result<String, CommandError> {
    let session = ctx
        .registry
        .get(invocation.guild_id)
        .ok_or(CommandError::NothingPlaying)?;
    let mut session = session.lock().await;

    let title = session
        .current()
        .map(|entry| entry.title().to_string())
        .ok_or(CommandError::NothingPlaying)?;

    let state = session
        .toggle_pause()
        .await
        .map_err(|e| CommandError::internal("toggling pause", e))?;

    Ok(replies::pause_toggled(state, &title))
}

async fn handle_volume(
    ctx: &BotContext,
    invocation: &Invocation,
    args: &str,
) -> Result<String, CommandError> {
    let session = ctx
        .registry
        .get(invocation.guild_id)
        .ok_or(CommandError::NoSession)?;
    let mut session = session.lock().await;

    let input = args.trim();
    if input.is_empty() {
        return Ok(replies::volume_current(session.volume()));
    }

    let requested: i64 = input.parse().map_err(|_| CommandError::InvalidVolume {
        input: input.to_string(),
        max: ctx.config.max_volume,
    })?;
    let volume = ctx.config.clamp_volume(requested);

    session
        .set_volume(volume)
        .await
        .map_err(|e| CommandError::internal("setting volume", e))?;

    info!(
        "🔊 {} ajustó el volumen a {}% en guild {}",
        invocation.user_name, volume, invocation.guild_id
    );
    Ok(replies::volume_set(volume))
}
