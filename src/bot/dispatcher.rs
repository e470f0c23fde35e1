//! Load Result Dispatcher: turns the one [`LoadResult`] of a resolve request
//! into queue mutations and the final reply for that request.

use serenity::model::id::{GuildId, UserId};
use std::sync::Arc;
use tracing::{error, info};

use super::platform::{Responder, VoiceDirectory};
use crate::{
    audio::{
        queue::QueueEntry,
        registry::SessionRegistry,
        session::{Enqueued, PlaybackSession},
    },
    error::CommandError,
    sources::{LoadResult, Track, TrackCollection, TrackResolver},
    ui::replies,
};

const ADDING_TRACK: &str = "adding track";

/// One in-flight resolve request and everything its outcome needs.
pub struct LoadRequest {
    pub registry: Arc<SessionRegistry>,
    pub guild_id: GuildId,
    pub requester: UserId,
    pub query: String,
    pub identifier: String,
    pub voice: Arc<dyn VoiceDirectory>,
    pub responder: Arc<dyn Responder>,
    pub playlist_limit: usize,
}

/// Resolves the request and sends exactly one final reply for it.
///
/// A panic in the resolver or while mutating the session is contained on its
/// own task and reported as a generic failure.
pub async fn resolve_and_dispatch(resolver: Arc<dyn TrackResolver>, request: LoadRequest) {
    let responder = request.responder.clone();
    let guild_id = request.guild_id;

    let task = tokio::spawn(async move {
        let result = resolver.load(&request.identifier).await;
        dispatch(&request, result).await
    });

    let reply = match task.await {
        Ok(reply) => reply,
        Err(e) => replies::failure(&CommandError::internal(ADDING_TRACK, e)),
    };

    if let Err(e) = responder.respond(&reply).await {
        error!("Error al enviar resultado de carga en guild {}: {:?}", guild_id, e);
    }
}

/// Applies a resolver outcome and renders the reply.
pub async fn dispatch(request: &LoadRequest, result: LoadResult) -> String {
    match apply(request, result).await {
        Ok(reply) => reply,
        Err(err) => {
            err.log_rejection(format_args!(
                "Carga de '{}' en guild {}",
                request.query, request.guild_id
            ));
            replies::failure(&err)
        }
    }
}

async fn apply(request: &LoadRequest, result: LoadResult) -> Result<String, CommandError> {
    match result {
        LoadResult::SingleTrack(track) => enqueue_track(request, track).await,
        LoadResult::Collection(collection) if collection.is_search_result => {
            let first = collection
                .tracks
                .into_iter()
                .next()
                .ok_or(CommandError::EmptyCollection)?;
            enqueue_track(request, first).await
        }
        LoadResult::Collection(collection) => enqueue_collection(request, collection).await,
        LoadResult::NoMatch => Err(CommandError::NoMatches {
            query: request.query.clone(),
        }),
        LoadResult::Failed(detail) => Err(CommandError::LoadFailed {
            message: detail.message,
        }),
    }
}

async fn enqueue_track(request: &LoadRequest, track: Track) -> Result<String, CommandError> {
    let session = request.registry.get_or_create(request.guild_id);
    let mut session = session.lock().await;
    ensure_connected(request, &session).await?;

    let title = track.title().to_string();
    let entry = QueueEntry::new(track, request.requester, request.query.clone());

    match session
        .enqueue(entry)
        .await
        .map_err(|e| CommandError::internal(ADDING_TRACK, e))?
    {
        Enqueued::Started => info!("▶️ '{}' empezó a sonar en guild {}", title, request.guild_id),
        Enqueued::Queued(position) => info!(
            "📋 '{}' en posición {} de la cola en guild {}",
            title, position, request.guild_id
        ),
    }

    Ok(replies::track_added(&title))
}

async fn enqueue_collection(
    request: &LoadRequest,
    collection: TrackCollection,
) -> Result<String, CommandError> {
    if collection.tracks.is_empty() {
        return Err(CommandError::EmptyCollection);
    }

    let total = collection.tracks.len();
    let entries: Vec<QueueEntry> = collection
        .tracks
        .into_iter()
        .take(request.playlist_limit)
        .map(|track| QueueEntry::new(track, request.requester, request.query.clone()))
        .collect();

    let session = request.registry.get_or_create(request.guild_id);
    let mut session = session.lock().await;
    ensure_connected(request, &session).await?;

    let added = session
        .enqueue_all(entries, request.playlist_limit)
        .await
        .map_err(|e| CommandError::internal(ADDING_TRACK, e))?;

    if added < total {
        info!(
            "✂️ Playlist '{}' recortada: {} de {} canciones",
            collection.name, added, total
        );
    }

    Ok(replies::tracks_added(added, &collection.name))
}

/// Joins the requester's current voice channel unless the sink is already connected.
async fn ensure_connected(
    request: &LoadRequest,
    session: &PlaybackSession,
) -> Result<(), CommandError> {
    let sink = session.sink();
    if sink.is_connected().await {
        return Ok(());
    }

    let channel_id = request
        .voice
        .voice_channel_of(request.guild_id, request.requester)
        .ok_or_else(|| {
            CommandError::internal(ADDING_TRACK, "requester is no longer in a voice channel")
        })?;

    sink.connect(channel_id)
        .await
        .map_err(|e| CommandError::internal(ADDING_TRACK, e))
}
