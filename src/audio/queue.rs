use chrono::{DateTime, Duration, Utc};
use serenity::model::id::UserId;
use std::collections::VecDeque;
use tracing::{debug, info};

use crate::sources::Track;

/// A resolved track plus who asked for it and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    track: Track,
    requester: UserId,
    original_query: String,
    resolved_uri: String,
    added_at: DateTime<Utc>,
}

impl QueueEntry {
    pub fn new(track: Track, requester: UserId, original_query: impl Into<String>) -> Self {
        Self {
            resolved_uri: track.uri().to_string(),
            track,
            requester,
            original_query: original_query.into(),
            added_at: Utc::now(),
        }
    }

    pub fn track(&self) -> &Track {
        &self.track
    }
    pub fn title(&self) -> &str {
        self.track.title()
    }
    pub fn requester(&self) -> UserId {
        self.requester
    }
    pub fn original_query(&self) -> &str {
        &self.original_query
    }
    pub fn resolved_uri(&self) -> &str {
        &self.resolved_uri
    }
    /// Tiempo que lleva en cola a fecha de `now`, nunca negativo.
    pub fn waited(&self, now: DateTime<Utc>) -> Duration {
        (now - self.added_at).max(Duration::zero())
    }
}

/// Cola FIFO de una guild. El track actual nunca vive aquí.
#[derive(Debug, Default)]
pub struct MusicQueue {
    items: VecDeque<QueueEntry>,
}

impl MusicQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Agrega un track al final de la cola
    pub fn add(&mut self, entry: QueueEntry) {
        info!("➕ Agregado a la cola: {}", entry.title());
        self.items.push_back(entry);
    }

    /// Agrega como máximo `limit` entradas, en orden; el resto se descarta.
    pub fn add_bounded<I>(&mut self, entries: I, limit: usize) -> usize
    where
        I: IntoIterator<Item = QueueEntry>,
    {
        let before = self.items.len();
        self.items.extend(entries.into_iter().take(limit));
        let added = self.items.len() - before;

        info!("➕ Agregadas {} canciones a la cola", added);
        added
    }

    /// Devuelve una entrada al frente (p. ej. si no se pudo reproducir)
    pub fn requeue_front(&mut self, entry: QueueEntry) {
        debug!("↩️ Devuelto al frente de la cola: {}", entry.title());
        self.items.push_front(entry);
    }

    pub fn peek(&self) -> Option<&QueueEntry> {
        self.items.front()
    }

    /// Obtiene el siguiente track (FIFO)
    pub fn pop(&mut self) -> Option<QueueEntry> {
        let next = self.items.pop_front();
        if let Some(ref entry) = next {
            debug!("➡️ Siguiente en cola (FIFO): {}", entry.title());
        }
        next
    }

    /// Limpia la cola y devuelve cuántas entradas se eliminaron
    pub fn clear(&mut self) -> usize {
        let removed = self.items.len();
        self.items.clear();
        info!("🗑️ Cola limpiada ({} entradas)", removed);
        removed
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.items.iter()
    }

    /// First `limit` entries for display. Never mutates the queue.
    pub fn preview(&self, limit: usize) -> QueuePreview {
        QueuePreview {
            items: self.items.iter().take(limit).cloned().collect(),
            total_items: self.items.len(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueuePreview {
    pub items: Vec<QueueEntry>,
    pub total_items: usize,
}

impl QueuePreview {
    /// Entries in the queue beyond the ones shown.
    pub fn overflow(&self) -> usize {
        self.total_items.saturating_sub(self.items.len())
    }
}
