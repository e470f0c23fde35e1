pub mod ytdlp;

use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use crate::config::PlaybackConfig;

pub use ytdlp::YtDlpResolver;

/// Metadata of a resolved, playable track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    title: String,
    author: Option<String>,
    uri: String,
    duration: Option<Duration>,
}

impl Track {
    pub fn new(title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: None,
            uri: uri.into(),
            duration: None,
        }
    }

    // Getters
    pub fn title(&self) -> &str {
        &self.title
    }
    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }
    pub fn uri(&self) -> &str {
        &self.uri
    }
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    // Setters
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// A multi-track resolver result: a playlist or a set of search hits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackCollection {
    pub name: String,
    pub tracks: Vec<Track>,
    /// Ambiguous match set rather than an ordered playlist.
    pub is_search_result: bool,
}

/// Error detail reported by a resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    pub message: String,
}

impl LoadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Outcome of resolving one query. Exactly one is produced per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadResult {
    SingleTrack(Track),
    Collection(TrackCollection),
    NoMatch,
    Failed(LoadError),
}

/// Turns a URI or a tagged search string into track metadata.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackResolver: Send + Sync {
    async fn load(&self, identifier: &str) -> LoadResult;
}

/// Decide qué recibe el resolver: URLs y búsquedas etiquetadas pasan tal cual,
/// el resto se convierte en búsqueda con el proveedor por defecto.
///
/// Provider tags match in any case and come out lower-cased, so resolvers
/// only ever see the canonical form (`YTSEARCH:x` becomes `ytsearch:x`).
pub fn resolve_identifier(query: &str, config: &PlaybackConfig) -> String {
    if let Some((tag, rest)) = split_provider_tag(query, config) {
        return format!("{}{}", tag, rest);
    }

    if is_http_url(query) {
        query.to_string()
    } else {
        format!("{}{}", config.default_search_prefix, query)
    }
}

fn split_provider_tag<'a>(query: &'a str, config: &PlaybackConfig) -> Option<(String, &'a str)> {
    config.passthrough_prefixes.iter().find_map(|prefix| {
        let head = query.get(..prefix.len())?;
        head.eq_ignore_ascii_case(prefix)
            .then(|| (prefix.to_ascii_lowercase(), &query[prefix.len()..]))
    })
}

fn is_http_url(query: &str) -> bool {
    Url::parse(query)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}
