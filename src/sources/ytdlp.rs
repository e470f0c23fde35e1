use async_process::Command;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{LoadError, LoadResult, Track, TrackCollection, TrackResolver};
use crate::config::Config;

/// Resolver que delega en el binario de yt-dlp (`--dump-single-json`).
pub struct YtDlpResolver {
    binary: String,
    search_results: usize,
    timeout: Duration,
}

/// Subconjunto del JSON de yt-dlp que nos interesa.
#[derive(Debug, Default, Deserialize)]
struct YtDlpItem {
    #[serde(rename = "_type")]
    kind: Option<String>,
    title: Option<String>,
    uploader: Option<String>,
    channel: Option<String>,
    duration: Option<f64>,
    webpage_url: Option<String>,
    url: Option<String>,
    entries: Option<Vec<YtDlpItem>>,
}

/// How an identifier maps onto a yt-dlp target.
#[derive(Debug, PartialEq, Eq)]
enum Target {
    Search(String),
    Locator(String),
    Unsupported(&'static str),
}

impl YtDlpResolver {
    pub fn new(binary: impl Into<String>, search_results: usize, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            search_results,
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.ytdlp_path.clone(),
            config.search_results,
            Duration::from_secs(config.resolve_timeout_secs),
        )
    }

    fn target(&self, identifier: &str) -> Target {
        if let Some(query) = identifier.strip_prefix("ytsearch:") {
            Target::Search(format!("ytsearch{}:{}", self.search_results, query))
        } else if let Some(query) = identifier.strip_prefix("scsearch:") {
            Target::Search(format!("scsearch{}:{}", self.search_results, query))
        } else if identifier.starts_with("spotify:") {
            Target::Unsupported("spotify")
        } else {
            Target::Locator(identifier.to_string())
        }
    }

    async fn run(&self, identifier: &str) -> LoadResult {
        let (target, is_search) = match self.target(identifier) {
            Target::Search(target) => (target, true),
            Target::Locator(target) => (target, false),
            Target::Unsupported(source) => {
                return LoadResult::Failed(LoadError::new(format!(
                    "unsupported source: {}",
                    source
                )))
            }
        };

        debug!("🔍 yt-dlp resolviendo: {}", target);

        let output = match Command::new(&self.binary)
            .args([
                "--dump-single-json",
                "--flat-playlist",
                "--skip-download",
                "--no-warnings",
            ])
            .arg(&target)
            .output()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                warn!("❌ No se pudo ejecutar {}: {}", self.binary, e);
                return LoadResult::Failed(LoadError::new(format!(
                    "could not start {}: {}",
                    self.binary, e
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return LoadResult::Failed(LoadError::new(error_detail(&stderr)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_output(&stdout, is_search)
    }
}

#[async_trait]
impl TrackResolver for YtDlpResolver {
    async fn load(&self, identifier: &str) -> LoadResult {
        match tokio::time::timeout(self.timeout, self.run(identifier)).await {
            Ok(result) => {
                info!("📦 Resultado de carga para '{}': {}", identifier, describe(&result));
                result
            }
            Err(_) => {
                warn!("⏱️ yt-dlp excedió {:?} para '{}'", self.timeout, identifier);
                LoadResult::Failed(LoadError::new("timed out while resolving the query"))
            }
        }
    }
}

fn describe(result: &LoadResult) -> String {
    match result {
        LoadResult::SingleTrack(track) => format!("track '{}'", track.title()),
        LoadResult::Collection(collection) => format!(
            "collection '{}' ({} tracks, search={})",
            collection.name,
            collection.tracks.len(),
            collection.is_search_result
        ),
        LoadResult::NoMatch => "no match".to_string(),
        LoadResult::Failed(err) => format!("failed: {}", err.message),
    }
}

/// Última línea útil de stderr, sin el prefijo `ERROR:`.
fn error_detail(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.trim_start_matches("ERROR:").trim().to_string())
        .unwrap_or_else(|| "yt-dlp exited with an error".to_string())
}

fn parse_output(stdout: &str, is_search: bool) -> LoadResult {
    let item: YtDlpItem = match serde_json::from_str(stdout) {
        Ok(item) => item,
        Err(e) => {
            return LoadResult::Failed(LoadError::new(format!(
                "unreadable resolver output: {}",
                e
            )))
        }
    };

    let is_playlist = item.kind.as_deref() == Some("playlist") || item.entries.is_some();
    if !is_playlist {
        return match into_track(item) {
            Some(track) => LoadResult::SingleTrack(track),
            None => LoadResult::Failed(LoadError::new("resolver returned a track without a URL")),
        };
    }

    let name = item.title.unwrap_or_else(|| "Unknown playlist".to_string());
    let tracks: Vec<Track> = item
        .entries
        .unwrap_or_default()
        .into_iter()
        .filter_map(into_track)
        .collect();

    if tracks.is_empty() && is_search {
        return LoadResult::NoMatch;
    }

    LoadResult::Collection(TrackCollection {
        name,
        tracks,
        is_search_result: is_search,
    })
}

fn into_track(item: YtDlpItem) -> Option<Track> {
    let uri = item.webpage_url.or(item.url)?;
    let mut track = Track::new(item.title.unwrap_or_else(|| "Unknown title".to_string()), uri);

    if let Some(author) = item.uploader.or(item.channel) {
        track = track.with_author(author);
    }

    if let Some(seconds) = item.duration.filter(|d| d.is_finite() && *d >= 0.0) {
        track = track.with_duration(Duration::from_secs_f64(seconds));
    }

    Some(track)
}
