use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Límite superior absoluto del volumen por guild.
pub const VOLUME_CEILING: u8 = 150;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub application_id: u64,
    pub guild_id: Option<u64>, // Para comandos de desarrollo
    pub command_prefix: String,

    // Resolución de pistas
    pub ytdlp_path: String,
    pub search_results: usize,
    pub resolve_timeout_secs: u64,

    // Reproducción
    pub playback: PlaybackConfig,
}

/// Snapshot of the settings every handler and dispatcher reads.
///
/// Built once at startup and shared behind an `Arc`; nothing mutates it
/// afterwards.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PlaybackConfig {
    pub default_volume: u8,
    pub max_volume: u8,
    /// Maximum number of tracks enqueued from a single playlist.
    pub max_playlist_size: usize,
    /// Number of entries the `queue` command lists.
    pub queue_display_limit: usize,
    /// Tag prepended to bare search phrases before they reach the resolver.
    pub default_search_prefix: String,
    /// Search-provider tags that are forwarded to the resolver untouched.
    pub passthrough_prefixes: Vec<String>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_volume: 100,
            max_volume: VOLUME_CEILING,
            max_playlist_size: 50,
            queue_display_limit: 10,
            default_search_prefix: "ytsearch:".to_string(),
            passthrough_prefixes: vec![
                "ytsearch:".to_string(),
                "scsearch:".to_string(),
                "spotify:".to_string(),
            ],
        }
    }
}

impl PlaybackConfig {
    /// Clamps a requested volume into the legal range for this bot.
    pub fn clamp_volume(&self, requested: i64) -> u8 {
        requested.clamp(0, i64::from(self.max_volume)) as u8
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = PlaybackConfig::default();

        let config = Self {
            // Discord
            discord_token: std::env::var("DISCORD_TOKEN")?,
            application_id: std::env::var("APPLICATION_ID")?.parse()?,
            guild_id: std::env::var("GUILD_ID").ok().and_then(|s| s.parse().ok()),
            command_prefix: std::env::var("COMMAND_PREFIX").unwrap_or_else(|_| "!".to_string()),

            // Resolución
            ytdlp_path: std::env::var("YTDLP_PATH").unwrap_or_else(|_| "yt-dlp".to_string()),
            search_results: std::env::var("SEARCH_RESULTS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
            resolve_timeout_secs: std::env::var("RESOLVE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,

            // Reproducción
            playback: PlaybackConfig {
                default_volume: std::env::var("DEFAULT_VOLUME")
                    .unwrap_or_else(|_| defaults.default_volume.to_string())
                    .parse()?,
                max_volume: std::env::var("MAX_VOLUME")
                    .unwrap_or_else(|_| defaults.max_volume.to_string())
                    .parse()?,
                max_playlist_size: std::env::var("MAX_PLAYLIST_SIZE")
                    .unwrap_or_else(|_| defaults.max_playlist_size.to_string())
                    .parse()?,
                queue_display_limit: std::env::var("QUEUE_DISPLAY_LIMIT")
                    .unwrap_or_else(|_| defaults.queue_display_limit.to_string())
                    .parse()?,
                default_search_prefix: std::env::var("DEFAULT_SEARCH_PREFIX")
                    .unwrap_or(defaults.default_search_prefix),
                passthrough_prefixes: defaults.passthrough_prefixes,
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - Max volume must not exceed [`VOLUME_CEILING`]
    /// - Default volume must not exceed max volume
    /// - Playlist cap, queue display limit and search result count must be > 0
    /// - The default search prefix must end with `:`
    pub fn validate(&self) -> Result<()> {
        let playback = &self.playback;

        if playback.max_volume > VOLUME_CEILING {
            anyhow::bail!(
                "Max volume cannot exceed {}, got: {}",
                VOLUME_CEILING,
                playback.max_volume
            );
        }

        if playback.default_volume > playback.max_volume {
            anyhow::bail!(
                "Default volume ({}) cannot exceed max volume ({})",
                playback.default_volume,
                playback.max_volume
            );
        }

        if playback.max_playlist_size == 0 {
            anyhow::bail!("Max playlist size must be greater than 0");
        }

        if playback.queue_display_limit == 0 {
            anyhow::bail!("Queue display limit must be greater than 0");
        }

        if self.search_results == 0 {
            anyhow::bail!("Search results must be greater than 0");
        }

        if !playback.default_search_prefix.ends_with(':') {
            anyhow::bail!(
                "Default search prefix must end with ':', got: {}",
                playback.default_search_prefix
            );
        }

        Ok(())
    }

    /// Returns a summary of the current configuration for logging.
    ///
    /// Excludes the Discord token.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Discord: App ID {} (Guild: {}), prefix '{}'\n  \
            Audio: {}% default vol, {}% max\n  \
            Limits: {} tracks per playlist, {} shown per queue page\n  \
            Resolver: {} ({} results, {}s timeout, default '{}')",
            self.application_id,
            self.guild_id.map_or("global".to_string(), |id| id.to_string()),
            self.command_prefix,
            self.playback.default_volume,
            self.playback.max_volume,
            self.playback.max_playlist_size,
            self.playback.queue_display_limit,
            self.ytdlp_path,
            self.search_results,
            self.resolve_timeout_secs,
            self.playback.default_search_prefix,
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // Discord (sin valores por defecto - deben proporcionarse)
            discord_token: String::new(),
            application_id: 0,
            guild_id: None,
            command_prefix: "!".to_string(),

            ytdlp_path: "yt-dlp".to_string(),
            search_results: 5,
            resolve_timeout_secs: 30,

            playback: PlaybackConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_default_volume_above_max() {
        let mut config = Config::default();
        config.playback.max_volume = 80;
        config.playback.default_volume = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_volume_ceiling_overflow() {
        let mut config = Config::default();
        config.playback.max_volume = 200;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_playlist_cap() {
        let mut config = Config::default();
        config.playback.max_playlist_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_search_prefix_without_colon() {
        let mut config = Config::default();
        config.playback.default_search_prefix = "ytsearch".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn clamps_volume_into_range() {
        let playback = PlaybackConfig::default();
        assert_eq!(playback.clamp_volume(-20), 0);
        assert_eq!(playback.clamp_volume(75), 75);
        assert_eq!(playback.clamp_volume(900), 150);
    }

    #[test]
    fn summary_omits_token() {
        let config = Config {
            discord_token: "super-secret".to_string(),
            ..Config::default()
        };
        assert!(!config.summary().contains("super-secret"));
    }
}
