use std::time::Duration;

use crate::{
    audio::{queue::QueuePreview, session::PlaybackState},
    error::CommandError,
    sources::Track,
};

/// Marcadores visuales de cada respuesta
pub mod glyphs {
    pub const SUCCESS: &str = "✅";
    pub const FAILURE: &str = "❌";
    pub const LOADING: &str = "🔄";
    pub const SKIP: &str = "⏭️";
    pub const QUEUE: &str = "🎵";
    pub const PLAYBACK: &str = "🎵";
    pub const STOP: &str = "⏹️";
    pub const PAUSE: &str = "⏸️";
    pub const RESUME: &str = "▶️";
    pub const VOLUME: &str = "🔊";
}

pub fn failure(err: &CommandError) -> String {
    format!("{} {}", glyphs::FAILURE, err)
}

pub fn loading(query: &str) -> String {
    format!("{} Loading... `[{}]`", glyphs::LOADING, query)
}

pub fn track_added(title: &str) -> String {
    format!("{} **Added to queue:** {}", glyphs::SUCCESS, title)
}

pub fn tracks_added(count: usize, playlist: &str) -> String {
    format!(
        "{} **Added {} tracks to queue** from playlist: {}",
        glyphs::SUCCESS,
        count,
        playlist
    )
}

pub fn skipped(title: &str) -> String {
    format!("{} Skipped: **{}**", glyphs::SKIP, title)
}

pub fn stopped() -> String {
    format!("{} Stopped playback and cleared queue!", glyphs::STOP)
}

pub fn pause_toggled(state: PlaybackState, title: &str) -> String {
    match state {
        PlaybackState::Paused => format!("{} Paused **{}**", glyphs::PAUSE, title),
        _ => format!("{} Resumed **{}**", glyphs::RESUME, title),
    }
}

pub fn now_playing(track: &Track) -> String {
    let mut text = format!("{} **Now Playing:** {}", glyphs::PLAYBACK, track.title());
    if let Some(author) = track.author().filter(|a| !a.is_empty()) {
        text.push_str(&format!(" by {}", author));
    }
    if let Some(duration) = track.duration() {
        text.push_str(&format!(" `[{}]`", format_duration(duration)));
    }
    text
}

/// Lista de la cola; `preview` ya viene recortado al límite de visualización.
pub fn queue_listing(current: Option<&Track>, preview: &QueuePreview) -> String {
    if preview.total_items == 0 {
        return match current {
            Some(track) => format!(
                "{} **Now Playing:** {}\n\nThe queue is currently empty.",
                glyphs::QUEUE,
                track.title()
            ),
            None => queue_empty(),
        };
    }

    let mut text = format!("{} **Current Queue:**\n", glyphs::QUEUE);
    if let Some(track) = current {
        text.push_str(&format!("**Now Playing:** {}\n\n", track.title()));
    }

    for (i, entry) in preview.items.iter().enumerate() {
        text.push_str(&format!("`{}.` **{}**\n", i + 1, entry.title()));
    }

    if preview.overflow() > 0 {
        text.push_str(&format!("\n... and {} more tracks", preview.overflow()));
    }

    text
}

pub fn queue_empty() -> String {
    format!(
        "{} The queue is currently empty and nothing is playing!",
        glyphs::QUEUE
    )
}

pub fn volume_current(volume: u8) -> String {
    format!("{} Current volume: **{}%**", glyphs::VOLUME, volume)
}

pub fn volume_set(volume: u8) -> String {
    format!("{} Volume set to **{}%**", glyphs::VOLUME, volume)
}

pub fn unknown_command(name: &str, args: &str) -> String {
    let mut text = format!("{} Command received: **{}**", glyphs::SUCCESS, name);
    if !args.is_empty() {
        text.push_str(&format!(" with arguments: `{}`", args));
    }
    text
}

pub fn guild_only() -> String {
    format!("{} This command only works inside a server!", glyphs::FAILURE)
}

pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}
