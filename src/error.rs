use std::fmt::{Debug, Display};
use thiserror::Error;
use tracing::{error, info, warn, Level};

/// Broad category of a command failure. None of them are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Corrective message for the user.
    UserInput,
    /// Informational message about the session.
    SessionState,
    /// The resolver found nothing or failed.
    Resolution,
    /// Unexpected fault, logged and reported generically.
    Internal,
}

impl ErrorKind {
    /// Level a rejection of this kind is logged at.
    pub fn log_level(self) -> Level {
        match self {
            ErrorKind::UserInput | ErrorKind::SessionState => Level::INFO,
            ErrorKind::Resolution => Level::WARN,
            ErrorKind::Internal => Level::ERROR,
        }
    }
}

/// Every way a command handler or a load result can fail.
///
/// The `Display` text is what the user reads, without the failure glyph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Please provide a song name or URL to play!")]
    EmptyQuery,

    #[error("You must be in a voice channel to use this command!")]
    NotInVoiceChannel,

    #[error("No music is currently playing!")]
    NoActiveSession,

    #[error("Nothing is currently playing!")]
    NothingPlaying,

    #[error("No audio session found for this server!")]
    NoSession,

    #[error("The playlist is empty!")]
    EmptyCollection,

    #[error("No matches found for: `{query}`")]
    NoMatches { query: String },

    #[error("Failed to load track: {message}")]
    LoadFailed { message: String },

    #[error("Volume must be a whole number between 0 and {max}, got `{input}`")]
    InvalidVolume { input: String, max: u8 },

    #[error("Error {action}")]
    Internal { action: String },
}

impl CommandError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyQuery | Self::NotInVoiceChannel | Self::InvalidVolume { .. } => {
                ErrorKind::UserInput
            }
            Self::NoActiveSession | Self::NothingPlaying | Self::NoSession => {
                ErrorKind::SessionState
            }
            Self::EmptyCollection | Self::NoMatches { .. } | Self::LoadFailed { .. } => {
                ErrorKind::Resolution
            }
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Logs `cause` and hides it behind a generic message naming `action`.
    pub fn internal(action: impl Into<String>, cause: impl Debug) -> Self {
        let action = action.into();
        error!("💥 Fallo interno {}: {:?}", action, cause);
        Self::Internal { action }
    }

    /// Logs that `context` was answered with this error, at the level of its kind.
    pub fn log_rejection(&self, context: impl Display) {
        let level = self.kind().log_level();
        if level == Level::ERROR {
            error!("❌ {} falló: {}", context, self);
        } else if level == Level::WARN {
            warn!("⚠️ {} fallido: {}", context, self);
        } else {
            info!("🚫 {} rechazado: {}", context, self);
        }
    }
}
