//! # Command Bridge
//!
//! Slash interactions and prefixed text messages both become a
//! [`NormalizedCommand`]: the command name plus the argument string, built by
//! joining the values with single spaces. The bridge routes it through a
//! static table of names and aliases and guarantees one terminal response.

use serenity::all::{CommandDataOption, CommandDataOptionValue};
use std::{collections::HashMap, sync::Arc};
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::{
    context::BotContext,
    handlers::{self, Outcome},
    platform::Invocation,
};
use crate::{error::CommandError, ui::replies};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedCommand {
    pub name: String,
    pub args: String,
}

impl NormalizedCommand {
    pub fn from_interaction<I, S>(name: &str, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args = options
            .into_iter()
            .map(|value| value.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            name: name.to_string(),
            args,
        }
    }

    /// `None` when `content` is not a command for this prefix.
    pub fn from_text(content: &str, prefix: &str) -> Option<Self> {
        let body = content.trim_start().strip_prefix(prefix)?;
        let mut words = body.split_whitespace();
        let name = words.next()?;

        Some(Self {
            name: name.to_string(),
            args: words.collect::<Vec<_>>().join(" "),
        })
    }
}

/// String form of each option value, in the order Discord reports them.
pub fn option_values(options: &[CommandDataOption]) -> Vec<String> {
    options
        .iter()
        .filter_map(|option| match &option.value {
            CommandDataOptionValue::String(value) => Some(value.clone()),
            CommandDataOptionValue::Integer(value) => Some(value.to_string()),
            CommandDataOptionValue::Number(value) => Some(value.to_string()),
            CommandDataOptionValue::Boolean(value) => Some(value.to_string()),
            CommandDataOptionValue::User(id) => Some(id.to_string()),
            CommandDataOptionValue::Channel(id) => Some(id.to_string()),
            CommandDataOptionValue::Role(id) => Some(id.to_string()),
            CommandDataOptionValue::Mentionable(id) => Some(id.to_string()),
            _ => None,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Play,
    Skip,
    Queue,
    NowPlaying,
    Stop,
    Pause,
    Volume,
}

impl CommandKind {
    pub const ALL: [CommandKind; 7] = [
        CommandKind::Play,
        CommandKind::Skip,
        CommandKind::Queue,
        CommandKind::NowPlaying,
        CommandKind::Stop,
        CommandKind::Pause,
        CommandKind::Volume,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CommandKind::Play => "play",
            CommandKind::Skip => "skip",
            CommandKind::Queue => "queue",
            CommandKind::NowPlaying => "nowplaying",
            CommandKind::Stop => "stop",
            CommandKind::Pause => "pause",
            CommandKind::Volume => "volume",
        }
    }

    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            CommandKind::NowPlaying => &["np"],
            CommandKind::Volume => &["vol"],
            _ => &[],
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CommandKind::Play => "Play a song or playlist from a URL or search query",
            CommandKind::Skip => "Skip the current track",
            CommandKind::Queue => "Show the upcoming tracks",
            CommandKind::NowPlaying => "Show the track that is playing",
            CommandKind::Stop => "Stop playback, clear the queue and leave the channel",
            CommandKind::Pause => "Pause or resume the current track",
            CommandKind::Volume => "Show or change the playback volume",
        }
    }
}

/// Routes normalized commands to their handlers.
pub struct CommandBridge {
    ctx: Arc<BotContext>,
    routes: HashMap<String, CommandKind>,
}

impl CommandBridge {
    pub fn new(ctx: Arc<BotContext>) -> Self {
        let mut routes = HashMap::new();
        for kind in CommandKind::ALL {
            routes.insert(kind.name().to_string(), kind);
            for alias in kind.aliases() {
                routes.insert(alias.to_string(), kind);
            }
        }

        Self { ctx, routes }
    }

    /// Case-insensitive lookup over names and aliases.
    pub fn lookup(&self, name: &str) -> Option<CommandKind> {
        self.routes.get(&name.to_lowercase()).copied()
    }

    /// Runs a command and sends its terminal response.
    ///
    /// `play` answers with a loading message and returns a pending
    /// [`Dispatch`]; the final result arrives later through the same responder.
    pub async fn dispatch(&self, command: NormalizedCommand, invocation: Invocation) -> Dispatch {
        info!(
            "📝 Comando {} usado por {} en guild {}",
            command.name, invocation.user_name, invocation.guild_id
        );

        let Some(kind) = self.lookup(&command.name) else {
            send(&invocation, &replies::unknown_command(&command.name, &command.args)).await;
            return Dispatch::done();
        };

        let reply_to = invocation.clone();
        let task = tokio::spawn(handlers::run(
            kind,
            self.ctx.clone(),
            invocation,
            command.args,
        ));

        match task.await {
            Ok(Ok(Outcome::Reply(text))) => {
                send(&reply_to, &text).await;
                Dispatch::done()
            }
            Ok(Ok(Outcome::Pending(handle))) => Dispatch {
                pending: Some(handle),
            },
            Ok(Err(err)) => {
                err.log_rejection(format_args!("/{}", kind.name()));
                send(&reply_to, &replies::failure(&err)).await;
                Dispatch::done()
            }
            Err(e) => {
                let err = CommandError::internal(format!("executing {} command", kind.name()), e);
                send(&reply_to, &replies::failure(&err)).await;
                Dispatch::done()
            }
        }
    }

    /// Text surface: a chat line that only happens to start with the prefix
    /// is not a command, so unknown names are ignored without a reply.
    pub async fn dispatch_text(
        &self,
        command: NormalizedCommand,
        invocation: Invocation,
    ) -> Option<Dispatch> {
        self.lookup(&command.name)?;
        Some(self.dispatch(command, invocation).await)
    }
}

async fn send(invocation: &Invocation, text: &str) {
    if let Err(e) = invocation.responder.respond(text).await {
        error!(
            "Error al enviar respuesta en guild {}: {:?}",
            invocation.guild_id, e
        );
    }
}

/// Handle on the work a dispatched command left running.
pub struct Dispatch {
    pending: Option<JoinHandle<()>>,
}

impl Dispatch {
    fn done() -> Self {
        Self { pending: None }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Waits until a pending resolution has sent its final reply.
    pub async fn settled(self) {
        if let Some(handle) = self.pending {
            if let Err(e) = handle.await {
                error!("Tarea de carga abortada: {:?}", e);
            }
        }
    }
}
