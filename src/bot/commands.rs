use anyhow::Result;
use serenity::{
    builder::{CreateCommand, CreateCommandOption},
    model::{application::CommandOptionType, id::GuildId},
    prelude::Context,
};

use super::bridge::CommandKind;
use crate::config::VOLUME_CEILING;

/// Registra comandos globales
pub async fn register_global_commands(ctx: &Context) -> Result<()> {
    for command in all_commands() {
        ctx.http.create_global_command(&command).await?;
    }

    Ok(())
}

/// Registra comandos para una guild específica (desarrollo)
pub async fn register_guild_commands(ctx: &Context, guild_id: GuildId) -> Result<()> {
    guild_id.set_commands(&ctx.http, all_commands()).await?;

    Ok(())
}

/// One slash command per name and alias, so `/np` works like `/nowplaying`.
fn all_commands() -> Vec<CreateCommand> {
    CommandKind::ALL
        .into_iter()
        .flat_map(|kind| {
            std::iter::once(kind.name())
                .chain(kind.aliases().iter().copied())
                .map(move |name| build_command(kind, name))
        })
        .collect()
}

fn build_command(kind: CommandKind, name: &str) -> CreateCommand {
    let command = CreateCommand::new(name).description(kind.description());

    match kind {
        CommandKind::Play => command.add_option(
            CreateCommandOption::new(
                CommandOptionType::String,
                "query",
                "Song name, URL or playlist",
            )
            .required(true),
        ),
        CommandKind::Volume => command.add_option(
            CreateCommandOption::new(
                CommandOptionType::Integer,
                "level",
                format!("Volume level (0-{})", VOLUME_CEILING),
            )
            .min_int_value(0)
            .max_int_value(VOLUME_CEILING.into()),
        ),
        _ => command,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_every_name_and_alias() {
        let expected = CommandKind::ALL
            .iter()
            .map(|kind| 1 + kind.aliases().len())
            .sum::<usize>();
        assert_eq!(all_commands().len(), expected);
        assert_eq!(expected, 9);
    }
}
