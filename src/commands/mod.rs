mod clear;
mod join;
mod leave;
mod nowplaying;
mod pause;
mod ping;
mod play;
mod playurl;
mod queue;
mod resume;
mod skip;

use std::env;
use std::sync::Arc;

use serenity::{
    all::{Command, CommandInteraction, Context, CreateCommand, GuildId, Http},
    Error,
};

use crate::misc::respond_error;

fn all_commands() -> Vec<CreateCommand> {
    vec![
        clear::register(),
        join::register(),
        leave::register(),
        nowplaying::register(),
        pause::register(),
        ping::register(),
        play::register(),
        playurl::register(),
        queue::register(),
        resume::register(),
        skip::register(),
    ]
}

pub async fn register_commands(http: &Arc<Http>) -> Result<Vec<Command>, Error> {
    let mut registered = Vec::new();
    for command in all_commands() {
        registered.push(Command::create_global_command(http, command).await?);
    }

    /*
        Global commands take up to an hour to update, and thus are not
        instantaneous. A development guild named in the environment gets
        guild commands on top, which update right away.
    */
    if let Ok(guild) = env::var("DISCORD_GUILD_ID") {
        match guild.parse::<u64>() {
            Ok(id) if id != 0 => {
                log::info!("Also registering commands in guild {id}");
                GuildId::new(id).set_commands(http, all_commands()).await?;
            }
            _ => log::warn!("Ignoring unusable DISCORD_GUILD_ID {guild:?}"),
        }
    }

    Ok(registered)
}

pub async fn handle_commands(ctx: Context, interaction: &CommandInteraction) {
    let name = interaction.data.name.clone();
    let result = match name.as_str() {
        "clear" => clear::handle(&ctx, interaction).await,
        "join" => join::handle(&ctx, interaction).await,
        "leave" => leave::handle(&ctx, interaction).await,
        "nowplaying" => nowplaying::handle(&ctx, interaction).await,
        "pause" => pause::handle(&ctx, interaction).await,
        "ping" => ping::handle(&ctx, interaction).await,
        "play" => play::handle(&ctx, interaction).await,
        "playurl" => playurl::handle(&ctx, interaction).await,
        "queue" => queue::handle(&ctx, interaction).await,
        "resume" => resume::handle(&ctx, interaction).await,
        "skip" => skip::handle(&ctx, interaction).await,
        &_ => Ok(()),
    };

    // A broken command must not take anything else down; the invoker gets a
    // generic failure note and the details go to the log.
    if let Err(err) = result {
        log::error!("/{name} failed: {err:#}");
        respond_error(
            &ctx,
            interaction,
            "Something went wrong while handling that command",
        )
        .await;
    }
}
