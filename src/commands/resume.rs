use anyhow::Result;
use serenity::all::{CommandInteraction, Context, CreateCommand};

use crate::misc::{guild_player, respond_command, respond_ephemeral};

pub async fn handle(ctx: &Context, interaction: &CommandInteraction) -> Result<()> {
    let Some(guild_id) = interaction.guild_id else {
        respond_command(ctx, interaction, "This command only works in a server").await;
        return Ok(());
    };
    let Some(player) = guild_player(ctx, guild_id).await else {
        respond_command(ctx, interaction, "The bot must be in a voice channel").await;
        return Ok(());
    };

    match player.resume().await {
        Ok(()) => respond_command(ctx, interaction, "Playback resumed").await,
        Err(err) => respond_ephemeral(ctx, interaction, &err.to_string()).await,
    }

    Ok(())
}

pub fn register() -> CreateCommand {
    CreateCommand::new("resume").description("Resume paused playback")
}
