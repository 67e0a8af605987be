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

    // The next track (or the end of the queue) gets announced by the player
    // itself once the current stream is torn down.
    match player.skip().await {
        Ok(()) => respond_command(ctx, interaction, "Skipping the current track").await,
        Err(err) => respond_ephemeral(ctx, interaction, &err.to_string()).await,
    }

    Ok(())
}

pub fn register() -> CreateCommand {
    CreateCommand::new("skip").description("Skip the current track")
}
