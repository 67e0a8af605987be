use anyhow::Result;
use serenity::all::{CommandInteraction, Context};
use serenity::builder::CreateCommand;

use crate::misc::{leave_vc, respond_command};

pub async fn handle(ctx: &Context, interaction: &CommandInteraction) -> Result<()> {
    let Some(guild_id) = interaction.guild_id else {
        respond_command(ctx, interaction, "This command only works in a server").await;
        return Ok(());
    };

    // Whatever was queued goes with the connection.
    match leave_vc(ctx, guild_id).await {
        Ok(()) => respond_command(ctx, interaction, "Left the voice channel").await,
        Err(err) => respond_command(ctx, interaction, &err.to_string()).await,
    }

    Ok(())
}

pub fn register() -> CreateCommand {
    CreateCommand::new("leave").description("Leave the voice channel and drop the queue")
}
