use anyhow::{anyhow, Result};
use serenity::all::{ChannelId, CommandInteraction, Context, GuildId, UserId};
use serenity::builder::CreateCommand;

use crate::botdata::BotDataKey;
use crate::misc::{respond_command, respond_ephemeral, user_voice_channel};
use crate::player::{self, PlayerHandle};

pub(super) enum JoinOutcome {
    Joined(PlayerHandle),
    AlreadyConnected(PlayerHandle),
    NotInVoiceChannel,
    ConnectFailed(String),
}

/// Connects to the invoker's voice channel and wires a player up for the
/// guild, or hands back the player that is already there. Player status
/// updates go to `text_channel_id`.
pub(super) async fn ensure_connected(
    ctx: &Context,
    guild_id: GuildId,
    user_id: UserId,
    text_channel_id: ChannelId,
) -> Result<JoinOutcome> {
    // Fetched before the data lock below, since the manager lives in the
    // same type map.
    let manager = songbird::get(ctx)
        .await
        .expect("Songbird Voice client placed in at initialisation.")
        .clone();

    // Held across the join so two racing commands cannot both create a
    // player for the same guild.
    let mut data_lock = ctx.data.write().await;
    let botdata = data_lock
        .get_mut::<BotDataKey>()
        .ok_or_else(|| anyhow!("Bot data is not initialized"))?;

    if let Some(player) = botdata.players.get(&guild_id) {
        return Ok(JoinOutcome::AlreadyConnected(player.clone()));
    }

    let Some(connect_to) = user_voice_channel(ctx, guild_id, user_id) else {
        return Ok(JoinOutcome::NotInVoiceChannel);
    };

    match manager.join(guild_id, connect_to).await {
        Ok(call) => {
            let player =
                player::create_player(ctx, call, botdata.http_client.clone(), text_channel_id);
            botdata.players.insert(guild_id, player.clone());
            Ok(JoinOutcome::Joined(player))
        }
        Err(err) => Ok(JoinOutcome::ConnectFailed(err.to_string())),
    }
}

pub async fn handle(ctx: &Context, interaction: &CommandInteraction) -> Result<()> {
    let Some(guild_id) = interaction.guild_id else {
        respond_command(ctx, interaction, "This command only works in a server").await;
        return Ok(());
    };

    let outcome =
        ensure_connected(ctx, guild_id, interaction.user.id, interaction.channel_id).await?;
    match outcome {
        JoinOutcome::Joined(_) => {
            respond_command(
                ctx,
                interaction,
                "Joined your voice channel. Use /play to queue a track",
            )
            .await;
        }
        JoinOutcome::AlreadyConnected(_) => {
            respond_command(ctx, interaction, "The bot is already in a voice channel").await;
        }
        JoinOutcome::NotInVoiceChannel => {
            respond_ephemeral(ctx, interaction, "Join a voice channel first").await;
        }
        JoinOutcome::ConnectFailed(reason) => {
            respond_command(ctx, interaction, &("Error: ".to_owned() + &reason)).await;
        }
    }

    Ok(())
}

pub fn register() -> CreateCommand {
    CreateCommand::new("join").description("Join a voice channel")
}
