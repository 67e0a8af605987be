use anyhow::{anyhow, Result};
use serenity::all::{
    CommandInteraction, CommandOptionType, Context, CreateCommandOption, CreateEmbed,
    CreateInteractionResponseFollowup, Mentionable, ResolvedValue,
};
use serenity::builder::CreateCommand;

use crate::commands::join::{ensure_connected, JoinOutcome};
use crate::misc::{
    duration_label, escape_markdown, followup_command, followup_ephemeral, guild_player,
    respond_command,
};
use crate::player::EnqueueOutcome;
use crate::resolver::{self, ResolveError, Track};

pub async fn handle(ctx: &Context, interaction: &CommandInteraction) -> Result<()> {
    let query = string_option(interaction, "query")
        .ok_or_else(|| anyhow!("Missing the required query option"))?;
    queue_request(ctx, interaction, &query).await
}

pub fn register() -> CreateCommand {
    CreateCommand::new("play")
        .description("Queue a track by search terms or URL")
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::String,
                "query",
                "Search terms, or a direct URL",
            )
            .required(true),
        )
}

pub(super) fn string_option(interaction: &CommandInteraction, name: &str) -> Option<String> {
    interaction
        .data
        .options()
        .iter()
        .find(|option| option.name == name)
        .and_then(|option| match &option.value {
            ResolvedValue::String(value) => Some((*value).to_string()),
            _ => None,
        })
}

/// The shared /play and /playurl path: connect if needed, resolve, enqueue,
/// report. `query` has already passed whatever validation the command does.
pub(super) async fn queue_request(
    ctx: &Context,
    interaction: &CommandInteraction,
    query: &str,
) -> Result<()> {
    let Some(guild_id) = interaction.guild_id else {
        respond_command(ctx, interaction, "This command only works in a server").await;
        return Ok(());
    };

    // Resolution and connecting both take a while; acknowledge right away.
    interaction.defer(&ctx.http).await?;

    match ensure_connected(ctx, guild_id, interaction.user.id, interaction.channel_id).await? {
        JoinOutcome::Joined(_) | JoinOutcome::AlreadyConnected(_) => {}
        JoinOutcome::NotInVoiceChannel => {
            followup_ephemeral(ctx, interaction, "Join a voice channel first").await;
            return Ok(());
        }
        JoinOutcome::ConnectFailed(reason) => {
            followup_command(ctx, interaction, &("Error: ".to_owned() + &reason)).await;
            return Ok(());
        }
    }

    let requested_by = interaction.user.mention().to_string();
    let track = match resolver::resolve(query, requested_by).await {
        Ok(track) => track,
        Err(ResolveError::NotFound) => {
            followup_command(
                ctx,
                interaction,
                &format!("No results for `{}`", escape_markdown(query)),
            )
            .await;
            return Ok(());
        }
        Err(err @ ResolveError::NoPlayableStream) => {
            followup_command(ctx, interaction, &err.to_string()).await;
            return Ok(());
        }
        Err(err) => {
            log::warn!("Resolution of {query:?} failed: {err}");
            followup_command(ctx, interaction, &("Error: ".to_owned() + &err.to_string())).await;
            return Ok(());
        }
    };

    // The guild may have told the bot to leave while the lookup ran; in that
    // case the track is discarded rather than played on a dead connection.
    let Some(player) = guild_player(ctx, guild_id).await else {
        followup_command(
            ctx,
            interaction,
            "The bot left the voice channel before the track resolved",
        )
        .await;
        return Ok(());
    };

    match player.enqueue(track.clone()).await {
        Ok(EnqueueOutcome::Started) => {
            send_track_followup(ctx, interaction, track_embed("Now playing", &track)).await;
        }
        Ok(EnqueueOutcome::Queued(position)) => {
            let embed = track_embed(&format!("Added to queue at position {position}"), &track);
            send_track_followup(ctx, interaction, embed).await;
        }
        Ok(EnqueueOutcome::Failed(reason)) => {
            followup_command(
                ctx,
                interaction,
                &format!(
                    "Could not play **{}**: {reason}",
                    escape_markdown(&track.title)
                ),
            )
            .await;
        }
        Err(_) => {
            followup_command(
                ctx,
                interaction,
                "The bot left the voice channel before the track resolved",
            )
            .await;
        }
    }

    Ok(())
}

pub(super) fn track_embed(heading: &str, track: &Track) -> CreateEmbed {
    let description = match &track.page_url {
        Some(page) => format!("[{}]({page})", escape_markdown(&track.title)),
        None => format!("**{}**", escape_markdown(&track.title)),
    };

    let mut embed = CreateEmbed::new()
        .title(heading.to_string())
        .description(description)
        .field("Duration", duration_label(track.duration), true)
        .field("Requested by", track.requested_by.clone(), true);
    if let Some(thumbnail) = &track.thumbnail {
        embed = embed.thumbnail(thumbnail.clone());
    }
    embed
}

async fn send_track_followup(ctx: &Context, interaction: &CommandInteraction, embed: CreateEmbed) {
    let followup = CreateInteractionResponseFollowup::new().embed(embed);
    if let Err(why) = interaction.create_followup(&ctx.http, followup).await {
        log::error!("Error sending followup: {why:?}");
    }
}
