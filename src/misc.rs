use std::time::Duration;

use anyhow::{anyhow, Result};
use serenity::all::{
    ChannelId, CommandInteraction, Context, CreateInteractionResponse,
    CreateInteractionResponseFollowup, CreateInteractionResponseMessage, GuildId, UserId,
};

use crate::botdata::BotDataKey;
use crate::player::PlayerHandle;

pub async fn respond_command(ctx: &Context, interaction: &CommandInteraction, text: &str) {
    let response = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new().content(text.to_string()),
    );
    if let Err(why) = interaction.create_response(&ctx.http, response).await {
        log::error!("Error sending response: {why:?}");
    }
}

/// Same as [`respond_command`] but only visible to the invoker. Used for
/// input mistakes that are nobody else's business.
pub async fn respond_ephemeral(ctx: &Context, interaction: &CommandInteraction, text: &str) {
    let response = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(text.to_string())
            .ephemeral(true),
    );
    if let Err(why) = interaction.create_response(&ctx.http, response).await {
        log::error!("Error sending response: {why:?}");
    }
}

/// Reply for interactions that were deferred first.
pub async fn followup_command(ctx: &Context, interaction: &CommandInteraction, text: &str) {
    let followup = CreateInteractionResponseFollowup::new().content(text.to_string());
    if let Err(why) = interaction.create_followup(&ctx.http, followup).await {
        log::error!("Error sending followup: {why:?}");
    }
}

/// Invoker-only variant of [`followup_command`].
pub async fn followup_ephemeral(ctx: &Context, interaction: &CommandInteraction, text: &str) {
    let followup = CreateInteractionResponseFollowup::new()
        .content(text.to_string())
        .ephemeral(true);
    if let Err(why) = interaction.create_followup(&ctx.http, followup).await {
        log::error!("Error sending followup: {why:?}");
    }
}

/// Best-effort failure reply for the dispatcher. Tries a fresh response
/// first and falls back to a followup when the interaction was already
/// acknowledged.
pub async fn respond_error(ctx: &Context, interaction: &CommandInteraction, text: &str) {
    let response = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(text.to_string())
            .ephemeral(true),
    );
    if interaction.create_response(&ctx.http, response).await.is_err() {
        let followup = CreateInteractionResponseFollowup::new()
            .content(text.to_string())
            .ephemeral(true);
        if let Err(why) = interaction.create_followup(&ctx.http, followup).await {
            log::error!("Error sending failure notice: {why:?}");
        }
    }
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}:{:0>2}:{:0>2}", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else {
        format!("{}:{:0>2}", secs / 60, secs % 60)
    }
}

/// Display label for a track's length. Zero means the extractor did not
/// know, live streams included.
pub fn duration_label(duration: Option<Duration>) -> String {
    match duration {
        Some(duration) if !duration.is_zero() => format_duration(duration),
        _ => "Unknown".to_string(),
    }
}

pub fn escape_markdown(text: &str) -> String {
    const ESCAPED: &str = "*_~[]()<>-#`\\";
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if ESCAPED.contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Voice channel the user currently sits in, if any.
pub fn user_voice_channel(ctx: &Context, guild_id: GuildId, user_id: UserId) -> Option<ChannelId> {
    let guild = ctx.cache.guild(guild_id)?;
    guild
        .voice_states
        .get(&user_id)
        .and_then(|state| state.channel_id)
}

/// The guild's player, if the bot is connected there.
pub async fn guild_player(ctx: &Context, guild_id: GuildId) -> Option<PlayerHandle> {
    let data_lock = ctx.data.read().await;
    let botdata = data_lock.get::<BotDataKey>()?;
    botdata.players.get(&guild_id).cloned()
}

/// Tears a guild's playback down: voice connection, driver task and the
/// bot-data entry. Shared by /leave and the forced-disconnect cleanup.
pub async fn leave_vc(ctx: &Context, guild_id: GuildId) -> Result<()> {
    let manager = songbird::get(ctx)
        .await
        .expect("Songbird Voice client placed in at initialisation.")
        .clone();

    if manager.get(guild_id).is_some() {
        if let Err(err) = manager.remove(guild_id).await {
            match err {
                songbird::error::JoinError::NoCall => {}
                _ => {
                    return Err(anyhow::Error::new(err).context("Error leaving the voice channel"))
                }
            }
        }
    }

    let player = {
        let mut data_lock = ctx.data.write().await;
        let botdata = data_lock
            .get_mut::<BotDataKey>()
            .ok_or_else(|| anyhow!("Bot data is not initialized"))?;
        botdata.players.remove(&guild_id)
    };

    match player {
        Some(player) => {
            player.disconnect().await;
            Ok(())
        }
        None => Err(anyhow!("The bot is not in a voice channel")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_durations_read_minutes_seconds() {
        assert_eq!(format_duration(Duration::from_secs(59)), "0:59");
        assert_eq!(format_duration(Duration::from_secs(65)), "1:05");
        assert_eq!(format_duration(Duration::from_secs(3599)), "59:59");
    }

    #[test]
    fn long_durations_grow_an_hours_field() {
        assert_eq!(format_duration(Duration::from_secs(3600)), "1:00:00");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1:01:01");
        assert_eq!(format_duration(Duration::from_secs(7325)), "2:02:05");
    }

    #[test]
    fn unknown_and_zero_lengths_share_a_label() {
        assert_eq!(duration_label(None), "Unknown");
        assert_eq!(duration_label(Some(Duration::ZERO)), "Unknown");
        assert_eq!(duration_label(Some(Duration::from_secs(190))), "3:10");
    }

    #[test]
    fn markdown_control_characters_are_escaped() {
        assert_eq!(escape_markdown("**loud**"), "\\*\\*loud\\*\\*");
        assert_eq!(escape_markdown("[x](y)"), "\\[x\\]\\(y\\)");
        assert_eq!(escape_markdown("plain title 99"), "plain title 99");
    }
}
