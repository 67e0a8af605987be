use serenity::all::Interaction;
use serenity::all::Ready;
use serenity::all::VoiceState;
use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::prelude::*;

use crate::commands;
use crate::misc;

pub struct Handler;

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.content == "!ping" {
            if let Err(why) = msg.channel_id.say(&ctx.http, "Pong!").await {
                log::error!("Error sending message: {why:?}");
            }
        }
    }

    async fn ready(&self, ctx: Context, botdata: Ready) {
        log::info!("Logged in as {}", botdata.user.name);
        if let Err(err) = commands::register_commands(&ctx.http).await {
            log::error!("Unable to register commands: {}", err.to_string())
        };
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(ref command) = interaction {
            commands::handle_commands(ctx, command).await
        }
    }

    async fn voice_state_update(&self, ctx: Context, _old: Option<VoiceState>, new: VoiceState) {
        // When the bot itself is kicked out of (or moved from) its voice
        // channel there is no /leave to clean up after it, so a dead
        // connection must not keep a queue alive.
        if new.channel_id.is_some() {
            return;
        }
        if new.user_id != ctx.cache.current_user().id {
            return;
        }
        let Some(guild_id) = new.guild_id else {
            return;
        };

        log::info!("Dropped from voice in guild {guild_id}, discarding its queue");
        if let Err(err) = misc::leave_vc(&ctx, guild_id).await {
            // Normal when the disconnect was our own /leave.
            log::debug!("Voice cleanup: {err:#}");
        }
    }
}
