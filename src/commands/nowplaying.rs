/*
 * This file is part of Jukebox.
 *
 * Copyright (C) 2025-present Jukebox contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 */

use anyhow::Result;
use serenity::all::{
    CommandInteraction, Context, CreateCommand, CreateInteractionResponse,
    CreateInteractionResponseMessage,
};

use crate::commands::play::track_embed;
use crate::misc::{guild_player, respond_command};
use crate::player::PlaybackState;

pub async fn handle(ctx: &Context, interaction: &CommandInteraction) -> Result<()> {
    let Some(guild_id) = interaction.guild_id else {
        respond_command(ctx, interaction, "This command only works in a server").await;
        return Ok(());
    };
    let Some(player) = guild_player(ctx, guild_id).await else {
        respond_command(ctx, interaction, "The bot must be in a voice channel").await;
        return Ok(());
    };

    let (track, paused) = {
        let data = player.data.read().await;
        (
            data.now_playing().cloned(),
            data.state == PlaybackState::Paused,
        )
    };

    let Some(track) = track else {
        respond_command(ctx, interaction, "No track is currently playing").await;
        return Ok(());
    };

    let heading = if paused {
        "Now playing (paused)"
    } else {
        "Now playing"
    };
    let response = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new().embed(track_embed(heading, &track)),
    );
    if let Err(why) = interaction.create_response(&ctx.http, response).await {
        log::error!("Error sending response: {why:?}");
    }

    Ok(())
}

pub fn register() -> CreateCommand {
    CreateCommand::new("nowplaying").description("Show the track that is currently playing")
}
