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

use anyhow::{anyhow, Result};
use serenity::all::{CommandInteraction, CommandOptionType, Context, CreateCommandOption};
use serenity::builder::CreateCommand;

use crate::commands::play::{queue_request, string_option};
use crate::misc::respond_ephemeral;
use crate::resolver;

pub async fn handle(ctx: &Context, interaction: &CommandInteraction) -> Result<()> {
    let url = string_option(interaction, "url")
        .ok_or_else(|| anyhow!("Missing the required url option"))?;

    if !resolver::is_known_media_url(&url) {
        respond_ephemeral(
            ctx,
            interaction,
            "That does not look like a supported media URL. YouTube, SoundCloud and Bandcamp links work here; for anything else try /play",
        )
        .await;
        return Ok(());
    }

    queue_request(ctx, interaction, &url).await
}

pub fn register() -> CreateCommand {
    CreateCommand::new("playurl")
        .description("Queue a track from a media page URL")
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::String,
                "url",
                "A YouTube, SoundCloud or Bandcamp URL",
            )
            .required(true),
        )
}
