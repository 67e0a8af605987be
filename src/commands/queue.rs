use anyhow::Result;
use serenity::all::{CommandInteraction, Context, CreateCommand};

use crate::misc::{duration_label, escape_markdown, guild_player, respond_command};
use crate::player::{PlaybackState, PlayerData};

/// Upcoming tracks shown before the listing is cut off.
const QUEUE_PREVIEW_LIMIT: usize = 10;

pub async fn handle(ctx: &Context, interaction: &CommandInteraction) -> Result<()> {
    let Some(guild_id) = interaction.guild_id else {
        respond_command(ctx, interaction, "This command only works in a server").await;
        return Ok(());
    };
    let Some(player) = guild_player(ctx, guild_id).await else {
        respond_command(ctx, interaction, "The bot must be in a voice channel").await;
        return Ok(());
    };

    let content = {
        let data = player.data.read().await;
        format_queue(&data)
    };
    respond_command(ctx, interaction, &content).await;

    Ok(())
}

pub fn register() -> CreateCommand {
    CreateCommand::new("queue").description("View the current song queue")
}

fn format_queue(data: &PlayerData) -> String {
    let mut current_content = String::new();
    let mut queue_content = String::from("Current song queue:\n");

    if let Some(track) = data.now_playing() {
        let paused = if data.state == PlaybackState::Paused {
            " (paused)"
        } else {
            ""
        };
        current_content = format!(
            "Currently playing: **{}** ({}){}\n",
            escape_markdown(&track.title),
            duration_label(track.duration),
            paused
        );
    }

    let upcoming = data.queue.len().saturating_sub(1);
    if upcoming == 0 {
        queue_content = "The queue is empty. Use /play to pick a song.".to_string();
    } else {
        for (i, track) in data.queue.upcoming().take(QUEUE_PREVIEW_LIMIT).enumerate() {
            queue_content.push_str(&format!(
                "{}: **{}** ({})\n",
                i + 1,
                escape_markdown(&track.title),
                duration_label(track.duration)
            ));
        }
        if upcoming > QUEUE_PREVIEW_LIMIT {
            queue_content.push_str(&format!("...and {} more\n", upcoming - QUEUE_PREVIEW_LIMIT));
        }
    }

    current_content + &queue_content
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::queue::TrackQueue;
    use crate::resolver::Track;

    fn track(title: &str) -> Track {
        Track {
            title: title.to_string(),
            stream_url: format!("https://cdn.example/{title}.m4a"),
            page_url: None,
            thumbnail: None,
            duration: Some(Duration::from_secs(190)),
            requested_by: "tester".to_string(),
        }
    }

    fn data_with(state: PlaybackState, titles: &[&str]) -> PlayerData {
        let mut queue = TrackQueue::new();
        for title in titles {
            queue.enqueue(track(title));
        }
        PlayerData { queue, state }
    }

    #[test]
    fn empty_and_idle_reads_as_empty() {
        let data = data_with(PlaybackState::Idle, &[]);
        assert_eq!(format_queue(&data), "The queue is empty. Use /play to pick a song.");
    }

    #[test]
    fn playing_head_is_not_listed_as_upcoming() {
        let data = data_with(PlaybackState::Playing, &["head", "next"]);
        let content = format_queue(&data);
        assert!(content.starts_with("Currently playing: **head** (3:10)\n"));
        assert!(content.contains("1: **next** (3:10)\n"));
        assert!(!content.contains("2:"));
    }

    #[test]
    fn paused_head_is_marked() {
        let data = data_with(PlaybackState::Paused, &["head"]);
        let content = format_queue(&data);
        assert!(content.starts_with("Currently playing: **head** (3:10) (paused)\n"));
        assert!(content.ends_with("The queue is empty. Use /play to pick a song."));
    }

    #[test]
    fn long_queues_are_cut_off_with_a_count() {
        let titles: Vec<String> = (0..13).map(|i| format!("track{i}")).collect();
        let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        let data = data_with(PlaybackState::Playing, &refs);

        // Head plus twelve upcoming: ten listed, two beyond the cut.
        let content = format_queue(&data);
        assert!(content.contains("10: **track10** (3:10)\n"));
        assert!(!content.contains("11: "));
        assert!(content.ends_with("...and 2 more\n"));
    }

    #[test]
    fn exactly_at_the_limit_shows_no_overflow_line() {
        let titles: Vec<String> = (0..11).map(|i| format!("track{i}")).collect();
        let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        let data = data_with(PlaybackState::Playing, &refs);

        let content = format_queue(&data);
        assert!(content.contains("10: **track10** (3:10)\n"));
        assert!(!content.contains("more"));
    }
}
