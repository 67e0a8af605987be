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

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;

/// Program used to query the media index. Must be on PATH.
const YTDLP_BIN: &str = "yt-dlp";

const UNKNOWN_TITLE: &str = "Unknown title";

/// Hosts /playurl accepts. Anything else is rejected before resolution.
const KNOWN_MEDIA_HOSTS: [&str; 4] = ["youtube.com", "youtu.be", "soundcloud.com", "bandcamp.com"];

/// One playable item, as handed to the queue. Immutable once resolved.
#[derive(Debug, Clone)]
pub struct Track {
    pub title: String,
    /// Direct audio stream URL. Often signed and short-lived; never empty.
    pub stream_url: String,
    /// Page the stream was resolved from, for display links.
    pub page_url: Option<String>,
    pub thumbnail: Option<String>,
    pub duration: Option<Duration>,
    /// Mention of the user who queued it.
    pub requested_by: String,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("No results for that query")]
    NotFound,
    #[error("The result has no playable audio stream")]
    NoPlayableStream,
    #[error("Media lookup failed: {0}")]
    Upstream(String),
    #[error("Could not run {YTDLP_BIN}: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Unreadable media metadata: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Subset of the extractor's JSON output this bot cares about. Unknown
/// fields are plentiful and ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct IndexEntry {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    webpage_url: Option<String>,
    #[serde(default)]
    formats: Vec<IndexFormat>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IndexFormat {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    acodec: Option<String>,
}

impl IndexFormat {
    /// Video-only formats report their audio codec as the string "none".
    fn has_audio_stream(&self) -> bool {
        matches!(self.acodec.as_deref(), Some(codec) if codec != "none")
    }

    fn usable_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.is_empty())
    }
}

impl Track {
    /// Picks the playable stream out of an index entry. The entry's own URL
    /// wins; otherwise the first listed format carrying an audio stream is
    /// used instead.
    pub(crate) fn from_entry(entry: IndexEntry, requested_by: String) -> Result<Self, ResolveError> {
        let direct = entry
            .url
            .as_deref()
            .filter(|url| !url.is_empty())
            .map(str::to_owned);
        let stream_url = direct.or_else(|| {
            entry
                .formats
                .iter()
                .find(|format| format.has_audio_stream() && format.usable_url().is_some())
                .and_then(|format| format.usable_url())
                .map(str::to_owned)
        });
        let Some(stream_url) = stream_url else {
            return Err(ResolveError::NoPlayableStream);
        };

        let duration = entry
            .duration
            .filter(|&secs| secs > 0.0)
            .map(|secs| Duration::from_secs(secs.round() as u64));

        Ok(Self {
            title: entry
                .title
                .filter(|title| !title.is_empty())
                .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            stream_url,
            page_url: entry.webpage_url,
            thumbnail: entry.thumbnail,
            duration,
            requested_by,
        })
    }
}

/// Resolves user input into a playable track. Anything that does not look
/// like a URL is run through the index's search and the top hit is taken.
pub async fn resolve(query: &str, requested_by: String) -> Result<Track, ResolveError> {
    let target = if query.starts_with("http://") || query.starts_with("https://") {
        query.to_string()
    } else {
        format!("ytsearch1:{query}")
    };

    let entry = fetch_entry(&target).await?;
    Track::from_entry(entry, requested_by)
}

async fn fetch_entry(target: &str) -> Result<IndexEntry, ResolveError> {
    let output = Command::new(YTDLP_BIN)
        .arg("--no-warnings")
        .arg("-j")
        .arg(target)
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = stderr
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("unknown extractor error")
            .to_string();
        return Err(ResolveError::Upstream(reason));
    }

    // One JSON object per line. Searches capped at one result put their
    // single entry on the first line; empty output means no hits.
    let stdout = String::from_utf8_lossy(&output.stdout);
    let first = stdout
        .lines()
        .find(|line| !line.trim().is_empty())
        .ok_or(ResolveError::NotFound)?;

    Ok(serde_json::from_str(first)?)
}

/// Whether `input` is a well-formed http(s) URL on a recognized media host,
/// subdomains included (www/m/music.youtube.com and friends).
pub fn is_known_media_url(input: &str) -> bool {
    let Ok(url) = reqwest::Url::parse(input) else {
        return false;
    };
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    let Some(host) = url.host_str() else {
        return false;
    };
    KNOWN_MEDIA_HOSTS
        .iter()
        .any(|known| host == *known || host.ends_with(&format!(".{known}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_json(json: &str) -> IndexEntry {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn direct_url_wins_over_formats() {
        let entry = entry_json(
            r#"{
                "title": "Some song",
                "url": "https://cdn.example/direct.m4a",
                "webpage_url": "https://media.example/watch?v=abc",
                "duration": 190.0,
                "formats": [
                    {"url": "https://cdn.example/other.m4a", "acodec": "opus"}
                ]
            }"#,
        );

        let track = Track::from_entry(entry, "<@1>".to_string()).unwrap();
        assert_eq!(track.stream_url, "https://cdn.example/direct.m4a");
        assert_eq!(track.title, "Some song");
        assert_eq!(track.duration, Some(Duration::from_secs(190)));
        assert_eq!(
            track.page_url.as_deref(),
            Some("https://media.example/watch?v=abc")
        );
    }

    #[test]
    fn falls_back_to_audio_format() {
        let entry = entry_json(
            r#"{
                "title": "Formats only",
                "formats": [
                    {"url": "https://cdn.example/video-only", "acodec": "none"},
                    {"url": "https://cdn.example/with-audio", "acodec": "mp4a.40.2"},
                    {"url": "https://cdn.example/also-audio", "acodec": "opus"}
                ]
            }"#,
        );

        let track = Track::from_entry(entry, "<@1>".to_string()).unwrap();
        assert_eq!(track.stream_url, "https://cdn.example/with-audio");
    }

    #[test]
    fn no_audio_format_is_an_error() {
        let entry = entry_json(
            r#"{
                "title": "Silent movie",
                "formats": [
                    {"url": "https://cdn.example/video-only", "acodec": "none"},
                    {"url": "https://cdn.example/no-codec-listed"}
                ]
            }"#,
        );

        assert!(matches!(
            Track::from_entry(entry, "<@1>".to_string()),
            Err(ResolveError::NoPlayableStream)
        ));
    }

    #[test]
    fn empty_url_counts_as_missing() {
        let entry = entry_json(
            r#"{
                "title": "Blank direct url",
                "url": "",
                "formats": [
                    {"url": "https://cdn.example/fallback", "acodec": "opus"}
                ]
            }"#,
        );

        let track = Track::from_entry(entry, "<@1>".to_string()).unwrap();
        assert_eq!(track.stream_url, "https://cdn.example/fallback");
    }

    #[test]
    fn missing_title_gets_a_placeholder() {
        let entry = entry_json(r#"{"url": "https://cdn.example/a.m4a"}"#);
        let track = Track::from_entry(entry, "<@1>".to_string()).unwrap();
        assert_eq!(track.title, UNKNOWN_TITLE);
    }

    #[test]
    fn zero_duration_reads_as_unknown() {
        let entry = entry_json(r#"{"url": "https://cdn.example/live", "duration": 0.0}"#);
        let track = Track::from_entry(entry, "<@1>".to_string()).unwrap();
        assert!(track.duration.is_none());
    }

    #[test]
    fn fractional_duration_rounds_to_whole_seconds() {
        let entry = entry_json(r#"{"url": "https://cdn.example/a.m4a", "duration": 123.6}"#);
        let track = Track::from_entry(entry, "<@1>".to_string()).unwrap();
        assert_eq!(track.duration, Some(Duration::from_secs(124)));
    }

    #[test]
    fn recognizes_known_media_urls() {
        assert!(is_known_media_url("https://youtube.com/watch?v=abc"));
        assert!(is_known_media_url("https://www.youtube.com/watch?v=abc"));
        assert!(is_known_media_url("https://music.youtube.com/watch?v=abc"));
        assert!(is_known_media_url("https://youtu.be/abc"));
        assert!(is_known_media_url("http://soundcloud.com/artist/track"));
        assert!(is_known_media_url("https://artist.bandcamp.com/track/song"));
    }

    #[test]
    fn rejects_unknown_or_malformed_urls() {
        assert!(!is_known_media_url("https://example.com/watch?v=abc"));
        assert!(!is_known_media_url("https://evilyoutube.com/watch?v=abc"));
        assert!(!is_known_media_url("ftp://youtube.com/file"));
        assert!(!is_known_media_url("youtube.com/watch?v=abc"));
        assert!(!is_known_media_url("not a url at all"));
    }
}
