use std::sync::Arc;

use serenity::all::{ChannelId, Context, CreateMessage};
use serenity::async_trait;
use songbird::input::HttpRequest;
use songbird::tracks::TrackHandle;
use songbird::{Call, Event, EventContext, EventHandler as VoiceEventHandler, TrackEvent};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};

use crate::misc::{duration_label, escape_markdown};
use crate::queue::TrackQueue;
use crate::resolver::Track;

const CONTROL_BUFFER: usize = 64;

/// Streaming status of one guild's player. A fully disconnected guild has no
/// player at all, so there is no variant for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Playing,
    Paused,
}

/// Queue and status snapshot, readable by any command. All writes happen on
/// the guild's driver task.
pub struct PlayerData {
    pub(crate) queue: TrackQueue,
    pub(crate) state: PlaybackState,
}

impl PlayerData {
    pub(crate) fn new() -> Self {
        Self {
            queue: TrackQueue::new(),
            state: PlaybackState::Idle,
        }
    }

    /// The queue head while a stream is loaded. Derived rather than stored,
    /// so it cannot drift from the queue.
    pub fn now_playing(&self) -> Option<&Track> {
        match self.state {
            PlaybackState::Idle => None,
            PlaybackState::Playing | PlaybackState::Paused => self.queue.head(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlayerError {
    #[error("No track is currently playing")]
    NothingPlaying,
    #[error("Already paused")]
    AlreadyPaused,
    #[error("Playback is not paused")]
    NotPaused,
    #[error("The player is gone, the bot may have left the voice channel")]
    Stopped,
}

/// What happened to a freshly enqueued track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// The player was idle: the track went straight to the head and started.
    Started,
    /// Something else is streaming; the track waits at this 1-based position
    /// among the upcoming tracks.
    Queued(usize),
    /// Its stream would not start and the track was dropped on the spot.
    Failed(String),
}

/// Status notifications posted to the guild's text channel.
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    TrackStarted(Track),
    TrackFailed { track: Track, reason: String },
    QueueFinished,
}

pub enum PlayerControlMessage {
    Enqueue {
        track: Track,
        reply: oneshot::Sender<EnqueueOutcome>,
    },
    Skip {
        reply: oneshot::Sender<Result<(), PlayerError>>,
    },
    Pause {
        reply: oneshot::Sender<Result<(), PlayerError>>,
    },
    Resume {
        reply: oneshot::Sender<Result<(), PlayerError>>,
    },
    Clear {
        reply: oneshot::Sender<usize>,
    },
    /// The active stream stopped, whether it ran out, died, or was skipped.
    TrackEnded,
    Disconnect {
        reply: oneshot::Sender<()>,
    },
}

/// Boundary between the driver task and the actual voice stream, so the
/// driver can be exercised without a live Discord connection.
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Starts streaming `track`. Implementations must deliver
    /// `PlayerControlMessage::TrackEnded` on `on_end` exactly once when the
    /// stream stops for any reason.
    async fn start(
        &self,
        track: &Track,
        on_end: mpsc::Sender<PlayerControlMessage>,
    ) -> anyhow::Result<()>;

    /// Cuts the active stream short. The end notification still fires.
    fn stop(&self);

    fn set_paused(&self, paused: bool);
}

/// Cloneable handle to one guild's player. Mutations go through the control
/// channel to the driver task; `data` is read directly for display.
#[derive(Clone)]
pub struct PlayerHandle {
    pub(crate) data: Arc<RwLock<PlayerData>>,
    control_tx: mpsc::Sender<PlayerControlMessage>,
}

impl PlayerHandle {
    /// Spawns the driver task. Returns the handle plus the event stream a
    /// notifier is expected to consume.
    pub fn spawn(sink: Arc<dyn AudioSink>) -> (Self, mpsc::Receiver<PlayerEvent>) {
        let (control_tx, control_rx) = mpsc::channel(CONTROL_BUFFER);
        let (event_tx, event_rx) = mpsc::channel(CONTROL_BUFFER);
        let data = Arc::new(RwLock::new(PlayerData::new()));

        let driver = PlayerDriver {
            data: Arc::clone(&data),
            sink,
            control_tx: control_tx.clone(),
            event_tx,
        };
        tokio::spawn(driver.run(control_rx));

        (Self { data, control_tx }, event_rx)
    }

    pub async fn enqueue(&self, track: Track) -> Result<EnqueueOutcome, PlayerError> {
        self.round_trip(|reply| PlayerControlMessage::Enqueue { track, reply })
            .await
    }

    pub async fn skip(&self) -> Result<(), PlayerError> {
        self.round_trip(|reply| PlayerControlMessage::Skip { reply })
            .await?
    }

    pub async fn pause(&self) -> Result<(), PlayerError> {
        self.round_trip(|reply| PlayerControlMessage::Pause { reply })
            .await?
    }

    pub async fn resume(&self) -> Result<(), PlayerError> {
        self.round_trip(|reply| PlayerControlMessage::Resume { reply })
            .await?
    }

    /// Drops every upcoming track, returning how many went. The current
    /// track keeps playing.
    pub async fn clear(&self) -> Result<usize, PlayerError> {
        self.round_trip(|reply| PlayerControlMessage::Clear { reply })
            .await
    }

    /// Stops the stream, empties the queue and shuts the driver task down.
    /// Safe to call on an already stopped player.
    pub async fn disconnect(&self) {
        let _ = self
            .round_trip(|reply| PlayerControlMessage::Disconnect { reply })
            .await;
    }

    async fn round_trip<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<T>) -> PlayerControlMessage,
    ) -> Result<T, PlayerError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.control_tx
            .send(message(reply_tx))
            .await
            .map_err(|_| PlayerError::Stopped)?;
        reply_rx.await.map_err(|_| PlayerError::Stopped)
    }
}

struct StartOutcome {
    started: Option<Track>,
    dropped: Vec<(Track, String)>,
}

struct PlayerDriver {
    data: Arc<RwLock<PlayerData>>,
    sink: Arc<dyn AudioSink>,
    /// Handed to the sink so end-of-stream notifications land back here.
    control_tx: mpsc::Sender<PlayerControlMessage>,
    event_tx: mpsc::Sender<PlayerEvent>,
}

impl PlayerDriver {
    async fn run(self, mut control_rx: mpsc::Receiver<PlayerControlMessage>) {
        while let Some(message) = control_rx.recv().await {
            // Each message is handled to completion under the write guard,
            // so readers never observe a half-advanced queue.
            let mut data = self.data.write().await;
            match message {
                PlayerControlMessage::Enqueue { track, reply } => {
                    data.queue.enqueue(track);
                    let outcome = if data.state == PlaybackState::Idle {
                        let start = self.start_head(&mut data).await;
                        if start.started.is_some() {
                            EnqueueOutcome::Started
                        } else {
                            // The only queued track was this one.
                            let reason = start
                                .dropped
                                .into_iter()
                                .next()
                                .map(|(_, reason)| reason)
                                .unwrap_or_else(|| "unknown error".to_string());
                            EnqueueOutcome::Failed(reason)
                        }
                    } else {
                        EnqueueOutcome::Queued(data.queue.len() - 1)
                    };
                    let _ = reply.send(outcome);
                }
                PlayerControlMessage::TrackEnded => {
                    if data.state == PlaybackState::Idle {
                        // A stop raced a disconnect or an already drained
                        // queue.
                        log::debug!("Stray track-end notification ignored");
                    } else {
                        data.queue.pop_head();
                        let start = self.start_head(&mut data).await;
                        for (track, reason) in start.dropped {
                            self.notify(PlayerEvent::TrackFailed { track, reason }).await;
                        }
                        match start.started {
                            Some(track) => self.notify(PlayerEvent::TrackStarted(track)).await,
                            None => self.notify(PlayerEvent::QueueFinished).await,
                        }
                    }
                }
                PlayerControlMessage::Skip { reply } => {
                    let result = if data.state == PlaybackState::Idle {
                        Err(PlayerError::NothingPlaying)
                    } else {
                        // The stop makes the end notification fire, which
                        // advances the queue like a natural completion.
                        self.sink.stop();
                        Ok(())
                    };
                    let _ = reply.send(result);
                }
                PlayerControlMessage::Pause { reply } => {
                    let result = match data.state {
                        PlaybackState::Idle => Err(PlayerError::NothingPlaying),
                        PlaybackState::Paused => Err(PlayerError::AlreadyPaused),
                        PlaybackState::Playing => {
                            self.sink.set_paused(true);
                            data.state = PlaybackState::Paused;
                            Ok(())
                        }
                    };
                    let _ = reply.send(result);
                }
                PlayerControlMessage::Resume { reply } => {
                    let result = match data.state {
                        PlaybackState::Idle => Err(PlayerError::NothingPlaying),
                        PlaybackState::Playing => Err(PlayerError::NotPaused),
                        PlaybackState::Paused => {
                            self.sink.set_paused(false);
                            data.state = PlaybackState::Playing;
                            Ok(())
                        }
                    };
                    let _ = reply.send(result);
                }
                PlayerControlMessage::Clear { reply } => {
                    let dropped = data.queue.clear(data.state != PlaybackState::Idle);
                    let _ = reply.send(dropped);
                }
                PlayerControlMessage::Disconnect { reply } => {
                    self.sink.stop();
                    data.queue.clear(false);
                    data.state = PlaybackState::Idle;
                    let _ = reply.send(());
                    break;
                }
            }
        }
        log::debug!("Player driver stopped");
    }

    /// Starts whatever sits at the head, dropping heads whose stream refuses
    /// to start, until something plays or the queue runs dry.
    async fn start_head(&self, data: &mut PlayerData) -> StartOutcome {
        let mut dropped = Vec::new();
        loop {
            let Some(track) = data.queue.head().cloned() else {
                data.state = PlaybackState::Idle;
                return StartOutcome {
                    started: None,
                    dropped,
                };
            };
            match self.sink.start(&track, self.control_tx.clone()).await {
                Ok(()) => {
                    data.state = PlaybackState::Playing;
                    return StartOutcome {
                        started: Some(track),
                        dropped,
                    };
                }
                Err(err) => {
                    log::warn!("Failed to start \"{}\": {err:#}", track.title);
                    data.queue.pop_head();
                    dropped.push((track, format!("{err:#}")));
                }
            }
        }
    }

    async fn notify(&self, event: PlayerEvent) {
        // The notifier may already be gone during shutdown.
        let _ = self.event_tx.send(event).await;
    }
}

/// Streams into the guild's live voice connection.
pub struct SongbirdSink {
    call: Arc<Mutex<Call>>,
    client: reqwest::Client,
    current: std::sync::Mutex<Option<TrackHandle>>,
}

impl SongbirdSink {
    pub fn new(call: Arc<Mutex<Call>>, client: reqwest::Client) -> Self {
        Self {
            call,
            client,
            current: std::sync::Mutex::new(None),
        }
    }
}

#[async_trait]
impl AudioSink for SongbirdSink {
    async fn start(
        &self,
        track: &Track,
        on_end: mpsc::Sender<PlayerControlMessage>,
    ) -> anyhow::Result<()> {
        // The mixer loads lazily and swallows dead URLs, so expired or
        // region-blocked streams are caught with a plain request first.
        self.client
            .get(&track.stream_url)
            .send()
            .await?
            .error_for_status()?;

        let input = HttpRequest::new(self.client.clone(), track.stream_url.clone());
        let mut call = self.call.lock().await;
        let handle = call.play_input(input.into());
        handle.add_event(
            Event::Track(TrackEvent::End),
            TrackEndNotifier { control_tx: on_end },
        )?;
        *self.current.lock().unwrap() = Some(handle);
        Ok(())
    }

    fn stop(&self) {
        if let Some(handle) = self.current.lock().unwrap().take() {
            if let Err(err) = handle.stop() {
                log::debug!("Stopping an already finished track: {err}");
            }
        }
    }

    fn set_paused(&self, paused: bool) {
        if let Some(handle) = self.current.lock().unwrap().as_ref() {
            let result = if paused { handle.pause() } else { handle.play() };
            if let Err(err) = result {
                log::debug!("Pause toggle on a finished track: {err}");
            }
        }
    }
}

struct TrackEndNotifier {
    control_tx: mpsc::Sender<PlayerControlMessage>,
}

#[async_trait]
impl VoiceEventHandler for TrackEndNotifier {
    async fn act(&self, _ctx: &EventContext<'_>) -> Option<Event> {
        // The driver may already be gone if the guild disconnected.
        let _ = self
            .control_tx
            .send(PlayerControlMessage::TrackEnded)
            .await;
        None
    }
}

/// Wires a freshly joined call into a player: sink, driver task and the
/// text-channel notifier.
pub fn create_player(
    ctx: &Context,
    call: Arc<Mutex<Call>>,
    client: reqwest::Client,
    text_channel_id: ChannelId,
) -> PlayerHandle {
    let sink = Arc::new(SongbirdSink::new(call, client));
    let (player, events) = PlayerHandle::spawn(sink);
    spawn_notifier(ctx.clone(), text_channel_id, events);
    player
}

/// Posts player status updates to the text channel the player was started
/// from.
pub fn spawn_notifier(ctx: Context, channel_id: ChannelId, mut events: mpsc::Receiver<PlayerEvent>) {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let text = match event {
                PlayerEvent::TrackStarted(track) => format!(
                    "Now playing: **{}** ({})",
                    escape_markdown(&track.title),
                    duration_label(track.duration)
                ),
                PlayerEvent::TrackFailed { track, reason } => format!(
                    "Skipping **{}**, its stream would not start: {reason}",
                    escape_markdown(&track.title)
                ),
                PlayerEvent::QueueFinished => {
                    "Queue finished. Use /play to pick the next song.".to_string()
                }
            };
            if let Err(why) = channel_id
                .send_message(&ctx, CreateMessage::new().content(text))
                .await
            {
                log::error!("Error sending message: {why:?}");
            }
        }
    });
}
