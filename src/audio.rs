//! Streaming audio engine: reqwest fetches the episode, rodio plays it.
//!
//! Output lives on its own thread because rodio's `OutputStream` cannot
//! leave the thread that opened it. The thread reports lifecycle changes as
//! [`EngineEvent`]s on the channel given to [`StreamingEngine::new`].
//!
//! The whole episode is downloaded before decoding starts, so the engine
//! stays in `Loading` for the full download.

use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;

use crate::controller::{AudioEngine, EngineEvent};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

enum AudioCommand {
    /// Drop whatever is playing; only `Load`s for `load_id` are accepted afterwards
    Reset { load_id: u64 },
    Load { load_id: u64, bytes: Vec<u8> },
    SetPlaying(bool),
    Stop,
    Volume(f32),
    Release,
}

pub struct StreamingEngine {
    client: reqwest::Client,
    runtime: Handle,
    audio: Sender<AudioCommand>,
    events: UnboundedSender<EngineEvent>,
    latest_load: Arc<AtomicU64>,
}

impl StreamingEngine {
    /// Must be called from within a tokio runtime
    pub fn new(events: UnboundedSender<EngineEvent>, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .context("Failed to build streaming HTTP client")?;

        let (audio, commands) = mpsc::channel();
        let thread_events = events.clone();
        std::thread::Builder::new()
            .name("audio-output".into())
            .spawn(move || audio_thread(commands, thread_events))
            .context("Failed to spawn audio thread")?;

        Ok(Self {
            client,
            runtime: Handle::current(),
            audio,
            events,
            latest_load: Arc::new(AtomicU64::new(0)),
        })
    }

    fn send(&self, command: AudioCommand) {
        if self.audio.send(command).is_err() {
            tracing::warn!("Audio thread is gone, command dropped");
        }
    }
}

impl AudioEngine for StreamingEngine {
    fn prepare(&mut self, url: &str) {
        let load_id = self.latest_load.fetch_add(1, Ordering::SeqCst) + 1;
        self.send(AudioCommand::Reset { load_id });
        let _ = self.events.send(EngineEvent::Buffering);

        let client = self.client.clone();
        let audio = self.audio.clone();
        let events = self.events.clone();
        let latest_load = Arc::clone(&self.latest_load);
        let url = url.to_string();

        self.runtime.spawn(async move {
            tracing::debug!(url = %url, load_id, "Fetching stream");
            let fetched = async {
                let response = client
                    .get(&url)
                    .send()
                    .await
                    .with_context(|| format!("Request to {url} failed"))?
                    .error_for_status()?;
                let bytes = response.bytes().await.context("Stream interrupted")?;
                anyhow::Ok(bytes.to_vec())
            }
            .await;

            if latest_load.load(Ordering::SeqCst) != load_id {
                tracing::debug!(load_id, "Discarding superseded stream");
                return;
            }

            match fetched {
                Ok(bytes) => {
                    tracing::info!(url = %url, size = bytes.len(), "Stream fetched");
                    let _ = audio.send(AudioCommand::Load { load_id, bytes });
                }
                Err(e) => {
                    let _ = events.send(EngineEvent::Error(format!("{e:#}")));
                }
            }
        });
    }

    fn set_play_when_ready(&mut self, play: bool) {
        self.send(AudioCommand::SetPlaying(play));
    }

    fn stop(&mut self) {
        // A fetch still in flight belongs to the load being stopped
        self.latest_load.fetch_add(1, Ordering::SeqCst);
        self.send(AudioCommand::Stop);
    }

    fn set_volume(&mut self, volume: f32) {
        self.send(AudioCommand::Volume(volume.clamp(0.0, 1.0)));
    }

    fn release(&mut self) {
        // Invalidate any fetch still in flight
        self.latest_load.fetch_add(1, Ordering::SeqCst);
        self.send(AudioCommand::Release);
    }
}

/// The part of a rodio `Sink` the command loop drives
trait PlaybackSink {
    fn play(&self);
    fn pause(&self);
    fn stop(&self);
    fn set_volume(&self, volume: f32);
    fn empty(&self) -> bool;
}

impl PlaybackSink for Sink {
    fn play(&self) {
        Sink::play(self)
    }

    fn pause(&self) {
        Sink::pause(self)
    }

    fn stop(&self) {
        Sink::stop(self)
    }

    fn set_volume(&self, volume: f32) {
        Sink::set_volume(self, volume)
    }

    fn empty(&self) -> bool {
        Sink::empty(self)
    }
}

/// Opens a paused sink over a fully fetched stream
trait OutputDevice {
    type Sink: PlaybackSink;

    fn open(&self, bytes: Vec<u8>) -> Result<Self::Sink>;
}

struct RodioDevice {
    handle: OutputStreamHandle,
}

impl OutputDevice for RodioDevice {
    type Sink = Sink;

    fn open(&self, bytes: Vec<u8>) -> Result<Sink> {
        let source = Decoder::new(Cursor::new(bytes)).context("Failed to decode stream")?;
        let sink = Sink::try_new(&self.handle).context("Failed to create audio sink")?;
        sink.pause();
        sink.append(source);
        Ok(sink)
    }
}

struct Output<D: OutputDevice> {
    device: D,
    events: UnboundedSender<EngineEvent>,
    sink: Option<D::Sink>,
    /// Last loaded stream, kept so play after stop/end restarts without refetching
    source: Option<Vec<u8>>,
    accepted_load: u64,
    play_when_ready: bool,
    volume: f32,
}

impl<D: OutputDevice> Output<D> {
    fn new(device: D, events: UnboundedSender<EngineEvent>) -> Self {
        Self {
            device,
            events,
            sink: None,
            source: None,
            accepted_load: 0,
            play_when_ready: false,
            volume: 1.0,
        }
    }

    /// Returns `false` once the thread should exit
    fn handle(&mut self, command: AudioCommand) -> bool {
        match command {
            AudioCommand::Reset { load_id } => {
                self.drop_sink();
                self.source = None;
                self.accepted_load = load_id;
            }
            AudioCommand::Load { load_id, bytes } => {
                if load_id == self.accepted_load {
                    self.source = Some(bytes);
                    self.start();
                } else {
                    tracing::debug!(load_id, accepted = self.accepted_load, "Ignoring stale stream");
                }
            }
            AudioCommand::SetPlaying(play) => {
                self.play_when_ready = play;
                if let Some(sink) = &self.sink {
                    if play {
                        sink.play();
                    } else {
                        sink.pause();
                    }
                    self.emit(EngineEvent::Ready {
                        play_when_ready: play,
                    });
                } else if play {
                    self.start();
                }
            }
            AudioCommand::Stop => {
                self.drop_sink();
                // Ids start at 1, so a stream still on its way is refused
                self.accepted_load = 0;
                self.play_when_ready = false;
                self.emit(EngineEvent::Idle);
            }
            AudioCommand::Volume(volume) => {
                self.volume = volume;
                if let Some(sink) = &self.sink {
                    sink.set_volume(volume);
                }
            }
            AudioCommand::Release => {
                self.drop_sink();
                tracing::debug!("Audio thread exiting");
                return false;
            }
        }
        true
    }

    /// Called between commands to notice a drained sink
    fn poll(&mut self) {
        if self.sink.as_ref().is_some_and(|sink| sink.empty()) {
            self.sink = None;
            self.play_when_ready = false;
            self.emit(EngineEvent::Ended);
        }
    }

    fn start(&mut self) {
        let Some(bytes) = self.source.clone() else {
            return;
        };
        self.drop_sink();

        match self.device.open(bytes) {
            Ok(sink) => {
                sink.set_volume(self.volume);
                if self.play_when_ready {
                    sink.play();
                }
                self.sink = Some(sink);
                self.emit(EngineEvent::Ready {
                    play_when_ready: self.play_when_ready,
                });
            }
            Err(e) => {
                self.source = None;
                self.emit(EngineEvent::Error(format!("{e:#}")));
            }
        }
    }

    fn drop_sink(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }
}

fn audio_thread(commands: Receiver<AudioCommand>, events: UnboundedSender<EngineEvent>) {
    let (_stream, handle) = match OutputStream::try_default() {
        Ok(output) => output,
        Err(e) => {
            tracing::error!(error = %e, "No audio output device");
            let _ = events.send(EngineEvent::Error(format!("no audio output: {e}")));
            return;
        }
    };

    let mut output = Output::new(RodioDevice { handle }, events);
    loop {
        match commands.recv_timeout(POLL_INTERVAL) {
            Ok(command) => {
                if !output.handle(command) {
                    return;
                }
            }
            Err(RecvTimeoutError::Timeout) => output.poll(),
            Err(RecvTimeoutError::Disconnected) => {
                output.handle(AudioCommand::Release);
                return;
            }
        }
    }
}
