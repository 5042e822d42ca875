//! Background task owning the controller.
//!
//! Host calls, engine events and focus changes arrive on separate channels and
//! are applied one at a time, so the service itself needs no locking.

use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::model::{EpisodeInfo, PlaybackStatus};

use super::collaborators::{AudioEngine, FocusArbiter, NotificationPresenter, WidgetBroadcaster};
use super::events::{EngineEvent, FocusChange, Residency, StartOutcome};
use super::service::PlayerService;

/// Reported to the host while the player task runs
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerSignal {
    StatusChanged(PlaybackStatus),
    PlaybackFailed(String),
    Terminated,
}

enum Input {
    Request { url: String, episode: EpisodeInfo },
    Play,
    Pause,
    Resume,
    Stop,
    Command {
        action: Option<String>,
        reply: oneshot::Sender<StartOutcome>,
    },
    Bind,
    Unbind { reply: oneshot::Sender<Residency> },
    Status { reply: oneshot::Sender<PlaybackStatus> },
    ReadyDeadline(u64),
    Shutdown,
}

/// Cloneable front door to the player task. Dropping every handle shuts the player down.
#[derive(Clone)]
pub struct PlayerHandle {
    tx: UnboundedSender<Input>,
}

impl PlayerHandle {
    pub fn request(&self, url: impl Into<String>, episode: EpisodeInfo) -> Result<()> {
        self.send(Input::Request {
            url: url.into(),
            episode,
        })
    }

    pub fn play(&self) -> Result<()> {
        self.send(Input::Play)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(Input::Pause)
    }

    pub fn resume(&self) -> Result<()> {
        self.send(Input::Resume)
    }

    pub fn stop(&self) -> Result<()> {
        self.send(Input::Stop)
    }

    pub fn bind(&self) -> Result<()> {
        self.send(Input::Bind)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(Input::Shutdown)
    }

    /// Host command channel (`PLAY`, `PAUSE`, `STOP`)
    pub async fn send_command(&self, action: Option<&str>) -> Result<StartOutcome> {
        let (reply, rx) = oneshot::channel();
        self.send(Input::Command {
            action: action.map(str::to_string),
            reply,
        })?;
        Ok(rx.await?)
    }

    pub async fn unbind(&self) -> Result<Residency> {
        let (reply, rx) = oneshot::channel();
        self.send(Input::Unbind { reply })?;
        Ok(rx.await?)
    }

    pub async fn status(&self) -> Result<PlaybackStatus> {
        let (reply, rx) = oneshot::channel();
        self.send(Input::Status { reply })?;
        Ok(rx.await?)
    }

    fn send(&self, input: Input) -> Result<()> {
        self.tx
            .send(input)
            .map_err(|_| anyhow!("player task has stopped"))
    }
}

pub fn spawn_player<E, F, N, W>(
    service: PlayerService<E, F, N, W>,
    engine_events: UnboundedReceiver<EngineEvent>,
    focus_events: UnboundedReceiver<FocusChange>,
    ready_timeout: Duration,
) -> (PlayerHandle, UnboundedReceiver<PlayerSignal>, JoinHandle<()>)
where
    E: AudioEngine + Send + 'static,
    F: FocusArbiter + Send + 'static,
    N: NotificationPresenter + Send + 'static,
    W: WidgetBroadcaster + Send + 'static,
{
    let (tx, inputs) = mpsc::unbounded_channel();
    let (signals, signal_rx) = mpsc::unbounded_channel();
    let deadlines = tx.downgrade();

    tracing::info!(?ready_timeout, "Starting player task");
    let task = tokio::spawn(run(
        service,
        inputs,
        deadlines,
        engine_events,
        focus_events,
        signals,
        ready_timeout,
    ));

    (PlayerHandle { tx }, signal_rx, task)
}

async fn run<E, F, N, W>(
    mut service: PlayerService<E, F, N, W>,
    mut inputs: UnboundedReceiver<Input>,
    deadlines: WeakUnboundedSender<Input>,
    mut engine_events: UnboundedReceiver<EngineEvent>,
    mut focus_events: UnboundedReceiver<FocusChange>,
    signals: UnboundedSender<PlayerSignal>,
    ready_timeout: Duration,
) where
    E: AudioEngine,
    F: FocusArbiter,
    N: NotificationPresenter,
    W: WidgetBroadcaster,
{
    loop {
        let before = service.status();

        let keep_running = tokio::select! {
            input = inputs.recv() => match input {
                Some(input) => handle_input(&mut service, input, &deadlines, &signals, ready_timeout),
                None => {
                    tracing::debug!("All player handles dropped");
                    false
                }
            },
            Some(event) = engine_events.recv() => {
                if let Err(e) = service.handle_engine_event(event) {
                    let _ = signals.send(PlayerSignal::PlaybackFailed(e.to_string()));
                }
                true
            }
            Some(change) = focus_events.recv() => {
                service.handle_focus_change(change);
                true
            }
        };

        let after = service.status();
        if after != before {
            let _ = signals.send(PlayerSignal::StatusChanged(after));
        }

        if !keep_running || service.wants_termination() {
            break;
        }
    }

    service.shutdown();
    let _ = signals.send(PlayerSignal::Terminated);
    tracing::info!("Player task finished");
}

/// Returns `false` once the task should wind down
fn handle_input<E, F, N, W>(
    service: &mut PlayerService<E, F, N, W>,
    input: Input,
    deadlines: &WeakUnboundedSender<Input>,
    signals: &UnboundedSender<PlayerSignal>,
    ready_timeout: Duration,
) -> bool
where
    E: AudioEngine,
    F: FocusArbiter,
    N: NotificationPresenter,
    W: WidgetBroadcaster,
{
    match input {
        Input::Request { url, episode } => {
            if let Some(request_id) = service.request(&url, episode) {
                schedule_deadline(deadlines.clone(), request_id, ready_timeout);
            }
        }
        Input::Play => service.play(),
        Input::Pause => service.pause(),
        Input::Resume => service.resume(),
        Input::Stop => service.stop(),
        Input::Command { action, reply } => {
            let outcome = service.on_start_command(action.as_deref());
            let _ = reply.send(outcome);
        }
        Input::Bind => service.on_bind(),
        Input::Unbind { reply } => {
            let residency = service.on_unbind();
            let _ = reply.send(residency);
            if residency == Residency::Terminate {
                return false;
            }
        }
        Input::Status { reply } => {
            let _ = reply.send(service.status());
        }
        Input::ReadyDeadline(request_id) => {
            if let Err(e) = service.ready_deadline(request_id) {
                let _ = signals.send(PlayerSignal::PlaybackFailed(e.to_string()));
            }
        }
        Input::Shutdown => return false,
    }
    true
}

fn schedule_deadline(deadlines: WeakUnboundedSender<Input>, request_id: u64, timeout: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(timeout).await;
        if let Some(tx) = deadlines.upgrade() {
            let _ = tx.send(Input::ReadyDeadline(request_id));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::testing::{Call, Recorder};
    use crate::controller::WidgetUpdate;

    const TIMEOUT: Duration = Duration::from_secs(5);

    struct Harness {
        recorder: Recorder,
        handle: PlayerHandle,
        signals: UnboundedReceiver<PlayerSignal>,
        task: JoinHandle<()>,
        engine: UnboundedSender<EngineEvent>,
        focus: UnboundedSender<FocusChange>,
    }

    fn start() -> Harness {
        let recorder = Recorder::default();
        let (engine, engine_rx) = mpsc::unbounded_channel();
        let (focus, focus_rx) = mpsc::unbounded_channel();
        let (handle, signals, task) = spawn_player(recorder.service(), engine_rx, focus_rx, TIMEOUT);
        Harness {
            recorder,
            handle,
            signals,
            task,
            engine,
            focus,
        }
    }

    fn episode() -> EpisodeInfo {
        EpisodeInfo::new("Episode One", "http://a/thumb.jpg")
    }

    #[tokio::test]
    async fn engine_events_drive_status_signals() {
        let mut h = start();

        h.handle.request("http://a/ep1.mp3", episode()).unwrap();
        assert_eq!(
            h.signals.recv().await,
            Some(PlayerSignal::StatusChanged(PlaybackStatus::Loading))
        );

        h.engine
            .send(EngineEvent::Ready { play_when_ready: true })
            .unwrap();
        assert_eq!(
            h.signals.recv().await,
            Some(PlayerSignal::StatusChanged(PlaybackStatus::Playing))
        );
        assert_eq!(h.handle.status().await.unwrap(), PlaybackStatus::Playing);
        assert!(h.recorder.calls().contains(&Call::Widget(WidgetUpdate::Episode {
            title: "Episode One".into(),
            thumbnail_url: "http://a/thumb.jpg".into(),
            is_playing: true,
        })));
    }

    #[tokio::test]
    async fn engine_error_is_signalled() {
        let mut h = start();
        h.handle.request("http://a/ep1.mp3", episode()).unwrap();
        h.signals.recv().await;

        h.engine.send(EngineEvent::Error("bad frame".into())).unwrap();

        assert_eq!(
            h.signals.recv().await,
            Some(PlayerSignal::PlaybackFailed("playback failed: bad frame".into()))
        );
        assert_eq!(
            h.signals.recv().await,
            Some(PlayerSignal::StatusChanged(PlaybackStatus::Idle))
        );
    }

    #[tokio::test]
    async fn focus_changes_reach_the_service() {
        let mut h = start();
        h.handle.request("http://a/ep1.mp3", episode()).unwrap();
        h.signals.recv().await;
        h.engine
            .send(EngineEvent::Ready { play_when_ready: true })
            .unwrap();
        h.signals.recv().await;

        h.focus.send(FocusChange::LostTransient).unwrap();

        assert_eq!(
            h.signals.recv().await,
            Some(PlayerSignal::StatusChanged(PlaybackStatus::Paused))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn load_that_never_becomes_ready_times_out() {
        let mut h = start();
        h.handle.request("http://a/ep1.mp3", episode()).unwrap();
        h.signals.recv().await;

        tokio::time::sleep(TIMEOUT + Duration::from_millis(10)).await;

        assert_eq!(
            h.signals.recv().await,
            Some(PlayerSignal::PlaybackFailed(
                "engine did not become ready in time".into()
            ))
        );
        assert_eq!(h.handle.status().await.unwrap(), PlaybackStatus::Idle);
        assert!(h.recorder.calls().contains(&Call::EngineStop));
    }

    #[tokio::test]
    async fn stop_command_without_host_terminates_the_task() {
        let mut h = start();

        let outcome = h.handle.send_command(Some("STOP")).await.unwrap();

        assert_eq!(outcome, StartOutcome::Sticky);
        assert_eq!(h.signals.recv().await, Some(PlayerSignal::Terminated));
        h.task.await.unwrap();
        assert!(h.recorder.calls().contains(&Call::Release));
        assert!(h.handle.status().await.is_err());
    }

    #[tokio::test]
    async fn unbind_while_idle_terminates() {
        let h = start();
        h.handle.bind().unwrap();

        assert_eq!(h.handle.unbind().await.unwrap(), Residency::Terminate);
        h.task.await.unwrap();
    }

    #[tokio::test]
    async fn unbind_while_playing_stays_resident() {
        let mut h = start();
        h.handle.bind().unwrap();
        h.handle.request("http://a/ep1.mp3", episode()).unwrap();
        h.signals.recv().await;

        assert_eq!(h.handle.unbind().await.unwrap(), Residency::Remain);
        assert_eq!(h.handle.status().await.unwrap(), PlaybackStatus::Loading);
    }

    #[tokio::test]
    async fn dropping_every_handle_tears_down_once() {
        let h = start();
        let recorder = h.recorder.clone();

        drop(h.handle);
        h.task.await.unwrap();

        let cancels = recorder
            .calls()
            .into_iter()
            .filter(|c| *c == Call::CancelNotification)
            .count();
        assert_eq!(cancels, 1);
        assert!(recorder.calls().contains(&Call::Release));
    }

    #[tokio::test]
    async fn request_followed_by_play_command_takes_focus() {
        let h = start();

        h.handle.request("http://a/ep1.mp3", episode()).unwrap();
        let outcome = h.handle.send_command(Some("PLAY")).await.unwrap();

        assert_eq!(outcome, StartOutcome::Sticky);
        assert!(h.recorder.has_focus());
        assert_eq!(h.handle.status().await.unwrap(), PlaybackStatus::Loading);
    }

    #[tokio::test]
    async fn stop_from_handle_clears_notification() {
        let mut h = start();
        h.handle.request("http://a/ep1.mp3", episode()).unwrap();
        h.signals.recv().await;

        h.handle.stop().unwrap();

        assert_eq!(
            h.signals.recv().await,
            Some(PlayerSignal::StatusChanged(PlaybackStatus::Idle))
        );
        assert!(h.recorder.calls().contains(&Call::CancelNotification));
    }
}
