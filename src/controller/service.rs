//! The playback controller: one engine, one focus handle, two observers

use crate::model::{ActiveTrack, EpisodeInfo, PlaybackStatus};

use super::collaborators::{
    AudioEngine, FocusArbiter, NotificationPresenter, WidgetBroadcaster, WidgetUpdate,
};
use super::events::{
    EngineEvent, FocusChange, FocusRequest, HostCommand, Residency, StartOutcome,
};
use super::machine::{self, Effect, Trigger};
use super::PlayerError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSettings {
    pub full_volume: f32,
    /// Volume used while another app holds transient, duckable focus
    pub duck_volume: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            full_volume: 1.0,
            duck_volume: 0.1,
        }
    }
}

pub struct PlayerService<E, F, N, W> {
    engine: E,
    focus: F,
    notifier: N,
    widget: W,
    settings: PlayerSettings,
    status: PlaybackStatus,
    track: Option<ActiveTrack>,
    /// False once the engine no longer holds `track`'s stream: the load
    /// failed or was stopped before it became ready
    loaded: bool,
    request_id: u64,
    host_bound: bool,
    terminate: bool,
    shut_down: bool,
}

impl<E, F, N, W> PlayerService<E, F, N, W>
where
    E: AudioEngine,
    F: FocusArbiter,
    N: NotificationPresenter,
    W: WidgetBroadcaster,
{
    pub fn new(engine: E, focus: F, notifier: N, widget: W, settings: PlayerSettings) -> Self {
        Self {
            engine,
            focus,
            notifier,
            widget,
            settings,
            status: PlaybackStatus::Idle,
            track: None,
            loaded: false,
            request_id: 0,
            host_bound: false,
            terminate: false,
            shut_down: false,
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn is_playing(&self) -> bool {
        self.status == PlaybackStatus::Playing
    }

    pub fn active_track(&self) -> Option<&ActiveTrack> {
        self.track.as_ref()
    }

    /// Set once a STOP arrived with no host bound
    pub fn wants_termination(&self) -> bool {
        self.terminate
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Play `url`, or resume it if it is already the loaded track.
    ///
    /// Returns the id of the new load so the caller can bound the wait for
    /// the engine to become ready (see [`Self::ready_deadline`]).
    pub fn request(&mut self, url: &str, episode: EpisodeInfo) -> Option<u64> {
        if self.loaded && self.track.as_ref().is_some_and(|track| track.url() == url) {
            tracing::debug!(url, "Requested track already loaded, resuming");
            self.play();
            return None;
        }

        tracing::info!(url, title = %episode.title, "Loading new track");
        let was_loading = self.status == PlaybackStatus::Loading;
        self.track = Some(ActiveTrack::new(url, episode));
        self.loaded = true;
        self.request_id += 1;
        self.apply(Trigger::Engine(EngineEvent::Buffering));
        if was_loading {
            // Status did not change, but the notification still names the old episode
            if let Some(track) = &self.track {
                self.notifier.start(PlaybackStatus::Loading, track.episode());
            }
        }

        self.engine.prepare(url);
        self.engine.set_play_when_ready(true);
        Some(self.request_id)
    }

    pub fn play(&mut self) {
        if !self.loaded {
            tracing::debug!("Play ignored, nothing loaded");
            return;
        }
        self.engine.set_play_when_ready(true);
    }

    pub fn pause(&mut self) {
        self.pause_engine();
        self.focus.abandon();
    }

    /// Like [`Self::play`], kept separate so focus regain reads as intent
    pub fn resume(&mut self) {
        if self.loaded {
            self.play();
        }
    }

    /// Stop playback and give up focus. The track stays referenced for display.
    pub fn stop(&mut self) {
        if self.status == PlaybackStatus::Loading {
            // The engine drops the pending fetch
            self.loaded = false;
        }
        self.engine.stop();
        self.focus.abandon();
        self.apply(Trigger::Stop);
    }

    pub fn handle_engine_event(&mut self, event: EngineEvent) -> Result<(), PlayerError> {
        tracing::debug!(?event, status = %self.status, "Engine event");
        let failure = match &event {
            EngineEvent::Error(reason) => Some(reason.clone()),
            _ => None,
        };
        if failure.is_some() {
            self.loaded = false;
            self.engine.stop();
            self.focus.abandon();
        } else if matches!(event, EngineEvent::Ready { .. }) && !self.loaded {
            tracing::debug!("Ignoring readiness of an abandoned load");
            return Ok(());
        }

        self.apply(Trigger::Engine(event));
        match failure {
            Some(reason) => Err(PlayerError::PlaybackFailed(reason)),
            None => Ok(()),
        }
    }

    pub fn handle_focus_change(&mut self, change: FocusChange) {
        tracing::debug!(?change, status = %self.status, "Audio focus changed");
        match change {
            FocusChange::Gained => {
                self.engine.set_volume(self.settings.full_volume);
                self.resume();
            }
            FocusChange::Lost => self.stop(),
            FocusChange::LostTransient => {
                if self.is_playing() {
                    self.pause_engine();
                }
            }
            FocusChange::LostTransientCanDuck => {
                if self.is_playing() {
                    self.engine.set_volume(self.settings.duck_volume);
                }
            }
        }
    }

    /// Fail a load that never became ready
    pub fn ready_deadline(&mut self, request_id: u64) -> Result<(), PlayerError> {
        if request_id != self.request_id || self.status != PlaybackStatus::Loading {
            return Ok(());
        }
        tracing::warn!(request_id, "Engine did not become ready in time");
        self.loaded = false;
        self.engine.stop();
        self.focus.abandon();
        self.apply(Trigger::Engine(EngineEvent::Error("timed out waiting for the stream".into())));
        Err(PlayerError::ReadyTimeout)
    }

    /// Dispatch an action string from the host. `None` means the host
    /// restarted us without a command.
    pub fn on_start_command(&mut self, action: Option<&str>) -> StartOutcome {
        let Some(action) = action else {
            return StartOutcome::Sticky;
        };

        let command = match action.parse::<HostCommand>() {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected host command");
                return StartOutcome::NotSticky;
            }
        };

        if self.focus.request() == FocusRequest::Denied {
            tracing::warn!(error = %PlayerError::AudioFocusDenied, ?command, "Host command dropped");
            self.stop();
            return StartOutcome::NotSticky;
        }

        tracing::info!(?command, status = %self.status, "Host command");
        match command {
            HostCommand::Play => self.play(),
            HostCommand::Pause => {
                if self.status == PlaybackStatus::Stopped {
                    self.stop();
                } else {
                    self.pause();
                }
            }
            HostCommand::Stop => {
                if self.host_bound && self.status.is_active() {
                    self.pause();
                    self.notifier.cancel();
                } else {
                    self.stop();
                    if !self.host_bound {
                        self.terminate = true;
                    }
                }
            }
        }

        StartOutcome::Sticky
    }

    pub fn on_bind(&mut self) {
        self.host_bound = true;
    }

    pub fn on_unbind(&mut self) -> Residency {
        self.host_bound = false;
        if self.status == PlaybackStatus::Idle {
            Residency::Terminate
        } else {
            Residency::Remain
        }
    }

    /// Ordered teardown. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        tracing::info!(status = %self.status, "Shutting down player");

        self.engine.set_play_when_ready(false);
        self.engine.release();
        self.focus.abandon();
        self.notifier.cancel();
    }

    fn pause_engine(&mut self) {
        self.engine.set_play_when_ready(false);
        self.apply(Trigger::Pause);
    }

    fn apply(&mut self, trigger: Trigger) {
        let transition = machine::transition(self.status, &trigger, self.track.is_some());
        if transition.status != self.status {
            tracing::debug!(from = %self.status, to = %transition.status, "Playback status changed");
        }
        self.status = transition.status;

        for effect in transition.effects {
            match effect {
                Effect::ShowNotification(status) => {
                    if let Some(track) = &self.track {
                        self.notifier.start(status, track.episode());
                    }
                }
                Effect::CancelNotification => self.notifier.cancel(),
                Effect::WidgetEpisode { is_playing } => {
                    if let Some(track) = &self.track {
                        let episode = track.episode();
                        self.widget.broadcast(WidgetUpdate::Episode {
                            title: episode.title.clone(),
                            thumbnail_url: episode.thumbnail_url.clone(),
                            is_playing,
                        });
                    }
                }
                Effect::WidgetNoEpisode => self.widget.broadcast(WidgetUpdate::NoEpisode),
                Effect::ReportFailure(reason) => {
                    tracing::error!(reason = %reason, "Playback failed");
                }
            }
        }
    }
}
