//! Recording fakes for every collaborator, sharing one call log

use std::sync::{Arc, Mutex, MutexGuard};

use crate::model::{EpisodeInfo, PlaybackStatus};

use super::collaborators::{
    AudioEngine, FocusArbiter, NotificationPresenter, WidgetBroadcaster, WidgetUpdate,
};
use super::events::FocusRequest;
use super::service::{PlayerService, PlayerSettings};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Prepare(String),
    PlayWhenReady(bool),
    EngineStop,
    Volume(f32),
    Release,
    FocusRequest,
    FocusAbandon,
    Notify(PlaybackStatus, String),
    CancelNotification,
    Widget(WidgetUpdate),
}

#[derive(Default)]
struct Log {
    calls: Vec<Call>,
    focus_held: bool,
    deny_focus: bool,
}

pub type FakeService = PlayerService<FakeEngine, FakeFocus, FakeNotifier, FakeWidget>;

#[derive(Clone, Default)]
pub struct Recorder {
    log: Arc<Mutex<Log>>,
}

impl Recorder {
    pub fn service(&self) -> FakeService {
        PlayerService::new(
            FakeEngine(self.clone()),
            FakeFocus(self.clone()),
            FakeNotifier(self.clone()),
            FakeWidget(self.clone()),
            PlayerSettings::default(),
        )
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn clear(&self) {
        self.lock().calls.clear();
    }

    pub fn has_focus(&self) -> bool {
        self.lock().focus_held
    }

    pub fn deny_focus(&self) {
        self.lock().deny_focus = true;
    }

    fn record(&self, call: Call) {
        self.lock().calls.push(call);
    }

    fn lock(&self) -> MutexGuard<'_, Log> {
        self.log.lock().unwrap()
    }
}

pub struct FakeEngine(Recorder);

impl AudioEngine for FakeEngine {
    fn prepare(&mut self, url: &str) {
        self.0.record(Call::Prepare(url.to_string()));
    }

    fn set_play_when_ready(&mut self, play: bool) {
        self.0.record(Call::PlayWhenReady(play));
    }

    fn stop(&mut self) {
        self.0.record(Call::EngineStop);
    }

    fn set_volume(&mut self, volume: f32) {
        self.0.record(Call::Volume(volume));
    }

    fn release(&mut self) {
        self.0.record(Call::Release);
    }
}

pub struct FakeFocus(Recorder);

impl FocusArbiter for FakeFocus {
    fn request(&mut self) -> FocusRequest {
        self.0.record(Call::FocusRequest);
        let mut log = self.0.lock();
        if log.deny_focus {
            FocusRequest::Denied
        } else {
            log.focus_held = true;
            FocusRequest::Granted
        }
    }

    fn abandon(&mut self) {
        self.0.record(Call::FocusAbandon);
        self.0.lock().focus_held = false;
    }
}

pub struct FakeNotifier(Recorder);

impl NotificationPresenter for FakeNotifier {
    fn start(&mut self, status: PlaybackStatus, episode: &EpisodeInfo) {
        self.0.record(Call::Notify(status, episode.title.clone()));
    }

    fn cancel(&mut self) {
        self.0.record(Call::CancelNotification);
    }
}

pub struct FakeWidget(Recorder);

impl WidgetBroadcaster for FakeWidget {
    fn broadcast(&mut self, update: WidgetUpdate) {
        self.0.record(Call::Widget(update));
    }
}
