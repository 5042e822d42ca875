//! Seams between the controller and the outside world.
//!
//! The controller owns one value of each trait for its whole lifetime; tests
//! substitute recording fakes.

use crate::model::{EpisodeInfo, PlaybackStatus};

use super::events::FocusRequest;

/// Decode/render backend. Lifecycle changes come back as
/// [`EngineEvent`](super::EngineEvent)s on whatever channel the engine was built with.
pub trait AudioEngine {
    /// Replace the current source (if any) with `url` and start buffering it
    fn prepare(&mut self, url: &str);
    fn set_play_when_ready(&mut self, play: bool);
    fn stop(&mut self);
    fn set_volume(&mut self, volume: f32);
    /// Free the output device. The engine is unusable afterwards.
    fn release(&mut self);
}

pub trait FocusArbiter {
    fn request(&mut self) -> FocusRequest;
    fn abandon(&mut self);
}

/// Renders (or cancels) the now-playing notification
pub trait NotificationPresenter {
    fn start(&mut self, status: PlaybackStatus, episode: &EpisodeInfo);
    fn cancel(&mut self);
}

/// Update pushed to every home-screen widget instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetUpdate {
    Episode {
        title: String,
        thumbnail_url: String,
        is_playing: bool,
    },
    NoEpisode,
}

pub trait WidgetBroadcaster {
    fn broadcast(&mut self, update: WidgetUpdate);
}
