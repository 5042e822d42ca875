//! Controller module - the playback controller and everything feeding it
//!
//! - `events`: engine, focus and host inputs
//! - `machine`: pure status transitions and the side effects they demand
//! - `collaborators`: traits for the engine, focus arbiter, notification and widget
//! - `service`: the controller itself (`PlayerService`)
//! - `runtime`: tokio task that serialises all inputs into the service

mod collaborators;
mod events;
mod machine;
mod runtime;
mod service;

#[cfg(test)]
mod testing;

pub use collaborators::{
    AudioEngine, FocusArbiter, NotificationPresenter, WidgetBroadcaster, WidgetUpdate,
};
pub use events::{
    EngineEvent, FocusChange, FocusRequest, HostCommand, Residency, StartOutcome,
};
pub use machine::{transition, Effect, Transition, Trigger};
pub use runtime::{spawn_player, PlayerHandle, PlayerSignal};
pub use service::{PlayerService, PlayerSettings};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlayerError {
    #[error("audio focus request was denied")]
    AudioFocusDenied,
    #[error("invalid host command: {0:?}")]
    InvalidCommand(String),
    #[error("playback failed: {0}")]
    PlaybackFailed(String),
    #[error("engine did not become ready in time")]
    ReadyTimeout,
}
