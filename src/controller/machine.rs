//! Pure playback state transitions.
//!
//! The controller feeds every engine event and every explicit pause/stop
//! through [`transition`] and then performs the returned effects against its
//! collaborators. Nothing here touches an engine, so the whole table can be
//! tested with plain values.

use crate::model::PlaybackStatus;

use super::events::EngineEvent;

#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    Engine(EngineEvent),
    /// `pause()` issued by the host or by a transient focus loss
    Pause,
    /// `stop()` issued by the host or by a permanent focus loss
    Stop,
}

/// Side effect the controller must perform after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ShowNotification(PlaybackStatus),
    CancelNotification,
    WidgetEpisode { is_playing: bool },
    WidgetNoEpisode,
    ReportFailure(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub status: PlaybackStatus,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(status: PlaybackStatus) -> Self {
        Self {
            status,
            effects: Vec::new(),
        }
    }
}

pub fn transition(current: PlaybackStatus, trigger: &Trigger, has_track: bool) -> Transition {
    let next = match trigger {
        Trigger::Engine(EngineEvent::Buffering) => PlaybackStatus::Loading,
        Trigger::Engine(EngineEvent::Ready { play_when_ready: true }) => PlaybackStatus::Playing,
        Trigger::Engine(EngineEvent::Ready { play_when_ready: false }) => PlaybackStatus::Paused,
        Trigger::Engine(EngineEvent::Ended) => PlaybackStatus::Stopped,
        Trigger::Engine(EngineEvent::Idle) => PlaybackStatus::Idle,
        Trigger::Engine(EngineEvent::Error(reason)) => {
            return Transition {
                status: PlaybackStatus::Idle,
                effects: vec![
                    Effect::CancelNotification,
                    Effect::WidgetNoEpisode,
                    Effect::ReportFailure(reason.clone()),
                ],
            };
        }
        Trigger::Pause => match current {
            PlaybackStatus::Loading | PlaybackStatus::Playing if has_track => {
                PlaybackStatus::Paused
            }
            _ => return Transition::unchanged(current),
        },
        Trigger::Stop => {
            // Always re-announced, even when already idle
            return Transition {
                status: PlaybackStatus::Idle,
                effects: vec![Effect::CancelNotification, Effect::WidgetNoEpisode],
            };
        }
    };

    if next == current {
        return Transition::unchanged(current);
    }

    let mut effects = Vec::new();
    match next {
        PlaybackStatus::Idle => effects.push(Effect::WidgetNoEpisode),
        PlaybackStatus::Playing | PlaybackStatus::Paused if has_track => {
            effects.push(Effect::ShowNotification(next));
            effects.push(Effect::WidgetEpisode {
                is_playing: next == PlaybackStatus::Playing,
            });
        }
        PlaybackStatus::Loading | PlaybackStatus::Stopped if has_track => {
            effects.push(Effect::ShowNotification(next));
        }
        _ => {}
    }

    Transition {
        status: next,
        effects,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PlaybackStatus::*;

    fn engine(event: EngineEvent) -> Trigger {
        Trigger::Engine(event)
    }

    #[test]
    fn ready_with_auto_play_starts_playing_and_updates_both_observers() {
        let t = transition(Loading, &engine(EngineEvent::Ready { play_when_ready: true }), true);

        assert_eq!(t.status, Playing);
        assert_eq!(
            t.effects,
            vec![
                Effect::ShowNotification(Playing),
                Effect::WidgetEpisode { is_playing: true }
            ]
        );
    }

    #[test]
    fn ready_without_auto_play_is_paused() {
        let t = transition(Loading, &engine(EngineEvent::Ready { play_when_ready: false }), true);

        assert_eq!(t.status, Paused);
        assert!(t.effects.contains(&Effect::WidgetEpisode { is_playing: false }));
    }

    #[test]
    fn buffering_shows_loading_notification_only() {
        let t = transition(Playing, &engine(EngineEvent::Buffering), true);

        assert_eq!(t.status, Loading);
        assert_eq!(t.effects, vec![Effect::ShowNotification(Loading)]);
    }

    #[test]
    fn end_of_stream_stops() {
        let t = transition(Playing, &engine(EngineEvent::Ended), true);

        assert_eq!(t.status, Stopped);
        assert_eq!(t.effects, vec![Effect::ShowNotification(Stopped)]);
    }

    #[test]
    fn engine_idle_clears_widget() {
        let t = transition(Stopped, &engine(EngineEvent::Idle), true);

        assert_eq!(t.status, Idle);
        assert_eq!(t.effects, vec![Effect::WidgetNoEpisode]);
    }

    #[test]
    fn repeated_event_has_no_effects() {
        let t = transition(Playing, &engine(EngineEvent::Ready { play_when_ready: true }), true);

        assert_eq!(t.status, Playing);
        assert!(t.effects.is_empty());
    }

    #[test]
    fn no_observer_updates_without_a_track() {
        let t = transition(Idle, &engine(EngineEvent::Ready { play_when_ready: true }), false);

        assert_eq!(t.status, Playing);
        assert!(t.effects.is_empty());
    }

    #[test]
    fn engine_error_is_reported_not_swallowed() {
        let t = transition(Playing, &engine(EngineEvent::Error("404".into())), true);

        assert_eq!(t.status, Idle);
        assert_eq!(
            t.effects,
            vec![
                Effect::CancelNotification,
                Effect::WidgetNoEpisode,
                Effect::ReportFailure("404".into())
            ]
        );
    }

    #[test]
    fn pause_only_applies_while_loading_or_playing() {
        assert_eq!(transition(Playing, &Trigger::Pause, true).status, Paused);
        assert_eq!(transition(Loading, &Trigger::Pause, true).status, Paused);

        for status in [Idle, Paused, Stopped] {
            let t = transition(status, &Trigger::Pause, true);
            assert_eq!(t.status, status);
            assert!(t.effects.is_empty());
        }
    }

    #[test]
    fn stop_always_clears_notification_and_widget() {
        for status in [Idle, Loading, Playing, Paused, Stopped] {
            let t = transition(status, &Trigger::Stop, true);
            assert_eq!(t.status, Idle);
            assert_eq!(
                t.effects,
                vec![Effect::CancelNotification, Effect::WidgetNoEpisode]
            );
        }
    }
}
