//! Inputs reaching the controller from the engine, the focus arbiter and the host

use std::str::FromStr;

use super::PlayerError;

/// Lifecycle report from the audio engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Buffering,
    Ready { play_when_ready: bool },
    Ended,
    /// Source released or never loaded
    Idle,
    Error(String),
}

/// Audio-focus change delivered to a focus holder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusChange {
    Gained,
    Lost,
    LostTransient,
    LostTransientCanDuck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusRequest {
    Granted,
    Denied,
}

/// Action string sent by the hosting process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    Play,
    Pause,
    Stop,
}

impl FromStr for HostCommand {
    type Err = PlayerError;

    fn from_str(action: &str) -> Result<Self, Self::Err> {
        let action = action.trim();
        if action.eq_ignore_ascii_case("PLAY") {
            Ok(HostCommand::Play)
        } else if action.eq_ignore_ascii_case("PAUSE") {
            Ok(HostCommand::Pause)
        } else if action.eq_ignore_ascii_case("STOP") {
            Ok(HostCommand::Stop)
        } else {
            Err(PlayerError::InvalidCommand(action.to_string()))
        }
    }
}

/// Whether the host should restart the controller if it dies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Sticky,
    NotSticky,
}

/// Answer to a host unbinding from the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Residency {
    Remain,
    Terminate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_actions_are_case_insensitive() {
        assert_eq!("PLAY".parse::<HostCommand>().unwrap(), HostCommand::Play);
        assert_eq!("pause".parse::<HostCommand>().unwrap(), HostCommand::Pause);
        assert_eq!(" Stop ".parse::<HostCommand>().unwrap(), HostCommand::Stop);
    }

    #[test]
    fn empty_and_unknown_actions_are_rejected() {
        assert!(matches!(
            "".parse::<HostCommand>(),
            Err(PlayerError::InvalidCommand(a)) if a.is_empty()
        ));
        assert!(matches!(
            "REWIND".parse::<HostCommand>(),
            Err(PlayerError::InvalidCommand(a)) if a == "REWIND"
        ));
    }
}
