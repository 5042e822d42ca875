//! Blue Podcast: podcast directory listings and a background playback controller
//!
//! - `model`: directory records, active track, playback status
//! - `directory`: remote directory client and cached listings
//! - `episodes`: episode rows for a podcast's detail view
//! - `controller`: the playback controller, its state machine and runtime
//! - `platform`: in-process focus arbiter, notification and widget collaborators
//! - `audio`: streaming rodio engine (feature `audio-output`)

#[cfg(feature = "audio-output")]
pub mod audio;
pub mod config;
pub mod controller;
pub mod directory;
pub mod episodes;
pub mod logging;
pub mod model;
pub mod platform;
