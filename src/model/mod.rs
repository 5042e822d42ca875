//! Model module - data types shared by the directory, the episode list and the controller
//!
//! - `podcast`: directory API records (episodes, podcasts, genre listings)
//! - `track`: the controller's active track and its display metadata
//! - `status`: playback status enum
//! - `listing`: fetch outcome of a directory listing

mod listing;
mod podcast;
mod status;
mod track;

pub use listing::Listing;
pub use podcast::{Channel, Episode, Podcast, PodcastGenre};
pub use status::PlaybackStatus;
pub use track::{ActiveTrack, EpisodeInfo};
