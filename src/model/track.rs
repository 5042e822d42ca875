//! What the controller is currently holding

use super::podcast::{Episode, Podcast};

/// Metadata shown by the notification and the widget
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EpisodeInfo {
    pub title: String,
    pub thumbnail_url: String,
}

impl EpisodeInfo {
    pub fn new(title: impl Into<String>, thumbnail_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            thumbnail_url: thumbnail_url.into(),
        }
    }

    /// Episodes carry no artwork of their own, the show's thumbnail is used
    pub fn from_episode(episode: &Episode, podcast: &Podcast) -> Self {
        Self::new(episode.title.clone(), podcast.thumbnail_url.clone())
    }
}

/// The loaded audio source and the episode it belongs to.
///
/// Replaced as a whole whenever a different url is requested.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveTrack {
    url: String,
    episode: EpisodeInfo,
}

impl ActiveTrack {
    pub fn new(url: impl Into<String>, episode: EpisodeInfo) -> Self {
        Self {
            url: url.into(),
            episode,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn episode(&self) -> &EpisodeInfo {
        &self.episode
    }
}
