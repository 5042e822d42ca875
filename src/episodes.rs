//! Binds a podcast's episodes to display rows

use crate::model::Episode;

/// One row of the episode list as a UI would show it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeRow {
    pub title: String,
    pub duration: String,
}

#[derive(Debug, Default)]
pub struct EpisodeList {
    episodes: Vec<Episode>,
}

impl EpisodeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn swap_episodes(&mut self, episodes: Vec<Episode>) {
        tracing::debug!(count = episodes.len(), "Episode list replaced");
        self.episodes = episodes;
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<EpisodeRow> {
        self.episodes.get(index).map(|episode| EpisodeRow {
            title: episode.title.clone(),
            duration: episode.duration_label(),
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = EpisodeRow> + '_ {
        (0..self.len()).filter_map(|i| self.row(i))
    }

    /// The episode behind a clicked row
    pub fn select(&self, index: usize) -> Option<&Episode> {
        self.episodes.get(index)
    }
}
