//! Directory API records: podcasts, their episodes and genre listings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single episode as returned by the directory API
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "pub_date_ms", default)]
    pub published_ms: i64,
    /// Length of the audio in seconds
    #[serde(rename = "audio_length", default)]
    pub audio_length_secs: u32,
    #[serde(rename = "audio")]
    pub audio_url: String,
}

impl Episode {
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.published_ms)
    }

    /// Whole minutes, rounded down, e.g. `"42m"`
    pub fn duration_label(&self) -> String {
        format!("{}m", self.audio_length_secs / 60)
    }
}

/// A podcast (show) with its episode list
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Podcast {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub website: String,
    #[serde(rename = "thumbnail", default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

/// Entry of a genre listing. Carries no episodes; fetch the `Podcast` for those.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(rename = "thumbnail", default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub description: String,
}

/// Response of the best-podcasts endpoint, optionally narrowed to one genre
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PodcastGenre {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub channels: Vec<Channel>,
}
