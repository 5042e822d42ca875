//! Channel listings per home-screen section, fetched lazily and cached

use std::collections::HashMap;

use futures::future::join_all;
use tokio::sync::RwLock;

use crate::model::{Channel, Listing};

use super::client::DirectoryApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Best,
    Comedy,
    Business,
    Health,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Best,
        Section::Comedy,
        Section::Business,
        Section::Health,
    ];

    /// Directory genre id; `Best` spans every genre
    pub fn genre_id(self) -> Option<u32> {
        match self {
            Section::Best => None,
            Section::Comedy => Some(133),
            Section::Business => Some(93),
            Section::Health => Some(88),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Section::Best => "best",
            Section::Comedy => "comedy",
            Section::Business => "business",
            Section::Health => "health",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.name().eq_ignore_ascii_case(name.trim()))
    }
}

pub struct PodcastListings<D> {
    directory: D,
    listings: RwLock<HashMap<Section, Listing<Vec<Channel>>>>,
}

impl<D: DirectoryApi> PodcastListings<D> {
    pub fn new(directory: D) -> Self {
        Self {
            directory,
            listings: RwLock::new(HashMap::new()),
        }
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Cached listing, fetching it on first access. Failed fetches are retried.
    pub async fn get(&self, section: Section) -> Listing<Vec<Channel>> {
        if let Some(Listing::Loaded(channels)) = self.listings.read().await.get(&section) {
            return Listing::Loaded(channels.clone());
        }
        self.refresh(section).await
    }

    /// Cached listing without touching the network
    pub async fn peek(&self, section: Section) -> Listing<Vec<Channel>> {
        self.listings
            .read()
            .await
            .get(&section)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn refresh(&self, section: Section) -> Listing<Vec<Channel>> {
        let result = match section.genre_id() {
            None => self.directory.best_podcasts().await,
            Some(genre_id) => self.directory.genre_podcasts(genre_id).await,
        };

        let listing = match result {
            Ok(genre) => {
                tracing::info!(
                    section = section.name(),
                    genre = %genre.name,
                    channels = genre.channels.len(),
                    "Listing loaded"
                );
                Listing::Loaded(genre.channels)
            }
            Err(e) => {
                tracing::error!(section = section.name(), error = %e, "Listing fetch failed");
                Listing::Failed(format!("{e:#}"))
            }
        };

        self.listings.write().await.insert(section, listing.clone());
        listing
    }

    /// Load every section concurrently
    pub async fn prefetch_all(&self) {
        join_all(Section::ALL.into_iter().map(|section| self.get(section))).await;
    }
}
