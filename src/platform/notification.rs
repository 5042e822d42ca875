use tokio::sync::watch;

use crate::controller::NotificationPresenter;
use crate::model::{EpisodeInfo, PlaybackStatus};

/// What a now-playing notification shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub status: PlaybackStatus,
    pub title: String,
    pub thumbnail_url: String,
}

/// Publishes the current notification; `None` means cancelled
pub struct NowPlayingNotifier {
    tx: watch::Sender<Option<Notification>>,
}

impl NowPlayingNotifier {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Notification>> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Option<Notification> {
        self.tx.borrow().clone()
    }
}

impl Default for NowPlayingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationPresenter for NowPlayingNotifier {
    fn start(&mut self, status: PlaybackStatus, episode: &EpisodeInfo) {
        tracing::debug!(%status, title = %episode.title, "Showing notification");
        self.tx.send_replace(Some(Notification {
            status,
            title: episode.title.clone(),
            thumbnail_url: episode.thumbnail_url.clone(),
        }));
    }

    fn cancel(&mut self) {
        if self.tx.send_replace(None).is_some() {
            tracing::debug!("Notification cancelled");
        }
    }
}
