use tokio::sync::broadcast;

use crate::controller::{WidgetBroadcaster, WidgetUpdate};

const WIDGET_CHANNEL_CAPACITY: usize = 16;

/// Fans widget updates out to every subscribed widget instance
pub struct WidgetHub {
    tx: broadcast::Sender<WidgetUpdate>,
}

impl WidgetHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(WIDGET_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WidgetUpdate> {
        self.tx.subscribe()
    }

    pub fn widget_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for WidgetHub {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetBroadcaster for WidgetHub {
    fn broadcast(&mut self, update: WidgetUpdate) {
        match self.tx.send(update) {
            Ok(widgets) => tracing::trace!(widgets, "Widget update sent"),
            // No widget on the home screen
            Err(_) => tracing::trace!("Widget update dropped, no subscribers"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_widget_receives_the_update() {
        let mut hub = WidgetHub::new();
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();

        hub.broadcast(WidgetUpdate::NoEpisode);

        assert_eq!(first.recv().await.unwrap(), WidgetUpdate::NoEpisode);
        assert_eq!(second.recv().await.unwrap(), WidgetUpdate::NoEpisode);
        assert_eq!(hub.widget_count(), 2);
    }

    #[test]
    fn broadcast_without_widgets_is_fine() {
        let mut hub = WidgetHub::new();
        hub.broadcast(WidgetUpdate::NoEpisode);
        assert_eq!(hub.widget_count(), 0);
    }
}
