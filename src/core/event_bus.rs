use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use super::metrics::MarketplaceMetrics;
use crate::market::MarketType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationVariant {
    Default,
    Destructive,
}

/// User-facing, dismissable message (a "toast").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: NotificationVariant,
}

impl Notification {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NotificationVariant::Default,
        }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NotificationVariant::Destructive,
        }
    }

    pub fn is_destructive(&self) -> bool {
        self.variant == NotificationVariant::Destructive
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MarketplaceEvent {
    MarketChanged {
        from: MarketType,
        to: MarketType,
        timestamp: DateTime<Utc>,
    },
    AvailabilityChanged {
        market_type: MarketType,
        is_open: bool,
        timestamp: DateTime<Utc>,
    },
    SessionStarted {
        user_id: String,
    },
    SessionEnded,
    ProfileUpdated {
        user_id: String,
    },
    BarterOfferSubmitted {
        offer_id: String,
        listing_id: Option<String>,
    },
    Notify(Notification),
}

pub struct EventBus {
    sender: broadcast::Sender<MarketplaceEvent>,
    metrics: Option<Arc<MarketplaceMetrics>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            metrics: None,
        }
    }

    pub fn with_metrics(capacity: usize, metrics: Arc<MarketplaceMetrics>) -> Self {
        let mut bus = Self::new(capacity);
        bus.metrics = Some(metrics);
        bus
    }

    pub fn publish(&self, event: MarketplaceEvent) {
        if let (MarketplaceEvent::Notify(_), Some(metrics)) = (&event, &self.metrics) {
            metrics.increment_notifications();
        }

        match self.sender.send(event.clone()) {
            Ok(receivers) => {
                tracing::debug!("📡 Event published to {} receivers: {:?}", receivers, event);
            }
            Err(_) => {
                // No subscribers yet; notifications are fire-and-forget.
                tracing::trace!("Event dropped, no subscribers: {:?}", event);
            }
        }
    }

    pub fn notify(&self, notification: Notification) {
        self.publish(MarketplaceEvent::Notify(notification));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MarketplaceEvent> {
        self.sender.subscribe()
    }

    /// Log every toast until the bus closes. Returns how many were logged.
    pub fn log_notifications(&self) -> JoinHandle<u64> {
        let mut events = self.subscribe();
        tokio::spawn(async move {
            let mut logged = 0;
            loop {
                match events.recv().await {
                    Ok(MarketplaceEvent::Notify(n)) => {
                        tracing::info!("🔔 {}: {}", n.title, n.description);
                        logged += 1;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Notification log fell behind, {} events skipped", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            logged
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_notification() {
        let metrics = Arc::new(MarketplaceMetrics::new());
        let bus = EventBus::with_metrics(16, metrics.clone());
        let mut rx = bus.subscribe();

        bus.notify(Notification::info("Hello", "World"));

        match rx.recv().await.unwrap() {
            MarketplaceEvent::Notify(n) => {
                assert_eq!(n.title, "Hello");
                assert!(!n.is_destructive());
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(metrics.get_notifications(), 1);
    }

    #[tokio::test]
    async fn test_notification_log_survives_lag() {
        let bus = EventBus::new(2);
        let logger = bus.log_notifications();

        // The logger has not run yet, so only the last two survive the overflow.
        for i in 0..5 {
            bus.notify(Notification::info(format!("toast {}", i), ""));
        }
        bus.publish(MarketplaceEvent::SessionEnded);
        bus.notify(Notification::info("after lag", ""));
        drop(bus);

        assert_eq!(logger.await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_notification_log_counts_toasts() {
        let bus = EventBus::new(16);
        let logger = bus.log_notifications();

        bus.notify(Notification::info("one", ""));
        bus.publish(MarketplaceEvent::SessionEnded);
        bus.notify(Notification::destructive("two", ""));
        drop(bus);

        assert_eq!(logger.await.unwrap(), 2);
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let bus = EventBus::new(4);
        bus.publish(MarketplaceEvent::SessionEnded);
    }
}
