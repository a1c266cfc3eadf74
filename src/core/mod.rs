pub mod config;
pub mod event_bus;
pub mod health;
pub mod logging;
pub mod metrics;

pub use config::Config;
pub use event_bus::{EventBus, MarketplaceEvent, Notification, NotificationVariant};
pub use health::{Component, HealthChecker, Status};
pub use metrics::MarketplaceMetrics;
