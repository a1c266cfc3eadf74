use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    MarketClock,
    SessionStore,
    Catalog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Everything up.
    Healthy,
    /// Listings and sessions work, but the market no longer follows the clock.
    Degraded,
    /// No listings to show, or sessions cannot be stored.
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: Status,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: ComponentHealth,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub market_clock: bool,
    pub session_store: bool,
    pub catalog: bool,
}

impl ComponentHealth {
    pub fn get(&self, component: Component) -> bool {
        match component {
            Component::MarketClock => self.market_clock,
            Component::SessionStore => self.session_store,
            Component::Catalog => self.catalog,
        }
    }

    fn set(&mut self, component: Component, healthy: bool) {
        match component {
            Component::MarketClock => self.market_clock = healthy,
            Component::SessionStore => self.session_store = healthy,
            Component::Catalog => self.catalog = healthy,
        }
    }

    pub fn status(&self) -> Status {
        if !self.session_store || !self.catalog {
            Status::Unhealthy
        } else if !self.market_clock {
            Status::Degraded
        } else {
            Status::Healthy
        }
    }
}

#[derive(Clone)]
pub struct HealthChecker {
    start_time: std::time::Instant,
    components: Arc<RwLock<ComponentHealth>>,
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthChecker {
    pub fn new() -> Self {
        Self {
            start_time: std::time::Instant::now(),
            components: Arc::new(RwLock::new(ComponentHealth::default())),
        }
    }

    pub async fn get_status(&self) -> HealthStatus {
        let components = self.components.read().await.clone();

        HealthStatus {
            status: components.status(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            components,
        }
    }

    pub async fn update_component(&self, component: Component, healthy: bool) {
        let mut components = self.components.write().await;
        if components.get(component) != healthy {
            tracing::info!(
                "{} {:?} is now {}",
                if healthy { "💚" } else { "💔" },
                component,
                if healthy { "up" } else { "down" }
            );
        }
        components.set(component, healthy);
    }
}
