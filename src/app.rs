use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::barter::BarterDesk;
use crate::core::health::Component;
use crate::core::{Config, EventBus, HealthChecker, MarketplaceMetrics};
use crate::listings::{Catalog, FilterSpec, Listing, ListingFilterEngine};
use crate::market::{format_clock, MarketClock, MarketSnapshot, SystemTimeSource, Theme, TimeSource};
use crate::session::{AuthService, KeyValueStore, ProfileEditor, SqliteStore};

/// Payload of `GET /market`.
#[derive(Debug, Clone, Serialize)]
pub struct MarketStatus {
    pub snapshot: MarketSnapshot,
    pub theme: Theme,
    pub display_name: &'static str,
    pub clock: String,
}

/// Everything the marketplace runs on, wired once at startup.
pub struct AppState {
    pub config: Config,
    pub bus: Arc<EventBus>,
    pub metrics: Arc<MarketplaceMetrics>,
    pub health: Arc<HealthChecker>,
    pub clock: Arc<MarketClock>,
    pub catalog: Arc<Catalog>,
    pub filter_engine: ListingFilterEngine,
    pub auth: Arc<AuthService>,
    pub profile: ProfileEditor,
    pub barter: BarterDesk,
}

impl AppState {
    pub async fn build(config: Config) -> Result<Self> {
        let time_source: Arc<dyn TimeSource> = match config.market.utc_offset_minutes {
            Some(minutes) => Arc::new(SystemTimeSource::with_offset_minutes(minutes)),
            None => Arc::new(SystemTimeSource::local()),
        };

        let store = SqliteStore::new(&config.session.db_path)
            .await
            .context("Failed to open session store")?;

        Self::build_with(config, time_source, Arc::new(store)).await
    }

    /// Same wiring with an injected clock source and session store.
    pub async fn build_with(
        config: Config,
        time_source: Arc<dyn TimeSource>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        let metrics = Arc::new(MarketplaceMetrics::new());
        let bus = Arc::new(EventBus::with_metrics(
            config.monitoring.event_bus_capacity,
            metrics.clone(),
        ));
        let health = Arc::new(HealthChecker::new());

        let clock = Arc::new(MarketClock::new(
            time_source,
            bus.clone(),
            metrics.clone(),
            config.market.tick_interval(),
        ));

        let catalog = Arc::new(
            Catalog::seeded(Utc::now()).with_fetch_latency(config.mock.fetch_latency()),
        );
        health
            .update_component(Component::Catalog, !catalog.is_empty())
            .await;

        let auth = Arc::new(AuthService::new(
            store,
            bus.clone(),
            config.session.allowed_email_domain.clone(),
            config.mock.action_latency(),
        ));
        auth.restore()
            .await
            .context("Failed to restore saved session")?;
        health.update_component(Component::SessionStore, true).await;

        let profile = ProfileEditor::new(auth.clone());
        let barter = BarterDesk::new(
            auth.clone(),
            catalog.clone(),
            bus.clone(),
            config.mock.action_latency(),
        );

        Ok(Self {
            filter_engine: ListingFilterEngine::with_metrics(metrics.clone()),
            config,
            bus,
            metrics,
            health,
            clock,
            catalog,
            auth,
            profile,
            barter,
        })
    }

    pub async fn start(&self) {
        self.clock.start();
        self.health
            .update_component(Component::MarketClock, self.clock.is_running())
            .await;
    }

    pub async fn stop(&self) {
        self.clock.stop();
        self.health.update_component(Component::MarketClock, false).await;
    }

    /// Listings of the active market that pass `spec`, catalog order kept.
    pub async fn visible_listings(&self, spec: &FilterSpec) -> Vec<Listing> {
        let market = self.clock.current_market().await;
        let listings = self.catalog.fetch_market(market).await;
        self.filter_engine.apply(&listings, spec)
    }

    pub async fn featured_listings(&self) -> Vec<Listing> {
        let market = self.clock.current_market().await;
        self.catalog.featured(market)
    }

    pub async fn market_status(&self) -> MarketStatus {
        let snapshot = self.clock.snapshot().await;
        MarketStatus {
            theme: Theme::for_market(snapshot.market_type),
            display_name: snapshot.market_type.display_name(),
            clock: format_clock(&snapshot.sampled_at),
            snapshot,
        }
    }
}
