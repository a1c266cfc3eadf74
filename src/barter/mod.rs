use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::event_bus::{EventBus, MarketplaceEvent, Notification};
use crate::listings::{BarterOffer, Catalog, Listing, OfferStatus, OfferedItem};
use crate::routes::{Redirect, Route};
use crate::session::AuthService;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BarterError {
    #[error("Please add at least one item or some money to your offer")]
    InvalidOffer,
    #[error("Please sign in to use the barter system")]
    NotSignedIn,
}

impl BarterError {
    pub fn notification(&self) -> Notification {
        let title = match self {
            BarterError::InvalidOffer => "Invalid offer",
            BarterError::NotSignedIn => "Authentication required",
        };
        Notification::destructive(title, self.to_string())
    }
}

/// Offer being composed on the barter page.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferDraft {
    pub listing: Option<Listing>,
    pub items: Vec<OfferedItem>,
    pub offered_money: f64,
}

impl OfferDraft {
    pub fn new(listing: Option<Listing>) -> Self {
        Self {
            listing,
            items: vec![Self::blank_item()],
            offered_money: 0.0,
        }
    }

    fn blank_item() -> OfferedItem {
        OfferedItem {
            description: String::new(),
            images: Vec::new(),
        }
    }

    pub fn add_item(&mut self) {
        self.items.push(Self::blank_item());
    }

    pub fn remove_item(&mut self, index: usize) {
        if index < self.items.len() {
            self.items.remove(index);
        }
    }

    pub fn set_description(&mut self, index: usize, description: impl Into<String>) {
        if let Some(item) = self.items.get_mut(index) {
            item.description = description.into();
        }
    }

    pub fn set_money(&mut self, amount: f64) {
        self.offered_money = if amount.is_finite() { amount.max(0.0) } else { 0.0 };
    }

    /// Items with a non-blank description.
    pub fn valid_items(&self) -> Vec<OfferedItem> {
        self.items
            .iter()
            .filter(|item| !item.description.trim().is_empty())
            .cloned()
            .collect()
    }

    pub fn validate(&self) -> Result<Vec<OfferedItem>, BarterError> {
        let items = self.valid_items();
        if items.is_empty() && self.offered_money <= 0.0 {
            return Err(BarterError::InvalidOffer);
        }
        Ok(items)
    }

    fn return_route(&self) -> Route {
        match &self.listing {
            Some(listing) => Route::ListingDetail(listing.id.clone()),
            None => Route::Listings,
        }
    }
}

pub struct BarterDesk {
    auth: Arc<AuthService>,
    catalog: Arc<Catalog>,
    bus: Arc<EventBus>,
    submitted: RwLock<Vec<BarterOffer>>,
    submit_latency: Duration,
}

impl BarterDesk {
    pub fn new(
        auth: Arc<AuthService>,
        catalog: Arc<Catalog>,
        bus: Arc<EventBus>,
        submit_latency: Duration,
    ) -> Self {
        Self {
            auth,
            catalog,
            bus,
            submitted: RwLock::new(Vec::new()),
            submit_latency,
        }
    }

    fn bounce(&self, redirect: Redirect) -> Redirect {
        if let Some(notification) = &redirect.notification {
            self.bus.notify(notification.clone());
        }
        tracing::debug!("↩️  Barter redirect to {}", redirect.to);
        redirect
    }

    /// Barter page entry: session guard, then the optional target listing.
    pub async fn open(&self, listing_id: Option<&str>) -> Result<OfferDraft, Redirect> {
        let page = Route::Barter {
            listing_id: listing_id.map(str::to_string),
        };
        page.session_guard(self.auth.is_authenticated().await)
            .map_err(|redirect| self.bounce(redirect))?;

        let Some(id) = listing_id else {
            return Ok(OfferDraft::new(None));
        };

        let Some(listing) = self.catalog.fetch_listing(id).await else {
            return Err(self.bounce(Redirect::with_error(
                Route::Listings,
                "Listing not found",
                "The requested listing could not be found",
            )));
        };

        if !listing.barter_enabled {
            return Err(self.bounce(Redirect::with_error(
                Route::ListingDetail(listing.id.clone()),
                "Barter not available",
                "This listing does not accept barter offers",
            )));
        }

        Ok(OfferDraft::new(Some(listing)))
    }

    pub async fn submit(&self, draft: &OfferDraft) -> Result<Redirect, BarterError> {
        let Some(user) = self.auth.current_user().await else {
            let error = BarterError::NotSignedIn;
            self.bus.notify(error.notification());
            return Err(error);
        };

        let offered_items = match draft.validate() {
            Ok(items) => items,
            Err(error) => {
                tracing::warn!("Barter offer rejected: {}", error);
                self.bus.notify(error.notification());
                return Err(error);
            }
        };

        // Mock POST barterOffers
        tokio::time::sleep(self.submit_latency).await;

        let offer = BarterOffer {
            id: Uuid::new_v4().to_string(),
            listing_id: draft.listing.as_ref().map(|l| l.id.clone()),
            buyer_id: user.id.clone(),
            buyer_name: user.name.clone(),
            offered_items,
            offered_money: draft.offered_money,
            status: OfferStatus::Pending,
            created_at: Utc::now(),
        };

        tracing::info!(
            "🤝 Barter offer {} submitted: {} items + ₹{:.0}",
            offer.id,
            offer.offered_items.len(),
            offer.offered_money
        );
        self.bus.publish(MarketplaceEvent::BarterOfferSubmitted {
            offer_id: offer.id.clone(),
            listing_id: offer.listing_id.clone(),
        });
        self.submitted.write().await.push(offer);

        let notification = Notification::info(
            "Barter offer sent!",
            "The seller has been notified of your offer",
        );
        self.bus.notify(notification.clone());

        Ok(Redirect {
            to: draft.return_route(),
            notification: Some(notification),
        })
    }

    pub async fn submitted_offers(&self) -> Vec<BarterOffer> {
        self.submitted.read().await.clone()
    }
}
