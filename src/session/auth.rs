use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

use super::store::KeyValueStore;
use crate::core::event_bus::{EventBus, MarketplaceEvent, Notification};
use crate::listings::Location;

/// Fixed storage key of the persisted session record.
pub const SESSION_KEY: &str = "thapar_marketplace_user";

const VALID_HOSTEL_QR: &str = "valid-qr-code";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostel: Option<String>,
    pub verified: bool,
    pub reputation: f64,
    pub avatar: String,
}

/// The demo account every successful login resolves to.
pub fn mock_user() -> User {
    User {
        id: "1".to_string(),
        email: "student@thapar.edu".to_string(),
        name: "Sample Student".to_string(),
        hostel: Some("Hostel J".to_string()),
        verified: true,
        reputation: 4.8,
        avatar: "https://api.dicebear.com/7.x/bottts/svg?seed=student".to_string(),
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthError {
    #[error("Please enter both email and password")]
    MissingCredentials,
    #[error("Please fill in all fields")]
    MissingFields,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Please use your Thapar email address")]
    InvalidEmailDomain,
    #[error("Please select your hostel")]
    MissingHostel,
    #[error("Please sign in to continue")]
    NotSignedIn,
    #[error("session storage failed: {0}")]
    Storage(String),
}

impl AuthError {
    pub fn notification(&self) -> Notification {
        let title = match self {
            AuthError::InvalidEmailDomain => "Authentication Error",
            AuthError::NotSignedIn => "Authentication required",
            _ => "Error",
        };
        Notification::destructive(title, self.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationStep {
    #[default]
    Details,
    Hostel,
}

/// Two-step sign-up: account details, then hostel verification.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub hostel: Option<Location>,
    step: RegistrationStep,
}

impl RegistrationForm {
    pub fn step(&self) -> RegistrationStep {
        self.step
    }

    pub fn validate_details(&self, allowed_domain: &str) -> Result<(), AuthError> {
        if [&self.name, &self.email, &self.password, &self.confirm_password]
            .iter()
            .any(|field| field.is_empty())
        {
            return Err(AuthError::MissingFields);
        }
        if self.password != self.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        if !self.email.ends_with(allowed_domain) {
            return Err(AuthError::InvalidEmailDomain);
        }
        Ok(())
    }

    /// Hostel choices offered in the second step.
    pub fn hostel_options() -> &'static [Location] {
        Location::for_market(crate::market::MarketType::Night)
    }
}

fn hostel_display_name(hostel: Location) -> String {
    // "hostel_j" -> "Hostel J"
    hostel
        .label()
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct AuthService {
    store: Arc<dyn KeyValueStore>,
    bus: Arc<EventBus>,
    user: RwLock<Option<User>>,
    allowed_domain: String,
    action_latency: Duration,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        bus: Arc<EventBus>,
        allowed_domain: impl Into<String>,
        action_latency: Duration,
    ) -> Self {
        Self {
            store,
            bus,
            user: RwLock::new(None),
            allowed_domain: allowed_domain.into(),
            action_latency,
        }
    }

    /// Read the persisted session once at startup. Unreadable records are discarded.
    pub async fn restore(&self) -> anyhow::Result<Option<User>> {
        let Some(raw) = self.store.get(SESSION_KEY).await? else {
            tracing::debug!("No saved session");
            return Ok(None);
        };

        match serde_json::from_str::<User>(&raw) {
            Ok(user) => {
                tracing::info!("🔑 Restored session for {}", user.email);
                *self.user.write().await = Some(user.clone());
                Ok(Some(user))
            }
            Err(e) => {
                tracing::warn!("Discarding corrupt session record: {}", e);
                self.store.remove(SESSION_KEY).await?;
                Ok(None)
            }
        }
    }

    pub async fn current_user(&self) -> Option<User> {
        self.user.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.user.read().await.is_some()
    }

    pub fn allowed_domain(&self) -> &str {
        &self.allowed_domain
    }

    fn reject<T>(&self, error: AuthError) -> Result<T, AuthError> {
        tracing::warn!("Auth rejected: {}", error);
        self.bus.notify(error.notification());
        Err(error)
    }

    async fn persist(&self, user: &User) -> Result<(), AuthError> {
        let raw = serde_json::to_string(user).map_err(|e| AuthError::Storage(e.to_string()))?;
        self.store
            .set(SESSION_KEY, &raw)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        if email.is_empty() || password.is_empty() {
            return self.reject(AuthError::MissingCredentials);
        }

        // Mock API round trip
        tokio::time::sleep(self.action_latency).await;

        if !self.verify_email(email) {
            return self.reject(AuthError::InvalidEmailDomain);
        }

        let user = mock_user();
        self.persist(&user).await?;
        *self.user.write().await = Some(user.clone());

        tracing::info!("✅ Signed in as {}", user.email);
        self.bus.publish(MarketplaceEvent::SessionStarted {
            user_id: user.id.clone(),
        });
        self.bus.notify(Notification::info(
            "Welcome back!",
            "You have successfully logged in",
        ));

        Ok(user)
    }

    pub async fn logout(&self) -> Result<(), AuthError> {
        *self.user.write().await = None;
        self.store
            .remove(SESSION_KEY)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        tracing::info!("👋 Signed out");
        self.bus.publish(MarketplaceEvent::SessionEnded);
        self.bus.notify(Notification::info(
            "Logged out",
            "You have been successfully logged out",
        ));
        Ok(())
    }

    pub fn verify_email(&self, email: &str) -> bool {
        email.ends_with(&self.allowed_domain)
    }

    pub fn verify_hostel(&self, qr_code: &str) -> bool {
        qr_code == VALID_HOSTEL_QR
    }

    fn is_hostel(location: Location) -> bool {
        RegistrationForm::hostel_options().contains(&location)
    }

    /// Step one of registration; advances the form on success.
    pub fn begin_registration(&self, form: &mut RegistrationForm) -> Result<(), AuthError> {
        if let Err(e) = form.validate_details(&self.allowed_domain) {
            return self.reject(e);
        }
        form.step = RegistrationStep::Hostel;
        Ok(())
    }

    pub async fn complete_registration(&self, form: &RegistrationForm) -> Result<User, AuthError> {
        if form.step != RegistrationStep::Hostel {
            if let Err(e) = form.validate_details(&self.allowed_domain) {
                return self.reject(e);
            }
        }
        let Some(hostel) = form
            .hostel
            .filter(|h| Self::is_hostel(*h))
        else {
            return self.reject(AuthError::MissingHostel);
        };

        let mut user = self.login(&form.email, &form.password).await?;
        user.name = form.name.clone();
        user.email = form.email.clone();
        user.hostel = Some(hostel_display_name(hostel));
        self.replace_user(user.clone()).await?;

        self.bus.notify(Notification::info(
            "Account created!",
            "You have successfully registered and logged in",
        ));
        Ok(user)
    }

    /// Swap the signed-in user record and persist it.
    pub async fn replace_user(&self, user: User) -> Result<(), AuthError> {
        if !self.is_authenticated().await {
            return self.reject(AuthError::NotSignedIn);
        }
        self.persist(&user).await?;
        *self.user.write().await = Some(user);
        Ok(())
    }

    pub fn action_latency(&self) -> Duration {
        self.action_latency
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }
}
