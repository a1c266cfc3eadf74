use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

use super::auth::{AuthError, AuthService, User};
use crate::core::event_bus::{MarketplaceEvent, Notification};
use crate::routes::{Redirect, Route};

const AVATAR_ENDPOINT: &str = "https://api.dicebear.com/9.x/avataaars/svg";

fn random_seed() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Body of `PUT user/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: String,
    pub hostel: String,
    pub bio: String,
    pub avatar_seed: String,
    pub interests: Vec<String>,
}

/// Editable copy of the signed-in user's profile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileForm {
    pub name: String,
    pub email: String,
    pub hostel: String,
    pub bio: String,
    pub reputation: f64,
    pub avatar_seed: String,
    pub interests: Vec<String>,
}

impl ProfileForm {
    pub fn from_user(user: &User) -> Self {
        let avatar_seed = if user.name.is_empty() {
            random_seed()
        } else {
            user.name.clone()
        };

        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            hostel: user.hostel.clone().unwrap_or_default(),
            bio: String::new(),
            reputation: user.reputation,
            avatar_seed,
            interests: Vec::new(),
        }
    }

    /// Returns false when the trimmed input is blank or already listed.
    pub fn add_interest(&mut self, input: &str) -> bool {
        let interest = input.trim();
        if interest.is_empty() || self.interests.iter().any(|i| i == interest) {
            return false;
        }
        self.interests.push(interest.to_string());
        true
    }

    pub fn remove_interest(&mut self, interest: &str) {
        self.interests.retain(|i| i != interest);
    }

    pub fn regenerate_avatar(&mut self) {
        self.avatar_seed = random_seed();
    }

    pub fn avatar_url(&self) -> String {
        let params = [
            ("seed", self.avatar_seed.as_str()),
            ("radius", "50"),
            ("size", "128"),
        ];
        match Url::parse_with_params(AVATAR_ENDPOINT, &params) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::warn!("Could not build avatar url: {}", e);
                AVATAR_ENDPOINT.to_string()
            }
        }
    }

    /// Discard edits.
    pub fn cancel(&mut self, user: &User) {
        *self = Self::from_user(user);
    }

    pub fn payload(&self) -> ProfileUpdate {
        ProfileUpdate {
            name: self.name.clone(),
            hostel: self.hostel.clone(),
            bio: self.bio.clone(),
            avatar_seed: self.avatar_seed.clone(),
            interests: self.interests.clone(),
        }
    }
}

pub struct ProfileEditor {
    auth: Arc<AuthService>,
}

impl ProfileEditor {
    pub fn new(auth: Arc<AuthService>) -> Self {
        Self { auth }
    }

    pub async fn open(&self) -> Result<ProfileForm, Redirect> {
        let user = self.auth.current_user().await;
        Route::Profile.session_guard(user.is_some())?;
        Ok(user.map(|user| ProfileForm::from_user(&user)).unwrap_or_default())
    }

    pub async fn save(&self, form: &ProfileForm) -> Result<ProfileUpdate, AuthError> {
        let Some(mut user) = self.auth.current_user().await else {
            return Err(AuthError::NotSignedIn);
        };

        let payload = form.payload();

        // Mock PUT user/me
        tokio::time::sleep(self.auth.action_latency()).await;

        user.name = payload.name.clone();
        user.hostel = Some(payload.hostel.clone()).filter(|h| !h.is_empty());
        self.auth.replace_user(user.clone()).await?;

        tracing::info!("📝 Profile saved for {}", user.email);
        let bus = self.auth.bus();
        bus.publish(MarketplaceEvent::ProfileUpdated {
            user_id: user.id.clone(),
        });
        bus.notify(Notification::info(
            "Profile updated",
            "Your changes have been saved",
        ));

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event_bus::EventBus;
    use crate::session::auth::mock_user;
    use crate::session::store::MemoryStore;
    use std::time::Duration;

    async fn signed_in() -> (Arc<AuthService>, ProfileEditor) {
        let bus = Arc::new(EventBus::new(16));
        let auth = Arc::new(AuthService::new(
            Arc::new(MemoryStore::new()),
            bus,
            "@thapar.edu",
            Duration::ZERO,
        ));
        auth.login("student@thapar.edu", "pw").await.unwrap();
        let editor = ProfileEditor::new(auth.clone());
        (auth, editor)
    }

    #[test]
    fn test_form_defaults_from_user() {
        let form = ProfileForm::from_user(&mock_user());
        assert_eq!(form.hostel, "Hostel J");
        assert_eq!(form.avatar_seed, "Sample Student");
        assert!(form.interests.is_empty());
        assert!(form.bio.is_empty());

        let mut nameless = mock_user();
        nameless.name.clear();
        nameless.hostel = None;
        let form = ProfileForm::from_user(&nameless);
        assert_eq!(form.hostel, "");
        assert_eq!(form.avatar_seed.len(), 8);
    }

    #[test]
    fn test_interests() {
        let mut form = ProfileForm::from_user(&mock_user());
        assert!(form.add_interest("  chess "));
        assert!(!form.add_interest("chess"));
        assert!(!form.add_interest("   "));
        assert!(form.add_interest("robotics"));
        assert_eq!(form.interests, vec!["chess", "robotics"]);

        form.remove_interest("chess");
        assert_eq!(form.interests, vec!["robotics"]);
    }

    #[test]
    fn test_avatar_url() {
        let mut form = ProfileForm::from_user(&mock_user());
        let url = form.avatar_url();
        assert!(url.starts_with("https://api.dicebear.com/9.x/avataaars/svg?seed=Sample"));
        assert!(url.ends_with("&radius=50&size=128"));

        form.regenerate_avatar();
        assert_ne!(form.avatar_seed, "Sample Student");
    }

    #[test]
    fn test_cancel_discards_edits() {
        let user = mock_user();
        let mut form = ProfileForm::from_user(&user);
        form.bio = "draft".to_string();
        form.add_interest("music");
        form.cancel(&user);
        assert_eq!(form, ProfileForm::from_user(&user));
    }

    #[test]
    fn test_payload_wire_format() {
        let form = ProfileForm::from_user(&mock_user());
        let json = serde_json::to_value(form.payload()).unwrap();
        assert_eq!(json["avatarSeed"], "Sample Student");
        assert_eq!(json["hostel"], "Hostel J");
        assert!(json["interests"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_requires_session() {
        let bus = Arc::new(EventBus::new(4));
        let auth = Arc::new(AuthService::new(
            Arc::new(MemoryStore::new()),
            bus,
            "@thapar.edu",
            Duration::ZERO,
        ));
        let redirect = ProfileEditor::new(auth).open().await.unwrap_err();
        assert_eq!(redirect.to, Route::Login);
    }

    #[tokio::test]
    async fn test_save_updates_session_user() {
        let (auth, editor) = signed_in().await;
        let mut form = editor.open().await.unwrap();
        form.name = "Sam Student".to_string();
        form.hostel = String::new();

        let payload = editor.save(&form).await.unwrap();
        assert_eq!(payload.name, "Sam Student");

        let user = auth.current_user().await.unwrap();
        assert_eq!(user.name, "Sam Student");
        assert_eq!(user.hostel, None);
    }
}
