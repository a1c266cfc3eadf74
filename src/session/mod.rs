pub mod auth;
pub mod profile;
pub mod store;

pub use auth::{mock_user, AuthError, AuthService, RegistrationForm, RegistrationStep, User, SESSION_KEY};
pub use profile::{ProfileEditor, ProfileForm, ProfileUpdate};
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
