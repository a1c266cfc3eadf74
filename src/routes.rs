use std::fmt;
use url::form_urlencoded;

use crate::core::event_bus::Notification;
use crate::listings::{Catalog, Listing};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    Listings,
    ListingDetail(String),
    Barter { listing_id: Option<String> },
    Profile,
    NotFound(String),
}

impl Route {
    pub fn parse(target: &str) -> Route {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };
        let trimmed = path.trim_end_matches('/');

        match trimmed {
            "" => Route::Home,
            "/login" => Route::Login,
            "/register" => Route::Register,
            "/listings" => Route::Listings,
            "/profile" => Route::Profile,
            "/barter" => {
                let listing_id = query.and_then(|q| {
                    form_urlencoded::parse(q.as_bytes())
                        .find(|(key, _)| key == "listingId")
                        .map(|(_, value)| value.into_owned())
                        .filter(|value| !value.is_empty())
                });
                Route::Barter { listing_id }
            }
            other => match other.strip_prefix("/listings/") {
                Some(id) if !id.is_empty() && !id.contains('/') => {
                    Route::ListingDetail(id.to_string())
                }
                _ => Route::NotFound(target.to_string()),
            },
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Listings => "/listings".to_string(),
            Route::ListingDetail(id) => format!("/listings/{}", id),
            Route::Barter { listing_id: None } => "/barter".to_string(),
            Route::Barter {
                listing_id: Some(id),
            } => {
                let query = form_urlencoded::Serializer::new(String::new())
                    .append_pair("listingId", id)
                    .finish();
                format!("/barter?{}", query)
            }
            Route::Profile => "/profile".to_string(),
            Route::NotFound(path) => path.clone(),
        }
    }

    /// Pages that bounce anonymous visitors to the login page.
    pub fn requires_session(&self) -> bool {
        matches!(self, Route::Barter { .. } | Route::Profile)
    }

    pub fn session_guard(&self, signed_in: bool) -> Result<(), Redirect> {
        if signed_in || !self.requires_session() {
            return Ok(());
        }

        let description = match self {
            Route::Barter { .. } => "Please sign in to use the barter system",
            _ => "Please sign in to continue",
        };
        Err(Redirect::with_error(
            Route::Login,
            "Authentication required",
            description,
        ))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Navigation forced by a guard, with the toast shown on arrival.
#[derive(Debug, Clone, PartialEq)]
pub struct Redirect {
    pub to: Route,
    pub notification: Option<Notification>,
}

impl Redirect {
    pub fn with_error(route: Route, title: &str, description: &str) -> Self {
        Self {
            to: route,
            notification: Some(Notification::destructive(title, description)),
        }
    }

    pub fn listing_not_found() -> Self {
        Self::with_error(
            Route::Listings,
            "Listing not found",
            "The listing you're looking for doesn't exist",
        )
    }
}

/// Detail page lookup; unknown ids send the visitor back to the listings page.
pub async fn resolve_listing(catalog: &Catalog, id: &str) -> Result<Listing, Redirect> {
    match catalog.fetch_listing(id).await {
        Some(listing) => Ok(listing),
        None => {
            tracing::warn!("Listing {} not found", id);
            Err(Redirect::listing_not_found())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_parse_known_pages() {
        assert_eq!(Route::parse("/"), Route::Home);
        assert_eq!(Route::parse(""), Route::Home);
        assert_eq!(Route::parse("/login"), Route::Login);
        assert_eq!(Route::parse("/listings/"), Route::Listings);
        assert_eq!(
            Route::parse("/listings/abc-123"),
            Route::ListingDetail("abc-123".to_string())
        );
        assert_eq!(Route::parse("/barter"), Route::Barter { listing_id: None });
        assert_eq!(
            Route::parse("/barter?listingId=42"),
            Route::Barter {
                listing_id: Some("42".to_string())
            }
        );
        assert_eq!(
            Route::parse("/nowhere"),
            Route::NotFound("/nowhere".to_string())
        );
        assert_eq!(
            Route::parse("/listings/a/b"),
            Route::NotFound("/listings/a/b".to_string())
        );
    }

    #[test]
    fn test_path_parse_agree() {
        let routes = [
            Route::Home,
            Route::Login,
            Route::Register,
            Route::Listings,
            Route::ListingDetail("f47ac10b".to_string()),
            Route::Barter { listing_id: None },
            Route::Barter {
                listing_id: Some("f47ac10b".to_string()),
            },
            Route::Profile,
            Route::NotFound("/missing".to_string()),
        ];
        for route in routes {
            assert_eq!(Route::parse(&route.path()), route);
        }
    }

    #[test]
    fn test_guarded_pages() {
        assert!(Route::Profile.requires_session());
        assert!(Route::Barter { listing_id: None }.requires_session());
        assert!(!Route::Listings.requires_session());
    }

    #[test]
    fn test_session_guard() {
        assert!(Route::Listings.session_guard(false).is_ok());
        assert!(Route::Profile.session_guard(true).is_ok());

        let redirect = Route::Profile.session_guard(false).unwrap_err();
        assert_eq!(redirect.to, Route::Login);
        let toast = redirect.notification.unwrap();
        assert_eq!(toast.title, "Authentication required");
        assert_eq!(toast.description, "Please sign in to continue");

        let redirect = Route::Barter {
            listing_id: Some("7".to_string()),
        }
        .session_guard(false)
        .unwrap_err();
        assert_eq!(
            redirect.notification.unwrap().description,
            "Please sign in to use the barter system"
        );
    }

    #[tokio::test]
    async fn test_resolve_listing() {
        let catalog = Catalog::seeded(Utc::now());
        let id = catalog.all()[3].id.clone();
        assert_eq!(resolve_listing(&catalog, &id).await.unwrap().id, id);

        let redirect = resolve_listing(&catalog, "missing").await.unwrap_err();
        assert_eq!(redirect.to, Route::Listings);
        assert_eq!(redirect.notification.unwrap().title, "Listing not found");
    }
}
