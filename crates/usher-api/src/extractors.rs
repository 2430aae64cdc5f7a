//! Axum extractors.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use usher_core::{Error, Session, Store, User};

use crate::state::AppState;

/// Authenticated session extractor.
///
/// Extracts a session token from the `Authorization: Bearer <token>` header
/// or the configured session cookie, resolves it, and returns the user and
/// session. Rejects with `Error::Unauthenticated` when no valid session is
/// found.
pub struct CurrentSession {
    pub user: User,
    pub session: Session,
}

/// Extract a session token from request parts.
///
/// Checks `Authorization: Bearer <token>` first, then the session cookie.
fn extract_token_from_parts(parts: &Parts, cookie_name: &str) -> Option<String> {
    if let Some(auth_header) = parts.headers.get("authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.to_string());
    }

    if let Some(cookie_header) = parts.headers.get("cookie")
        && let Ok(cookie_str) = cookie_header.to_str()
    {
        for part in cookie_str.split(';') {
            let part = part.trim();
            if let Some(value) = part.strip_prefix(&format!("{}=", cookie_name))
                && !value.is_empty()
            {
                return Some(value.to_string());
            }
        }
    }

    None
}

impl<S: Store> FromRequestParts<AppState<S>> for CurrentSession {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let cookie_name = &state.config.session.cookie_name;
        let token =
            extract_token_from_parts(parts, cookie_name).ok_or(Error::Unauthenticated)?;

        let (user, session) = state
            .sessions()
            .resolve(&token)
            .await?
            .ok_or(Error::SessionNotFound)?;

        Ok(CurrentSession { user, session })
    }
}

/// Extractor that deserializes JSON and runs `validator::Validate`.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| Error::invalid_request(format!("Invalid JSON: {}", e)))?;

        value.validate().map_err(|e| Error::validation(e.to_string()))?;

        Ok(ValidatedJson(value))
    }
}
