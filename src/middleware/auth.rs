//! Authentication middleware and extractors.
//!
//! Provides the `RequireUser` extractor: a handler that takes it only runs
//! with a live token set in the session, so no gateway fetch ever happens
//! unauthenticated. Expired access tokens are refreshed in place via the
//! identity provider; when refresh is impossible the session is flushed
//! and the request is redirected into the login flow.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::idp::{AccessClaims, Role, TokenSet};
use crate::models::session_keys;
use crate::state::AppState;

/// The authenticated requester, as rendering needs it.
///
/// Recomputed from the live token on every request; nothing here is stored.
#[derive(Debug, Clone)]
pub struct Viewer {
    /// Display name from the token claims (may be empty).
    pub username: String,
    /// Capability derived from the realm roles.
    pub role: Role,
    /// Raw access token, attached to every gateway call.
    pub access_token: String,
}

impl Viewer {
    fn from_token_set(tokens: &TokenSet) -> Self {
        let claims = AccessClaims::from_token(&tokens.access_token);
        let role = claims.role();
        Self {
            username: claims.preferred_username.unwrap_or_default(),
            role,
            access_token: tokens.access_token.clone(),
        }
    }
}

/// Extractor that requires an authenticated session.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireUser(viewer): RequireUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", viewer.username)
/// }
/// ```
pub struct RequireUser(pub Viewer);

/// Error returned when authentication is required but not present.
pub enum AuthRejection {
    /// Send the visitor through the login flow.
    RedirectToLogin,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/auth/login").into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::RedirectToLogin)?
            .clone();

        let tokens: TokenSet = session
            .get(session_keys::TOKEN_SET)
            .await
            .ok()
            .flatten()
            .ok_or(AuthRejection::RedirectToLogin)?;

        let tokens = if tokens.is_expired() {
            match refresh_token_set(state, &session, &tokens).await {
                Some(fresh) => fresh,
                None => {
                    // Stale session with no way back; end it and re-authenticate.
                    let _ = session.flush().await;
                    return Err(AuthRejection::RedirectToLogin);
                }
            }
        } else {
            tokens
        };

        Ok(Self(Viewer::from_token_set(&tokens)))
    }
}

/// Obtain a fresh token set via the refresh grant and store it.
///
/// Returns `None` when no refresh token exists or the provider refuses it.
async fn refresh_token_set(
    state: &AppState,
    session: &Session,
    stale: &TokenSet,
) -> Option<TokenSet> {
    let refresh_token = stale.refresh_token.as_deref()?;

    match state.idp().refresh_token(refresh_token).await {
        Ok(fresh) => {
            if let Err(err) = set_token_set(session, &fresh).await {
                tracing::warn!(error = %err, "Failed to store refreshed token set");
            }
            Some(fresh)
        }
        Err(err) => {
            tracing::info!(error = %err, "Token refresh failed, forcing re-login");
            None
        }
    }
}

/// Helper to store the identity provider token set in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_token_set(
    session: &Session,
    tokens: &TokenSet,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::TOKEN_SET, tokens).await
}

/// Helper to read the identity provider token set from the session.
pub async fn get_token_set(session: &Session) -> Option<TokenSet> {
    session
        .get::<TokenSet>(session_keys::TOKEN_SET)
        .await
        .ok()
        .flatten()
}
