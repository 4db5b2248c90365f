//! Identity provider OAuth route handlers.
//!
//! - Landing: signed-out page with the sign-in control (and, after a forced
//!   logout, the reason banner)
//! - Login: redirects to the provider's authorization page
//! - Callback: validates state, exchanges the code, stores the token set
//! - Logout: ends the session and redirects to the provider's end-session
//!   endpoint

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rand::Rng;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::idp::AccessClaims;
use crate::middleware::{get_token_set, set_token_set};
use crate::models::{Feedback, session_keys, set_feedback, take_feedback};
use crate::state::AppState;

/// Query parameters from the OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Authorization code to exchange for tokens.
    pub code: Option<String>,
    /// State parameter for CSRF protection.
    pub state: Option<String>,
    /// Error code if authorization failed.
    pub error: Option<String>,
    /// Error description.
    pub error_description: Option<String>,
}

/// Signed-out landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub feedback: Option<Feedback>,
}

/// Generate a cryptographically secure random string.
fn generate_random_string(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            // SAFETY: idx is always within bounds since random_range returns 0..CHARSET.len()
            char::from(*CHARSET.get(idx).expect("idx within bounds"))
        })
        .collect()
}

/// Show the signed-out landing page.
///
/// An already-authenticated visitor goes straight to the console.
///
/// # Route
///
/// `GET /auth/login`
#[instrument(skip(session))]
pub async fn login_page(session: Session) -> Response {
    if get_token_set(&session).await.is_some() {
        return Redirect::to("/").into_response();
    }

    LoginTemplate {
        feedback: take_feedback(&session).await,
    }
    .into_response()
}

/// Initiate the OAuth login flow.
///
/// Generates the CSRF state, stores it in the session, and redirects to
/// the identity provider's authorization page.
///
/// # Errors
///
/// Returns an error if the OAuth state cannot be stored in the session.
///
/// # Route
///
/// `POST /auth/login`
#[instrument(skip(state, session))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
) -> Result<Redirect, AppError> {
    let oauth_state = generate_random_string(32);

    session
        .insert(session_keys::OAUTH_STATE, &oauth_state)
        .await?;

    let auth_url = state
        .idp()
        .authorization_url(&state.callback_url(), &oauth_state);

    Ok(Redirect::to(&auth_url))
}

/// Handle the OAuth callback.
///
/// Validates the state parameter, exchanges the authorization code for a
/// token set, and stores it in the session. A stored token set is the
/// authenticated flag: the console render it unlocks is the initial fetch
/// sequence, run once per sign-in.
///
/// # Errors
///
/// Returns an error if the callback is missing its code, the code exchange
/// fails, or the session cannot be updated.
///
/// # Route
///
/// `GET /auth/callback`
#[instrument(skip(state, session, query))]
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, AppError> {
    if let Some(error) = query.error {
        let description = query.error_description.unwrap_or_default();
        tracing::warn!("Identity provider error: {} - {}", error, description);
        return Ok(sign_in_failed(&session).await);
    }

    let code = query
        .code
        .ok_or_else(|| AppError::BadRequest("missing authorization code".to_string()))?;
    let returned_state = query
        .state
        .ok_or_else(|| AppError::BadRequest("missing state parameter".to_string()))?;

    let stored_state: Option<String> = session.get(session_keys::OAUTH_STATE).await?;

    if stored_state.as_ref() != Some(&returned_state) {
        tracing::warn!("OAuth state mismatch");
        return Ok(sign_in_failed(&session).await);
    }

    // Clear the stored state (one-time use)
    session.remove::<String>(session_keys::OAUTH_STATE).await?;

    let tokens = state
        .idp()
        .exchange_code(&code, &state.callback_url())
        .await?;

    set_token_set(&session, &tokens).await?;

    let claims = AccessClaims::from_token(&tokens.access_token);
    if let Some(username) = &claims.preferred_username {
        crate::error::set_sentry_user(username);
    }
    tracing::info!(
        username = claims.preferred_username.as_deref().unwrap_or(""),
        role = ?claims.role(),
        "User authenticated"
    );

    Ok(Redirect::to("/").into_response())
}

/// End the session.
///
/// Flushes the session and redirects to the identity provider's
/// end-session endpoint, which lands back on the signed-out page.
///
/// # Route
///
/// `POST /auth/logout`
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Response {
    let id_token = get_token_set(&session)
        .await
        .and_then(|tokens| tokens.id_token);

    if let Err(e) = session.flush().await {
        tracing::warn!("Failed to flush session on logout: {}", e);
    }
    crate::error::clear_sentry_user();

    let post_logout_uri = format!("{}/auth/login", state.config().base_url);
    let logout_url = state.idp().logout_url(id_token.as_deref(), &post_logout_uri);

    Redirect::to(&logout_url).into_response()
}

/// Store the sign-in failure banner and return to the landing page.
async fn sign_in_failed(session: &Session) -> Response {
    set_feedback(
        session,
        Feedback::Error("Sign-in failed. Please try again.".to_string()),
    )
    .await;
    Redirect::to("/auth/login").into_response()
}
