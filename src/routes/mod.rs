//! HTTP route handlers for the console.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Console page (products + orders)
//! GET  /health                 - Health check
//!
//! # Products (admin controls are cosmetic; the gateway enforces roles)
//! POST /products               - Create product
//! POST /products/{id}          - Update product
//! GET  /products/{id}/delete   - Delete confirmation dialog
//! POST /products/{id}/delete   - Delete product
//! GET  /products/{id}/order    - Order quantity dialog
//! POST /products/{id}/order    - Place order
//!
//! # Auth (OAuth code flow against the identity provider)
//! GET  /auth/login             - Signed-out landing page
//! POST /auth/login             - Redirect to the identity provider
//! GET  /auth/callback          - Handle the OAuth callback
//! POST /auth/logout            - End the session
//! ```

pub mod auth;
pub mod console;
pub mod orders;
pub mod products;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::gateway::GatewayError;
use crate::models::{Feedback, set_feedback};
use crate::state::AppState;

/// Feedback shown when the gateway rejects the bearer token.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized. Please log in again.";

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/callback", get(auth::callback))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
///
/// Order placement lives here too: the quantity dialog and its POST are
/// addressed by the product being ordered.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(products::create))
        .route("/{id}", post(products::update))
        .route(
            "/{id}/delete",
            get(products::confirm_delete).post(products::delete),
        )
        .route(
            "/{id}/order",
            get(orders::quantity_dialog).post(orders::place),
        )
}

/// Create all routes for the console.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(console::show))
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
}

/// Translate a failed gateway call into the banner message for `action`.
///
/// `action` is a short verb phrase ("create product", "fetch orders").
pub(crate) fn failure_message(action: &str, err: &GatewayError) -> String {
    match err {
        GatewayError::Unauthorized => UNAUTHORIZED_MESSAGE.to_string(),
        GatewayError::Forbidden => {
            format!("Forbidden. You do not have permission to {action}.")
        }
        GatewayError::Failed { message, .. } => format!("Failed to {action}. {message}"),
        GatewayError::Http(_) => {
            format!("Failed to {action}. The gateway could not be reached.")
        }
    }
}

/// Apply the shared failure policy to a failed gateway call.
///
/// Every operation routes its `GatewayError` through here: the message for
/// `action` lands in the single feedback slot, a 401 additionally ends the
/// session and sends the user back into the login flow, and everything else
/// redirects to `retry_to` (the console, or the form being retried).
pub(crate) async fn report_failure(
    session: &Session,
    action: &str,
    err: &GatewayError,
    retry_to: &str,
) -> Redirect {
    tracing::warn!(action, error = %err, "Gateway operation failed");

    if matches!(err, GatewayError::Unauthorized) {
        // End the session exactly once; the banner rides the fresh
        // anonymous session onto the landing page.
        if let Err(flush_err) = session.flush().await {
            tracing::warn!(error = %flush_err, "Failed to flush session");
        }
        crate::error::clear_sentry_user();
        set_feedback(session, Feedback::Error(failure_message(action, err))).await;
        return Redirect::to("/auth/login");
    }

    set_feedback(session, Feedback::Error(failure_message(action, err))).await;
    Redirect::to(retry_to)
}
