//! Identity provider (`OpenID` Connect) client.
//!
//! The console never sees credentials; authentication is an OAuth 2.0 code
//! flow against an external provider with a Keycloak-style endpoint layout
//! under the issuer URL.
//!
//! # OAuth Flow
//!
//! 1. Generate the login URL with `authorization_url()`
//! 2. Redirect the user to the provider's login page
//! 3. The provider redirects back with an authorization code
//! 4. Exchange the code for tokens with `exchange_code()`
//! 5. Attach the access token to every gateway request
//!
//! Access tokens are short-lived; `refresh_token()` obtains a fresh set via
//! the refresh grant without another login round trip.

mod claims;
mod types;

pub use claims::{ADMIN_ROLE, AccessClaims, RealmAccess, Role};
pub use types::TokenSet;

use std::sync::Arc;

use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::IdpConfig;
use types::TokenResponse;

/// Errors that can occur when talking to the identity provider.
#[derive(Debug, Error)]
pub enum IdpError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The token endpoint rejected the request.
    #[error("Token request failed: {0}")]
    TokenEndpoint(String),
}

/// Client for the external identity provider.
///
/// Cheap to clone; all state lives behind an `Arc`.
#[derive(Clone)]
pub struct IdentityClient {
    inner: Arc<IdentityClientInner>,
}

struct IdentityClientInner {
    client: reqwest::Client,
    issuer_url: String,
    client_id: String,
    client_secret: String,
}

impl IdentityClient {
    /// Create a new identity provider client.
    #[must_use]
    pub fn new(config: &IdpConfig) -> Self {
        Self {
            inner: Arc::new(IdentityClientInner {
                client: reqwest::Client::new(),
                issuer_url: config.issuer_url.clone(),
                client_id: config.client_id.clone(),
                client_secret: config.client_secret.expose_secret().to_string(),
            }),
        }
    }

    /// Protocol endpoint under the issuer (Keycloak layout).
    fn endpoint(&self, leaf: &str) -> String {
        format!("{}/protocol/openid-connect/{leaf}", self.inner.issuer_url)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // OAuth Flow
    // ─────────────────────────────────────────────────────────────────────────

    /// Generate the authorization URL for login.
    ///
    /// Redirect users to this URL to begin the OAuth flow.
    ///
    /// # Arguments
    ///
    /// * `redirect_uri` - The callback URL to redirect to after authentication
    /// * `state` - A random string stored in the session to prevent CSRF attacks
    #[must_use]
    pub fn authorization_url(&self, redirect_uri: &str, state: &str) -> String {
        format!(
            "{}?\
            client_id={}&\
            response_type=code&\
            scope=openid&\
            redirect_uri={}&\
            state={}",
            self.endpoint("auth"),
            urlencoding::encode(&self.inner.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state)
        )
    }

    /// Generate the end-session URL.
    ///
    /// # Arguments
    ///
    /// * `id_token` - The ID token from the current session, if any
    /// * `post_logout_redirect_uri` - Where to redirect after logout
    #[must_use]
    pub fn logout_url(&self, id_token: Option<&str>, post_logout_redirect_uri: &str) -> String {
        let mut url = format!(
            "{}?\
            client_id={}&\
            post_logout_redirect_uri={}",
            self.endpoint("logout"),
            urlencoding::encode(&self.inner.client_id),
            urlencoding::encode(post_logout_redirect_uri)
        );
        if let Some(hint) = id_token {
            url.push_str("&id_token_hint=");
            url.push_str(&urlencoding::encode(hint));
        }
        url
    }

    /// Exchange an authorization code for a token set.
    ///
    /// # Arguments
    ///
    /// * `code` - The authorization code from the OAuth callback
    /// * `redirect_uri` - The same redirect URI used in the authorization request
    ///
    /// # Errors
    ///
    /// Returns an error if the token exchange fails.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenSet, IdpError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", &self.inner.client_id),
            ("client_secret", &self.inner.client_secret),
            ("code", code),
            ("redirect_uri", redirect_uri),
        ];

        let response = self
            .inner
            .client
            .post(self.endpoint("token"))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(IdpError::TokenEndpoint(format!(
                "Token exchange failed: {text}"
            )));
        }

        let token_response: TokenResponse = response.json().await?;
        Ok(token_response.into_token_set())
    }

    /// Refresh an access token using a refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token refresh fails.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenSet, IdpError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", &self.inner.client_id),
            ("client_secret", &self.inner.client_secret),
            ("refresh_token", refresh_token),
        ];

        let response = self
            .inner
            .client
            .post(self.endpoint("token"))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(IdpError::TokenEndpoint(format!(
                "Token refresh failed: {text}"
            )));
        }

        let token_response: TokenResponse = response.json().await?;
        Ok(token_response.into_token_set())
    }
}
