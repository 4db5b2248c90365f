//! Types for identity provider OAuth responses.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Token set obtained from the identity provider.
///
/// Stored in the session and attached to every gateway request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    /// The access token for gateway requests.
    pub access_token: String,
    /// The ID token (`OpenID` Connect), passed back on logout.
    pub id_token: Option<String>,
    /// The refresh token for obtaining new access tokens.
    pub refresh_token: Option<String>,
    /// Token lifetime in seconds.
    pub expires_in: Option<i64>,
    /// Unix timestamp when the token was obtained.
    pub obtained_at: i64,
}

impl TokenSet {
    /// Check if the access token is expired (with 60s buffer).
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_in.is_some_and(|expires_in| {
            let now = Utc::now().timestamp();
            let expires_at = self.obtained_at + expires_in;
            now >= (expires_at - 60)
        })
    }
}

/// Raw token response from the identity provider's token endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct TokenResponse {
    pub access_token: String,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    #[allow(dead_code)]
    pub token_type: Option<String>,
}

impl TokenResponse {
    /// Stamp the response into a session-storable token set.
    pub(super) fn into_token_set(self) -> TokenSet {
        TokenSet {
            access_token: self.access_token,
            id_token: self.id_token,
            refresh_token: self.refresh_token,
            expires_in: self.expires_in,
            obtained_at: Utc::now().timestamp(),
        }
    }
}
