//! Access token claims and role derivation.
//!
//! The console decodes the JWT payload without verifying the signature.
//! Claims gate rendering only; the gateway authorizes every request itself,
//! so a forged token buys a view that cannot complete any operation.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

/// Realm role that unlocks the administrative view.
pub const ADMIN_ROLE: &str = "ADMIN";

/// Capability derived from the access token's realm roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Manages the catalog and sees every order.
    Admin,
    /// Browses the catalog and places own orders.
    Client,
}

impl Role {
    /// Derive the role from a raw access token.
    ///
    /// Absent, malformed, or sentinel-free claims all mean `Client`;
    /// derivation never fails.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        AccessClaims::from_token(token).role()
    }

    /// Whether this role sees the administrative view.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Claims the console reads from the access token payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessClaims {
    /// Display name of the authenticated user.
    #[serde(default)]
    pub preferred_username: Option<String>,
    /// Realm-level role assignments.
    #[serde(default)]
    pub realm_access: RealmAccess,
}

/// Realm role container as the identity provider emits it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RealmAccess {
    /// Role names granted in the realm.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl AccessClaims {
    /// Decode claims from the payload segment of a JWT.
    ///
    /// Anything that is not a three-part token with a JSON payload decodes
    /// to the default (no username, no roles).
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        decode_payload(token).unwrap_or_default()
    }

    /// Role encoded in the realm roles.
    #[must_use]
    pub fn role(&self) -> Role {
        if self.realm_access.roles.iter().any(|role| role == ADMIN_ROLE) {
            Role::Admin
        } else {
            Role::Client
        }
    }
}

/// Decode the base64url payload of `header.payload.signature`.
fn decode_payload(token: &str) -> Option<AccessClaims> {
    let mut parts = token.trim().split('.');
    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return None,
    };

    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}
